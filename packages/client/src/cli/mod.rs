//! Interactive terminal client for a live session.

mod command;
mod formatter;
mod runner;
mod ui;

pub use runner::run_client;
