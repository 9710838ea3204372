//! Wire frames exchanged with the proxy.
//!
//! - `client`: frames sent by this client
//! - `server`: decoding of frames sent by the server

pub mod client;
pub mod server;

pub use client::{ClientMessage, TransportSetup};
pub use server::{ServerEnvelope, ServerFrame};
