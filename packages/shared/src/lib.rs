//! Shared utilities for the gemini-live packages.

pub mod logger;
pub mod time;
