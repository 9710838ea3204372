//! Client wrapper for the Multimodal Live bidirectional streaming API.
//!
//! The library connects to the API through a WebSocket proxy, performs the
//! transport and session setup handshake, forwards user input as protocol
//! frames and classifies inbound server frames for a UI layer.

pub mod classifier;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;

// demo terminal client
pub mod cli;

pub use classifier::{ClassifiedMessage, MessageKind, classify, classify_text, classify_value};
pub use config::{ResponseModality, SessionConfig};
pub use connection::{ConnectionState, LiveConnection};
pub use error::LiveApiError;
pub use handler::{LiveEvent, LiveEventHandler, NoopEventHandler};
