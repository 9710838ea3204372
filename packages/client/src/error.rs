//! Error types for the live API client.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors surfaced to callers of [`LiveConnection`](crate::LiveConnection).
///
/// Transport failures are not represented here: they are reported through
/// [`LiveEventHandler::on_error_message`](crate::LiveEventHandler::on_error_message).
#[derive(Debug, Error)]
pub enum LiveApiError {
    /// A frame was sent while the socket was not open
    #[error("Connection is not open (current state: {0})")]
    NotConnected(ConnectionState),

    /// `connect` was called while a connection is already in progress or open
    #[error("Connection is already established or in progress")]
    AlreadyConnected,

    /// `reconnect` was called before any access token was provided
    #[error("No access token, call connect first")]
    MissingAccessToken,

    /// `disconnect` was called on a connection that already ended
    #[error("Connection is already closed")]
    AlreadyClosed,

    /// An outbound frame could not be serialized
    #[error("Failed to serialize frame: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection driver is gone
    #[error("Connection driver has stopped")]
    ChannelClosed,
}
