//! Event callbacks for a live connection.

use tokio::sync::mpsc;

use crate::classifier::ClassifiedMessage;

/// Receives events from a [`LiveConnection`](crate::LiveConnection).
///
/// Callbacks run on the connection's driver task, in arrival order, so they
/// should return quickly.
#[cfg_attr(test, mockall::automock)]
pub trait LiveEventHandler: Send + Sync {
    /// A server frame was received and classified.
    fn on_receive_response(&self, message: ClassifiedMessage);

    /// The socket opened and both setup frames were sent.
    fn on_connection_started(&self);

    /// The connection ended or a frame could not be read.
    fn on_error_message(&self, message: &str);
}

/// Handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventHandler;

impl LiveEventHandler for NoopEventHandler {
    fn on_receive_response(&self, _message: ClassifiedMessage) {}

    fn on_connection_started(&self) {}

    fn on_error_message(&self, _message: &str) {}
}

/// Owned form of the handler callbacks, for consumers that prefer a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Response(ClassifiedMessage),
    ConnectionStarted,
    Error(String),
}

impl LiveEventHandler for mpsc::UnboundedSender<LiveEvent> {
    fn on_receive_response(&self, message: ClassifiedMessage) {
        if self.send(LiveEvent::Response(message)).is_err() {
            tracing::debug!("Event receiver dropped, discarding response");
        }
    }

    fn on_connection_started(&self) {
        if self.send(LiveEvent::ConnectionStarted).is_err() {
            tracing::debug!("Event receiver dropped, discarding connection start");
        }
    }

    fn on_error_message(&self, message: &str) {
        if self.send(LiveEvent::Error(message.to_string())).is_err() {
            tracing::debug!("Event receiver dropped, discarding error '{}'", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_text;

    #[tokio::test]
    async fn test_channel_handler_forwards_events_in_order() {
        // テスト項目: チャネルハンドラがイベントを受信順に転送する
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let message = classify_text(r#"{"setupComplete":{}}"#).unwrap();

        // when (操作):
        tx.on_connection_started();
        tx.on_receive_response(message.clone());
        tx.on_error_message("Connection closed");

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(LiveEvent::ConnectionStarted));
        assert_eq!(rx.recv().await, Some(LiveEvent::Response(message)));
        assert_eq!(
            rx.recv().await,
            Some(LiveEvent::Error("Connection closed".to_string()))
        );
    }

    #[test]
    fn test_channel_handler_tolerates_dropped_receiver() {
        // テスト項目: 受信側が破棄されていてもパニックしない
        // given (前提条件):
        let (tx, rx) = mpsc::unbounded_channel::<LiveEvent>();
        drop(rx);

        // when (操作):
        tx.on_connection_started();
        tx.on_error_message("Connection error");

        // then (期待する結果):
        assert!(tx.is_closed());
    }
}
