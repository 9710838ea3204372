//! Message formatting utilities for terminal display.

use chrono::Local;
use gemini_live_shared::time::{timestamp_to_local_clock, timestamp_to_rfc3339};

use crate::classifier::{ClassifiedMessage, MessageKind};

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a classified server message
    ///
    /// # Arguments
    ///
    /// * `message` - The classified message
    /// * `received_at` - Unix timestamp when the message was received (milliseconds)
    ///
    /// # Returns
    ///
    /// A formatted string, or `None` when the message carries nothing worth showing
    pub fn format_response(message: &ClassifiedMessage, received_at: i64) -> Option<String> {
        let clock = timestamp_to_local_clock(received_at);
        let body = match message.kind {
            MessageKind::SetupComplete => Some("Session setup complete".to_string()),
            MessageKind::Text => Some(format!("model: {}", message.payload)),
            MessageKind::Audio => Some(format!(
                "model: <audio chunk, {} base64 chars>",
                message.payload.len()
            )),
            MessageKind::Resumption if message.payload.is_empty() => None,
            MessageKind::Resumption => Some(format!("resumption handle: {}", message.payload)),
            MessageKind::InputTranscription if message.payload.is_empty() => None,
            MessageKind::InputTranscription => Some(format!("you (heard): {}", message.payload)),
            MessageKind::OutputTranscription if message.payload.is_empty() => None,
            MessageKind::OutputTranscription => Some(format!("model (said): {}", message.payload)),
            MessageKind::Unknown => None,
        };

        match (body, message.is_turn_complete()) {
            (Some(body), true) => Some(format!(
                "\n[{}] {}\n[{}] -- turn complete --\n",
                clock, body, clock
            )),
            (Some(body), false) => Some(format!("\n[{}] {}\n", clock, body)),
            (None, true) => Some(format!("\n[{}] -- turn complete --\n", clock)),
            (None, false) => None,
        }
    }

    /// Format the banner shown once the session is set up
    pub fn format_connection_started(started_at: i64) -> String {
        let timestamp = timestamp_to_rfc3339(started_at, &Local).unwrap_or_default();
        format!(
            "\n============================================================\n\
             Connected at {}\n\
             Type a message and press Enter. /help lists commands.\n\
             ============================================================\n",
            timestamp
        )
    }

    /// Format a connection error or close notification
    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    /// Format the list of available commands
    pub fn format_help() -> String {
        "\nCommands:\n  \
         <text>            send a text turn\n  \
         /image <path>     send an image file\n  \
         /audio <path>     send a raw PCM audio file\n  \
         /reconnect        open a new session\n  \
         /help             show this help\n  \
         /quit             disconnect and exit\n"
            .to_string()
    }
}
