//! Classification of inbound server frames into semantic message kinds.

use std::fmt;

use serde_json::Value;

use crate::protocol::server::{ServerEnvelope, ServerFrame, Transcription};

/// Prefix of the output transcription payload for a finished segment.
const OUTPUT_FINISHED_PREFIX: &str = "Finished: ";

/// Semantic kind of one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SetupComplete,
    Text,
    Audio,
    Resumption,
    InputTranscription,
    OutputTranscription,
    Unknown,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetupComplete => "SETUP_COMPLETE",
            Self::Text => "TEXT",
            Self::Audio => "AUDIO",
            Self::Resumption => "RESUMPTION",
            Self::InputTranscription => "INPUT_TRANSCRIPTION",
            Self::OutputTranscription => "OUTPUT_TRANSCRIPTION",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Result of classifying one inbound frame.
///
/// `payload` holds text, base64 audio, a resumption handle or a transcript
/// fragment depending on `kind`, and is empty for `SetupComplete` and `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    pub kind: MessageKind,
    pub payload: String,
    /// `serverContent.turnComplete` verbatim, whatever the kind
    pub turn_complete: Option<bool>,
}

impl ClassifiedMessage {
    fn new(kind: MessageKind, payload: String, turn_complete: Option<bool>) -> Self {
        Self {
            kind,
            payload,
            turn_complete,
        }
    }

    /// Whether the server signalled the end of the model turn.
    pub fn is_turn_complete(&self) -> bool {
        self.turn_complete.unwrap_or(false)
    }
}

/// Classify a decoded server frame.
pub fn classify(envelope: &ServerEnvelope) -> ClassifiedMessage {
    let (kind, payload) = match &envelope.frame {
        ServerFrame::SetupComplete => (MessageKind::SetupComplete, String::new()),
        ServerFrame::ModelText(text) => (MessageKind::Text, text.clone()),
        ServerFrame::ModelAudio(data) => (MessageKind::Audio, data.clone()),
        ServerFrame::ResumptionUpdate { new_handle } => {
            (MessageKind::Resumption, new_handle.clone())
        }
        ServerFrame::InputTranscription(transcription) => (
            MessageKind::InputTranscription,
            match transcription {
                Transcription::Text(text) => text.clone(),
                Transcription::Finished(marker) => marker.clone(),
                Transcription::Empty => String::new(),
            },
        ),
        ServerFrame::OutputTranscription(transcription) => (
            MessageKind::OutputTranscription,
            match transcription {
                Transcription::Text(text) => text.clone(),
                Transcription::Finished(marker) => format!("{OUTPUT_FINISHED_PREFIX}{marker}"),
                Transcription::Empty => String::new(),
            },
        ),
        ServerFrame::Unrecognized => (MessageKind::Unknown, String::new()),
    };

    ClassifiedMessage::new(kind, payload, envelope.turn_complete)
}

/// Classify a server frame that has already been parsed as JSON.
pub fn classify_value(value: &Value) -> ClassifiedMessage {
    classify(&ServerEnvelope::decode(value))
}

/// Parse and classify a raw server frame.
///
/// Only invalid JSON is an error; any valid JSON classifies to some kind.
pub fn classify_text(text: &str) -> Result<ClassifiedMessage, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(classify_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_complete_wins_over_other_fields() {
        // テスト項目: setupComplete があれば他のフィールドに関係なく SETUP_COMPLETE になる
        // given (前提条件):
        let value = json!({
            "setupComplete": true,
            "serverContent": { "modelTurn": { "parts": [{ "text": "hi" }] } },
            "sessionResumptionUpdate": { "newHandle": "h1" }
        });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::SetupComplete);
        assert!(message.payload.is_empty());
    }

    #[test]
    fn test_text_part() {
        // テスト項目: 最初の part が text の場合 TEXT になる
        // given (前提条件):
        let value = json!({ "serverContent": { "modelTurn": { "parts": [{ "text": "hi" }] } } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.payload, "hi");
    }

    #[test]
    fn test_inline_data_part() {
        // テスト項目: 最初の part が inlineData の場合 AUDIO になる
        // given (前提条件):
        let value = json!({
            "serverContent": { "modelTurn": { "parts": [{ "inlineData": { "data": "QUJD" } }] } }
        });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Audio);
        assert_eq!(message.payload, "QUJD");
    }

    #[test]
    fn test_only_first_part_is_inspected() {
        // テスト項目: 2 番目以降の part は無視される
        // given (前提条件):
        let value = json!({
            "serverContent": { "modelTurn": { "parts": [
                { "text": "first" },
                { "inlineData": { "data": "QUJD" } }
            ] } }
        });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.payload, "first");
    }

    #[test]
    fn test_session_resumption_update() {
        // テスト項目: sessionResumptionUpdate の場合 RESUMPTION になり新しいハンドルを持つ
        // given (前提条件):
        let value = json!({ "sessionResumptionUpdate": { "newHandle": "h1", "resumable": true } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Resumption);
        assert_eq!(message.payload, "h1");
    }

    #[test]
    fn test_input_transcription_text() {
        // テスト項目: inputTranscription の text が payload になる
        // given (前提条件):
        let value = json!({ "serverContent": { "inputTranscription": { "text": "hello th" } } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::InputTranscription);
        assert_eq!(message.payload, "hello th");
    }

    #[test]
    fn test_input_transcription_finished_has_no_prefix() {
        // テスト項目: inputTranscription の finished マーカーは接頭辞なしで payload になる
        // given (前提条件):
        let value = json!({ "serverContent": { "inputTranscription": { "finished": "x" } } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::InputTranscription);
        assert_eq!(message.payload, "x");
    }

    #[test]
    fn test_output_transcription_finished_has_prefix() {
        // テスト項目: outputTranscription の finished マーカーは "Finished: " 付きで payload になる
        // given (前提条件):
        let value = json!({ "serverContent": { "outputTranscription": { "finished": "x" } } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::OutputTranscription);
        assert_eq!(message.payload, "Finished: x");
    }

    #[test]
    fn test_output_transcription_text_preferred_over_finished() {
        // テスト項目: text と finished の両方がある場合 text が優先される
        // given (前提条件):
        let value = json!({
            "serverContent": { "outputTranscription": { "text": "partial", "finished": true } }
        });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.payload, "partial");
    }

    #[test]
    fn test_input_transcription_precedes_output_transcription() {
        // テスト項目: 入力と出力の両方のトランスクリプトがある場合 INPUT_TRANSCRIPTION になる
        // given (前提条件):
        let value = json!({
            "serverContent": {
                "inputTranscription": { "text": "in" },
                "outputTranscription": { "text": "out" }
            }
        });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::InputTranscription);
        assert_eq!(message.payload, "in");
    }

    #[test]
    fn test_unmatched_frame_is_unknown() {
        // テスト項目: どのルールにも一致しない場合 UNKNOWN で payload が空になる
        // given (前提条件):
        let value = json!({ "usageMetadata": { "totalTokenCount": 42 } });

        // when (操作):
        let message = classify_value(&value);

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Unknown);
        assert!(message.payload.is_empty());
        assert_eq!(message.turn_complete, None);
    }

    #[test]
    fn test_parts_object_with_index_key_is_unknown() {
        // テスト項目: parts が配列でなくオブジェクトの場合は TEXT ではなく UNKNOWN になる
        // given (前提条件):
        let text = r#"{"serverContent":{"modelTurn":{"parts":{"0":{"text":"x"}}}}}"#;

        // when (操作):
        let message = classify_text(text).unwrap();

        // then (期待する結果):
        assert_eq!(message.kind, MessageKind::Unknown);
        assert!(message.payload.is_empty());
    }

    #[test]
    fn test_non_object_json_is_unknown() {
        // テスト項目: オブジェクトでない JSON も失敗せず UNKNOWN になる
        // given (前提条件):
        let values = [json!(null), json!(42), json!("text"), json!([1, 2])];

        // when (操作):
        let kinds: Vec<_> = values.iter().map(|v| classify_value(v).kind).collect();

        // then (期待する結果):
        assert!(kinds.iter().all(|kind| *kind == MessageKind::Unknown));
    }

    #[test]
    fn test_turn_complete_attached_to_every_kind() {
        // テスト項目: turnComplete はどの種別でもそのまま付与される
        // given (前提条件):
        let with_text = json!({
            "serverContent": { "modelTurn": { "parts": [{ "text": "bye" }] }, "turnComplete": true }
        });
        let alone = json!({ "serverContent": { "turnComplete": true } });
        let explicit_false = json!({
            "serverContent": { "outputTranscription": { "text": "t" }, "turnComplete": false }
        });

        // when (操作):
        let with_text = classify_value(&with_text);
        let alone = classify_value(&alone);
        let explicit_false = classify_value(&explicit_false);

        // then (期待する結果):
        assert_eq!(with_text.kind, MessageKind::Text);
        assert_eq!(with_text.turn_complete, Some(true));
        assert_eq!(alone.kind, MessageKind::Unknown);
        assert!(alone.is_turn_complete());
        assert_eq!(explicit_false.kind, MessageKind::OutputTranscription);
        assert_eq!(explicit_false.turn_complete, Some(false));
    }

    #[test]
    fn test_classify_text_rejects_invalid_json() {
        // テスト項目: 不正な JSON はエラーになる
        // given (前提条件):
        let text = "{not json";

        // when (操作):
        let result = classify_text(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_message_kind_display() {
        // テスト項目: MessageKind がプロトコル上の名前で表示される
        // given (前提条件):
        let kind = MessageKind::OutputTranscription;

        // when (操作):
        let name = kind.to_string();

        // then (期待する結果):
        assert_eq!(name, "OUTPUT_TRANSCRIPTION");
    }
}
