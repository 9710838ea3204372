//! Decoding of inbound server frames.
//!
//! Server frames are loosely typed JSON. Decoding never fails: any shape that
//! is not recognized becomes [`ServerFrame::Unrecognized`]. A field counts as
//! present only when it is "truthy" (not null, false, zero or an empty string).

use serde_json::Value;

/// Recognized content of one server frame.
///
/// When a frame matches several shapes, the first variant in declaration order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    SetupComplete,
    /// Text of the first model-turn part
    ModelText(String),
    /// Base64 inline data of the first model-turn part
    ModelAudio(String),
    ResumptionUpdate {
        new_handle: String,
    },
    InputTranscription(Transcription),
    OutputTranscription(Transcription),
    Unrecognized,
}

/// A transcription fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    /// Partial transcript text
    Text(String),
    /// End-of-segment marker, rendered as text
    Finished(String),
    Empty,
}

/// A decoded frame together with the turn completion flag, which is independent of the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvelope {
    pub frame: ServerFrame,
    pub turn_complete: Option<bool>,
}

impl ServerEnvelope {
    /// Decode a server frame from parsed JSON.
    pub fn decode(value: &Value) -> Self {
        Self {
            frame: ServerFrame::decode(value),
            turn_complete: value
                .pointer("/serverContent/turnComplete")
                .and_then(Value::as_bool),
        }
    }
}

impl ServerFrame {
    /// Decode the content of a server frame from parsed JSON.
    pub fn decode(value: &Value) -> Self {
        if truthy(value.get("setupComplete")) {
            return Self::SetupComplete;
        }

        let first_part = value
            .pointer("/serverContent/modelTurn/parts")
            .and_then(Value::as_array)
            .and_then(|parts| parts.first());
        if let Some(text) = first_part.and_then(|part| part.get("text"))
            && truthy(Some(text))
        {
            return Self::ModelText(render(text));
        }
        if let Some(inline_data) = first_part.and_then(|part| part.get("inlineData"))
            && truthy(Some(inline_data))
        {
            return Self::ModelAudio(
                inline_data
                    .get("data")
                    .filter(|data| !data.is_null())
                    .map(render)
                    .unwrap_or_default(),
            );
        }

        if let Some(update) = value.get("sessionResumptionUpdate")
            && truthy(Some(update))
        {
            return Self::ResumptionUpdate {
                new_handle: update
                    .get("newHandle")
                    .filter(|handle| !handle.is_null())
                    .map(render)
                    .unwrap_or_default(),
            };
        }

        if let Some(transcription) = value.pointer("/serverContent/inputTranscription")
            && truthy(Some(transcription))
        {
            return Self::InputTranscription(Transcription::decode(transcription));
        }
        if let Some(transcription) = value.pointer("/serverContent/outputTranscription")
            && truthy(Some(transcription))
        {
            return Self::OutputTranscription(Transcription::decode(transcription));
        }

        Self::Unrecognized
    }
}

impl Transcription {
    fn decode(value: &Value) -> Self {
        match (value.get("text"), value.get("finished")) {
            (Some(text), _) if truthy(Some(text)) => Self::Text(render(text)),
            (_, Some(finished)) if truthy(Some(finished)) => Self::Finished(render(finished)),
            _ => Self::Empty,
        }
    }
}

/// Loose presence check used by the server protocol.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Strings verbatim, everything else as its JSON text.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
