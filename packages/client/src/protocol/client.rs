//! Outbound frames.
//!
//! Keys are serialized exactly as the proxy expects them (snake_case).
//! Optional setup features are omitted entirely when disabled.

use serde::Serialize;

use crate::config::{ResponseModality, SessionConfig};

/// MIME type of raw PCM audio chunks.
pub const AUDIO_PCM_MIME_TYPE: &str = "audio/pcm";
/// Default MIME type of image chunks.
pub const IMAGE_JPEG_MIME_TYPE: &str = "image/jpeg";

/// First frame on every connection: tells the proxy where to connect and with which credential.
#[derive(Debug, Serialize)]
pub struct TransportSetup<'a> {
    pub bearer_token: &'a str,
    pub service_url: String,
}

impl<'a> TransportSetup<'a> {
    pub fn new(bearer_token: &'a str, config: &SessionConfig) -> Self {
        Self {
            bearer_token,
            service_url: config.service_url(),
        }
    }
}

/// Protocol messages, each serialized as `{ "<variant>": { ... } }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    Setup(Setup),
    ClientContent(ClientContent),
    RealtimeInput(RealtimeInput),
}

#[derive(Debug, Serialize)]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: SystemInstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<AudioTranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resumption: Option<SessionResumption>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub response_modalities: Vec<ResponseModality>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
    pub language_code: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

/// Serialized as an empty object; its presence enables the feature.
#[derive(Debug, Default, Serialize)]
pub struct AudioTranscriptionConfig {}

#[derive(Debug, Serialize)]
pub struct SessionResumption {
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Serialize)]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

impl ClientMessage {
    /// Build the session setup frame from the current configuration.
    pub fn session_setup(config: &SessionConfig) -> Self {
        Self::Setup(Setup {
            model: config.model_uri(),
            generation_config: GenerationConfig {
                response_modalities: config.response_modalities.clone(),
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: config.voice_name.clone(),
                        },
                    },
                    language_code: config.voice_locale.clone(),
                },
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: config.system_instructions.clone(),
                }],
            },
            input_audio_transcription: config
                .enable_input_transcript
                .then(AudioTranscriptionConfig::default),
            output_audio_transcription: config
                .enable_output_transcript
                .then(AudioTranscriptionConfig::default),
            session_resumption: config.enable_session_resumption.then(|| SessionResumption {
                handle: config.resumption_handle.clone(),
            }),
        })
    }

    /// A single, complete user turn carrying `text`.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::ClientContent(ClientContent {
            turns: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: text.into() }],
            }],
            turn_complete: true,
        })
    }

    /// One realtime media chunk with the given MIME type.
    pub fn realtime_input(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: mime_type.into(),
                data: data.into(),
            }],
        })
    }
}
