//! Session configuration for the live API.
//!
//! Values here are read when a connection is established. Changing them on an
//! open connection only affects the next session setup.

use serde::Serialize;

/// Region that hosts the model endpoint.
pub const LOCATION: &str = "us-central1";

/// Output medium requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Text,
    Audio,
}

impl std::str::FromStr for ResponseModality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "AUDIO" => Ok(Self::Audio),
            other => Err(format!("unknown response modality '{}'", other)),
        }
    }
}

/// Mutable session settings used to build the setup frames.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    proxy_url: String,
    project_id: String,
    model: String,
    api_host: String,
    pub response_modalities: Vec<ResponseModality>,
    pub system_instructions: String,
    pub voice_name: String,
    pub voice_locale: String,
    pub enable_input_transcript: bool,
    pub enable_output_transcript: bool,
    pub enable_session_resumption: bool,
    pub resumption_handle: String,
}

impl SessionConfig {
    /// Create a configuration with audio responses and every optional feature disabled.
    ///
    /// # Arguments
    ///
    /// * `proxy_url` - WebSocket URL of the proxy (e.g. "ws://localhost:8080")
    /// * `project_id` - Cloud project that owns the model endpoint
    /// * `model` - Model name (e.g. "gemini-2.0-flash-live-preview-04-09")
    /// * `api_host` - Upstream API host the proxy connects to
    pub fn new(
        proxy_url: impl Into<String>,
        project_id: impl Into<String>,
        model: impl Into<String>,
        api_host: impl Into<String>,
    ) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            project_id: project_id.into(),
            model: model.into(),
            api_host: api_host.into(),
            response_modalities: vec![ResponseModality::Audio],
            system_instructions: String::new(),
            voice_name: String::new(),
            voice_locale: String::new(),
            enable_input_transcript: false,
            enable_output_transcript: false,
            enable_session_resumption: false,
            resumption_handle: String::new(),
        }
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// Fully qualified model resource name.
    ///
    /// Derived on every call so it always reflects the current project and model.
    pub fn model_uri(&self) -> String {
        format!(
            "projects/{}/locations/{}/publishers/google/models/{}",
            self.project_id, LOCATION, self.model
        )
    }

    /// Upstream service URL the proxy should connect to.
    pub fn service_url(&self) -> String {
        format!(
            "wss://{}/ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent",
            self.api_host
        )
    }

    pub fn set_proxy_url(&mut self, proxy_url: impl Into<String>) {
        self.proxy_url = proxy_url.into();
    }

    pub fn set_project_id(&mut self, project_id: impl Into<String>) {
        self.project_id = project_id.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_api_host(&mut self, api_host: impl Into<String>) {
        self.api_host = api_host.into();
    }

    /// Enable or disable input and output transcription independently.
    pub fn set_transcript(&mut self, input: bool, output: bool) {
        tracing::debug!(input, output, "Updating transcript settings");
        self.enable_input_transcript = input;
        self.enable_output_transcript = output;
    }

    pub fn set_voice(&mut self, name: impl Into<String>, locale: impl Into<String>) {
        self.voice_name = name.into();
        self.voice_locale = locale.into();
    }

    /// Configure session resumption.
    ///
    /// The handle is sent in the next session setup only when `enable` is true.
    pub fn set_resumption(&mut self, enable: bool, handle: impl Into<String>) {
        self.enable_session_resumption = enable;
        self.resumption_handle = handle.into();
    }

    pub fn set_response_modalities(&mut self, modalities: Vec<ResponseModality>) {
        self.response_modalities = modalities;
    }

    pub fn set_system_instructions(&mut self, instructions: impl Into<String>) {
        self.system_instructions = instructions.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> SessionConfig {
        SessionConfig::new(
            "ws://localhost:8080",
            "my-project",
            "gemini-live",
            "us-central1-aiplatform.googleapis.com",
        )
    }

    #[test]
    fn test_new_config_defaults() {
        // テスト項目: 新しい設定のデフォルト値が音声応答のみでオプション機能が無効
        // given (前提条件):

        // when (操作):
        let config = create_test_config();

        // then (期待する結果):
        assert_eq!(config.response_modalities, vec![ResponseModality::Audio]);
        assert!(config.system_instructions.is_empty());
        assert!(!config.enable_input_transcript);
        assert!(!config.enable_output_transcript);
        assert!(!config.enable_session_resumption);
        assert!(config.resumption_handle.is_empty());
    }

    #[test]
    fn test_model_uri_composition() {
        // テスト項目: model URI がプロジェクト ID とモデル名から構成される
        // given (前提条件):
        let config = create_test_config();

        // when (操作):
        let uri = config.model_uri();

        // then (期待する結果):
        assert_eq!(
            uri,
            "projects/my-project/locations/us-central1/publishers/google/models/gemini-live"
        );
    }

    #[test]
    fn test_model_uri_follows_project_id_change() {
        // テスト項目: プロジェクト ID を変更すると model URI も更新される
        // given (前提条件):
        let mut config = create_test_config();

        // when (操作):
        config.set_project_id("other-project");

        // then (期待する結果):
        assert_eq!(
            config.model_uri(),
            "projects/other-project/locations/us-central1/publishers/google/models/gemini-live"
        );
    }

    #[test]
    fn test_model_uri_follows_model_change() {
        // テスト項目: モデル名を変更すると model URI も更新される
        // given (前提条件):
        let mut config = create_test_config();

        // when (操作):
        config.set_model("gemini-next");

        // then (期待する結果):
        assert!(config.model_uri().ends_with("/models/gemini-next"));
    }

    #[test]
    fn test_service_url_uses_api_host() {
        // テスト項目: service URL が API ホストから構成される
        // given (前提条件):
        let mut config = create_test_config();

        // when (操作):
        config.set_api_host("example.googleapis.com");

        // then (期待する結果):
        assert_eq!(
            config.service_url(),
            "wss://example.googleapis.com/ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent"
        );
    }

    #[test]
    fn test_set_transcript_is_independent() {
        // テスト項目: 入力と出力のトランスクリプト設定が独立して設定される
        // given (前提条件):
        let mut config = create_test_config();

        // when (操作):
        config.set_transcript(false, true);

        // then (期待する結果):
        assert!(!config.enable_input_transcript);
        assert!(config.enable_output_transcript);
    }

    #[test]
    fn test_response_modality_from_str() {
        // テスト項目: 応答モダリティが大文字小文字を問わずパースされる
        // given (前提条件):
        let inputs = ["audio", "TEXT", "video"];

        // when (操作):
        let results: Vec<_> = inputs
            .iter()
            .map(|s| s.parse::<ResponseModality>())
            .collect();

        // then (期待する結果):
        assert_eq!(results[0], Ok(ResponseModality::Audio));
        assert_eq!(results[1], Ok(ResponseModality::Text));
        assert!(results[2].is_err());
    }
}
