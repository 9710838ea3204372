//! Terminal client for a Multimodal Live session through a WebSocket proxy.
//!
//! Connects to the proxy, performs the session setup and sends each input
//! line as a user turn. Server responses are classified and printed.
//! Every option can also be set through a `GEMINI_LIVE_*` environment
//! variable or a `.env` file.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin gemini-live-client -- --project-id my-project --token "$(gcloud auth print-access-token)"
//! cargo run --bin gemini-live-client -- -p my-project -t TOKEN --modality TEXT --output-transcript
//! ```

use clap::Parser;

use gemini_live_client::{ResponseModality, SessionConfig};
use gemini_live_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "gemini-live-client")]
#[command(
    about = "Terminal client for the Multimodal Live API through a WebSocket proxy",
    long_about = None
)]
struct Args {
    /// WebSocket URL of the proxy
    #[arg(
        short = 'u',
        long,
        env = "GEMINI_LIVE_PROXY_URL",
        default_value = "ws://localhost:8080"
    )]
    proxy_url: String,

    /// Cloud project that hosts the model
    #[arg(short = 'p', long, env = "GEMINI_LIVE_PROJECT_ID")]
    project_id: String,

    /// Model name
    #[arg(
        short = 'm',
        long,
        env = "GEMINI_LIVE_MODEL",
        default_value = "gemini-2.0-flash-live-preview-04-09"
    )]
    model: String,

    /// Upstream API host the proxy connects to
    #[arg(
        long,
        env = "GEMINI_LIVE_API_HOST",
        default_value = "us-central1-aiplatform.googleapis.com"
    )]
    api_host: String,

    /// OAuth access token forwarded to the proxy
    #[arg(
        short = 't',
        long,
        env = "GEMINI_LIVE_ACCESS_TOKEN",
        hide_env_values = true
    )]
    token: String,

    /// Prebuilt voice name
    #[arg(long, env = "GEMINI_LIVE_VOICE", default_value = "Puck")]
    voice: String,

    /// Speech language code
    #[arg(long, env = "GEMINI_LIVE_LOCALE", default_value = "en-US")]
    locale: String,

    /// System instructions for the model
    #[arg(long, env = "GEMINI_LIVE_SYSTEM_INSTRUCTIONS", default_value = "")]
    system_instructions: String,

    /// Response modalities (comma separated: AUDIO, TEXT)
    #[arg(
        long,
        env = "GEMINI_LIVE_MODALITY",
        value_delimiter = ',',
        default_value = "AUDIO"
    )]
    modality: Vec<ResponseModality>,

    /// Transcribe the user's audio input
    #[arg(long, env = "GEMINI_LIVE_INPUT_TRANSCRIPT")]
    input_transcript: bool,

    /// Transcribe the model's audio output
    #[arg(long, env = "GEMINI_LIVE_OUTPUT_TRANSCRIPT")]
    output_transcript: bool,

    /// Enable session resumption
    #[arg(long, env = "GEMINI_LIVE_RESUMPTION")]
    resumption: bool,

    /// Resumption handle from a previous session
    #[arg(long, env = "GEMINI_LIVE_RESUMPTION_HANDLE", default_value = "")]
    resumption_handle: String,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(
            &self.proxy_url,
            &self.project_id,
            &self.model,
            &self.api_host,
        );
        config.set_voice(&self.voice, &self.locale);
        config.set_system_instructions(&self.system_instructions);
        config.set_response_modalities(self.modality.clone());
        config.set_transcript(self.input_transcript, self.output_transcript);
        config.set_resumption(self.resumption, &self.resumption_handle);
        config
    }
}

#[tokio::main]
async fn main() {
    // Load .env before tracing so RUST_LOG can come from it
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }
    let args = Args::parse();
    let config = args.session_config();

    // Run the client
    if let Err(e) = gemini_live_client::cli::run_client(config, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
