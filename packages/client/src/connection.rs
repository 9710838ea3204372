//! Live connection lifecycle.
//!
//! A [`LiveConnection`] owns at most one socket at a time. `connect` spawns a
//! driver task that opens the socket, sends the transport and session setup
//! frames, then forwards outbound frames and classifies inbound ones until the
//! socket ends. Callers talk to the driver through an unbounded channel and
//! observe the lifecycle through a watch channel.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    classifier::classify_text,
    config::SessionConfig,
    error::LiveApiError,
    handler::LiveEventHandler,
    protocol::client::{AUDIO_PCM_MIME_TYPE, ClientMessage, IMAGE_JPEG_MIME_TYPE, TransportSetup},
};

/// Reported when the socket closes, whoever closed it.
pub const CONNECTION_CLOSED_MESSAGE: &str = "Connection closed";
/// Reported when the socket fails to open or fails while open.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";
/// Reported when an inbound frame is not valid JSON. The session stays open.
pub const MALFORMED_MESSAGE: &str = "Malformed message";

/// Lifecycle of a connection.
///
/// `Idle → Connecting → Open → Closed`, with `Errored` reachable from
/// `Connecting` or `Open`. A new `connect` starts over from `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Whether the connection has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

enum Command {
    Send(String),
    Close,
}

/// State shared between the connection and its driver.
///
/// Every `connect` starts a new generation; a driver may only update the
/// state while its generation is current, so a superseded driver cannot
/// overwrite the state of its successor.
struct SharedState {
    tx: watch::Sender<ConnectionState>,
    generation: AtomicU64,
}

impl SharedState {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Idle);
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Start a new generation in the given state and return its id.
    fn begin(&self, state: ConnectionState) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|current| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = state;
        });
        generation
    }

    /// Move to `next` if `generation` is still current and not yet terminal.
    fn transition(&self, generation: u64, next: ConnectionState) -> bool {
        self.tx.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || current.is_terminal() {
                return false;
            }
            *current = next;
            true
        })
    }

    /// End the current generation, whichever it is.
    fn end_current(&self, next: ConnectionState) -> bool {
        let generation = self.generation.load(Ordering::SeqCst);
        self.transition(generation, next)
    }
}

/// Client for one live session at a time.
pub struct LiveConnection {
    config: SessionConfig,
    handler: Arc<dyn LiveEventHandler>,
    access_token: Option<SecretString>,
    state: Arc<SharedState>,
    command_tx: Option<mpsc::UnboundedSender<Command>>,
    driver: Option<JoinHandle<()>>,
}

impl LiveConnection {
    /// Create an idle connection.
    ///
    /// # Arguments
    ///
    /// * `config` - Session settings used by the next `connect`
    /// * `handler` - Receives classified responses, connection start and errors
    pub fn new(config: SessionConfig, handler: Arc<dyn LiveEventHandler>) -> Self {
        tracing::debug!(
            proxy_url = config.proxy_url(),
            model_uri = %config.model_uri(),
            "Created live connection"
        );
        Self {
            config,
            handler,
            access_token: None,
            state: Arc::new(SharedState::new()),
            command_tx: None,
            driver: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access to the session settings.
    ///
    /// Changes apply to the next setup, never to an already open session.
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state.current()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.tx.subscribe()
    }

    /// Open a session through the proxy.
    ///
    /// Must be called from within a Tokio runtime. The socket is opened on a
    /// spawned task; failures are reported through the handler.
    ///
    /// # Errors
    ///
    /// Returns `LiveApiError::AlreadyConnected` while connecting or open.
    pub fn connect(&mut self, access_token: impl Into<String>) -> Result<(), LiveApiError> {
        if matches!(
            self.state(),
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            return Err(LiveApiError::AlreadyConnected);
        }
        self.access_token = Some(SecretString::from(access_token.into()));
        self.start()
    }

    /// Open a new session with the access token of the previous `connect`.
    ///
    /// # Errors
    ///
    /// Returns `LiveApiError::MissingAccessToken` if `connect` was never called.
    pub fn reconnect(&mut self) -> Result<(), LiveApiError> {
        if self.access_token.is_none() {
            return Err(LiveApiError::MissingAccessToken);
        }
        self.start()
    }

    fn start(&mut self) -> Result<(), LiveApiError> {
        let state = self.state();
        if matches!(state, ConnectionState::Connecting | ConnectionState::Open) {
            return Err(LiveApiError::AlreadyConnected);
        }
        let token = match &self.access_token {
            Some(token) => SecretString::from(token.expose_secret().to_string()),
            None => return Err(LiveApiError::MissingAccessToken),
        };

        let generation = self.state.begin(ConnectionState::Connecting);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        self.command_tx = Some(command_tx);

        let driver = Driver {
            generation,
            config: self.config.clone(),
            token,
            handler: self.handler.clone(),
            state: self.state.clone(),
        };
        self.driver = Some(tokio::spawn(driver.run(command_rx)));

        Ok(())
    }

    /// Close the session.
    ///
    /// Before any `connect` this is a no-op. While connecting, the attempt is
    /// abandoned. While open, a close frame is sent and the handler is told
    /// once the socket is closed.
    ///
    /// # Errors
    ///
    /// Returns `LiveApiError::AlreadyClosed` if the connection already ended.
    pub fn disconnect(&mut self) -> Result<(), LiveApiError> {
        match self.state() {
            ConnectionState::Idle => {
                tracing::debug!("disconnect called before connect, nothing to close");
                Ok(())
            }
            ConnectionState::Closed | ConnectionState::Errored => Err(LiveApiError::AlreadyClosed),
            ConnectionState::Connecting => {
                tracing::info!("Abandoning connection attempt");
                if let Some(driver) = self.driver.take() {
                    driver.abort();
                }
                self.command_tx = None;
                if self.state.end_current(ConnectionState::Closed) {
                    self.handler.on_error_message(CONNECTION_CLOSED_MESSAGE);
                }
                Ok(())
            }
            ConnectionState::Open => {
                // A close is already pending when the sender is gone
                if let Some(command_tx) = self.command_tx.take() {
                    tracing::info!("Closing live session");
                    command_tx
                        .send(Command::Close)
                        .map_err(|_| LiveApiError::ChannelClosed)?;
                }
                Ok(())
            }
        }
    }

    /// Send a complete user turn containing `text`.
    pub fn send_text_message(&self, text: impl Into<String>) -> Result<(), LiveApiError> {
        self.send_message(&ClientMessage::user_text(text))
    }

    /// Send one realtime media chunk.
    ///
    /// # Arguments
    ///
    /// * `data` - Base64-encoded payload
    /// * `mime_type` - MIME type of the decoded payload
    pub fn send_realtime_input_message(
        &self,
        data: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<(), LiveApiError> {
        self.send_message(&ClientMessage::realtime_input(data, mime_type))
    }

    /// Send a chunk of base64-encoded raw PCM audio.
    pub fn send_audio_message(&self, base64_pcm: impl Into<String>) -> Result<(), LiveApiError> {
        self.send_realtime_input_message(base64_pcm, AUDIO_PCM_MIME_TYPE)
    }

    /// Send a base64-encoded image, `image/jpeg` unless another MIME type is given.
    pub fn send_image_message(
        &self,
        base64_image: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Result<(), LiveApiError> {
        self.send_realtime_input_message(base64_image, mime_type.unwrap_or(IMAGE_JPEG_MIME_TYPE))
    }

    fn send_message(&self, message: &ClientMessage) -> Result<(), LiveApiError> {
        let state = self.state();
        if state != ConnectionState::Open {
            return Err(LiveApiError::NotConnected(state));
        }
        let frame = serde_json::to_string(message)?;
        let Some(command_tx) = &self.command_tx else {
            return Err(LiveApiError::ChannelClosed);
        };
        command_tx
            .send(Command::Send(frame))
            .map_err(|_| LiveApiError::ChannelClosed)
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        // An open driver closes its socket once the command channel is dropped
        if self.state() == ConnectionState::Connecting
            && let Some(driver) = self.driver.take()
        {
            driver.abort();
        }
    }
}

/// Everything one connection attempt needs, moved into its task.
struct Driver {
    generation: u64,
    config: SessionConfig,
    token: SecretString,
    handler: Arc<dyn LiveEventHandler>,
    state: Arc<SharedState>,
}

impl Driver {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let proxy_url = self.config.proxy_url().to_string();
        tracing::info!("Connecting to {}", proxy_url);

        let (ws_stream, _response) = match connect_async(proxy_url.as_str()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", proxy_url, e);
                self.finish(ConnectionState::Errored);
                return;
            }
        };
        let (mut write, mut read) = ws_stream.split();

        let frames = match setup_frames(&self.config, self.token.expose_secret()) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::error!("Failed to serialize setup frames: {}", e);
                self.finish(ConnectionState::Errored);
                return;
            }
        };
        for frame in frames {
            if let Err(e) = write.send(Message::Text(frame.into())).await {
                tracing::warn!("Failed to send setup frame: {}", e);
                self.finish(ConnectionState::Errored);
                return;
            }
        }
        tracing::debug!(model_uri = %self.config.model_uri(), "Sent setup frames");

        if !self.advance(ConnectionState::Open) {
            tracing::debug!("Connection superseded before it opened");
            let _ = write.close().await;
            return;
        }
        tracing::info!("Live session started");
        self.handler.on_connection_started();

        let outcome = loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(frame)) => {
                        tracing::debug!("Sending frame ({} bytes)", frame.len());
                        if let Err(e) = write.send(Message::Text(frame.into())).await {
                            tracing::warn!("Failed to send frame: {}", e);
                            break ConnectionState::Errored;
                        }
                    }
                    Some(Command::Close) | None => {
                        if let Err(e) = write.close().await {
                            tracing::debug!("Error while closing socket: {}", e);
                        }
                        break ConnectionState::Closed;
                    }
                },
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_inbound(text.as_str(), &*self.handler)
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => dispatch_inbound(text, &*self.handler),
                        Err(e) => {
                            tracing::warn!("Received non UTF-8 binary frame: {}", e);
                            self.handler.on_error_message(MALFORMED_MESSAGE);
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Server closed the connection");
                        // Flush the close reply queued by the protocol layer
                        if let Err(e) = write.close().await {
                            tracing::debug!("Error while completing close handshake: {}", e);
                        }
                        break ConnectionState::Closed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break ConnectionState::Errored;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break ConnectionState::Closed;
                    }
                },
            }
        };

        self.finish(outcome);
    }

    /// Move this driver's generation to `next`; false once superseded or ended.
    fn advance(&self, next: ConnectionState) -> bool {
        self.state.transition(self.generation, next)
    }

    /// Record a terminal state and report it, unless this driver was superseded.
    fn finish(&self, outcome: ConnectionState) {
        if !self.advance(outcome) {
            return;
        }
        let message = match outcome {
            ConnectionState::Errored => CONNECTION_ERROR_MESSAGE,
            _ => CONNECTION_CLOSED_MESSAGE,
        };
        self.handler.on_error_message(message);
    }
}

/// Transport setup followed by session setup, serialized in send order.
fn setup_frames(config: &SessionConfig, token: &str) -> Result<[String; 2], serde_json::Error> {
    Ok([
        serde_json::to_string(&TransportSetup::new(token, config))?,
        serde_json::to_string(&ClientMessage::session_setup(config))?,
    ])
}

/// Classify one inbound frame and hand it to the handler.
fn dispatch_inbound(text: &str, handler: &dyn LiveEventHandler) {
    match classify_text(text) {
        Ok(message) => {
            tracing::debug!(
                kind = %message.kind,
                turn_complete = ?message.turn_complete,
                "Message received"
            );
            handler.on_receive_response(message);
        }
        Err(e) => {
            tracing::warn!("Failed to parse server frame: {}", e);
            handler.on_error_message(MALFORMED_MESSAGE);
        }
    }
}
