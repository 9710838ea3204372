//! Terminal session loop.

use std::{path::Path, sync::Arc};

use gemini_live_shared::time::now_millis;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::{
    classifier::MessageKind,
    config::SessionConfig,
    connection::{ConnectionState, LiveConnection},
    error::LiveApiError,
    handler::LiveEvent,
};

use super::{
    command::{InputCommand, encode_file, image_mime_type, parse_input},
    formatter::MessageFormatter,
    ui::{PROMPT, redisplay_prompt},
};

/// Run an interactive session until the user quits or input ends.
///
/// Connection loss does not end the loop; the user may `/reconnect`.
pub async fn run_client(
    config: SessionConfig,
    access_token: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<LiveEvent>();
    let mut connection = LiveConnection::new(config, Arc::new(event_tx));

    tracing::info!(
        "Connecting to {} (model {})",
        connection.config().proxy_url(),
        connection.config().model_uri()
    );
    connection.connect(access_token)?;

    let input_rx = spawn_readline();
    let mut session = Session {
        connection,
        input_rx,
        latest_handle: None,
    };

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => session.handle_event(event),
                None => break,
            },
            line = session.input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                let Some(command) = parse_input(&line) else {
                    continue;
                };
                if command == InputCommand::Quit {
                    break;
                }
                session.handle_command(command).await;
            }
        }
    }

    match session.connection.disconnect() {
        Ok(()) | Err(LiveApiError::AlreadyClosed) => {}
        Err(e) => tracing::warn!("Failed to disconnect: {}", e),
    }
    tracing::info!("Client session ended");

    Ok(())
}

struct Session {
    connection: LiveConnection,
    input_rx: mpsc::UnboundedReceiver<String>,
    /// Most recent resumption handle issued by the server
    latest_handle: Option<String>,
}

impl Session {
    fn handle_event(&mut self, event: LiveEvent) {
        match event {
            LiveEvent::ConnectionStarted => {
                print!(
                    "{}",
                    MessageFormatter::format_connection_started(now_millis())
                );
            }
            LiveEvent::Response(message) => {
                if message.kind == MessageKind::Resumption && !message.payload.is_empty() {
                    self.latest_handle = Some(message.payload.clone());
                }
                match MessageFormatter::format_response(&message, now_millis()) {
                    Some(formatted) => print!("{}", formatted),
                    None => return,
                }
            }
            LiveEvent::Error(message) => {
                tracing::warn!("{}", message);
                print!("{}", MessageFormatter::format_error(&message));
            }
        }
        redisplay_prompt();
    }

    async fn handle_command(&mut self, command: InputCommand) {
        let result = match command {
            InputCommand::Text(text) => self.connection.send_text_message(text),
            InputCommand::Image(path) => match encode_file(&path) {
                Ok(data) => self
                    .connection
                    .send_image_message(data, image_mime_type(&path)),
                Err(e) => {
                    report_file_error(&path, &e);
                    Ok(())
                }
            },
            InputCommand::Audio(path) => match encode_file(&path) {
                Ok(data) => self.connection.send_audio_message(data),
                Err(e) => {
                    report_file_error(&path, &e);
                    Ok(())
                }
            },
            InputCommand::Reconnect => self.reconnect().await,
            InputCommand::Help => {
                print!("{}", MessageFormatter::format_help());
                Ok(())
            }
            InputCommand::Invalid(line) => {
                let message = format!("Unknown command: {}", line);
                print!("{}", MessageFormatter::format_error(&message));
                Ok(())
            }
            InputCommand::Quit => Ok(()),
        };

        if let Err(e) = result {
            tracing::debug!("Command failed: {}", e);
            print!("{}", MessageFormatter::format_error(&e.to_string()));
        }
        redisplay_prompt();
    }

    /// Close the current session if needed and open a new one, resuming when possible.
    async fn reconnect(&mut self) -> Result<(), LiveApiError> {
        if matches!(
            self.connection.state(),
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            let mut state_rx = self.connection.subscribe_state();
            self.connection.disconnect()?;
            state_rx
                .wait_for(|state| state.is_terminal())
                .await
                .map_err(|_| LiveApiError::ChannelClosed)?;
        }

        let config = self.connection.config_mut();
        if config.enable_session_resumption
            && let Some(handle) = &self.latest_handle
        {
            tracing::info!("Resuming session with the latest handle");
            config.set_resumption(true, handle.clone());
        }
        self.connection.reconnect()
    }
}

fn report_file_error(path: &Path, error: &std::io::Error) {
    let message = format!("{}: {}", path.display(), error);
    print!("{}", MessageFormatter::format_error(&message));
}

/// Read lines on a blocking thread and forward them to the session loop.
fn spawn_readline() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.trim()).ok();
                    }
                    if input_tx.send(line).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
