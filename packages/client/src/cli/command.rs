//! Parsing of terminal input lines.
//!
//! Pure functions, kept free of I/O except for [`encode_file`].

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// What the user asked for on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Plain text sent as a user turn
    Text(String),
    /// Send an image file as a realtime chunk
    Image(PathBuf),
    /// Send a raw PCM file as a realtime chunk
    Audio(PathBuf),
    Reconnect,
    Help,
    Quit,
    /// A slash command that is not recognized, or is missing its argument
    Invalid(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Option<InputCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(InputCommand::Text(line.to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    let command = match (name, argument) {
        ("image", path) if !path.is_empty() => InputCommand::Image(PathBuf::from(path)),
        ("audio", path) if !path.is_empty() => InputCommand::Audio(PathBuf::from(path)),
        ("reconnect", "") => InputCommand::Reconnect,
        ("help", "") => InputCommand::Help,
        ("quit", "") | ("exit", "") => InputCommand::Quit,
        _ => InputCommand::Invalid(line.to_string()),
    };
    Some(command)
}

/// MIME type for an image file, `None` meaning the default (`image/jpeg`).
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Read a file and encode it as standard base64.
pub fn encode_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}
