//! UI utilities for the terminal client.

use std::io::Write;

/// Prompt shown while waiting for input.
pub const PROMPT: &str = "you> ";

/// Redisplay the prompt after printing server output
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
