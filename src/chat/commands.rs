//! In-band command parsing for the chat application.
//!
//! Two words are reserved: `exit` ends the run and `history` prints the
//! current transcript.  Both must make up the whole input line; anything else
//! is a prompt.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Exit the chat application.
    Exit,

    /// Print the transcript of the current session.
    History,
}

/// Parses user input for in-band commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a prompt.  Matching ignores case and
/// surrounding whitespace.
///
/// # Examples
///
/// ```
/// # use friday::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("exit"), Some(ChatCommand::Exit));
/// assert_eq!(parse_command("History"), Some(ChatCommand::History));
/// assert!(parse_command("exit the vim editor").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("exit") {
        Some(ChatCommand::Exit)
    } else if input.eq_ignore_ascii_case("history") {
        Some(ChatCommand::History)
    } else {
        None
    }
}

/// The prompt shown before every input line.
pub fn prompt_text() -> &'static str {
    "Hey boss, how you doing? Friday here (or type 'exit' to quit, 'history' to view history): "
}
