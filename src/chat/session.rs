//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which routes each input line
//! to a command, a text model or image generation, and keeps the session's
//! transcript on disk.

use time::OffsetDateTime;

use crate::browser::UrlOpener;
use crate::chat::commands::{ChatCommand, parse_command};
use crate::client::{CompletionBackend, describe_image_failure, describe_text_failure};
use crate::error::Result;
use crate::observability::{CHAT_FAILED_TURNS, CHAT_IMAGE_TURNS, CHAT_TEXT_TURNS};
use crate::render::Renderer;
use crate::selector::{ModelTable, Selection};
use crate::store::{SessionId, SessionStore};
use crate::types::{Message, Model, default_transcript, history_lines};
use crate::utils::time::now;

/// Printed once when the REPL starts.
pub const WELCOME: &str = "Welcome to Friday: terminal chat with text and image support!";

/// Printed when the user exits.
pub const FAREWELL: &str = "Goodbye!";

/// Printed by `history` when the session has no transcript yet.
pub const NO_HISTORY: &str = "No history found for this session.";

/// Printed when the model answered with nothing.
pub const EMPTY_RESPONSE: &str = "Failed to get a response. Please try again later.";

/// What the REPL should do after an input line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Prompt for the next line.
    Continue,

    /// Stop the REPL.
    Exit,
}

/// A chat session that manages conversation state and API interactions.
///
/// The session has no identity until the first prompt arrives.  That prompt
/// names the session, registers it in the index, and from then on every load,
/// save and `history` of the run uses the same transcript file.
pub struct ChatSession<B: CompletionBackend> {
    backend: B,
    store: SessionStore,
    table: ModelTable,
    opener: Box<dyn UrlOpener>,
    session_id: Option<SessionId>,
    clock: fn() -> OffsetDateTime,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a new chat session.
    pub fn new(
        backend: B,
        store: SessionStore,
        table: ModelTable,
        opener: Box<dyn UrlOpener>,
    ) -> Self {
        Self {
            backend,
            store,
            table,
            opener,
            session_id: None,
            clock: now,
        }
    }

    /// Replaces the clock used to timestamp the session identifier.
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// The session identifier, once the first prompt has been handled.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The store backing this session.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The model table used for routing.
    pub fn table(&self) -> &ModelTable {
        &self.table
    }

    /// Handles one line of user input.
    ///
    /// Remote failures are reported through `renderer` and never returned;
    /// the only error returned is a failure to persist the transcript.
    pub async fn handle_input(
        &mut self,
        input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        match parse_command(input) {
            Some(ChatCommand::Exit) => {
                renderer.print_info(FAREWELL);
                return Ok(TurnOutcome::Exit);
            }
            Some(ChatCommand::History) => {
                self.show_history(renderer);
                return Ok(TurnOutcome::Continue);
            }
            None => {}
        }
        if input.trim().is_empty() {
            return Ok(TurnOutcome::Continue);
        }

        let (session_id, mut messages) = self.begin_turn(input, renderer);
        match self.table.select(input) {
            Selection::Image => self.image_turn(input, renderer).await,
            Selection::Text(model) => {
                self.text_turn(input, &model, &mut messages, renderer).await
            }
        }
        self.store.save(&session_id, &messages)?;
        Ok(TurnOutcome::Continue)
    }

    /// Prints the persisted transcript, one `Role: content` line per message.
    pub fn show_history(&self, renderer: &mut dyn Renderer) {
        let Some(session_id) = &self.session_id else {
            renderer.print_info(NO_HISTORY);
            return;
        };
        match self.store.try_load(session_id) {
            Ok(Some(messages)) => {
                for line in history_lines(&messages) {
                    renderer.print_info(&line);
                }
            }
            Ok(None) => renderer.print_info(NO_HISTORY),
            Err(err) => renderer.print_error(&format!("Failed to read history: {err}")),
        }
    }

    /// Returns the session identifier and the transcript this turn builds on,
    /// creating and registering the session on the first prompt.
    fn begin_turn(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
    ) -> (SessionId, Vec<Message>) {
        if let Some(session_id) = &self.session_id {
            return (session_id.clone(), self.store.load(session_id));
        }
        let session_id = SessionId::with_prompt(prompt, (self.clock)());
        let path = self.store.session_path(&session_id);
        if let Err(err) = self.store.append_index_entry(&session_id, &path) {
            renderer.print_error(&format!("Failed to update session index: {err}"));
        }
        self.session_id = Some(session_id.clone());
        (session_id, default_transcript())
    }

    async fn image_turn(&mut self, prompt: &str, renderer: &mut dyn Renderer) {
        CHAT_IMAGE_TURNS.click();
        match self.backend.generate_image(prompt).await {
            Ok(url) => {
                renderer.print_image(&url);
                if let Err(err) = self.opener.open(&url) {
                    renderer.print_error(&err.to_string());
                }
            }
            Err(err) => {
                CHAT_FAILED_TURNS.click();
                renderer.print_error(&describe_image_failure(&err));
            }
        }
    }

    async fn text_turn(
        &mut self,
        prompt: &str,
        model: &Model,
        messages: &mut Vec<Message>,
        renderer: &mut dyn Renderer,
    ) {
        CHAT_TEXT_TURNS.click();
        messages.push(Message::user(prompt));
        match self.backend.generate_text(messages, model).await {
            Ok(text) if text.is_empty() => {
                CHAT_FAILED_TURNS.click();
                renderer.print_error(EMPTY_RESPONSE);
            }
            Ok(text) => {
                renderer.print_response(model, &text);
                messages.push(Message::assistant(text));
            }
            Err(err) => {
                CHAT_FAILED_TURNS.click();
                renderer.print_error(&format!(
                    "Model {model} failed with error: {}",
                    describe_text_failure(&err)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::NoBrowser;
    use crate::error::Error;
    use crate::render::PlainTextRenderer;
    use crate::types::MessageRole;
    use time::macros::datetime;

    struct Echo;

    #[async_trait::async_trait]
    impl CompletionBackend for Echo {
        async fn generate_text(&self, messages: &[Message], model: &Model) -> Result<String> {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("{model} heard {last}"))
        }

        async fn generate_image(&self, _prompt: &str) -> Result<String> {
            Err(Error::credential_missing("API_KEY"))
        }
    }

    fn fixed_clock() -> OffsetDateTime {
        datetime!(2024-05-01 14:30 UTC)
    }

    fn session(dir: &tempfile::TempDir) -> ChatSession<Echo> {
        ChatSession::new(
            Echo,
            SessionStore::new(dir.path().join("history")),
            ModelTable::builtin(),
            Box::new(NoBrowser),
        )
        .with_clock(fixed_clock)
    }

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn exit_before_any_prompt_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut chat = session(&dir);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), chat.table(), false);
        let outcome = tokio_test::block_on(chat.handle_input("exit", &mut renderer)).unwrap();
        assert_eq!(outcome, TurnOutcome::Exit);
        assert_eq!(output(renderer), "Goodbye!\n");
        assert!(!dir.path().join("history").exists());
    }

    #[test]
    fn history_before_any_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut chat = session(&dir);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), chat.table(), false);
        let outcome = tokio_test::block_on(chat.handle_input("history", &mut renderer)).unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(output(renderer), format!("{NO_HISTORY}\n"));
    }

    #[test]
    fn blank_input_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut chat = session(&dir);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), chat.table(), false);
        let outcome = tokio_test::block_on(chat.handle_input("   ", &mut renderer)).unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(chat.session_id().is_none());
        assert!(output(renderer).is_empty());
    }

    #[test]
    fn first_prompt_names_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut chat = session(&dir);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), chat.table(), false);
        tokio_test::block_on(chat.handle_input("brief hello", &mut renderer)).unwrap();

        let id = chat.session_id().unwrap().clone();
        assert_eq!(id.as_str(), "brief hello_2024-05-01_14_30");
        let transcript = chat.store().load(&id);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, MessageRole::System);
        assert_eq!(transcript[2].content, "llama-3.1-8b-instant heard brief hello");
        assert!(output(renderer).contains("Response from llama-3.1-8b-instant:"));
    }

    #[test]
    fn failed_image_leaves_transcript_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut chat = session(&dir);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), chat.table(), false);
        tokio_test::block_on(chat.handle_input("image of a cat", &mut renderer)).unwrap();

        let id = chat.session_id().unwrap().clone();
        assert_eq!(chat.store().load(&id), default_transcript());
        assert_eq!(
            output(renderer),
            "Error generating image: API Key not found (API_KEY is not set)\n"
        );
    }
}
