//! Interactive terminal chat with keyword-routed models.
//!
//! Each prompt's first word picks the model that answers it: `brief ...` goes
//! to a small fast model, `explanation ...` to a large one, `picture ...` to
//! image generation, and anything unrecognized to the default model.
//! Conversations are saved under `history/` after every turn.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage, reading API_KEY from api_key.env or the environment
//! friday-chat
//!
//! # Keep history elsewhere and use a custom keyword table
//! friday-chat --history-dir ~/.friday --models models.yaml
//!
//! # Disable colors and the browser (useful over ssh)
//! friday-chat --no-color --no-browser
//! ```
//!
//! # Commands
//!
//! - `history` - Print the transcript of the current session
//! - `exit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use friday::chat::{
    ChatArgs, ChatConfig, ChatSession, FAREWELL, PlainTextRenderer, Renderer, TurnOutcome,
    WELCOME, prompt_text,
};
use friday::{
    CompletionClient, JsonLinesLogger, NoBrowser, SessionStore, SystemBrowser, UrlOpener,
};

/// Main entry point for the friday-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("friday-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    if let Err(err) = config.load_env_file() {
        eprintln!("warning: {err}");
    }

    friday::register_biometrics(biometrics::Collector::new());

    let table = config.load_model_table()?;
    let mut client =
        CompletionClient::with_options(None, config.base_url.clone(), Some(config.timeout))?;
    if let Some(path) = &config.log_file {
        client = client.with_logger(Arc::new(JsonLinesLogger::open(path)?));
    }
    let opener: Box<dyn UrlOpener> = if config.open_browser {
        Box::new(SystemBrowser)
    } else {
        Box::new(NoBrowser)
    };

    let mut renderer = PlainTextRenderer::with_color(&table, config.use_color);
    let mut session = ChatSession::new(
        client,
        SessionStore::new(&config.history_dir),
        table,
        opener,
    );
    let mut rl = DefaultEditor::new()?;

    println!("{WELCOME}");

    loop {
        let readline = rl.readline(prompt_text());

        match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }

                match session.handle_input(&line, &mut renderer).await {
                    Ok(TurnOutcome::Exit) => break,
                    Ok(TurnOutcome::Continue) => {}
                    Err(err) => {
                        renderer.print_error(&format!("Failed to save history: {err}"));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\n{FAREWELL}");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}
