//! Chat application module for interactive conversations.
//!
//! This module provides the REPL chat interface built on top of the
//! friday client library. It supports:
//!
//! - Keyword routing of prompts to text models or image generation
//! - ANSI-colored responses with per-model shade rotation
//! - JSON transcripts persisted after every turn
//! - The in-band commands `exit` and `history`
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The turn state machine and its persistence
//! - [`commands`]: In-band command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer, ShadeRotation};
pub use commands::{ChatCommand, parse_command, prompt_text};
pub use config::{ChatArgs, ChatConfig, DEFAULT_ENV_FILE};
pub use session::{
    ChatSession, EMPTY_RESPONSE, FAREWELL, NO_HISTORY, TurnOutcome, WELCOME,
};
