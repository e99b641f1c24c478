//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.  Every flag is optional; with
//! none given the client behaves as a bare REPL storing history under
//! `history/` and reading its key from `api_key.env`.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::selector::ModelTable;
use crate::store::HISTORY_DIR;

/// Default env file consulted for the API key at startup.
pub const DEFAULT_ENV_FILE: &str = "api_key.env";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// Command-line arguments for the friday-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Directory for transcripts and the session index.
    #[arrrg(optional, "History directory (default: history)", "DIR")]
    pub history_dir: Option<String>,

    /// Env file to load before reading API_KEY.
    #[arrrg(optional, "Env file holding API_KEY (default: api_key.env)", "PATH")]
    pub env_file: Option<String>,

    /// YAML model table replacing the built-in one.
    #[arrrg(optional, "YAML model/keyword table", "PATH")]
    pub models: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u32>,

    /// Append API interactions as JSON lines to this file.
    #[arrrg(optional, "Log API requests and responses as JSON lines", "PATH")]
    pub log_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Print image URLs without opening them.
    #[arrrg(flag, "Do not open generated images in a browser")]
    pub no_browser: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Directory for transcripts and the index.
    pub history_dir: PathBuf,

    /// Env file loaded at startup.
    pub env_file: PathBuf,

    /// Optional YAML model table.
    pub model_table_path: Option<PathBuf>,

    /// Optional API base URL override.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Optional JSON-lines log of API interactions.
    pub log_file: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to open generated images in the default browser.
    pub open_browser: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - History directory: `history`
    /// - Env file: `api_key.env`
    /// - Model table: built in
    /// - Timeout: 60 seconds
    /// - Color: enabled
    /// - Browser: enabled
    pub fn new() -> Self {
        Self {
            history_dir: PathBuf::from(HISTORY_DIR),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            model_table_path: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS.into()),
            log_file: None,
            use_color: true,
            open_browser: true,
        }
    }

    /// Sets the history directory.
    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = dir.into();
        self
    }

    /// Sets the YAML model table path.
    pub fn with_model_table_path(mut self, path: Option<PathBuf>) -> Self {
        self.model_table_path = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Disables opening images in a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Loads the env file into the process environment.
    ///
    /// A missing file is not an error: the key may already be set, and a
    /// missing key is reported on the first request.  A file that exists but
    /// cannot be parsed is.
    pub fn load_env_file(&self) -> Result<()> {
        match dotenvy::from_path(&self.env_file) {
            Ok(()) => Ok(()),
            Err(err) if err.not_found() => Ok(()),
            Err(err) => Err(Error::validation(
                format!("could not load {}: {err}", self.env_file.display()),
                Some("env_file".to_string()),
            )),
        }
    }

    /// Loads the model table: the YAML file if one is configured, otherwise
    /// the built-in table.
    pub fn load_model_table(&self) -> Result<ModelTable> {
        match &self.model_table_path {
            Some(path) => ModelTable::from_yaml_file(path),
            None => Ok(ModelTable::builtin()),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            history_dir: args
                .history_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.history_dir),
            env_file: args.env_file.map(PathBuf::from).unwrap_or(defaults.env_file),
            model_table_path: args.models.map(PathBuf::from),
            base_url: args.base_url,
            timeout: args
                .timeout_secs
                .map(|secs| Duration::from_secs(secs.into()))
                .unwrap_or(defaults.timeout),
            log_file: args.log_file.map(PathBuf::from),
            use_color: !args.no_color,
            open_browser: !args.no_browser,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.history_dir, PathBuf::from("history"));
        assert_eq!(config.env_file, PathBuf::from("api_key.env"));
        assert!(config.model_table_path.is_none());
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.log_file.is_none());
        assert!(config.use_color);
        assert!(config.open_browser);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config.history_dir, PathBuf::from("history"));
        assert!(config.use_color);
        assert!(config.open_browser);
        assert_eq!(config.load_model_table().unwrap(), ModelTable::builtin());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            history_dir: Some("/tmp/chats".to_string()),
            env_file: Some(".env".to_string()),
            models: Some("models.yaml".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            timeout_secs: Some(5),
            log_file: Some("api.jsonl".to_string()),
            no_color: true,
            no_browser: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.history_dir, PathBuf::from("/tmp/chats"));
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert_eq!(config.model_table_path, Some(PathBuf::from("models.yaml")));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1/"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_file, Some(PathBuf::from("api.jsonl")));
        assert!(!config.use_color);
        assert!(!config.open_browser);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_history_dir("elsewhere")
            .with_model_table_path(Some(PathBuf::from("t.yaml")))
            .without_color()
            .without_browser();
        assert_eq!(config.history_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.model_table_path, Some(PathBuf::from("t.yaml")));
        assert!(!config.use_color);
        assert!(!config.open_browser);
    }

    #[test]
    fn missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatConfig {
            env_file: dir.path().join("api_key.env"),
            ..ChatConfig::new()
        };
        config.load_env_file().unwrap();
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_key.env");
        std::fs::write(&path, "FRIDAY_TEST_UNTERMINATED=\"no closing quote\n").unwrap();
        let config = ChatConfig {
            env_file: path,
            ..ChatConfig::new()
        };
        let err = config.load_env_file().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("api_key.env"));
    }

    #[test]
    fn model_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yaml");
        std::fs::write(
            &path,
            "default_model: base\nmodels:\n  - id: fast\n    keywords: [quick]\n",
        )
        .unwrap();
        let config = ChatConfig::new().with_model_table_path(Some(path));
        let table = config.load_model_table().unwrap();
        assert_eq!(table.default_model.as_str(), "base");

        let missing = ChatConfig::new().with_model_table_path(Some(dir.path().join("nope.yaml")));
        assert!(missing.load_model_table().is_err());
    }
}
