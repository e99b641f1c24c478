// Public modules
pub mod browser;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod selector;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use browser::{NoBrowser, SystemBrowser, UrlOpener};
pub use client::{
    API_KEY_VAR, CompletionBackend, CompletionClient, IMAGE_ERROR_PREFIX, TEXT_ERROR_PREFIX,
    describe_image_failure, describe_text_failure,
};
pub use client_logger::{ClientLogger, JsonLinesLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer, ShadeRotation, color_text};
pub use selector::{
    DEFAULT_SHADE, DEFAULT_TEXT_MODEL, IMAGE_MODEL, ModelSpec, ModelTable, Selection,
    selector_token,
};
pub use store::{IndexEntry, SessionId, SessionIndex, SessionStore};
pub use types::*;
