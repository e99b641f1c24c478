// Public modules
pub mod chat_completion;
pub mod image_generation;
pub mod message;
pub mod model;

// Re-exports
pub use chat_completion::{
    ChatChoice, ChatCompletion, ChatCompletionParams, ChoiceMessage, CompletionUsage,
};
pub use image_generation::{ImageData, ImageGenerationParams, ImagesResponse};
pub use message::{
    DEFAULT_SYSTEM_PROMPT, Message, MessageRole, default_transcript, history_lines,
};
pub use model::Model;
