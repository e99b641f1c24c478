//! Logging trait for completion client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log every API interaction passing through the
//! [`CompletionClient`](crate::CompletionClient), and [`JsonLinesLogger`], which
//! appends each interaction to a file as one JSON object per line.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::types::{ChatCompletion, ChatCompletionParams, ImageGenerationParams, ImagesResponse};

/// A trait for logging completion client operations.
///
/// Implement this trait to capture and record all API interactions.
/// Implementations must not panic and should swallow their own I/O failures;
/// logging never changes the outcome of a request.
///
/// # Example
///
/// ```rust,ignore
/// use friday::{ChatCompletion, ChatCompletionParams, ClientLogger, Error};
///
/// struct StderrLogger;
///
/// impl ClientLogger for StderrLogger {
///     fn log_chat_completion(&self, params: &ChatCompletionParams, response: &ChatCompletion) {
///         eprintln!("{} -> {:?}", params.model, response.first_content());
///     }
///
///     fn log_error(&self, endpoint: &str, error: &Error) {
///         eprintln!("{endpoint} failed: {error}");
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a successful chat completion together with the request that produced it.
    fn log_chat_completion(&self, params: &ChatCompletionParams, response: &ChatCompletion);

    /// Log a successful image generation.
    fn log_image_generation(&self, params: &ImageGenerationParams, response: &ImagesResponse) {
        _ = params;
        _ = response;
    }

    /// Log a failed request.  `endpoint` is the path relative to the base URL.
    fn log_error(&self, endpoint: &str, error: &Error);
}

/// A [`ClientLogger`] that appends JSON lines to a file.
///
/// Each line carries an `event` field (`chat_completion`,
/// `image_generation` or `error`) and the request and response bodies.
pub struct JsonLinesLogger {
    file: Mutex<File>,
}

impl JsonLinesLogger {
    /// Opens `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| Error::io(format!("failed to open log {}", path.display()), err))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: Value) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

impl ClientLogger for JsonLinesLogger {
    fn log_chat_completion(&self, params: &ChatCompletionParams, response: &ChatCompletion) {
        self.write_line(json!({
            "event": "chat_completion",
            "request": params,
            "response": response,
        }));
    }

    fn log_image_generation(&self, params: &ImageGenerationParams, response: &ImagesResponse) {
        self.write_line(json!({
            "event": "image_generation",
            "request": params,
            "response": response,
        }));
    }

    fn log_error(&self, endpoint: &str, error: &Error) {
        self.write_line(json!({
            "event": "error",
            "endpoint": endpoint,
            "status_code": error.status_code(),
            "message": error.to_string(),
        }));
    }
}
