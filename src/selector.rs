//! Keyword routing of prompts to models.
//!
//! The first word of a prompt, lowercased, is looked up in each model's
//! keyword list in table order and the first hit wins.  One entry of the
//! table is designated the image entry; a hit there routes the prompt to
//! image generation instead of a text model.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Model;

/// Text model used when no keyword matches.
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.1-70b-versatile";

/// Identifier of the built-in image entry.
pub const IMAGE_MODEL: &str = "image-model-specialized";

/// Shade used for models without a configured shade list.
pub const DEFAULT_SHADE: u8 = 37;

/// Largest SGR code accepted as a shade (bright white background).
const MAX_SHADE: u8 = 107;

/// Where a prompt should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Generate text with this model.
    Text(Model),

    /// Generate an image from the prompt.
    Image,
}

impl Selection {
    /// Returns true for the image sentinel.
    pub fn is_image(&self) -> bool {
        matches!(self, Selection::Image)
    }
}

/// One row of the model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Provider model identifier.
    pub id: Model,

    /// Trigger words, matched against the lowercased first word of a prompt.
    pub keywords: Vec<String>,

    /// ANSI SGR color codes rotated through for this model's responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shades: Vec<u8>,

    /// Marks the image-generation entry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub image: bool,
}

impl ModelSpec {
    fn text(id: &str, keywords: &[&str], shades: &[u8]) -> Self {
        Self {
            id: Model::from(id),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            shades: shades.to_vec(),
            image: false,
        }
    }

    fn image(id: &str, keywords: &[&str], shades: &[u8]) -> Self {
        Self {
            image: true,
            ..Self::text(id, keywords, shades)
        }
    }
}

/// Keyword and color configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTable {
    /// Text model for prompts that match no keyword.
    pub default_model: Model,

    /// Models in match-priority order.
    pub models: Vec<ModelSpec>,
}

impl ModelTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            default_model: Model::from(DEFAULT_TEXT_MODEL),
            models: vec![
                ModelSpec::text(
                    "llama-3.1-8b-instant",
                    &["shortest", "brief", "concise", "quick", "clear", "simple"],
                    &[32, 92, 42],
                ),
                ModelSpec::text(
                    "llama-3.1-70b-versatile",
                    &[
                        "explanation",
                        "detailed",
                        "in-depth",
                        "comprehensive",
                        "thorough",
                        "elaborate",
                    ],
                    &[34, 94, 36],
                ),
                ModelSpec::image(
                    IMAGE_MODEL,
                    &["image", "visual", "picture", "graph", "illustration"],
                    &[36, 96, 46],
                ),
                ModelSpec::text(
                    "gemma2-9b-it",
                    &["detailed", "complex", "extended", "rich", "insightful"],
                    &[33, 93, 43],
                ),
                ModelSpec::text(
                    "gemma-7b-it",
                    &["in-depth", "thorough", "intensive", "comprehensive", "detailed"],
                    &[35, 95, 45],
                ),
                ModelSpec::text(
                    "llama-guard-3-8b",
                    &["guarded", "safe", "secure", "protected"],
                    &[],
                ),
                ModelSpec::text(
                    "llama3-70b-8192",
                    &["large-context", "extensive", "contextual", "broad"],
                    &[],
                ),
                ModelSpec::text(
                    "llama3-8b-8192",
                    &["quick", "medium-context", "responsive", "efficient"],
                    &[],
                ),
                ModelSpec::text(
                    "llama3-groq-70b-8192-tool-use-preview",
                    &["tool-use", "preview", "functional", "specialized"],
                    &[],
                ),
                ModelSpec::text(
                    "llama3-groq-8b-8192-tool-use-preview",
                    &["tool-use", "preview", "functional", "specialized"],
                    &[],
                ),
                ModelSpec::text(
                    "llava-v1.5-7b-4096-preview",
                    &["preview", "specific", "focused", "targeted"],
                    &[],
                ),
                ModelSpec::text(
                    "mixtral-8x7b-32768",
                    &["large-context", "expansive", "extended", "wide"],
                    &[],
                ),
            ],
        }
    }

    /// Parses and validates a YAML model table.
    ///
    /// ```yaml
    /// default_model: llama-3.1-70b-versatile
    /// models:
    ///   - id: llama-3.1-8b-instant
    ///     keywords: [brief, quick]
    ///     shades: [32, 92]
    ///   - id: image-model
    ///     keywords: [picture]
    ///     image: true
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut table: Self = serde_yaml::from_str(yaml)?;
        table.normalize();
        table.validate()?;
        Ok(table)
    }

    /// Reads a YAML model table from `path`.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read model table {}", path.display()), err)
        })?;
        Self::from_yaml_str(&content)
    }

    fn normalize(&mut self) {
        for spec in &mut self.models {
            for keyword in &mut spec.keywords {
                *keyword = keyword.trim().to_lowercase();
            }
        }
    }

    /// Checks the invariants the selector and renderer rely on.
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(Error::validation(
                "model table has no models",
                Some("models".to_string()),
            ));
        }
        if self
            .models
            .iter()
            .any(|spec| spec.image && spec.id == self.default_model)
        {
            return Err(Error::validation(
                format!("default model {} is the image entry", self.default_model),
                Some("default_model".to_string()),
            ));
        }
        for spec in &self.models {
            if let Some(keyword) = spec
                .keywords
                .iter()
                .find(|k| k.is_empty() || k.chars().any(char::is_whitespace))
            {
                return Err(Error::validation(
                    format!("model {} has keyword {keyword:?} that can never match", spec.id),
                    Some("keywords".to_string()),
                ));
            }
            if let Some(shade) = spec.shades.iter().find(|&&s| s > MAX_SHADE) {
                return Err(Error::validation(
                    format!("model {} has invalid shade {shade}", spec.id),
                    Some("shades".to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Chooses where `prompt` goes.
    ///
    /// Pure: depends only on the prompt and the table.
    pub fn select(&self, prompt: &str) -> Selection {
        let Some(token) = selector_token(prompt) else {
            return Selection::Text(self.default_model.clone());
        };
        match self
            .models
            .iter()
            .find(|spec| spec.keywords.iter().any(|k| *k == token))
        {
            Some(spec) if spec.image => Selection::Image,
            Some(spec) => Selection::Text(spec.id.clone()),
            None => Selection::Text(self.default_model.clone()),
        }
    }

    /// Shade lists keyed by model, for models that configure any.
    ///
    /// When a model appears more than once, the first row wins.
    pub fn shade_table(&self) -> HashMap<Model, Vec<u8>> {
        let mut shades = HashMap::new();
        for spec in &self.models {
            if !spec.shades.is_empty() {
                shades
                    .entry(spec.id.clone())
                    .or_insert_with(|| spec.shades.clone());
            }
        }
        shades
    }
}

impl Default for ModelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The lowercased first whitespace-delimited word of `prompt`.
pub fn selector_token(prompt: &str) -> Option<String> {
    prompt.split_whitespace().next().map(str::to_lowercase)
}
