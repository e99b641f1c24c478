use std::fmt;

use serde::{Deserialize, Serialize};

/// A hosted model identifier, e.g. `llama-3.1-8b-instant`.
///
/// Model identifiers are opaque to the client; the set of usable models comes
/// from the [`ModelTable`](crate::ModelTable) rather than from this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    /// Create a model identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model(model.to_string())
    }
}

impl AsRef<str> for Model {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_serializes_as_bare_string() {
        let model = Model::from("gemma2-9b-it");
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gemma2-9b-it""#);

        let model: Model = serde_json::from_str(r#""mixtral-8x7b-32768""#).unwrap();
        assert_eq!(model.as_str(), "mixtral-8x7b-32768");
    }

    #[test]
    fn display() {
        let model = Model::new("llama3-8b-8192");
        assert_eq!(model.to_string(), "llama3-8b-8192");
    }
}
