use serde::{Deserialize, Serialize};

/// Request body for `POST images/generations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageGenerationParams {
    /// The raw user prompt.
    pub prompt: String,
}

impl ImageGenerationParams {
    /// Create parameters for a single prompt; the provider picks the model.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// One generated image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageData {
    /// Hosted URL of the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Inline base64 payload, for providers that return one instead of a URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,

    /// The prompt after provider-side rewriting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Response body of `POST images/generations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesResponse {
    /// Unix timestamp of creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,

    /// Generated images.
    pub data: Vec<ImageData>,
}

impl ImagesResponse {
    /// URL of the first generated image.
    pub fn first_url(&self) -> Option<&str> {
        self.data.first().and_then(|image| image.url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn params_only_send_prompt() {
        let params = ImageGenerationParams::new("picture of a sunset");
        assert_eq!(
            to_value(&params).unwrap(),
            json!({"prompt": "picture of a sunset"})
        );
    }

    #[test]
    fn first_url() {
        let response: ImagesResponse = serde_json::from_value(json!({
            "created": 1,
            "data": [{"url": "https://img.example/1.png"}, {"url": "https://img.example/2.png"}]
        }))
        .unwrap();
        assert_eq!(response.first_url(), Some("https://img.example/1.png"));

        let response: ImagesResponse =
            serde_json::from_value(json!({"data": [{"b64_json": "AAAA"}]})).unwrap();
        assert_eq!(response.first_url(), None);
    }
}
