use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageRole, Model};

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model that should answer.
    pub model: Model,

    /// The full transcript, oldest message first.
    pub messages: Vec<Message>,
}

impl ChatCompletionParams {
    /// Create request parameters for the given transcript and model.
    pub fn new(messages: Vec<Message>, model: Model) -> Self {
        Self { model, messages }
    }
}

/// The message inside a completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceMessage {
    /// Role of the generated message; the provider always reports `assistant`.
    pub role: MessageRole,

    /// Generated text. Providers send `null` when the model produced nothing.
    #[serde(default)]
    pub content: Option<String>,
}

/// One candidate completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChoice {
    /// Position of the choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChoiceMessage,

    /// Why generation stopped (`stop`, `length`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token accounting reported alongside a completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionUsage {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of the two.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response body of `POST chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Provider-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The model that actually served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Candidate completions; the client uses the first.
    pub choices: Vec<ChatChoice>,

    /// Token accounting, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletion {
    /// The text of the first choice, if there is one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn params_carry_model_and_transcript() {
        let params = ChatCompletionParams::new(
            vec![Message::default_system(), Message::user("hi")],
            Model::from("llama-3.1-8b-instant"),
        );
        assert_eq!(
            to_value(&params).unwrap(),
            json!({
                "model": "llama-3.1-8b-instant",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn completion_from_provider_json() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1730000000,
            "model": "llama-3.1-70b-versatile",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Qubits."},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let completion: ChatCompletion = serde_json::from_value(body).unwrap();
        assert_eq!(completion.first_content(), Some("Qubits."));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn completion_without_choices_has_no_content() {
        let completion: ChatCompletion = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(completion.first_content(), None);

        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(completion.first_content(), None);
    }
}
