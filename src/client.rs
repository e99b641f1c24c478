use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_CREDENTIAL_MISSING, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::types::{
    ChatCompletion, ChatCompletionParams, ImageGenerationParams, ImagesResponse, Message, Model,
};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const CHAT_COMPLETIONS: &str = "chat/completions";
const IMAGE_GENERATIONS: &str = "images/generations";

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "API_KEY";

/// Prefix of the user-visible description of a failed text turn.
pub const TEXT_ERROR_PREFIX: &str = "Error: ";

/// Prefix of the user-visible description of a failed image turn.
pub const IMAGE_ERROR_PREFIX: &str = "Error generating image: ";

/// Describes a failed text generation the way the chat loop prints it.
pub fn describe_text_failure(error: &Error) -> String {
    format!("{TEXT_ERROR_PREFIX}{error}")
}

/// Describes a failed image generation the way the chat loop prints it.
pub fn describe_image_failure(error: &Error) -> String {
    format!("{IMAGE_ERROR_PREFIX}{error}")
}

////////////////////////////////////////// CompletionBackend /////////////////////////////////////////

/// The two remote operations the chat loop depends on.
///
/// Both return errors as values; implementations never panic on remote
/// failures.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generates the next assistant message for `messages` using `model`.
    async fn generate_text(&self, messages: &[Message], model: &Model) -> Result<String>;

    /// Generates an image for `prompt` and returns its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}

////////////////////////////////////////// CompletionClient //////////////////////////////////////////

/// Client for an OpenAI-compatible chat-completion and image-generation API.
///
/// The credential is resolved on every request, so a client can be built
/// before the key is available and a missing key surfaces as
/// [`Error::CredentialMissing`] from the call that needed it.
#[derive(Clone)]
pub struct CompletionClient {
    api_key: Option<String>,
    api_key_var: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl CompletionClient {
    /// Create a new client against the default endpoint.
    ///
    /// When `api_key` is `None` the key is read from the `API_KEY`
    /// environment variable at call time.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        Ok(Self {
            api_key,
            api_key_var: API_KEY_VAR.to_string(),
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Reads the credential from `variable` instead of `API_KEY`.
    pub fn with_api_key_var(mut self, variable: impl Into<String>) -> Self {
        self.api_key_var = variable.into();
        self
    }

    /// Attaches a logger that observes every request.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves the credential, preferring an explicitly supplied key.
    fn api_key(&self) -> Result<String> {
        let key = match &self.api_key {
            Some(key) => Some(key.clone()),
            None => env::var(&self.api_key_var).ok(),
        };
        match key {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => {
                CLIENT_CREDENTIAL_MISSING.click();
                Err(Error::credential_missing(&self.api_key_var))
            }
        }
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_status(status_code, &error_body, request_id, retry_after)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// POSTs `body` to `endpoint` and decodes the JSON response.
    async fn post<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T> {
        let api_key = self.api_key()?;
        let url = self.base_url.join(endpoint)?;
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.send_json(url, &api_key, body).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        api_key: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .headers(self.default_headers(api_key)?)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    fn log_failure<T>(&self, endpoint: &str, result: Result<T>) -> Result<T> {
        if let (Err(err), Some(logger)) = (&result, &self.logger) {
            logger.log_error(endpoint, err);
        }
        result
    }

    /// Send a chat-completion request.
    pub async fn chat_completion(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
        let result = self.post(CHAT_COMPLETIONS, &params).await;
        let completion = self.log_failure(CHAT_COMPLETIONS, result)?;
        if let Some(logger) = &self.logger {
            logger.log_chat_completion(&params, &completion);
        }
        Ok(completion)
    }

    /// Send an image-generation request.
    pub async fn image_generation(&self, params: ImageGenerationParams) -> Result<ImagesResponse> {
        let result = self.post(IMAGE_GENERATIONS, &params).await;
        let images = self.log_failure(IMAGE_GENERATIONS, result)?;
        if let Some(logger) = &self.logger {
            logger.log_image_generation(&params, &images);
        }
        Ok(images)
    }
}

#[async_trait::async_trait]
impl CompletionBackend for CompletionClient {
    async fn generate_text(&self, messages: &[Message], model: &Model) -> Result<String> {
        let params = ChatCompletionParams::new(messages.to_vec(), model.clone());
        let completion = self.chat_completion(params).await?;
        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| Error::serialization("response contained no message content", None))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let images = self
            .image_generation(ImageGenerationParams::new(prompt))
            .await?;
        images
            .first_url()
            .map(str::to_string)
            .ok_or_else(|| Error::serialization("response contained no image URL", None))
    }
}

/// Parses a base URL, making sure relative joins append to its path.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Maps an HTTP error status and body to an [`Error`].
///
/// Bodies of the form `{"error": {"message", "type", "param"}}` are unpacked;
/// anything else is used verbatim as the message.
pub fn error_from_status(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_message = detail
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}
