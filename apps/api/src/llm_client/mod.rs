/// LLM Client: the content-generation oracle boundary.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Pipeline code depends only on the `ContentOracle` trait; `LlmClient` is the
/// production implementation and a scripted oracle replaces it in tests.
///
/// SERIALIZATION CONTRACT: callers hand structured values to this layer and
/// never pre-serialize them. `OracleRequest::context` is a `serde_json::Value`
/// that is rendered exactly once into the prompt, and the HTTP body is
/// serialized exactly once by reqwest. A context that is a JSON *string*
/// containing JSON is rejected as `OracleError::PreSerializedPayload`.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all oracle calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("oracle context was passed as a pre-serialized JSON string")]
    PreSerializedPayload,

    #[error("oracle response did not match the expected shape: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle contract
// ────────────────────────────────────────────────────────────────────────────

/// What an oracle request is for. Lets stubs and logs tell calls apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OraclePurpose {
    TailorResume,
    GapQuestion,
}

/// A fully-built, deterministic instruction payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRequest {
    pub purpose: OraclePurpose,
    pub system: String,
    pub instructions: String,
    /// Structured context. Never a pre-serialized string.
    pub context: Value,
}

impl OracleRequest {
    pub fn new(
        purpose: OraclePurpose,
        system: impl Into<String>,
        instructions: impl Into<String>,
        context: &impl Serialize,
    ) -> Result<Self, OracleError> {
        let request = Self {
            purpose,
            system: system.into(),
            instructions: instructions.into(),
            context: serde_json::to_value(context)?,
        };
        request.validate()?;
        Ok(request)
    }

    /// Rejects a context that is a string holding serialized JSON.
    pub fn validate(&self) -> Result<(), OracleError> {
        if let Value::String(s) = &self.context {
            let trimmed = s.trim_start();
            if (trimmed.starts_with('{') || trimmed.starts_with('['))
                && serde_json::from_str::<Value>(s).is_ok()
            {
                return Err(OracleError::PreSerializedPayload);
            }
        }
        Ok(())
    }

    /// Renders instructions and context into the single user prompt.
    pub fn render_prompt(&self) -> Result<String, OracleError> {
        let context = serde_json::to_string_pretty(&self.context)?;
        Ok(format!("{}\n\nCONTEXT (JSON):\n{}", self.instructions, context))
    }
}

/// The content-generation oracle. Returns a machine-parseable JSON value.
///
/// No retry policy is expected from callers; implementations own their own
/// transport retries.
#[async_trait]
pub trait ContentOracle: Send + Sync {
    async fn generate(&self, request: &OracleRequest) -> Result<Value, OracleError>;
}

/// Deserializes an oracle response into a typed shape.
pub fn parse_response<T: DeserializeOwned>(value: Value) -> Result<T, OracleError> {
    serde_json::from_value(value).map_err(|e| OracleError::Malformed(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, OracleError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, OracleError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<OracleError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            // `.json()` is the only serialization of the body.
            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(OracleError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(OracleError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(OracleError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(OracleError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ContentOracle for LlmClient {
    async fn generate(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        request.validate()?;
        let prompt = request.render_prompt()?;
        debug!("Oracle call ({:?}), prompt {} chars", request.purpose, prompt.len());

        let response = self.call(&prompt, &request.system).await?;
        let text = response.text().ok_or(OracleError::EmptyContent)?;

        Ok(serde_json::from_str(strip_json_fences(text))?)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
