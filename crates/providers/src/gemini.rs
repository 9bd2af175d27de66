//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint:
//! - `x-goog-api-key` header authentication
//! - System instruction as a top-level field, not a message role
//! - History roles mapped to `user` / `model`
//!
//! Returns the completion text unmodified; schema enforcement belongs to
//! the resolver, not this layer.

use async_trait::async_trait;
use learnmate_core::error::GeneratorError;
use learnmate_core::generator::{GenerationRequest, Generator, PromptMessage};
use learnmate_core::turn::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini `generateContent` API client.
pub struct GeminiGenerator {
    name: String,
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    /// Create a new Gemini generator with the default model and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: api_key.into(),
            client: Self::build_client(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Select a model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the HTTP client timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.client = Self::build_client(secs);
        self
    }

    fn build_client(timeout_secs: u64) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default()
    }

    /// Extract system messages from the message list.
    /// Gemini takes the system instruction as a top-level field.
    fn extract_system(messages: &[PromptMessage]) -> (Option<String>, Vec<&PromptMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut dialogue: Vec<&PromptMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.text),
                _ => dialogue.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, dialogue)
    }

    /// Convert dialogue messages to Gemini content entries.
    fn to_api_contents(messages: &[&PromptMessage]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|msg| GeminiContent {
                role: match msg.role {
                    Role::Assistant => "model".into(),
                    _ => "user".into(),
                },
                parts: vec![GeminiPart {
                    text: msg.text.clone(),
                }],
            })
            .collect()
    }

    /// Join the first candidate's text parts into one completion.
    fn response_to_text(resp: GeminiResponse) -> Result<String, GeneratorError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GeneratorError::EmptyCompletion("no candidates returned".into()))?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(GeneratorError::EmptyCompletion(format!(
                "candidate had no text parts (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let (system, dialogue) = Self::extract_system(&request.messages);
        let contents = Self::to_api_contents(&dialogue);

        let body = GeminiRequest {
            system_instruction: system.map(|text| GeminiSystemInstruction {
                parts: vec![GeminiPart { text }],
            }),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        debug!(provider = "gemini", model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(e.to_string())
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(GeneratorError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(GeneratorError::AuthenticationFailed(
                "Invalid Gemini API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(GeneratorError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: GeminiResponse = response.json().await.map_err(|e| {
            GeneratorError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Gemini response: {e}"),
            }
        })?;

        Self::response_to_text(api_resp)
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}
