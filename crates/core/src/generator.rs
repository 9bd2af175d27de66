//! Generator trait — the abstraction over the text generation backend.
//!
//! The backend is treated as an opaque capability: given an ordered list of
//! role-tagged messages it returns one raw text completion, with no guarantee
//! of format or determinism. Schema enforcement happens downstream in the
//! resolver, never here.

use crate::error::GeneratorError;
use crate::turn::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of an assembled generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub text: String,
}

impl PromptMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A complete request to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Ordered messages: one system entry first, then the dialogue
    pub messages: Vec<PromptMessage>,

    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

pub fn default_temperature() -> f32 {
    0.7
}

/// The core Generator trait.
///
/// Every backend (Gemini, a deterministic test fake, the unconfigured
/// sentinel) implements this trait. The exchange pipeline calls `complete`
/// without knowing which backend is wired in — pure polymorphism.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and return the raw text completion unmodified.
    async fn complete(&self, request: GenerationRequest) -> Result<String, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_message_constructors() {
        assert_eq!(PromptMessage::system("rules").role, Role::System);
        assert_eq!(PromptMessage::user("hi").role, Role::User);
        assert_eq!(PromptMessage::assistant("hello").role, Role::Assistant);
    }

    #[test]
    fn request_temperature_default() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_output_tokens.is_none());
    }
}
