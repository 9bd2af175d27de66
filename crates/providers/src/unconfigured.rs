//! The unconfigured generation backend.
//!
//! Stands in when no credential was provided at startup. Every completion
//! attempt fails with `GeneratorError::NotConfigured`, which the exchange
//! pipeline surfaces as a service-unavailable condition without committing
//! any turn.

use async_trait::async_trait;
use learnmate_core::error::GeneratorError;
use learnmate_core::generator::{GenerationRequest, Generator};

/// A generator that was never configured.
pub struct UnconfiguredGenerator {
    reason: String,
}

impl UnconfiguredGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Generator for UnconfiguredGenerator {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _request: GenerationRequest) -> Result<String, GeneratorError> {
        Err(GeneratorError::NotConfigured(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_fails_with_not_configured() {
        let generator = UnconfiguredGenerator::new("no GEMINI_API_KEY");
        let result = generator
            .complete(GenerationRequest {
                messages: vec![],
                temperature: 0.7,
                max_output_tokens: None,
            })
            .await;
        match result {
            Err(GeneratorError::NotConfigured(reason)) => {
                assert!(reason.contains("GEMINI_API_KEY"));
            }
            other => panic!("expected NotConfigured, got {other:?}"),
        }
    }
}
