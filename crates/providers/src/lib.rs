//! Generation backend implementations for Learnmate.

pub mod gemini;
pub mod unconfigured;

pub use gemini::GeminiGenerator;
pub use unconfigured::UnconfiguredGenerator;

use learnmate_config::AppConfig;
use learnmate_core::Generator;
use std::sync::Arc;

/// Build a generator from configuration.
///
/// A missing credential yields the unconfigured sentinel rather than an
/// error: absence of the capability is itself a valid, detectable runtime
/// state, and every chat exchange against it fails with a configuration
/// error without corrupting stored state.
pub fn from_config(config: &AppConfig) -> Arc<dyn Generator> {
    match &config.provider.api_key {
        Some(key) => {
            let mut generator = GeminiGenerator::new(key)
                .with_model(&config.provider.model)
                .with_timeout_secs(config.provider.timeout_secs);
            if let Some(url) = &config.provider.api_url {
                generator = generator.with_base_url(url);
            }
            Arc::new(generator)
        }
        None => Arc::new(UnconfiguredGenerator::new(
            "no API key in config or GEMINI_API_KEY",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_selects_unconfigured() {
        let config = AppConfig::default();
        let generator = from_config(&config);
        assert_eq!(generator.name(), "unconfigured");
    }

    #[test]
    fn present_key_selects_gemini() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("test-key".into());
        let generator = from_config(&config);
        assert_eq!(generator.name(), "gemini");
    }
}
