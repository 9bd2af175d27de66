//! Error types for the Learnmate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the exchange pipeline maps
//! these onto its caller-facing taxonomy.

use thiserror::Error;

/// Failures of the text generation backend.
///
/// `NotConfigured` is a distinct, detectable state: the capability was never
/// wired up (missing credential), which is fatal for a chat exchange but does
/// not corrupt stored state. Everything else is a transport or API failure.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty completion: {0}")]
    EmptyCompletion(String),
}

/// Failures of the turn store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_error_displays_status() {
        let err = GeneratorError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn not_configured_names_the_capability() {
        let err = GeneratorError::NotConfigured("no GEMINI_API_KEY set".into());
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn store_error_displays_reason() {
        let err = StoreError::MigrationFailed("turns table: disk full".into());
        assert!(err.to_string().contains("turns table"));
    }
}
