//! Provider errors.
//!
//! Every variant is transient from the agent loop's point of view except
//! `MissingApiKey` and `ClientBuild`, which can only occur at startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// No credential in config or in the provider's env var.
    #[error("no API key for provider '{provider}' (set {env_key} or provider.apiKey)")]
    MissingApiKey {
        provider: &'static str,
        env_key: &'static str,
    },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("request to LLM failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx HTTP status.
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode LLM response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("LLM response contained no choices")]
    EmptyChoices,
}

impl LlmError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            LlmError::MissingApiKey { .. } | LlmError::ClientBuild(_)
        )
    }
}
