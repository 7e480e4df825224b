//! LLM Provider trait: the boundary between the agent and a model backend.
//!
//! The `HttpProvider` in `http_provider.rs` covers all OpenAI-compatible APIs.

use async_trait::async_trait;
use scribe_core::types::{LlmResponse, Message, ToolDefinition};

use crate::error::LlmError;

/// Configuration passed to each LLM call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate (`None` lets the backend decide).
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: 1.0,
        }
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages`: Conversation history in OpenAI format, system message first.
    /// * `tools`   : Optional list of tool definitions the LLM can call.
    /// * `model`   : Model identifier (e.g. `"glm-4.7"`).
    /// * `config`  : Temperature, max_tokens.
    ///
    /// # Returns
    /// An `LlmResponse` with content and/or tool calls, or the failure.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, LlmError>;

    /// The default model for this provider instance.
    fn default_model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
