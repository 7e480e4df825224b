//! Generic HTTP-based LLM provider for OpenAI-compatible APIs.
//!
//! Talks directly to any OpenAI-compatible `/chat/completions` endpoint
//! (Z.ai GLM, OpenAI, DeepSeek, OpenRouter).
//!
//! No request timeout is set: long-form completions can legitimately take
//! minutes, and a hung call simply holds the loop.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use scribe_core::config::ProviderConfig;
use scribe_core::utils::mask_secret;
use scribe_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Message, ToolDefinition,
};

use crate::error::LlmError;
use crate::registry::{resolve_api_key, resolve_spec, ProviderSpec};
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Connect timeout only; the response itself may take as long as it takes.
const CONNECT_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A generic LLM provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.z.ai/api/coding/paas/v4"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Default model for this provider instance.
    default_model: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    /// The provider spec this instance was built from.
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new HttpProvider.
    ///
    /// # Arguments
    /// * `config` : User's config (api_base, extra_headers)
    /// * `spec`   : Static provider spec from the registry
    /// * `api_key`: Resolved credential
    /// * `model`  : The default model to use
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        api_key: impl Into<String>,
        model: &str,
    ) -> Result<Self, LlmError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: api_key.into(),
            default_model: model.to_string(),
            extra_headers,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// The provider spec in use.
    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    /// The API base in use.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The credential, masked for display (`abcd...wxyz`).
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, LlmError> {
        debug!(
            provider = self.spec.display_name,
            model = %model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| "auto".to_string()),
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                LlmError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %body,
                "API error"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_resp = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "Failed to parse LLM response");
                LlmError::Decode(e)
            })?;

        let llm_resp = chat_resp.into_response().ok_or(LlmError::EmptyChoices)?;
        debug!(
            provider = self.spec.display_name,
            has_content = llm_resp.content.is_some(),
            tool_calls = llm_resp.tool_calls.len(),
            finish_reason = llm_resp.finish_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );
        Ok(llm_resp)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider from a model name and the provider config.
///
/// Matches the model to a spec, resolves the credential (config, then the
/// spec's env var) and creates the client. A missing credential is an error.
pub fn create_provider(model: &str, config: &ProviderConfig) -> Result<HttpProvider, LlmError> {
    let spec = resolve_spec(model, config);
    let api_key = resolve_api_key(config, spec).ok_or(LlmError::MissingApiKey {
        provider: spec.name,
        env_key: spec.env_key,
    })?;

    debug!(
        provider = spec.display_name,
        model = model,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating LLM provider"
    );

    HttpProvider::new(config, spec, api_key, model)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
