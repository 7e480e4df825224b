//! Provider registry: static specs for the supported OpenAI-compatible backends.
//!
//! Each `ProviderSpec` describes how to reach one backend: keywords for model
//! matching, the env var carrying its API key, and its default API base.

use scribe_core::config::ProviderConfig;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"zai"`).
    pub name: &'static str,
    /// Keywords to match in model names (lowercase). E.g. `&["glm"]`.
    pub keywords: &'static [&'static str],
    /// Environment variable for the API key. E.g. `"ZAI_API_KEY"`.
    pub env_key: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Whether this is a gateway/aggregator (OpenRouter).
    pub is_gateway: bool,
    /// If the API key starts with this prefix, auto-detect this provider.
    pub detect_by_key_prefix: Option<&'static str>,
    /// Default API base URL.
    pub default_api_base: &'static str,
}

/// Supported providers, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // OpenRouter: gateway, matched by key prefix "sk-or-"
    ProviderSpec {
        name: "openrouter",
        keywords: &["openrouter"],
        env_key: "OPENROUTER_API_KEY",
        display_name: "OpenRouter",
        is_gateway: true,
        detect_by_key_prefix: Some("sk-or-"),
        default_api_base: "https://openrouter.ai/api/v1",
    },
    // Z.ai (GLM): coding plan endpoint
    ProviderSpec {
        name: "zai",
        keywords: &["glm", "zai", "zhipu"],
        env_key: "ZAI_API_KEY",
        display_name: "Z.ai",
        is_gateway: false,
        detect_by_key_prefix: None,
        default_api_base: "https://api.z.ai/api/coding/paas/v4",
    },
    ProviderSpec {
        name: "deepseek",
        keywords: &["deepseek"],
        env_key: "DEEPSEEK_API_KEY",
        display_name: "DeepSeek",
        is_gateway: false,
        detect_by_key_prefix: None,
        default_api_base: "https://api.deepseek.com/v1",
    },
    ProviderSpec {
        name: "openai",
        keywords: &["gpt", "o1", "o3", "o4", "openai"],
        env_key: "OPENAI_API_KEY",
        display_name: "OpenAI",
        is_gateway: false,
        detect_by_key_prefix: None,
        default_api_base: "https://api.openai.com/v1",
    },
];

/// Provider used when nothing else matches.
const DEFAULT_PROVIDER: &str = "zai";

/// Find a spec by its internal name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|s| s.name == name)
}

/// Find a non-gateway spec whose keywords appear in the model name.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS
        .iter()
        .filter(|s| !s.is_gateway)
        .find(|s| s.keywords.iter().any(|kw| model_lower.contains(kw)))
}

/// Pick the provider entry for a model + config.
///
/// Priority:
/// 1. Explicit `provider.name` in config.
/// 2. API key prefix (e.g. `sk-or-` → OpenRouter).
/// 3. Model keyword match.
/// 4. Default (Z.ai).
pub fn resolve_spec(model: &str, config: &ProviderConfig) -> &'static ProviderSpec {
    if let Some(spec) = config.name.as_deref().and_then(find_by_name) {
        return spec;
    }

    if config.is_configured() {
        if let Some(spec) = PROVIDERS.iter().find(|s| {
            s.detect_by_key_prefix
                .is_some_and(|pfx| config.api_key.starts_with(pfx))
        }) {
            return spec;
        }
    }

    find_by_model(model)
        .or_else(|| find_by_name(DEFAULT_PROVIDER))
        .unwrap_or(&PROVIDERS[0])
}

/// The API key for a provider: config value first, then its env var.
pub fn resolve_api_key(config: &ProviderConfig, spec: &ProviderSpec) -> Option<String> {
    if config.is_configured() {
        return Some(config.api_key.clone());
    }
    std::env::var(spec.env_key).ok().filter(|k| !k.is_empty())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
