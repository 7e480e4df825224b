//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentConfig`, `ProviderConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_COMPRESSION_RATIO: f64 = 0.9;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.scribe/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentConfig,
    pub provider: ProviderConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Agent loop and context-budget settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// LLM model identifier.
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per response (`None` = provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Iteration ceiling for one run.
    pub max_iterations: usize,
    /// The model's context window, in tokens.
    pub context_window: usize,
    /// Fraction of the context window at which compression triggers.
    pub compression_ratio: f64,
    /// Messages kept verbatim when history is compressed.
    pub keep_recent: usize,
    /// Write a full backup snapshot every N iterations (0 disables).
    pub backup_interval: usize,
    /// Root directory under which project folders are created.
    pub output_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "glm-4.7".to_string(),
            temperature: 1.0,
            max_tokens: None,
            max_iterations: 300,
            context_window: 200_000,
            compression_ratio: DEFAULT_COMPRESSION_RATIO,
            keep_recent: 10,
            backup_interval: 50,
            output_dir: "output".to_string(),
        }
    }
}

impl AgentConfig {
    /// Token count at which compression is triggered.
    ///
    /// A ratio that is NaN, infinite or not above zero would compress on
    /// every iteration; the default ratio is used instead.
    pub fn compression_threshold(&self) -> usize {
        let ratio = if is_usable_ratio(self.compression_ratio) {
            self.compression_ratio.min(1.0)
        } else {
            warn!(
                ratio = self.compression_ratio,
                "unusable compression ratio, using the default"
            );
            DEFAULT_COMPRESSION_RATIO
        };
        (self.context_window as f64 * ratio) as usize
    }
}

/// Finite and above zero.
pub fn is_usable_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio > 0.0
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Configuration for the LLM backend (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Provider name from the provider table (e.g. `"zai"`); matched from the model when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.model, "glm-4.7");
        assert_eq!(config.agent.max_iterations, 300);
        assert_eq!(config.agent.keep_recent, 10);
        assert_eq!(config.agent.backup_interval, 50);
        assert!(!config.provider.is_configured());
    }

    #[test]
    fn test_default_threshold_is_ninety_percent() {
        assert_eq!(AgentConfig::default().compression_threshold(), 180_000);
    }

    #[test]
    fn test_threshold_ratio_is_clamped() {
        let agent = AgentConfig {
            context_window: 1000,
            compression_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(agent.compression_threshold(), 1000);
    }

    #[test]
    fn test_unusable_ratio_falls_back_to_default() {
        for ratio in [f64::NAN, f64::INFINITY, 0.0, -0.5] {
            let agent = AgentConfig {
                context_window: 1000,
                compression_ratio: ratio,
                ..Default::default()
            };
            assert_eq!(agent.compression_threshold(), 900, "ratio {ratio}");
        }
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = r#"{
            "agent": { "contextWindow": 128000, "keepRecent": 4, "maxTokens": 8192 },
            "provider": { "name": "openai", "apiKey": "sk-test", "apiBase": "http://localhost:8000/v1" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent.context_window, 128_000);
        assert_eq!(config.agent.keep_recent, 4);
        assert_eq!(config.agent.max_tokens, Some(8192));
        // Unspecified fields keep their defaults
        assert_eq!(config.agent.model, "glm-4.7");
        assert_eq!(config.provider.name.as_deref(), Some("openai"));
        assert!(config.provider.is_configured());
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let raw = serde_json::to_value(Config::default()).unwrap();
        assert!(raw["agent"].get("maxIterations").is_some());
        assert!(raw["agent"].get("max_iterations").is_none());
        assert!(raw["agent"].get("maxTokens").is_none());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.agent.context_window, 200_000);
        assert_eq!(config.agent.output_dir, "output");
    }
}
