//! Config loader: reads `~/.scribe/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.scribe/config.json`
//! 3. Environment variables `SCRIBE_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use super::schema::{is_usable_ratio, Config};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given or default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `SCRIBE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `SCRIBE_AGENT__MODEL`, `SCRIBE_AGENT__TEMPERATURE`, `SCRIBE_AGENT__MAX_TOKENS`
/// - `SCRIBE_AGENT__MAX_ITERATIONS`, `SCRIBE_AGENT__CONTEXT_WINDOW`
/// - `SCRIBE_AGENT__COMPRESSION_RATIO`, `SCRIBE_AGENT__KEEP_RECENT`
/// - `SCRIBE_AGENT__BACKUP_INTERVAL`, `SCRIBE_AGENT__OUTPUT_DIR`
/// - `SCRIBE_PROVIDER__NAME`, `SCRIBE_PROVIDER__API_KEY`, `SCRIBE_PROVIDER__API_BASE`
fn apply_env_overrides(mut config: Config) -> Config {
    let agent = &mut config.agent;
    if let Ok(val) = std::env::var("SCRIBE_AGENT__MODEL") {
        agent.model = val;
    }
    override_parsed("SCRIBE_AGENT__TEMPERATURE", &mut agent.temperature);
    if let Some(n) = env_parsed::<u32>("SCRIBE_AGENT__MAX_TOKENS") {
        agent.max_tokens = Some(n);
    }
    override_parsed("SCRIBE_AGENT__MAX_ITERATIONS", &mut agent.max_iterations);
    override_parsed("SCRIBE_AGENT__CONTEXT_WINDOW", &mut agent.context_window);
    match env_parsed::<f64>("SCRIBE_AGENT__COMPRESSION_RATIO") {
        Some(ratio) if is_usable_ratio(ratio) => agent.compression_ratio = ratio,
        Some(ratio) => warn!(ratio = ratio, "ignoring compression ratio override, must be finite and above zero"),
        None => {}
    }
    override_parsed("SCRIBE_AGENT__KEEP_RECENT", &mut agent.keep_recent);
    override_parsed("SCRIBE_AGENT__BACKUP_INTERVAL", &mut agent.backup_interval);
    if let Ok(val) = std::env::var("SCRIBE_AGENT__OUTPUT_DIR") {
        agent.output_dir = val;
    }

    let provider = &mut config.provider;
    if let Ok(val) = std::env::var("SCRIBE_PROVIDER__NAME") {
        provider.name = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_PROVIDER__API_KEY") {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var("SCRIBE_PROVIDER__API_BASE") {
        provider.api_base = Some(val);
    }

    config
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

fn override_parsed<T: FromStr>(key: &str, target: &mut T) {
    if let Some(v) = env_parsed(key) {
        *target = v;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.agent.context_window, 200_000);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "agent": {
                "model": "deepseek-chat",
                "maxIterations": 40
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "deepseek-chat");
        assert_eq!(config.agent.max_iterations, 40);
        // Default preserved
        assert_eq!(config.agent.temperature, 1.0);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.max_iterations, 300);
    }

    #[test]
    fn test_env_override_model() {
        std::env::set_var("SCRIBE_AGENT__MODEL", "test-model");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.model, "test-model");
        std::env::remove_var("SCRIBE_AGENT__MODEL");
    }

    #[test]
    fn test_env_override_numeric() {
        std::env::set_var("SCRIBE_AGENT__BACKUP_INTERVAL", "7");
        std::env::set_var("SCRIBE_AGENT__CONTEXT_WINDOW", "not-a-number");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.backup_interval, 7);
        // Unparseable values leave the default alone
        assert_eq!(config.agent.context_window, 200_000);
        std::env::remove_var("SCRIBE_AGENT__BACKUP_INTERVAL");
        std::env::remove_var("SCRIBE_AGENT__CONTEXT_WINDOW");
    }

    #[test]
    fn test_env_override_rejects_nan_ratio() {
        std::env::set_var("SCRIBE_AGENT__COMPRESSION_RATIO", "NaN");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.compression_ratio, 0.9);
        assert_eq!(config.agent.compression_threshold(), 180_000);

        std::env::set_var("SCRIBE_AGENT__COMPRESSION_RATIO", "0");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.compression_ratio, 0.9);

        std::env::set_var("SCRIBE_AGENT__COMPRESSION_RATIO", "0.5");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.compression_threshold(), 100_000);
        std::env::remove_var("SCRIBE_AGENT__COMPRESSION_RATIO");
    }

    #[test]
    fn test_env_override_provider_key() {
        std::env::set_var("SCRIBE_PROVIDER__API_KEY", "sk-env-key");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.provider.api_key, "sk-env-key");
        std::env::remove_var("SCRIBE_PROVIDER__API_KEY");
    }
}
