//! Application configuration.
//!
//! Credentials come from environment variables first, then from an optional
//! `~/.config/flightfriend/secret.toml`. A missing credential is never
//! fatal: the affected service simply runs in mock mode.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Runtime configuration for external services.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Gemini generative-text API key.
    pub gemini_api_key: Option<String>,
    /// Aviationstack flight-data API key.
    pub aviationstack_api_key: Option<String>,
    /// Base URL of the hosted record store (chat history).
    pub history_url: Option<String>,
    /// Anonymous API key for the hosted record store.
    pub history_api_key: Option<String>,
    /// Forces mock providers even when credentials are present.
    pub enable_mocks: bool,
}

/// Shape of `~/.config/flightfriend/secret.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
struct SecretFile {
    #[serde(default)]
    gemini: Option<KeyEntry>,
    #[serde(default)]
    aviationstack: Option<KeyEntry>,
    #[serde(default)]
    history: Option<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct KeyEntry {
    api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryEntry {
    url: String,
    api_key: String,
}

impl AppConfig {
    /// Loads configuration from the environment and the optional secret file.
    ///
    /// Never fails; unreadable or malformed secret files are logged and
    /// skipped.
    pub fn load() -> Self {
        let secrets = load_secret_file().unwrap_or_default();

        let gemini_api_key = env_non_empty("GEMINI_API_KEY")
            .or_else(|| secrets.gemini.as_ref().map(|e| e.api_key.clone()));
        let aviationstack_api_key = env_non_empty("AVIATIONSTACK_API_KEY")
            .or_else(|| secrets.aviationstack.as_ref().map(|e| e.api_key.clone()));
        let history_url = env_non_empty("SUPABASE_URL")
            .or_else(|| secrets.history.as_ref().map(|e| e.url.clone()));
        let history_api_key = env_non_empty("SUPABASE_ANON_KEY")
            .or_else(|| secrets.history.as_ref().map(|e| e.api_key.clone()));
        let enable_mocks = env_non_empty("FLIGHTFRIEND_ENABLE_MOCKS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Self {
            gemini_api_key,
            aviationstack_api_key,
            history_url,
            history_api_key,
            enable_mocks,
        };
        tracing::info!(
            "[AppConfig] gemini: {}, aviationstack: {}, history: {}, mocks: {}",
            present(&config.gemini_api_key),
            present(&config.aviationstack_api_key),
            present(&config.history_url),
            config.enable_mocks
        );
        config
    }

    /// A configuration with no credentials: every provider runs in mock mode.
    pub fn mock_only() -> Self {
        Self {
            enable_mocks: true,
            ..Self::default()
        }
    }
}

fn present(value: &Option<String>) -> &'static str {
    if value.is_some() { "present" } else { "missing" }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn secret_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("flightfriend").join("secret.toml"))
}

fn load_secret_file() -> Option<SecretFile> {
    read_secret_file(&secret_file_path()?)
}

fn read_secret_file(path: &std::path::Path) -> Option<SecretFile> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("[AppConfig] Failed to read {}: {err}", path.display());
            return None;
        }
    };
    match toml::from_str(&content) {
        Ok(secrets) => Some(secrets),
        Err(err) => {
            warn!("[AppConfig] Failed to parse {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_file_shape() {
        let parsed: SecretFile = toml::from_str(
            r#"
            [gemini]
            api_key = "g-key"

            [history]
            url = "https://example.supabase.co"
            api_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.gemini.unwrap().api_key, "g-key");
        assert!(parsed.aviationstack.is_none());
        let history = parsed.history.unwrap();
        assert_eq!(history.url, "https://example.supabase.co");
        assert_eq!(history.api_key, "anon");
    }

    #[test]
    fn test_read_secret_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.toml");
        std::fs::write(&path, "[aviationstack]\napi_key = \"av-key\"\n").unwrap();

        let secrets = read_secret_file(&path).unwrap();
        assert_eq!(secrets.aviationstack.unwrap().api_key, "av-key");

        // Missing and malformed files are both treated as "no secrets".
        assert!(read_secret_file(&dir.path().join("absent.toml")).is_none());
        std::fs::write(&path, "not valid toml [").unwrap();
        assert!(read_secret_file(&path).is_none());
    }

    #[test]
    fn test_mock_only_has_no_credentials() {
        let config = AppConfig::mock_only();
        assert!(config.enable_mocks);
        assert!(config.gemini_api_key.is_none());
        assert!(config.aviationstack_api_key.is_none());
    }
}
