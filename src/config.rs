//! Configuration file parser for ~/.config/podconfig-tui/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use crate::util::{validate_server_url, UrlValidationError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable overriding `server_url` from the file.
pub const SERVER_URL_ENV: &str = "PODCONFIG_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid server URL '{url}': {source}")]
    ServerUrl {
        url: String,
        #[source]
        source: UrlValidationError,
    },

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the podconfig backend.
    pub server_url: String,

    /// Upper bound on a whole request/response exchange, in seconds.
    pub request_timeout_secs: u64,

    /// How long a remove control stays armed, in milliseconds.
    pub confirm_timeout_ms: u64,

    /// How long "copied" feedback stays on a control, in milliseconds.
    pub copy_feedback_ms: u64,

    /// Largest response body accepted from the backend.
    pub max_response_bytes: usize,

    /// Write logs here instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 20,
            confirm_timeout_ms: 3000,
            copy_feedback_ms: 1000,
            max_response_bytes: 5 * 1024 * 1024,
            log_file: None,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "server_url",
        "request_timeout_secs",
        "confirm_timeout_ms",
        "copy_feedback_ms",
        "max_response_bytes",
        "log_file",
    ];

    /// Default location: `$HOME/.config/podconfig-tui/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("podconfig-tui")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check the size before reading so a huge file is never pulled into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            server = %config.server_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses TOML text. Blank text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("confirm_timeout_ms", self.confirm_timeout_ms),
            ("copy_feedback_ms", self.copy_feedback_ms),
        ];
        for (key, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_response_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the backend URL: command line, then environment, then file.
    pub fn resolve_server_url(
        &self,
        cli: Option<&str>,
        env: Option<&str>,
    ) -> Result<Url, ConfigError> {
        let raw = cli
            .or(env.filter(|v| !v.trim().is_empty()))
            .unwrap_or(&self.server_url);
        validate_server_url(raw).map_err(|source| ConfigError::ServerUrl {
            url: raw.to_string(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("podconfig_tui_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.confirm_timeout(), Duration::from_millis(3000));
        assert_eq!(config.copy_feedback(), Duration::from_millis(1000));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/podconfig_tui_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let (dir, path) = temp_config("empty", "   \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = temp_config("partial", "server_url = \"http://nas.local:8080\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.server_url, "http://nas.local:8080");
        assert_eq!(config.confirm_timeout_ms, 3000);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
server_url = "https://podcasts.example.com/admin"
request_timeout_secs = 5
confirm_timeout_ms = 4000
copy_feedback_ms = 1500
max_response_bytes = 1024
log_file = "/tmp/podconfig-tui.log"
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(
            config,
            Config {
                server_url: "https://podcasts.example.com/admin".to_string(),
                request_timeout_secs: 5,
                confirm_timeout_ms: 4000,
                copy_feedback_ms: 1500,
                max_response_bytes: 1024,
                log_file: Some(PathBuf::from("/tmp/podconfig-tui.log")),
            }
        );
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("server_url = \"http://x:1\"\ntheme = \"dark\"\n").unwrap();
        assert_eq!(config.server_url, "http://x:1");
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("confirm_timeout_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::parse("confirm_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "confirm_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = temp_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_server_url_precedence() {
        let config = Config {
            server_url: "http://file:1".to_string(),
            ..Config::default()
        };

        let url = config
            .resolve_server_url(Some("http://cli:2"), Some("http://env:3"))
            .unwrap();
        assert_eq!(url.as_str(), "http://cli:2/");

        let url = config.resolve_server_url(None, Some("http://env:3")).unwrap();
        assert_eq!(url.as_str(), "http://env:3/");

        let url = config.resolve_server_url(None, Some("  ")).unwrap();
        assert_eq!(url.as_str(), "http://file:1/");

        let url = config.resolve_server_url(None, None).unwrap();
        assert_eq!(url.as_str(), "http://file:1/");
    }

    #[test]
    fn test_bad_server_url_rejected() {
        let config = Config::default();
        let err = config
            .resolve_server_url(Some("ftp://nas.local"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ServerUrl { .. }));
    }
}
