//! Configuration loading.
//!
//! Settings are read from `config.toml` in the platform configuration
//! directory (`~/.config/shiori/config.toml` on Linux) unless a path is
//! given. Every field has a default, so a partial file or no file at all
//! still yields a usable configuration.
//!
//! ```toml
//! log_level = "debug"
//!
//! [server]
//! url = "https://komga.example.com"
//! api_key = "0123456789abcdef"
//!
//! [reader]
//! reading_direction = "rtl"
//! split_wide_page_mode = "auto"
//! dual_page = true
//!
//! [cache]
//! max_size_mb = 512
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::net::ServerAuth;
use crate::types::ReaderSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShioriConfig {
    pub log_level: LogLevel,
    pub server: ServerConfig,
    pub reader: ReaderSettings,
    pub cache: CacheConfig,
}

/// Server connection settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Credentials to send: the API key wins over a username/password pair.
    pub fn auth(&self) -> ServerAuth {
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            return ServerAuth::api_key(key);
        }
        match &self.username {
            Some(username) if !username.is_empty() => {
                ServerAuth::basic(username, self.password.clone().unwrap_or_default())
            }
            _ => ServerAuth::None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("auth", &self.auth())
            .finish()
    }
}

/// Page cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; the platform cache directory when unset.
    pub dir: Option<PathBuf>,
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_size_mb: 2048,
        }
    }
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("shiori")
                .join("pages")
        })
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// `config.toml` in the platform configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shiori").join("config.toml"))
}

/// Parses a TOML configuration.
///
/// # Errors
///
/// * [`Error::Config`] - If the TOML is malformed or a value has the wrong type
///
/// ```rust
/// use shiori::config::parse_config;
/// use shiori::types::ReadingDirection;
///
/// let config = parse_config("[reader]\nreading_direction = \"rtl\"").unwrap();
/// assert_eq!(config.reader.reading_direction, ReadingDirection::Rtl);
/// assert_eq!(config.reader.preload_ahead, 2);
/// assert!(parse_config("[reader]\ndual_page = \"yes\"").is_err());
/// ```
pub fn parse_config(contents: &str) -> Result<ShioriConfig> {
    Ok(toml::from_str(contents)?)
}

/// Serializes a configuration back to TOML.
pub fn serialize_config(config: &ShioriConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::config(e.to_string()))
}

/// Loads the configuration at `path`, falling back to defaults.
///
/// A missing or invalid file is logged and replaced by
/// [`ShioriConfig::default`].
pub fn load_config(path: &Path) -> ShioriConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded config");
            data
        }
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default config: {err}");
            return ShioriConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!(?config, "Parsed configuration from disk");
            config
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            ShioriConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::TapZoneMode;
    use crate::types::SplitWidePageMode;
    use tempfile::TempDir;

    #[test]
    fn partial_files_use_defaults() {
        let config = parse_config(
            r#"
            log_level = "debug"

            [reader]
            split_wide_page_mode = "auto"
            tap_zone_mode = "webtoon"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.reader.split_wide_page_mode, SplitWidePageMode::Auto);
        assert_eq!(config.reader.tap_zone_mode, TapZoneMode::Webtoon);
        assert!(!config.reader.dual_page);
        assert_eq!(config.cache.max_size_mb, 2048);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn api_key_wins_over_password() {
        let mut server = ServerConfig {
            url: "https://komga.example.com".to_string(),
            username: Some("reader".to_string()),
            password: Some("secret".to_string()),
            api_key: None,
        };
        assert_eq!(server.auth(), ServerAuth::basic("reader", "secret"));
        server.api_key = Some("key".to_string());
        assert_eq!(server.auth(), ServerAuth::api_key("key"));
        server.api_key = Some(String::new());
        server.username = None;
        assert_eq!(server.auth(), ServerAuth::None);
        assert!(!format!("{:?}", server).contains("secret"));
    }

    #[test]
    fn load_falls_back_on_missing_or_invalid_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(load_config(&path), ShioriConfig::default());

        fs::write(&path, "reader = [").unwrap();
        assert_eq!(load_config(&path), ShioriConfig::default());

        fs::write(&path, "[cache]\nmax_size_mb = 10\n").unwrap();
        let config = load_config(&path);
        assert_eq!(config.cache.max_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = ShioriConfig::default();
        config.server.url = "https://komga.example.com".to_string();
        config.reader.dual_page = true;
        let text = serialize_config(&config).unwrap();
        assert_eq!(parse_config(&text).unwrap(), config);
    }
}
