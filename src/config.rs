//! Configuration file parser for ~/.config/pinfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, but we log a warning for each so typos
//! do not go unnoticed.
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::banner::DEFAULT_TIMEOUT;
use crate::favicon::DEFAULT_PROVIDER;
use crate::timeline::RefreshMode;

const PINBOARD_FEEDS: &str = "https://feeds.pinboard.in/json";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("No Pinboard user configured (set `user` or pass --user)")]
    MissingUser,

    #[error("The network timeline needs the Pinboard feed secret (set `secret` or PINFEED_SECRET)")]
    MissingSecret,

    #[error("Invalid URL for `{key}`: {source}")]
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys can be given.
///
/// SEC-015: Debug is hand-written so the feed secret never reaches logs.
#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pinboard username whose network and bookmarks are shown.
    pub user: Option<String>,

    /// Pinboard RSS secret (Settings > Privacy). Needed for the network feed.
    /// The `PINFEED_SECRET` env var takes precedence.
    pub secret: Option<SecretString>,

    /// Number of entries requested from each feed.
    pub feed_count: u32,

    /// Override for the timeline (network) feed URL.
    pub timeline_url: Option<String>,

    /// Override for the bookmarks feed URL.
    pub bookmarks_url: Option<String>,

    /// Base URL of the favicon service.
    pub favicon_provider: String,

    /// Seconds the copy banner stays up without interaction.
    pub banner_timeout_secs: u64,

    /// Whether the two feeds are fetched one after the other or together.
    pub refresh_mode: RefreshMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            secret: None,
            feed_count: 50,
            timeline_url: None,
            bookmarks_url: None,
            favicon_provider: DEFAULT_PROVIDER.to_string(),
            banner_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            refresh_mode: RefreshMode::default(),
        }
    }
}

/// SEC-015: Mask the secret in Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("user", &self.user)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("feed_count", &self.feed_count)
            .field("timeline_url", &self.timeline_url)
            .field("bookmarks_url", &self.bookmarks_url)
            .field("favicon_provider", &self.favicon_provider)
            .field("banner_timeout_secs", &self.banner_timeout_secs)
            .field("refresh_mode", &self.refresh_mode)
            .finish()
    }
}

/// Resolved feed endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub timeline: Url,
    pub bookmarks: Url,
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "user",
        "secret",
        "feed_count",
        "timeline_url",
        "bookmarks_url",
        "favicon_provider",
        "banner_timeout_secs",
        "refresh_mode",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warnings
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
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
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), user = ?config.user, "Loaded configuration");
        Ok(config)
    }

    /// Apply `PINFEED_SECRET` if set; it wins over the file.
    pub fn with_env_secret(mut self, env_secret: Option<String>) -> Self {
        if let Some(secret) = env_secret.filter(|s| !s.trim().is_empty()) {
            self.secret = Some(SecretString::from(secret));
        }
        self
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_secs(self.banner_timeout_secs.max(1))
    }

    /// Work out both feed URLs.
    ///
    /// Explicit overrides are used as-is. Otherwise the Pinboard URLs are
    /// built from the user (and, for the network feed, the secret).
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let parse = |key: &'static str, s: &str| {
            Url::parse(s).map_err(|source| ConfigError::InvalidUrl { key, source })
        };

        let user = self.user.as_deref().map(str::trim).filter(|u| !u.is_empty());

        let timeline = match (&self.timeline_url, user) {
            (Some(url), _) => parse("timeline_url", url)?,
            (None, Some(user)) => {
                let secret = self.secret.as_ref().ok_or(ConfigError::MissingSecret)?;
                parse(
                    "timeline_url",
                    &format!(
                        "{}/secret:{}/u:{}/network/?count={}",
                        PINBOARD_FEEDS,
                        secret.expose_secret(),
                        user,
                        self.feed_count
                    ),
                )?
            }
            (None, None) => return Err(ConfigError::MissingUser),
        };

        let bookmarks = match (&self.bookmarks_url, user) {
            (Some(url), _) => parse("bookmarks_url", url)?,
            (None, Some(user)) => parse(
                "bookmarks_url",
                &format!("{}/u:{}/?count={}", PINBOARD_FEEDS, user, self.feed_count),
            )?,
            (None, None) => return Err(ConfigError::MissingUser),
        };

        Ok(Endpoints {
            timeline,
            bookmarks,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("pinfeed_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.user.is_none());
        assert_eq!(config.feed_count, 50);
        assert_eq!(config.favicon_provider, DEFAULT_PROVIDER);
        assert_eq!(config.banner_timeout(), Duration::from_secs(5));
        assert_eq!(config.refresh_mode, RefreshMode::Sequential);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/pinfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.feed_count, 50);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "  \n\n ");
        let config = Config::load(&path).unwrap();
        assert!(config.user.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let (dir, path) = write_config(
            "full",
            r#"
user = "alice"
secret = "abc123"
feed_count = 20
favicon_provider = "https://icons.example"
banner_timeout_secs = 8
refresh_mode = "concurrent"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.secret.as_ref().map(|s| s.expose_secret()), Some("abc123"));
        assert_eq!(config.feed_count, 20);
        assert_eq!(config.favicon_provider, "https://icons.example");
        assert_eq!(config.banner_timeout(), Duration::from_secs(8));
        assert_eq!(config.refresh_mode, RefreshMode::Concurrent);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_refresh_mode_rejected() {
        let (dir, path) = write_config("bad_mode", "refresh_mode = \"parallel\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "user = \"bob\"\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.user.as_deref(), Some("bob"));
        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-015: Debug output masks the secret
    #[test]
    fn test_debug_masks_secret() {
        let config = Config::default().with_env_secret(Some("super-secret-token".to_string()));
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_env_secret_overrides_file_but_blank_does_not() {
        let mut config = Config::default();
        config.secret = Some(SecretString::from("from-file"));

        let config = config.with_env_secret(Some("   ".to_string()));
        assert_eq!(config.secret.as_ref().map(|s| s.expose_secret()), Some("from-file"));

        let config = config.with_env_secret(Some("from-env".to_string()));
        assert_eq!(config.secret.as_ref().map(|s| s.expose_secret()), Some("from-env"));
    }

    #[test]
    fn test_pinboard_endpoints() {
        let mut config = Config::default().with_env_secret(Some("s3cr3t".to_string()));
        config.user = Some("alice".to_string());
        config.feed_count = 25;

        let endpoints = config.endpoints().unwrap();
        assert_eq!(
            endpoints.timeline.as_str(),
            "https://feeds.pinboard.in/json/secret:s3cr3t/u:alice/network/?count=25"
        );
        assert_eq!(
            endpoints.bookmarks.as_str(),
            "https://feeds.pinboard.in/json/u:alice/?count=25"
        );
    }

    #[test]
    fn test_network_feed_needs_secret() {
        let mut config = Config::default();
        config.user = Some("alice".to_string());
        assert!(matches!(config.endpoints(), Err(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_overrides_need_no_user() {
        let mut config = Config::default();
        config.timeline_url = Some("http://127.0.0.1:8080/network".to_string());
        config.bookmarks_url = Some("http://127.0.0.1:8080/mine".to_string());
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.bookmarks.path(), "/mine");

        config.bookmarks_url = Some("::not a url".to_string());
        assert!(matches!(
            config.endpoints(),
            Err(ConfigError::InvalidUrl { key: "bookmarks_url", .. })
        ));
    }

    #[test]
    fn test_no_user_no_overrides() {
        assert!(matches!(
            Config::default().endpoints(),
            Err(ConfigError::MissingUser)
        ));
    }
}
