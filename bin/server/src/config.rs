//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__` as the
//! nesting separator (`ACCESS__BASE_URL=/docs/`, `SESSION__BACKEND=postgres`).
//!
//! See [`AccessConfig`] for the access-control settings.

use pagewarden_access::AccessConfig;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Generated site location.
    #[serde(default)]
    pub site: SiteConfig,

    /// Access-control configuration.
    #[serde(default)]
    pub access: AccessConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// User role configuration.
    #[serde(default)]
    pub roles: RolesConfig,
}

/// Where the generated site lives on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Directory served for the URL root. The base URL is resolved below it.
    #[serde(default = "default_site_root")]
    pub root: PathBuf,
}

/// Session storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// In-process only; sessions are lost on restart.
    Memory,
    /// A JSON document on disk.
    #[default]
    File,
    /// The `sessions` table in PostgreSQL.
    Postgres,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Session document for the `file` backend.
    #[serde(default = "default_session_file_path")]
    pub file_path: PathBuf,

    /// PostgreSQL connection URL, required for the `postgres` backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between expired-session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Enables `GET {base_url}auth/login?userId=...`, which logs in as any user.
    /// Development only.
    #[serde(default)]
    pub dev_login: bool,
}

/// User role configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    /// JSON array of `{ "userId": ..., "roles": [...] }` records.
    #[serde(default = "default_roles_file_path")]
    pub file_path: PathBuf,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_site_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_session_file_path() -> PathBuf {
    PathBuf::from("data/sessions.json")
}

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

fn default_roles_file_path() -> PathBuf {
    PathBuf::from("data/user_roles.json")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_site_root(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            file_path: default_session_file_path(),
            database_url: None,
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
            dev_login: false,
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            file_path: default_roles_file_path(),
        }
    }
}

/// Invalid session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionConfigError {
    /// The postgres backend was selected without a database URL.
    MissingDatabaseUrl,
    /// Sessions must last at least one minute.
    NonPositiveDuration { minutes: i64 },
    /// The sweep interval must be at least one second.
    ZeroCleanupInterval,
}

impl fmt::Display for SessionConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDatabaseUrl => {
                write!(f, "session.database_url is required for the postgres backend")
            }
            Self::NonPositiveDuration { minutes } => {
                write!(f, "session.duration_minutes must be positive, got {minutes}")
            }
            Self::ZeroCleanupInterval => {
                write!(f, "session.cleanup_interval_seconds must be positive")
            }
        }
    }
}

impl std::error::Error for SessionConfigError {}

impl SessionConfig {
    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> pagewarden_core::Result<(), SessionConfigError> {
        if self.backend == SessionBackend::Postgres
            && self.database_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(SessionConfigError::MissingDatabaseUrl.into());
        }
        if self.duration_minutes <= 0 {
            return Err(SessionConfigError::NonPositiveDuration {
                minutes: self.duration_minutes,
            }
            .into());
        }
        if self.cleanup_interval_seconds == 0 {
            return Err(SessionConfigError::ZeroCleanupInterval.into());
        }
        Ok(())
    }

    /// Returns the session lifetime.
    #[must_use]
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is malformed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.backend, SessionBackend::File);
        assert_eq!(config.file_path, PathBuf::from("data/sessions.json"));
        assert_eq!(config.duration_minutes, 60);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
        assert!(!config.dev_login);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn server_config_deserializes_with_defaults() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bind_addr, default_bind_addr());
        assert_eq!(config.site.root, PathBuf::from("public"));
        assert_eq!(config.roles.file_path, PathBuf::from("data/user_roles.json"));
        assert_eq!(config.access, AccessConfig::default());
    }

    #[test]
    fn server_config_deserializes_nested_values() {
        let config: ServerConfig = serde_json::from_str(
            r#"{
                "bind_addr": "0.0.0.0:8080",
                "site": { "root": "/srv/site" },
                "access": { "base_url": "/docs/" },
                "session": { "backend": "postgres", "database_url": "postgres://localhost/pw" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.site.root, PathBuf::from("/srv/site"));
        assert_eq!(config.access.base_url(), "/docs/");
        assert_eq!(config.session.backend, SessionBackend::Postgres);
        assert!(config.session.validate().is_ok());
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let config = SessionConfig {
            backend: SessionBackend::Postgres,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            database_url: Some("  ".to_string()),
            ..config
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_durations() {
        let config = SessionConfig {
            duration_minutes: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            cleanup_interval_seconds: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
