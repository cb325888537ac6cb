//! Error types for the access crate.
//!
//! Absence is never an error here: a missing session, role record, or page
//! metadata is an `Option`. These types cover infrastructure failures and
//! invalid configuration only.

use std::fmt;
use std::path::PathBuf;

/// Errors from session and user-role storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing file could not be read.
    Read { path: PathBuf, reason: String },
    /// The backing file could not be written.
    Write { path: PathBuf, reason: String },
    /// Stored data could not be decoded.
    Decode { path: PathBuf, reason: String },
    /// Data could not be encoded for storage.
    Encode { reason: String },
    /// A non-file backend (e.g. a database) failed.
    Backend { backend: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, reason } => {
                write!(f, "failed to read '{}': {reason}", path.display())
            }
            Self::Write { path, reason } => {
                write!(f, "failed to write '{}': {reason}", path.display())
            }
            Self::Decode { path, reason } => {
                write!(f, "failed to decode '{}': {reason}", path.display())
            }
            Self::Encode { reason } => {
                write!(f, "failed to encode store data: {reason}")
            }
            Self::Backend { backend, reason } => {
                write!(f, "{backend} store error: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from validating an [`AccessConfig`](crate::AccessConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL must begin and end with `/`.
    InvalidBaseUrl { base_url: String },
    /// A role name was empty.
    EmptyRole { field: &'static str },
    /// The cookie prefix was empty or contained cookie-illegal characters.
    InvalidCookiePrefix { prefix: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl { base_url } => {
                write!(f, "base url '{base_url}' must start and end with '/'")
            }
            Self::EmptyRole { field } => {
                write!(f, "role name '{field}' must not be empty")
            }
            Self::InvalidCookiePrefix { prefix } => {
                write!(f, "invalid cookie prefix '{prefix}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_read_display() {
        let err = StoreError::Read {
            path: PathBuf::from("data/sessions.json"),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("data/sessions.json"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn store_error_backend_display() {
        let err = StoreError::Backend {
            backend: "postgres".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "postgres store error: connection refused");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidBaseUrl {
            base_url: "docs".to_string(),
        };
        assert!(err.to_string().contains("'docs'"));

        let err = ConfigError::EmptyRole {
            field: "public_role",
        };
        assert!(err.to_string().contains("public_role"));
    }
}
