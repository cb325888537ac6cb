//! Access configuration.
//!
//! One immutable value, loaded once by the transport and handed to every
//! component at construction time.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the access decision pipeline.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// URL prefix under which the site is served. Must start and end with `/`.
    /// Default: "/"
    #[serde(default = "default_base_url")]
    base_url: String,
    /// Prefix of the session cookie name; the cookie is `<prefix>_session`.
    /// Default: "pagewarden"
    #[serde(default = "default_cookie_prefix")]
    cookie_prefix: String,
    /// Role that grants access without any identity.
    /// Default: "public"
    #[serde(default = "default_public_role")]
    public_role: String,
    /// Role that grants access to any valid identity.
    /// Default: "authenticated"
    #[serde(default = "default_authenticated_role")]
    authenticated_role: String,
    /// Role assumed for pages whose metadata has no role list.
    /// Default: "authenticated"
    #[serde(default = "default_fallback_role")]
    fallback_role: String,
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_cookie_prefix() -> String {
    "pagewarden".to_string()
}

fn default_public_role() -> String {
    "public".to_string()
}

fn default_authenticated_role() -> String {
    "authenticated".to_string()
}

fn default_fallback_role() -> String {
    "authenticated".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cookie_prefix: default_cookie_prefix(),
            public_role: default_public_role(),
            authenticated_role: default_authenticated_role(),
            fallback_role: default_fallback_role(),
        }
    }
}

impl AccessConfig {
    /// Creates a configuration builder starting from the defaults.
    #[must_use]
    pub fn builder() -> AccessConfigBuilder {
        AccessConfigBuilder::default()
    }

    /// Checks the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not slash-delimited, a role name is
    /// empty, or the cookie prefix is not a valid cookie-name token.
    pub fn validate(&self) -> pagewarden_core::Result<(), ConfigError> {
        if !self.base_url.starts_with('/') || !self.base_url.ends_with('/') {
            return Err(ConfigError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
            }
            .into());
        }

        let prefix_ok = !self.cookie_prefix.is_empty()
            && self
                .cookie_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(ConfigError::InvalidCookiePrefix {
                prefix: self.cookie_prefix.clone(),
            }
            .into());
        }

        for (field, value) in [
            ("public_role", &self.public_role),
            ("authenticated_role", &self.authenticated_role),
            ("fallback_role", &self.fallback_role),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyRole { field }.into());
            }
        }

        Ok(())
    }

    /// Returns the base URL prefix.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured cookie prefix.
    #[must_use]
    pub fn cookie_prefix(&self) -> &str {
        &self.cookie_prefix
    }

    /// Returns the name of the session cookie.
    #[must_use]
    pub fn session_cookie_name(&self) -> String {
        format!("{}_session", self.cookie_prefix)
    }

    /// Returns the role that marks a page as public.
    #[must_use]
    pub fn public_role(&self) -> &str {
        &self.public_role
    }

    /// Returns the role that admits any authenticated requester.
    #[must_use]
    pub fn authenticated_role(&self) -> &str {
        &self.authenticated_role
    }

    /// Returns the role used when page metadata carries none.
    #[must_use]
    pub fn fallback_role(&self) -> &str {
        &self.fallback_role
    }
}

/// Builder for [`AccessConfig`].
#[derive(Debug, Clone, Default)]
pub struct AccessConfigBuilder {
    config: AccessConfig,
}

impl AccessConfigBuilder {
    /// Sets the base URL prefix.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the cookie prefix.
    #[must_use]
    pub fn cookie_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cookie_prefix = prefix.into();
        self
    }

    /// Sets the public role name.
    #[must_use]
    pub fn public_role(mut self, role: impl Into<String>) -> Self {
        self.config.public_role = role.into();
        self
    }

    /// Sets the authenticated role name.
    #[must_use]
    pub fn authenticated_role(mut self, role: impl Into<String>) -> Self {
        self.config.authenticated_role = role.into();
        self
    }

    /// Sets the fallback role name.
    #[must_use]
    pub fn fallback_role(mut self, role: impl Into<String>) -> Self {
        self.config.fallback_role = role.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> AccessConfig {
        self.config
    }
}
