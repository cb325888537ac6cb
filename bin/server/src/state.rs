//! Shared application state.

use axum::http::HeaderMap;
use pagewarden_access::{
    AccessConfig, AccessPolicy, FileSessionStore, IdentityResolver, MemorySessionStore,
    SessionStore, SiteAssetLookup, StoreError, UserRoleStore,
};
use pagewarden_core::{Clock, SessionId};
use rootcause::Report;
use std::sync::Arc;

use crate::auth::db::PgSessionStore;
use crate::auth::middleware::cookie_header;
use crate::config::{ServerConfig, SessionBackend, SessionConfig};

/// State shared by the access middleware and the session routes.
pub struct AppState {
    /// The access decision for every site request.
    pub policy: AccessPolicy,
    /// Session storage, shared with the policy's identity resolver.
    pub sessions: Arc<dyn SessionStore>,
    /// Time source for session issue and expiry.
    pub clock: Arc<dyn Clock>,
    /// Access-control configuration.
    pub access: AccessConfig,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Wires the policy from configuration and the given stores.
    pub fn new(
        config: &ServerConfig,
        sessions: Arc<dyn SessionStore>,
        user_roles: Arc<dyn UserRoleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pages = Arc::new(SiteAssetLookup::new(&config.site.root, &config.access));
        let identities = IdentityResolver::new(&config.access, sessions.clone(), clock.clone());
        Self {
            policy: AccessPolicy::new(&config.access, pages, identities, user_roles),
            sessions,
            clock,
            access: config.access.clone(),
            session_config: config.session.clone(),
        }
    }

    /// Returns the session cookie name.
    pub fn cookie_name(&self) -> &str {
        self.policy.identities().cookie_name()
    }

    /// Returns the session id named by the request's cookies, parsed the same
    /// way the access policy parses them.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<SessionId> {
        self.policy
            .identities()
            .session_id(cookie_header(headers).as_deref())
    }
}

/// Opens the configured session backend.
///
/// # Errors
///
/// Returns an error if the postgres backend cannot be reached or migrated.
pub async fn open_session_store(
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, Report<StoreError>> {
    match config.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::File => Ok(Arc::new(FileSessionStore::new(config.file_path.clone()))),
        SessionBackend::Postgres => {
            let Some(database_url) = config.database_url.as_deref() else {
                return Err(StoreError::Backend {
                    backend: "postgres".to_string(),
                    reason: "no database url configured".to_string(),
                }
                .into());
            };
            Ok(Arc::new(PgSessionStore::connect(database_url).await?))
        }
    }
}
