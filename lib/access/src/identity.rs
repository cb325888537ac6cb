//! Requester identity resolution.
//!
//! Turns the `Cookie` header of a request into one of three outcomes:
//! no credential at all, a credential that is unknown or expired, or a
//! verified user identity.

use cookie::Cookie;
use pagewarden_core::{Clock, SessionId, UserId};
use rootcause::Report;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::config::AccessConfig;
use crate::error::StoreError;
use crate::session_store::SessionStore;

/// How a requester proved their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A session cookie issued at login.
    Cookie,
}

/// The credential presented with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    pub kind: CredentialKind,
}

/// A verified requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user the credential belongs to.
    pub id: UserId,
    /// The credential that established the identity.
    pub credential: Option<Credential>,
}

/// Outcome of identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    /// No credential was presented.
    Anonymous,
    /// A credential was presented but is unknown or expired.
    Unauthorized,
    /// The credential is valid.
    Identified(Identity),
}

impl Requester {
    /// Returns the identity, if the requester was identified.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Identified(identity) => Some(identity),
            Self::Anonymous | Self::Unauthorized => None,
        }
    }
}

/// Resolves requesters from their session cookie.
#[derive(Clone)]
pub struct IdentityResolver {
    cookie_name: String,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl IdentityResolver {
    /// Creates a resolver reading the configured session cookie.
    #[must_use]
    pub fn new(
        config: &AccessConfig,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cookie_name: config.session_cookie_name(),
            sessions,
            clock,
        }
    }

    /// Returns the name of the cookie carrying the session id.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Reads the session id from the raw `Cookie` header value.
    ///
    /// Every consumer of the session cookie goes through here, so the
    /// policy and the session routes agree on which session a request names.
    #[must_use]
    pub fn session_id(&self, cookie_header: Option<&str>) -> Option<SessionId> {
        cookie_header
            .and_then(|header| session_cookie_value(header, &self.cookie_name))
            .map(SessionId::new)
    }

    /// Resolves the requester from the raw `Cookie` header value.
    ///
    /// An expired session is deleted before `Unauthorized` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store cannot be read.
    #[instrument(skip_all)]
    pub async fn resolve(
        &self,
        cookie_header: Option<&str>,
    ) -> Result<Requester, Report<StoreError>> {
        let Some(session_id) = self.session_id(cookie_header) else {
            debug!("no session cookie, requester is anonymous");
            return Ok(Requester::Anonymous);
        };

        let now = self.clock.now();
        let Some(session) = self.sessions.get(&session_id).await? else {
            debug!(session_id = %session_id, "unknown session");
            return Ok(Requester::Unauthorized);
        };

        if session.is_expired_at(now) {
            debug!(
                session_id = %session_id,
                expired_at = %session.expired_at(),
                now = %now,
                "session expired"
            );
            if let Err(e) = self.sessions.delete(&session_id).await {
                error!(session_id = %session_id, error = %e, "failed to delete expired session");
            }
            return Ok(Requester::Unauthorized);
        }

        debug!(user_id = %session.user_id(), "session valid");
        Ok(Requester::Identified(Identity {
            id: session.user_id().clone(),
            credential: Some(Credential {
                kind: CredentialKind::Cookie,
            }),
        }))
    }
}

/// Extracts the value of cookie `name` from a `Cookie` header.
///
/// Surrounding double quotes are removed. Empty values are treated as absent.
#[must_use]
pub fn session_cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}
