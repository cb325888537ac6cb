//! The access decision.
//!
//! [`AccessPolicy::evaluate`] walks the rules below in order and stops at the
//! first that applies. Every branch that is not an explicit allow denies.
//!
//! 1. Safe assets and safe scripts are allowed.
//! 2. Anything that is not a page is denied.
//! 3. A page without access-control metadata is denied.
//! 4. A page open to the public role is allowed.
//! 5. A requester without a valid session is denied.
//! 6. A page open to the authenticated role is allowed.
//! 7. A user without a role record is denied.
//! 8. The page is allowed if the user holds any of its roles.
//!
//! Once a page is involved (rule 3 onward), the response must not be cached.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::config::AccessConfig;
use crate::identity::{IdentityResolver, Requester};
use crate::page::PageAccessControlLookup;
use crate::resource::{Resource, ResourceClassifier};
use crate::role::UserRoleStore;

/// Allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// The rule that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    SafeAsset,
    SafeScript,
    UnknownResource,
    MissingAccessControl,
    PublicPage,
    Anonymous,
    Unauthorized,
    AuthenticatedPage,
    NoUserRoles,
    RoleMatched,
    RoleMismatch,
    /// A session or role store failed; denied rather than guessed.
    StoreUnavailable,
}

impl Reason {
    /// Returns a short snake_case name, used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafeAsset => "safe_asset",
            Self::SafeScript => "safe_script",
            Self::UnknownResource => "unknown_resource",
            Self::MissingAccessControl => "missing_access_control",
            Self::PublicPage => "public_page",
            Self::Anonymous => "anonymous",
            Self::Unauthorized => "unauthorized",
            Self::AuthenticatedPage => "authenticated_page",
            Self::NoUserRoles => "no_user_roles",
            Self::RoleMatched => "role_matched",
            Self::RoleMismatch => "role_mismatch",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: Reason,
    /// The response must carry no-store cache directives.
    pub no_store: bool,
}

impl Verdict {
    fn allow(reason: Reason, no_store: bool) -> Self {
        Self {
            decision: Decision::Allow,
            reason,
            no_store,
        }
    }

    fn deny(reason: Reason, no_store: bool) -> Self {
        Self {
            decision: Decision::Deny,
            reason,
            no_store,
        }
    }

    /// Returns true if the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// Combines classification, page metadata, identity, and user roles into a
/// single allow/deny decision per request.
#[derive(Clone)]
pub struct AccessPolicy {
    classifier: ResourceClassifier,
    pages: Arc<dyn PageAccessControlLookup>,
    identities: IdentityResolver,
    user_roles: Arc<dyn UserRoleStore>,
    public_role: String,
    authenticated_role: String,
}

impl AccessPolicy {
    /// Creates a policy from its collaborators.
    #[must_use]
    pub fn new(
        config: &AccessConfig,
        pages: Arc<dyn PageAccessControlLookup>,
        identities: IdentityResolver,
        user_roles: Arc<dyn UserRoleStore>,
    ) -> Self {
        Self {
            classifier: ResourceClassifier::new(config.base_url()),
            pages,
            identities,
            user_roles,
            public_role: config.public_role().to_string(),
            authenticated_role: config.authenticated_role().to_string(),
        }
    }

    /// Returns the identity resolver, shared with the session routes.
    #[must_use]
    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    /// Decides whether a request for `path` may proceed.
    ///
    /// `path` must already be percent-decoded. `cookie_header` is the raw
    /// `Cookie` header value, if any.
    #[instrument(skip(self, cookie_header))]
    pub async fn evaluate(&self, path: &str, cookie_header: Option<&str>) -> Verdict {
        let resource = self.classifier.classify(path);
        debug!(kind = %resource.kind(), "classified request path");
        let verdict = match resource {
            Resource::SafeAsset => Verdict::allow(Reason::SafeAsset, false),
            Resource::SafeScript => Verdict::allow(Reason::SafeScript, false),
            Resource::Unknown => {
                warn!("unclassifiable path");
                Verdict::deny(Reason::UnknownResource, false)
            }
            Resource::Page(page) => self.evaluate_page(&page, cookie_header).await,
        };
        debug!(decision = ?verdict.decision, reason = %verdict.reason, "access decision");
        verdict
    }

    #[instrument(skip(self, cookie_header))]
    async fn evaluate_page(&self, page: &str, cookie_header: Option<&str>) -> Verdict {
        let Some(entry) = self.pages.get(page).await else {
            warn!("no access-control metadata for page");
            return Verdict::deny(Reason::MissingAccessControl, true);
        };

        if entry.roles.contains(&self.public_role) {
            return Verdict::allow(Reason::PublicPage, true);
        }

        let identity = match self.identities.resolve(cookie_header).await {
            Ok(Requester::Identified(identity)) => identity,
            Ok(Requester::Anonymous) => return Verdict::deny(Reason::Anonymous, true),
            Ok(Requester::Unauthorized) => return Verdict::deny(Reason::Unauthorized, true),
            Err(e) => {
                error!(error = %e, "session store unavailable");
                return Verdict::deny(Reason::StoreUnavailable, true);
            }
        };

        if entry.roles.contains(&self.authenticated_role) {
            return Verdict::allow(Reason::AuthenticatedPage, true);
        }

        let user_roles = match self.user_roles.get(&identity.id).await {
            Ok(Some(roles)) => roles,
            Ok(None) => {
                debug!(user_id = %identity.id, "user has no role record");
                return Verdict::deny(Reason::NoUserRoles, true);
            }
            Err(e) => {
                error!(user_id = %identity.id, error = %e, "user role store unavailable");
                return Verdict::deny(Reason::StoreUnavailable, true);
            }
        };

        if entry.roles.intersects(&user_roles) {
            Verdict::allow(Reason::RoleMatched, true)
        } else {
            Verdict::deny(Reason::RoleMismatch, true)
        }
    }
}
