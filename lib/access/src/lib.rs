//! Access decisions for pagewarden.
//!
//! This crate decides whether a request for a statically generated
//! documentation site may be served. The pieces are:
//!
//! - [`ResourceClassifier`]: maps a request path to a safe asset, a safe
//!   script, a page id, or unknown.
//! - [`PageAccessControlLookup`]: resolves the roles allowed to read a page
//!   from the site's build artifacts.
//! - [`SessionStore`] and [`IdentityResolver`]: turn a session cookie into a
//!   verified user.
//! - [`UserRoleStore`]: the roles each user holds.
//! - [`AccessPolicy`]: combines all of the above into an allow/deny
//!   [`Verdict`]. Anything not explicitly allowed is denied.

pub mod config;
pub mod decision;
pub mod error;
pub mod identity;
mod json_file;
pub mod page;
pub mod resource;
pub mod role;
pub mod session;
pub mod session_store;

pub use config::{AccessConfig, AccessConfigBuilder};
pub use decision::{AccessPolicy, Decision, Reason, Verdict};
pub use error::{ConfigError, StoreError};
pub use identity::{Credential, CredentialKind, Identity, IdentityResolver, Requester};
pub use page::{PageAccessControlEntry, PageAccessControlLookup, PageMetadata, SiteAssetLookup};
pub use resource::{Resource, ResourceClassifier, ResourceKind};
pub use role::{FileUserRoleStore, MemoryUserRoleStore, RoleSet, UserRoleEntry, UserRoleStore};
pub use session::{ExternalPayload, Session};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
