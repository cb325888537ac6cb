//! Roles and the user-role lookup.
//!
//! Roles are plain names. A page lists the roles allowed to read it; a user
//! holds a set of roles maintained outside this system. Access is granted
//! when the two sets intersect.

use async_trait::async_trait;
use pagewarden_core::UserId;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::StoreError;
use crate::json_file::JsonFile;

/// An unordered set of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet {
    roles: BTreeSet<String>,
}

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a role set holding a single role.
    #[must_use]
    pub fn single(role: impl Into<String>) -> Self {
        Self {
            roles: BTreeSet::from([role.into()]),
        }
    }

    /// Returns true if `role` is in the set.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the two sets share at least one role.
    #[must_use]
    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.roles.is_disjoint(&other.roles)
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns the number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Iterates over the role names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One record of the user-role document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleEntry {
    /// The user the roles belong to.
    pub user_id: UserId,
    /// Roles granted to the user.
    pub roles: RoleSet,
}

/// Read-only lookup of a user's roles.
#[async_trait]
pub trait UserRoleStore: Send + Sync {
    /// Returns the user's roles, or `None` if the user has no record.
    async fn get(&self, user_id: &UserId) -> Result<Option<RoleSet>, Report<StoreError>>;
}

/// In-process user-role store, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRoleStore {
    entries: HashMap<UserId, RoleSet>,
}

impl MemoryUserRoleStore {
    /// Creates a store from role entries. Later entries for the same user win.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = UserRoleEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.user_id, entry.roles))
                .collect(),
        }
    }
}

#[async_trait]
impl UserRoleStore for MemoryUserRoleStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<RoleSet>, Report<StoreError>> {
        Ok(self.entries.get(user_id).cloned())
    }
}

/// User-role store backed by a JSON array of [`UserRoleEntry`] records.
///
/// The document is re-read on every lookup so edits take effect without a
/// restart. A missing file means no user has roles.
#[derive(Debug, Clone)]
pub struct FileUserRoleStore {
    file: JsonFile,
}

impl FileUserRoleStore {
    /// Creates a store reading the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl UserRoleStore for FileUserRoleStore {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get(&self, user_id: &UserId) -> Result<Option<RoleSet>, Report<StoreError>> {
        let entries: Vec<UserRoleEntry> = self.file.read().await?;
        Ok(entries
            .into_iter()
            .find(|entry| &entry.user_id == user_id)
            .map(|entry| entry.roles))
    }
}
