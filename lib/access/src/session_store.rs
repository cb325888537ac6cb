//! Session storage.
//!
//! [`SessionStore`] is the only contract other components depend on. Every
//! backend serializes its writers: at most one `set`, `delete`, or
//! `clear_expired` runs against a store instance at a time, so whole-collection
//! read-modify-write cycles never lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagewarden_core::SessionId;
use rootcause::Report;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::json_file::JsonFile;
use crate::session::Session;

/// Keyed CRUD over sessions plus an expiry sweep.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces the session with the same id.
    async fn set(&self, session: Session) -> Result<(), Report<StoreError>>;

    /// Looks up a session by id.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>>;

    /// Removes a session. Removing an absent id is a no-op.
    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>>;

    /// Removes every session expired at `now` and returns how many were removed.
    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, Report<StoreError>>;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, session: Session) -> Result<(), Report<StoreError>> {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, Report<StoreError>> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// On-disk document: session id to session.
type SessionDocument = BTreeMap<SessionId, Session>;

/// Session store backed by a single JSON document keyed by session id.
///
/// Every mutation re-reads the whole document, applies the change, and
/// writes it back under the store's write lock.
#[derive(Debug)]
pub struct FileSessionStore {
    file: JsonFile,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Creates a store backed by the document at `path`.
    ///
    /// The file is created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    async fn set(&self, session: Session) -> Result<(), Report<StoreError>> {
        let _guard = self.write_lock.lock().await;
        let mut sessions: SessionDocument = self.file.read().await?;
        sessions.insert(session.id().clone(), session);
        self.file.write(&sessions).await
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>> {
        let mut sessions: SessionDocument = self.file.read().await?;
        Ok(sessions.remove(id))
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        let _guard = self.write_lock.lock().await;
        let mut sessions: SessionDocument = self.file.read().await?;
        if sessions.remove(id).is_some() {
            self.file.write(&sessions).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, Report<StoreError>> {
        let _guard = self.write_lock.lock().await;
        let mut sessions: SessionDocument = self.file.read().await?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let removed = (before - sessions.len()) as u64;
        if removed > 0 {
            self.file.write(&sessions).await?;
        }
        debug!(removed, "cleared expired sessions");
        Ok(removed)
    }
}
