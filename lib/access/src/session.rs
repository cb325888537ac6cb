//! Login sessions.
//!
//! A session binds the opaque id carried in the session cookie to a user and
//! an expiry instant. Sessions are created on login and removed on logout, by
//! identity resolution when found expired, or by the maintenance sweep.

use chrono::{DateTime, Duration, Utc};
use pagewarden_core::{SessionId, UserId};
use serde::{Deserialize, Serialize};

/// Provider-specific data attached to a session, opaque to this crate.
pub type ExternalPayload = serde_json::Map<String, serde_json::Value>;

/// A server-held login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier; the only lookup key.
    id: SessionId,
    /// The user this session authenticates.
    user_id: UserId,
    /// When the user logged in.
    login_at: DateTime<Utc>,
    /// First instant at which the session is no longer valid.
    expired_at: DateTime<Utc>,
    /// Identity provider that vouched for the user.
    provider_id: String,
    /// Provider session data (tokens, claims, ...).
    #[serde(default)]
    external_payload: ExternalPayload,
}

impl Session {
    /// Creates a session starting at `login_at` and lasting `lifetime`.
    #[must_use]
    pub fn new(
        id: SessionId,
        user_id: UserId,
        provider_id: impl Into<String>,
        login_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            id,
            user_id,
            login_at,
            expired_at: login_at + lifetime,
            provider_id: provider_id.into(),
            external_payload: ExternalPayload::new(),
        }
    }

    /// Attaches provider session data.
    #[must_use]
    pub fn with_external_payload(mut self, payload: ExternalPayload) -> Self {
        self.external_payload = payload;
        self
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the authenticated user's ID.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn login_at(&self) -> DateTime<Utc> {
        self.login_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expired_at(&self) -> DateTime<Utc> {
        self.expired_at
    }

    /// Returns the identity provider id.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Returns the provider session data.
    #[must_use]
    pub fn external_payload(&self) -> &ExternalPayload {
        &self.external_payload
    }

    /// Returns true if the session is dead at `now`.
    ///
    /// A session whose expiry is at or before `now` is expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn login_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn test_session() -> Session {
        Session::new(
            SessionId::new("sess_test_123"),
            UserId::new("alice"),
            "google",
            login_time(),
            Duration::hours(1),
        )
    }

    #[test]
    fn new_session_has_correct_fields() {
        let session = test_session();
        assert_eq!(session.id().as_str(), "sess_test_123");
        assert_eq!(session.user_id().as_str(), "alice");
        assert_eq!(session.provider_id(), "google");
        assert_eq!(session.login_at(), login_time());
        assert_eq!(session.expired_at(), login_time() + Duration::hours(1));
        assert!(session.external_payload().is_empty());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let session = test_session();
        let expiry = session.expired_at();
        assert!(!session.is_expired_at(expiry - Duration::seconds(1)));
        assert!(session.is_expired_at(expiry));
        assert!(session.is_expired_at(expiry + Duration::seconds(1)));
    }

    #[test]
    fn external_payload_survives_serialization() {
        let mut payload = ExternalPayload::new();
        payload.insert("refresh_token".to_string(), "rt_456".into());
        let session = test_session().with_external_payload(payload);

        let json = serde_json::to_string(&session).expect("serialize");
        let parsed: Session = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, session);
        assert_eq!(parsed.external_payload()["refresh_token"], "rt_456");
    }

    #[test]
    fn missing_payload_defaults_to_empty() {
        let json = r#"{
            "id": "s1",
            "user_id": "bob",
            "login_at": "2024-03-01T09:00:00Z",
            "expired_at": "2024-03-01T10:00:00Z",
            "provider_id": "dev"
        }"#;
        let session: Session = serde_json::from_str(json).expect("deserialize");
        assert!(session.external_payload().is_empty());
    }
}
