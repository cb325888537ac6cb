//! Strongly-typed identifiers.
//!
//! Both identifiers are opaque strings. User ids come from the external
//! identity provider verbatim; session ids are generated here as ULIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Macro to generate a string-backed identifier newtype.
macro_rules! define_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Unique identifier for a login session, carried in the session cookie.
    SessionId
);

define_string_id!(
    /// Identifier of a user as verified by the identity provider.
    UserId
);

impl SessionId {
    /// Generates a fresh session id using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_id_display() {
        let id = SessionId::new("sess_test_123");
        assert_eq!(id.to_string(), "sess_test_123");
    }

    #[test]
    fn user_id_from_str() {
        let id: UserId = "alice".into();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn generated_session_ids_are_unique() {
        let ids: HashSet<SessionId> = (0..64).map(|_| SessionId::generate()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn generated_session_id_is_a_ulid() {
        let id = SessionId::generate();
        assert!(id.as_str().parse::<Ulid>().is_ok());
    }

    #[test]
    fn id_serializes_transparently() {
        let json = serde_json::to_string(&UserId::new("bob")).expect("serialize");
        assert_eq!(json, "\"bob\"");
    }
}
