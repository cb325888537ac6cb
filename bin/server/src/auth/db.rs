//! PostgreSQL session storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagewarden_access::{Session, SessionStore, StoreError};
use pagewarden_core::{SessionId, UserId};
use rootcause::Report;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

const BACKEND: &str = "postgres";

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    login_at: DateTime<Utc>,
    expired_at: DateTime<Utc>,
    provider_id: String,
    external_payload: Value,
}

impl SessionRow {
    fn into_session(self) -> Session {
        let payload = match self.external_payload {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Session::new(
            SessionId::new(self.id),
            UserId::new(self.user_id),
            self.provider_id,
            self.login_at,
            self.expired_at - self.login_at,
        )
        .with_external_payload(payload)
    }
}

fn backend_error(e: impl std::fmt::Display) -> Report<StoreError> {
    StoreError::Backend {
        backend: BACKEND.to_string(),
        reason: e.to_string(),
    }
    .into()
}

/// Sessions in the `sessions` table.
///
/// Every operation is a single statement, so concurrent writers are
/// serialized by the database.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, Report<StoreError>> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(backend_error)?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(backend_error)?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    async fn set(&self, session: Session) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, login_at, expired_at, provider_id, external_payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                login_at = EXCLUDED.login_at,
                expired_at = EXCLUDED.expired_at,
                provider_id = EXCLUDED.provider_id,
                external_payload = EXCLUDED.external_payload
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.user_id().as_str())
        .bind(session.login_at())
        .bind(session.expired_at())
        .bind(session.provider_id())
        .bind(Value::Object(session.external_payload().clone()))
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, login_at, expired_at, provider_id, external_payload
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(row.map(SessionRow::into_session))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, Report<StoreError>> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expired_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        debug!(removed = result.rows_affected(), "cleared expired sessions");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn row_converts_to_session() {
        let login_at = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        let row = SessionRow {
            id: "01J8ZQ".to_string(),
            user_id: "alice".to_string(),
            login_at,
            expired_at: login_at + Duration::hours(1),
            provider_id: "dev".to_string(),
            external_payload: json!({ "email": "alice@example.com" }),
        };

        let session = row.into_session();
        assert_eq!(session.id().as_str(), "01J8ZQ");
        assert_eq!(session.user_id().as_str(), "alice");
        assert_eq!(session.expired_at(), login_at + Duration::hours(1));
        assert_eq!(session.provider_id(), "dev");
        assert_eq!(
            session.external_payload().get("email"),
            Some(&json!("alice@example.com"))
        );
    }

    #[test]
    fn non_object_payload_reads_as_empty() {
        let login_at = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        let row = SessionRow {
            id: "s1".to_string(),
            user_id: "alice".to_string(),
            login_at,
            expired_at: login_at,
            provider_id: "dev".to_string(),
            external_payload: Value::Null,
        };
        assert!(row.into_session().external_payload().is_empty());
    }

    #[test]
    fn backend_errors_name_the_backend() {
        let report = backend_error("connection refused");
        assert!(report.to_string().contains("postgres store error"));
    }
}
