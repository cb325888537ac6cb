//! Session routes: development login and logout.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use pagewarden_access::{Session, SessionStore, StoreError};
use pagewarden_core::{Clock, SessionId, UserId};
use rootcause::Report;
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use crate::state::AppState;

/// Provider id recorded on sessions issued by [`dev_login`].
pub const DEV_PROVIDER_ID: &str = "dev";

/// Query parameters for the development login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevLoginQuery {
    user_id: String,
}

/// Logs in as `userId` without an identity provider.
///
/// Any session named by the current cookie is replaced. Only routed when
/// `session.dev_login` is enabled.
pub async fn dev_login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DevLoginQuery>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AuthError::MissingUserId);
    }

    if let Some(previous) = state.session_id(&headers) {
        state
            .sessions
            .delete(&previous)
            .await
            .map_err(AuthError::Store)?;
    }

    let lifetime = state.session_config.lifetime();
    let session = Session::new(
        SessionId::generate(),
        UserId::new(user_id),
        DEV_PROVIDER_ID,
        state.clock.now(),
        lifetime,
    );
    let session_id = session.id().clone();
    state.sessions.set(session).await.map_err(AuthError::Store)?;
    tracing::info!(user_id, "Issued development session");

    let base_url = state.access.base_url().to_string();
    let session_cookie = Cookie::build((state.cookie_name().to_string(), session_id.to_string()))
        .path(base_url.clone())
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(state.session_config.duration_minutes));

    Ok((jar.add(session_cookie), Redirect::to(&base_url)))
}

/// Logs out the user by deleting their session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(session_id) = state.session_id(&headers) {
        if let Err(e) = state.sessions.delete(&session_id).await {
            tracing::error!(error = %e, "Failed to delete session on logout");
        }
    }

    let base_url = state.access.base_url().to_string();
    let remove_session = Cookie::build((state.cookie_name().to_string(), ""))
        .path(base_url.clone())
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to(&base_url))
}

/// Session route errors.
#[derive(Debug)]
pub enum AuthError {
    MissingUserId,
    Store(Report<StoreError>),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingUserId => (StatusCode::BAD_REQUEST, "Missing userId"),
            Self::Store(report) => {
                tracing::error!(error = %report, "Session store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
