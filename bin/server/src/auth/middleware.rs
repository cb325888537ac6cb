//! Access-control middleware for Axum.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, COOKIE, EXPIRES, PRAGMA},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::state::AppState;

const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// Runs the access policy for a request and either forwards it or answers
/// `403 Forbidden`.
///
/// Page requests get no-store headers whether they are allowed or not.
pub async fn access_control(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let raw_path = request.uri().path();
    let path = match urlencoding::decode(raw_path) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            warn!(path = raw_path, error = %e, "undecodable request path");
            return forbidden();
        }
    };

    let cookie_header = cookie_header(request.headers());
    let verdict = state.policy.evaluate(&path, cookie_header.as_deref()).await;

    let mut response = if verdict.is_allowed() {
        next.run(request).await
    } else {
        debug!(path = %path, reason = %verdict.reason, "request denied");
        forbidden()
    };

    if verdict.no_store {
        apply_no_store(response.headers_mut());
    }
    response
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

/// Joins every `Cookie` header line into one header value, as HTTP/2
/// requires before the cookie string is parsed.
pub(crate) fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let lines: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("; "))
    }
}

fn apply_no_store(headers: &mut HeaderMap) {
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
}
