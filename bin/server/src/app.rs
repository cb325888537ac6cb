//! HTTP router.

use axum::{Router, middleware::from_fn_with_state, routing::get};
use std::path::Path;
use std::sync::Arc;
use tower::Layer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth;
use crate::state::AppState;

/// Builds the application router.
///
/// Session routes live under `{base_url}auth/` so the session cookie, scoped
/// to the base URL, reaches them. Every other request goes through the access
/// policy before reaching the static files under `site_root`.
pub fn router(state: Arc<AppState>, site_root: impl AsRef<Path>) -> Router {
    let site = from_fn_with_state(state.clone(), auth::access_control)
        .layer(ServeDir::new(site_root.as_ref()));

    let base_url = state.access.base_url();
    let mut router = Router::new().route(&format!("{base_url}auth/logout"), get(auth::logout));
    if state.session_config.dev_login {
        router = router.route(&format!("{base_url}auth/login"), get(auth::dev_login));
    }

    router
        .fallback_service(site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
