use pagewarden_access::{FileUserRoleStore, UserRoleStore};
use pagewarden_core::{Clock, SystemClock};
use pagewarden_server::{
    app, config::ServerConfig, maintenance, state::AppState, state::open_session_store,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    config
        .access
        .validate()
        .expect("invalid access configuration");
    config
        .session
        .validate()
        .expect("invalid session configuration");
    tracing::info!(
        base_url = config.access.base_url(),
        site_root = %config.site.root.display(),
        backend = ?config.session.backend,
        "Loaded configuration"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sessions = open_session_store(&config.session)
        .await
        .expect("failed to open session store");
    let user_roles: Arc<dyn UserRoleStore> =
        Arc::new(FileUserRoleStore::new(config.roles.file_path.clone()));

    // Cleanup expired sessions on startup, then periodically
    maintenance::sweep_expired_sessions(sessions.as_ref(), clock.as_ref()).await;
    maintenance::spawn_session_sweeper(
        sessions.clone(),
        clock.clone(),
        std::time::Duration::from_secs(config.session.cleanup_interval_seconds),
    );

    if config.session.dev_login {
        tracing::warn!("Development login is enabled; anyone can sign in as any user");
    }

    let state = Arc::new(AppState::new(&config, sessions, user_roles, clock));
    let app = app::router(state, &config.site.root);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
