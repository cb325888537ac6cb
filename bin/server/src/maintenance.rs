//! Expired-session sweeps.

use pagewarden_access::SessionStore;
use pagewarden_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Removes every session expired at the current time.
///
/// Failures are logged and reported as `None`.
pub async fn sweep_expired_sessions(sessions: &dyn SessionStore, clock: &dyn Clock) -> Option<u64> {
    match sessions.clear_expired(clock.now()).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(deleted_sessions = count, "Cleaned up expired sessions");
            }
            Some(count)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions");
            None
        }
    }
}

/// Spawns a task sweeping expired sessions every `period`, starting one
/// period from now.
pub fn spawn_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            sweep_expired_sessions(sessions.as_ref(), clock.as_ref()).await;
        }
    })
}
