//! Periodic removal of expired sessions.
//!
//! This is the only thing keeping the sessions table bounded; the access
//! guard's lazy cleanup only touches sessions that are presented again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::session::SessionStore;
use crate::error::AuthError;

/// Run one sweep against the current wall clock.
pub async fn sweep_once(store: &dyn SessionStore) -> Result<u64, AuthError> {
    let purged = store.purge_expired(Utc::now().naive_utc()).await?;
    if purged > 0 {
        tracing::info!(purged, "removed expired sessions");
    } else {
        tracing::debug!("no expired sessions to remove");
    }
    Ok(purged)
}

/// Spawn a background task sweeping expired sessions every `every`.
///
/// The first sweep runs immediately. Failures are logged and the loop
/// keeps going. A zero period is treated as one second.
pub fn spawn_session_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    let every = if every.is_zero() {
        Duration::from_secs(1)
    } else {
        every
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = sweep_once(store.as_ref()).await {
                tracing::error!(error = %e, "expired session sweep failed");
            }
        }
    })
}
