use super::SessionStore;
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodically delete expired session rows. Authorization does not depend on it.
pub fn spawn_sweeper(sessions: SessionStore, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "Session sweeper started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; restore already skipped expired rows.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "Expired sessions purged"),
                Err(e) => warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}
