// Periodic background pass that closes sessions past the retention threshold.

use crate::use_cases::session_manager::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawns the sweep loop. The first pass runs one full `period` after startup.
pub fn spawn_sweeper(
    manager: Arc<SessionManager>,
    period: Duration,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // `interval` completes its first tick immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("session sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    let closed = manager.sweep_expired().await;
                    if closed > 0 {
                        let remaining = manager.active_sessions().await;
                        info!(closed, remaining, "swept expired sessions");
                    }
                }
            }
        }
    })
}
