//! Keep-alive for timer subscribers.
//!
//! A subscriber can sit idle for minutes between timer writes, long enough
//! for proxies to drop the socket. Each pass pings every connection and
//! forgets the ones whose socket task has already ended.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ws::manager::WsManager;

/// Run a heartbeat pass every `every`, starting one interval from now.
///
/// The returned handle is aborted during shutdown.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let sweep = ws_manager.ping_sweep().await;
            if sweep.pinged > 0 || sweep.dropped > 0 {
                tracing::debug!(
                    pinged = sweep.pinged,
                    dropped = sweep.dropped,
                    "WebSocket heartbeat"
                );
            }
        }
    })
}
