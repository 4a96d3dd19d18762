//! Keep-alive loop
//!
//! Broadcasts a `heartbeat` to every connection on a fixed period. Designed
//! to run as a background task next to the WebSocket server:
//!
//! ```ignore
//! tokio::spawn(run_heartbeat(hub.clone(), Duration::from_secs(30)));
//! ```
//!
//! Dead connections discovered by a heartbeat are deregistered like any other
//! failed send, so the loop doubles as a sweeper for idle sockets.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::hub::Hub;
use crate::hub::message::ServerMessage;

/// Run forever, one heartbeat per `period`. `period` must be non-zero.
pub async fn run_heartbeat(hub: Hub, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let delivered = hub.broadcast_all(&ServerMessage::heartbeat());
        let status = hub.status();
        debug!(
            delivered,
            connections = status.connections,
            topics = status.topics.len(),
            "heartbeat"
        );
    }
}
