use std::time::Duration;

use tracing::{info, warn};

use crate::registry::{RoomRegistry, DEFAULT_ROOM};
use crate::relay::{RelayController, RelayState};

/// Backstop for the best-effort stop-on-leave: clients that crash or close
/// the tab never send a leave, so their presence records simply expire and
/// this task notices the empty room.
pub fn spawn(registry: RoomRegistry, relay: RelayController, interval_secs: u64) {
    if !relay.controls_instance() {
        info!("idle reaper disabled (no relay instance configured)");
        return;
    }

    info!("idle reaper enabled — checking every {interval_secs}s");

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
            match run_once(&registry, &relay).await {
                Ok(true) => info!("idle reaper stopped the relay"),
                Ok(false) => {}
                Err(e) => warn!("idle reap failed: {e:#}"),
            }
        }
    });
}

/// One idle check. Stops the relay iff the main room is empty and the
/// instance is running or booting. Returns whether a stop was issued.
pub async fn run_once(registry: &RoomRegistry, relay: &RelayController) -> anyhow::Result<bool> {
    if !registry.list_live(DEFAULT_ROOM).await.is_empty() {
        return Ok(false);
    }

    let status = relay.describe().await?;
    if matches!(status.state, RelayState::Running | RelayState::Pending) {
        relay.stop().await?;
        return Ok(true);
    }

    Ok(false)
}
