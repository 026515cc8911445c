//! Background keep-alive: refreshes the Lawmatics token during idle periods
//! so interactive requests rarely have to wait on the token endpoint.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::oauth::KeepAliveStatus;
use crate::state::AppState;

/// How often the keep-alive wakes up to look at the stored token
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Run the keep-alive loop until shutdown is signalled.
///
/// Every failure is logged and swallowed; a failed background refresh must
/// never take the process down or stop future ticks.
pub(crate) async fn run_keep_alive(
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> color_eyre::Result<()> {
    let mut interval = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        "Keep-alive running every {}s",
        KEEP_ALIVE_INTERVAL.as_secs()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.tokens.keep_warm().await {
                    Ok(KeepAliveStatus::Idle) => {
                        debug!("Keep-alive: no token to refresh");
                    }
                    Ok(KeepAliveStatus::Fresh(ms_left)) => {
                        debug!("Keep-alive: token still fresh, {}ms left", ms_left);
                    }
                    Ok(KeepAliveStatus::Refreshed) => {
                        info!("Keep-alive: token refreshed early");
                    }
                    Err(err) => {
                        error!("Keep-alive refresh failed: {}", err);
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Keep-alive shutting down");
                return Ok(());
            }
        }
    }
}
