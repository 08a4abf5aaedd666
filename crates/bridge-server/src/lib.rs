pub mod api;
pub mod state;

use std::sync::Arc;

use application::{BridgeService, RetryPolicy, SerialChannel};
use domain::BridgeError;
use infrastructure::{BridgeConfig, LinkFactory};
use state::AppState;
use tracing::{info, warn};

/// Build the reader link, open it once and wire up the bridge service.
/// A reader that cannot be opened yet is not fatal; the first request retries.
pub async fn setup_app_state(config: &BridgeConfig) -> Result<Arc<AppState>, BridgeError> {
    let link = LinkFactory::create_link(config)?;
    let link_type = link.link_type().to_string();

    let channel = Arc::new(SerialChannel::new(link, RetryPolicy::from(&config.retry)));
    match channel.open().await {
        Ok(()) => info!(link = %link_type, port = %config.serial.port, "✅ Reader connected"),
        Err(e) => warn!(
            link = %link_type,
            error = %e,
            "Reader not available yet, will retry on first request"
        ),
    }

    Ok(Arc::new(AppState::new(BridgeService::new(channel))))
}
