use std::sync::Arc;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::error::AppError;

/// Withdraws special offers whose end date has passed. Returns how many
/// services were changed.
pub async fn sweep_expired_offers(state: &AppState) -> Result<u64, AppError> {
    let today = Utc::now().date_naive();
    state.service_repo.expire_offers(today).await
}

pub async fn start_offer_sweeper(state: Arc<AppState>) {
    let interval = state.config.offer_sweep_interval;
    info!("Starting special-offer sweeper (every {}s)...", interval.as_secs());

    loop {
        async {
            match sweep_expired_offers(&state).await {
                Ok(0) => {}
                Ok(count) => info!("Expired {} special offer(s)", count),
                Err(e) => error!("Failed to expire special offers: {:?}", e),
            }
        }
            .instrument(info_span!("offer_sweep"))
            .await;

        sleep(interval).await;
    }
}
