//! Recurring background jobs.
//!
//! Call `spawn_all` once during startup. Tasks are detached with
//! `tokio::spawn` and never block the caller.

use crate::services::SubscriptionService;
use chrono::Utc;
use std::time::Duration;

/// Spawn all background tasks. An interval of 0 leaves expiry to the cron endpoint.
pub fn spawn_all(subscription_service: SubscriptionService, expire_interval_secs: u64) {
    if expire_interval_secs == 0 {
        log::info!("In-process subscription expiry disabled");
        return;
    }

    // cancelled subscriptions past their end date go back to trial
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(expire_interval_secs));
        loop {
            ticker.tick().await;
            match subscription_service.expire_cancelled(Utc::now()).await {
                Ok(n) if n > 0 => log::info!("Expired subscriptions processed: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to expire subscriptions: {e:?}"),
            }
        }
    });
}
