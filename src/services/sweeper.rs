//! Background recurrence sweeper.
//!
//! The materializer itself knows nothing about cadence; this task owns the
//! periodic trigger. It runs one sweep immediately at startup (catch-up after
//! a restart), then one per interval tick. Each sweep gets a fixed time
//! budget; a sweep that overruns is abandoned and the next tick starts fresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::recurrence;
use crate::db::repository::ScheduleRepository;

/// Spawn the sweeper loop onto the current runtime.
///
/// # Arguments
/// * `repo` - Shared repository handle
/// * `interval` - Time between sweeps
/// * `budget` - Deadline for one sweep before it is abandoned
///
/// # Returns
/// The task handle; dropping it detaches the loop, aborting it stops the
/// sweeper.
pub fn spawn_sweeper(
    repo: Arc<dyn ScheduleRepository>,
    interval: Duration,
    budget: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Recurrence sweeper started: interval {}s, budget {}s",
            interval.as_secs(),
            budget.as_secs()
        );

        loop {
            ticker.tick().await;

            match tokio::time::timeout(budget, recurrence::expand(repo.as_ref(), Utc::now()))
                .await
            {
                Ok(Ok(summary)) => info!(
                    "Recurrence sweep finished: examined={} created={} skipped={} failed={}",
                    summary.examined, summary.created, summary.skipped, summary.failed
                ),
                Ok(Err(err)) => error!("Recurrence sweep failed: {}", err),
                Err(_) => error!(
                    "Recurrence sweep exceeded its {}s budget and was abandoned",
                    budget.as_secs()
                ),
            }
        }
    })
}
