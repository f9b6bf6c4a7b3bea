//! Background triggering of active feeding schedules.
//!
//! Firing is at-most-once per calendar minute; a tick missed during
//! downtime is not replayed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tracing::info;

use crate::engine::FarmEngine;
use crate::feeding::FeedingSchedule;

/// Minute-resolution key used for firing idempotence.
pub fn minute_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M").to_string()
}

/// Whether a schedule should fire at `now`: active, matching time-of-day,
/// and not already fired within this minute.
pub fn is_due(schedule: &FeedingSchedule, now: DateTime<Utc>) -> bool {
    schedule.is_active
        && schedule.time.hour() == now.time().hour()
        && schedule.time.minute() == now.time().minute()
        && schedule.last_fired_minute.as_deref() != Some(minute_key(now).as_str())
}

/// Runs the schedule ticker until the task is dropped. One timer task
/// serves all schedules; each tick fires whatever is due.
pub async fn run_ticker(engine: Arc<FarmEngine>, tick_interval: Duration) {
    info!(
        interval_secs = tick_interval.as_secs(),
        "Starting feeding schedule ticker"
    );
    let mut interval = tokio::time::interval(tick_interval);
    loop {
        interval.tick().await;
        let fired = engine.fire_due_schedules(Utc::now());
        if fired > 0 {
            info!(fired, "Fired due feeding schedules");
        }
    }
}
