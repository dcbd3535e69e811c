//! Daily sync scheduler
//!
//! Runs a sync once a day at a fixed UTC time. A failed run is logged and
//! the scheduler waits for the next slot; it never retries early.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::sync::SyncService;

/// First instant strictly after `now` at `hour:minute` UTC.
///
/// Out-of-range values are clamped to 23:59.
pub fn next_run_after(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let slot = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(slot).and_utc();

    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Daily sync loop.
///
/// Spawn this with `tokio::spawn`; it runs until the task is aborted.
pub async fn run_daily(sync: SyncService, schedule: ScheduleConfig) {
    info!(
        hour = schedule.hour,
        minute = schedule.minute,
        "Sync scheduler started"
    );

    loop {
        let now = Utc::now();
        let next = next_run_after(now, schedule.hour, schedule.minute);
        info!(next_run = %next, "Waiting for next scheduled sync");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match sync.run().await {
            Ok(report) => info!(
                synced = report.synced,
                endpoints_failed = report.endpoints_failed,
                "Scheduled sync finished"
            ),
            Err(e) => error!(error = %e, "Scheduled sync failed (non-fatal)"),
        }
    }
}
