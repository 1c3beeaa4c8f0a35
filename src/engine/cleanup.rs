//! Booking retention cleanup
//!
//! Background task that purges bookings dated more than `retention_days` ago.
//! It runs on a cron schedule (daily at midnight by default). A failed pass is
//! logged and left for the next scheduled run.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use tokio::time::Duration;

use crate::config::CleanupConfig;
use crate::db::Booking;
use crate::DbPool;

/// Deletes bookings older than the retention window
pub struct BookingCleanup {
    db: DbPool,
    config: CleanupConfig,
}

impl BookingCleanup {
    pub fn new(db: DbPool, config: CleanupConfig) -> Self {
        Self { db, config }
    }

    /// First date that is kept when cleaning up on `today`
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today - chrono::Duration::days(i64::from(self.config.retention_days))
    }

    /// Run a single cleanup pass for `today`. Returns the number of bookings removed.
    pub async fn run_cleanup(&self, today: NaiveDate) -> Result<u64> {
        if !self.config.enabled {
            tracing::debug!("Booking cleanup is disabled, skipping");
            return Ok(0);
        }

        let cutoff = self.cutoff(today);
        let removed = Booking::delete_dated_before(&self.db, cutoff)
            .await
            .context("Failed to delete expired bookings")?;

        tracing::info!(
            removed,
            cutoff = %cutoff,
            retention_days = self.config.retention_days,
            "Booking cleanup completed"
        );

        Ok(removed)
    }
}

/// Parse the configured cron expression
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).with_context(|| format!("Invalid cleanup schedule: {}", expr))
}

/// Time to wait from `now` until the next scheduled run
fn until_next_run<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<Duration> {
    let next = schedule.after(now).next()?;
    let wait = next.signed_duration_since(now.clone()).to_std().unwrap_or_default();
    Some(wait)
}

/// Spawn the background cleanup task
pub fn spawn_cleanup_task(db: DbPool, config: CleanupConfig) -> Result<()> {
    if !config.enabled {
        tracing::info!("Booking cleanup is disabled");
        return Ok(());
    }

    let schedule = parse_schedule(&config.schedule)?;
    tracing::info!(
        schedule = %config.schedule,
        retention_days = config.retention_days,
        "Starting booking cleanup task"
    );

    let cleanup = BookingCleanup::new(db, config);

    tokio::spawn(async move {
        loop {
            let Some(wait) = until_next_run(&schedule, &Local::now()) else {
                tracing::warn!("Cleanup schedule has no upcoming runs, stopping task");
                break;
            };
            tokio::time::sleep(wait).await;

            if let Err(e) = cleanup.run_cleanup(Local::now().date_naive()).await {
                tracing::error!(error = %e, "Booking cleanup failed");
            }
        }
    });

    Ok(())
}
