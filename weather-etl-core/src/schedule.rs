//! Periodic runner for unattended operation.
//!
//! Runs the pipeline once per schedule tick. A failed run is logged and the
//! runner waits for the next tick; missed ticks are not caught up.

use std::{future::Future, str::FromStr};

use chrono::{DateTime, Utc};

use crate::{fetch::WeatherSource, load::WeatherSink, pipeline::Pipeline};

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expr}': {reason}")]
    Parse { expr: String, reason: String },
    #[error("Schedule '{0}' has no upcoming occurrence")]
    Exhausted(String),
}

/// A parsed cron schedule, evaluated in UTC.
#[derive(Debug, Clone)]
pub struct RunSchedule {
    expr: String,
    schedule: cron::Schedule,
}

impl RunSchedule {
    /// Parse `@daily`-style shorthands, or 5- and 6-field cron expressions.
    ///
    /// The `cron` crate wants a leading seconds field, so standard 5-field
    /// expressions get `0 ` prepended.
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let normalized = normalize_cron_expr(expr);
        let schedule =
            cron::Schedule::from_str(&normalized).map_err(|e| ScheduleError::Parse {
                expr: expr.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            expr: expr.trim().to_string(),
            schedule,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.schedule
            .after(&after)
            .next()
            .ok_or_else(|| ScheduleError::Exhausted(self.expr.clone()))
    }
}

fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Run `pipeline` on every tick of `schedule` until `shutdown` resolves.
///
/// Returns the number of completed runs, successful or not.
pub async fn run_scheduled<S, L, F>(
    pipeline: &Pipeline<S, L>,
    schedule: &RunSchedule,
    shutdown: F,
) -> Result<u64, ScheduleError>
where
    S: WeatherSource,
    L: WeatherSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut runs = 0u64;

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now)?;
        log::info!("Next weather ETL run at {next} (schedule '{}')", schedule.expr());

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutdown requested, stopping scheduler after {runs} run(s)");
                return Ok(runs);
            }
            _ = tokio::time::sleep(wait) => {}
        }

        // Failures are already logged by the pipeline; the next tick is a fresh run.
        if let Ok(report) = pipeline.run().await {
            log::debug!("Scheduled run stored {:?}", report.record);
        }
        runs += 1;
    }
}
