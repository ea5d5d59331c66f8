//! Periodic refresh of the day's exchange rates.
//!
//! The central bank publishes during business hours, so the refresh only runs
//! inside a window of local hours. Outside the window ticks are skipped.

use serde::{Deserialize, Serialize};
use std::{fmt::Display, time::Duration};
use time::{OffsetDateTime, UtcOffset};
use tokio::time::MissedTickBehavior;
use tracing::{Instrument as _, Level, event, span};

/// When to refresh rates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshSchedule {
    /// How often to check for today's rates (disabled if omitted)
    #[serde(default = "default_every", with = "humantime_serde::option")]
    pub every: Option<Duration>,
    /// The first local hour in which a refresh may run
    #[serde(default = "default_from_hour")]
    pub from_hour: u8,
    /// The last local hour in which a refresh may run
    #[serde(default = "default_until_hour")]
    pub until_hour: u8,
    /// The local time zone, in whole hours east of UTC
    #[serde(default = "default_utc_offset")]
    pub utc_offset: i8,
}

fn default_every() -> Option<Duration> {
    Some(Duration::from_secs(3600))
}

fn default_from_hour() -> u8 {
    9
}

fn default_until_hour() -> u8 {
    21
}

fn default_utc_offset() -> i8 {
    3
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            every: default_every(),
            from_hour: default_from_hour(),
            until_hour: default_until_hour(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl RefreshSchedule {
    /// The local time zone as an offset
    pub fn offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.utc_offset, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    /// The local wall-clock time for `now`
    pub fn local(&self, now: OffsetDateTime) -> OffsetDateTime {
        now.to_offset(self.offset())
    }

    /// Whether `now` falls inside the refresh window (both ends inclusive)
    pub fn in_window(&self, now: OffsetDateTime) -> bool {
        (self.from_hour..=self.until_hour).contains(&self.local(now).hour())
    }

    /// Call `f` with the local date on every tick that falls inside the window.
    ///
    /// Errors are logged and the loop carries on; the next tick retries. Returns
    /// immediately if no interval is configured.
    pub async fn run<T, E: Display>(&self, f: impl AsyncFn(time::Date) -> Result<T, E>) {
        let Some(every) = self.every else {
            return;
        };

        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let now = OffsetDateTime::now_utc();
            if !self.in_window(now) {
                event!(Level::DEBUG, hour = self.local(now).hour(), "outside refresh window");
                continue;
            }

            let today = self.local(now).date();
            let span = span!(Level::INFO, "scheduled rate refresh", %today);
            async {
                if let Err(err) = f(today).await {
                    event!(Level::WARN, err = err.to_string(), "rate refresh failed");
                }
            }
            .instrument(span)
            .await;
        }
    }
}
