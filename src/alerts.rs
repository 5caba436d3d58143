//! Alert text composition
//!
//! An alert is a short group of lines printed together:
//!
//! ```text
//! May  1 12:00:00 gw: packet loss 3/10 (tolerance 1)
//!                 ↳ gw 97/100 3% loss, 0.52 ms avg, 0.08 ms mdev
//!                 ↳ last reply 4m 10s ago
//! ```

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::{
    Round,
    config::Thresholds,
    context::Context,
    monitors::AlertState,
    tally::{DRILL_PREFIX, Tally},
    util::format_elapsed,
};

/// Timestamp layout at the start of every primary alert line
pub const TIME_FORMAT: &str = "%b %e %H:%M:%S";

/// One entry of the alert stream
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub state: AlertState,

    /// Primary lines followed by drill-down lines
    pub lines: Vec<String>,

    /// Raw probe output of the offending round
    #[serde(skip)]
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct AlertManager {
    thresholds: Thresholds,
}

impl AlertManager {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Builds the alert for a round that crossed a threshold
    ///
    /// `tally` must already include `round`. The printed stamp uses the time
    /// zone of `now`.
    pub fn compose<Tz>(
        &self,
        round: &Round,
        state: AlertState,
        tally: &Tally,
        context: &Context,
        now: DateTime<Tz>,
    ) -> AlertEvent
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stamp = now.format(TIME_FORMAT);
        let now = now.with_timezone(&Utc);
        let mut lines = vec![];

        if state.loss_exceeded {
            lines.push(format!(
                "{stamp} {}: packet loss {}/{} (tolerance {})",
                round.target,
                round.lost(),
                round.packets_sent,
                self.thresholds.loss_tolerance
            ));
        }

        if state.jitter_exceeded
            && let Some(stats) = round.stats
        {
            lines.push(format!(
                "{stamp} {}: jitter {:.2} ms mdev > {:.2} ms avg × {}",
                round.target, stats.mdev_ms, stats.avg_ms, self.thresholds.jitter_multiple
            ));
        }

        lines.push(tally.drill_line());

        if !round.has_replies() {
            lines.push(last_reply_line(tally.last_reply, context, now));
        }

        AlertEvent {
            target: round.target.clone(),
            timestamp: now,
            state,
            lines,
            raw: round.raw.clone(),
        }
    }
}

pub fn last_reply_line(
    last_reply: Option<DateTime<Utc>>,
    context: &Context,
    now: DateTime<Utc>,
) -> String {
    match last_reply {
        Some(at) => {
            let ago = (now - at).to_std().unwrap_or_default();
            format!("{DRILL_PREFIX}last reply {} ago", format_elapsed(ago))
        }
        None => format!(
            "{DRILL_PREFIX}last reply unknown, at least {}",
            format_elapsed(context.uptime_at(now))
        ),
    }
}
