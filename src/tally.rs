//! Rolling statistics over a target's history
//!
//! A [`Tally`] is recomputed from scratch on every query and never stored.
//! Every figure that cannot be computed is `None` rather than NaN, and text
//! rendering shows it as `-`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Round, history::History};

/// Indentation for lines that elaborate on a preceding line
pub const DRILL_PREFIX: &str = "                ↳ ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub target: String,

    /// Rounds currently in the window
    pub rounds: usize,

    pub total_pings: u64,
    pub total_pongs: u64,

    /// Always within `0..=100`, 100 when nothing was sent
    pub loss_percent: u8,

    /// Mean of the per-round averages
    pub avg_rtt_ms: Option<f64>,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,

    /// Median of the per-round standard deviations
    pub mdev_ms: Option<f64>,

    /// Issue time of the newest round that got at least one reply
    pub last_reply: Option<DateTime<Utc>>,

    /// No round has been recorded for this target yet
    pub pending: bool,
}

impl Tally {
    pub fn pending(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rounds: 0,
            total_pings: 0,
            total_pongs: 0,
            loss_percent: 100,
            avg_rtt_ms: None,
            min_rtt_ms: None,
            max_rtt_ms: None,
            mdev_ms: None,
            last_reply: None,
            pending: true,
        }
    }

    pub fn from_history(target: &str, history: &History) -> Self {
        Self::compute(target, history.iter())
    }

    pub fn compute<'a>(target: &str, rounds: impl IntoIterator<Item = &'a Round>) -> Self {
        let mut tally = Self::pending(target);
        let mut averages = vec![];
        let mut deviations = vec![];

        for round in rounds {
            tally.rounds += 1;
            tally.total_pings += u64::from(round.packets_sent);
            tally.total_pongs += u64::from(round.packets_received);

            if round.has_replies() {
                tally.last_reply = tally.last_reply.max(Some(round.issued_at));
            }

            let Some(stats) = round.stats else {
                continue;
            };

            averages.extend(round.avg_ms());
            deviations.push(stats.mdev_ms);
            tally.min_rtt_ms = Some(tally.min_rtt_ms.map_or(stats.min_ms, |m| m.min(stats.min_ms)));
            tally.max_rtt_ms = Some(tally.max_rtt_ms.map_or(stats.max_ms, |m| m.max(stats.max_ms)));
        }

        tally.pending = tally.rounds == 0;
        tally.loss_percent = loss_percent(tally.total_pings, tally.total_pongs);
        tally.avg_rtt_ms = mean(&averages);
        tally.mdev_ms = median(&mut deviations);

        tally
    }

    /// One row of the full report, target padded to `name_width`
    pub fn summary_line(&self, name_width: usize) -> String {
        if self.pending {
            return format!("{:<name_width$} pending, no rounds yet", self.target);
        }

        format!(
            "{:<name_width$} {:>6}/{:<6} {:>3}% loss {:>8} ms avg, {:>8} ms mdev",
            self.target,
            self.total_pongs,
            self.total_pings,
            self.loss_percent,
            render_ms(self.avg_rtt_ms),
            render_ms(self.mdev_ms),
        )
    }

    /// Indented single-target line used for alerts and target queries
    pub fn drill_line(&self) -> String {
        if self.pending {
            return format!("{DRILL_PREFIX}{} pending, no rounds yet", self.target);
        }

        format!(
            "{DRILL_PREFIX}{} {}/{} {}% loss, {} ms avg, {} ms mdev",
            self.target,
            self.total_pongs,
            self.total_pings,
            self.loss_percent,
            render_ms(self.avg_rtt_ms),
            render_ms(self.mdev_ms),
        )
    }
}

/// `100 - round(pongs / pings × 100)`, clamped to `0..=100`
pub fn loss_percent(pings: u64, pongs: u64) -> u8 {
    if pings == 0 {
        return 100;
    }

    let delivered = (pongs as f64 / pings as f64 * 100.0).round() as i64;
    (100 - delivered).clamp(0, 100) as u8
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    mean.is_finite().then_some(mean)
}

/// Upper median, robust against a few outlier rounds
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    Some(values[values.len() / 2])
}

pub fn render_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
