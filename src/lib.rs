pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod alerts;
pub mod config;
pub mod context;
pub mod graph;
pub mod history;
pub mod monitors;
pub mod probe;
pub mod tally;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of one batch of echo probes against one target.
///
/// A round is immutable once the poller has built it. The historian copies it
/// into the target's history and never touches it again until it is
/// overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub target: String,
    pub issued_at: DateTime<Utc>,

    /// Round-trip time per sequence number in milliseconds, `None` for lost
    /// packets. Length equals the configured packet count.
    pub rtts: Vec<Option<f64>>,

    pub packets_sent: u32,
    pub packets_received: u32,

    /// Summary statistics, absent when no reply came back.
    pub stats: Option<RttStats>,

    /// Raw probe output, kept for verbose diagnostics only.
    #[serde(skip)]
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttStats {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub mdev_ms: f64,
}

/// Reasons a round is rejected before it reaches a history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundError {
    #[error("no packets were transmitted")]
    NothingSent,

    #[error("received {received} replies for {sent} packets")]
    TooManyReplies { sent: u32, received: u32 },

    #[error("statistics present without any reply")]
    StatsWithoutReplies,

    #[error("invalid round-trip statistics: {0}")]
    InvalidStats(String),
}

impl Round {
    /// Round for a probe that could not be carried out at all.
    ///
    /// Every packet counts as lost so an unreachable target shows up as 100%
    /// loss instead of disappearing from reports.
    pub fn failed(target: impl Into<String>, issued_at: DateTime<Utc>, packets: u32) -> Self {
        Self {
            target: target.into(),
            issued_at,
            rtts: vec![None; packets as usize],
            packets_sent: packets,
            packets_received: 0,
            stats: None,
            raw: String::new(),
        }
    }

    pub fn lost(&self) -> u32 {
        self.packets_sent.saturating_sub(self.packets_received)
    }

    pub fn has_replies(&self) -> bool {
        self.packets_received > 0
    }

    /// Average round-trip time, only if it is a usable positive number.
    pub fn avg_ms(&self) -> Option<f64> {
        self.stats
            .map(|s| s.avg_ms)
            .filter(|avg| avg.is_finite() && *avg > 0.0)
    }

    pub fn validate(&self) -> Result<(), RoundError> {
        if self.packets_sent == 0 {
            return Err(RoundError::NothingSent);
        }

        if self.packets_received > self.packets_sent {
            return Err(RoundError::TooManyReplies {
                sent: self.packets_sent,
                received: self.packets_received,
            });
        }

        let Some(stats) = self.stats else {
            return Ok(());
        };

        if self.packets_received == 0 {
            return Err(RoundError::StatsWithoutReplies);
        }

        let RttStats {
            min_ms,
            avg_ms,
            max_ms,
            mdev_ms,
        } = stats;

        if [min_ms, avg_ms, max_ms, mdev_ms]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(RoundError::InvalidStats(format!(
                "{min_ms}/{avg_ms}/{max_ms}/{mdev_ms}"
            )));
        }

        if min_ms > max_ms {
            return Err(RoundError::InvalidStats(format!(
                "min {min_ms} exceeds max {max_ms}"
            )));
        }

        Ok(())
    }
}
