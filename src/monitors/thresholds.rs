use serde::{Deserialize, Serialize};

use crate::{Round, config::Thresholds};

/// Threshold verdict for a single round
///
/// ```text
/// lost packets  > loss_tolerance        → loss_exceeded
/// mdev          > avg × jitter_multiple → jitter_exceeded
/// avg missing or zero                   → jitter not checked
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub loss_exceeded: bool,
    pub jitter_exceeded: bool,

    /// False when the round had no usable average to compare against
    pub jitter_checked: bool,
}

impl AlertState {
    pub fn evaluate(round: &Round, thresholds: &Thresholds) -> Self {
        let loss_exceeded = Self::loss_exceeds(
            round.packets_sent,
            round.packets_received,
            thresholds.loss_tolerance,
        );

        let jitter = round.stats.and_then(|stats| {
            Self::jitter_exceeds(round.avg_ms(), stats.mdev_ms, thresholds.jitter_multiple)
        });

        Self {
            loss_exceeded,
            jitter_exceeded: jitter.unwrap_or(false),
            jitter_checked: jitter.is_some(),
        }
    }

    pub fn loss_exceeds(sent: u32, received: u32, tolerance: u32) -> bool {
        sent.saturating_sub(received) > tolerance
    }

    /// `None` when there is no positive average to scale
    pub fn jitter_exceeds(avg_ms: Option<f64>, mdev_ms: f64, multiple: f64) -> Option<bool> {
        let avg_ms = avg_ms.filter(|avg| avg.is_finite() && *avg > 0.0)?;
        Some(mdev_ms > avg_ms * multiple)
    }

    pub fn is_alert(&self) -> bool {
        self.loss_exceeded || self.jitter_exceeded
    }
}
