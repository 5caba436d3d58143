//! Probe adapter
//!
//! Runs one round of echo probes against one target. The rest of the crate
//! only sees the [`Prober`] trait; [`SystemPing`] is the implementation used
//! by the binary, tests plug in scripted probers.

pub mod parse;
pub mod system;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Round, RttStats};

pub use system::SystemPing;

/// Parameters for one round of probes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeParams {
    /// Packets per round
    pub count: u32,

    /// Delay between two packets
    pub interval: Duration,

    /// Payload size in bytes
    pub size: u32,

    /// How long to wait for the last reply
    pub timeout: Duration,
}

impl ProbeParams {
    /// Upper bound for a whole round, after which the probe is abandoned
    pub fn round_deadline(&self) -> Duration {
        self.interval
            .saturating_mul(self.count)
            .saturating_add(self.timeout)
            .saturating_add(Duration::from_secs(1))
    }
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            count: 10,
            interval: Duration::from_secs(1),
            size: 56,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of one successful probe invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub rtts: Vec<Option<f64>>,
    pub stats: Option<RttStats>,
    pub raw: String,
}

impl ProbeReport {
    pub fn into_round(self, target: impl Into<String>, issued_at: DateTime<Utc>) -> Round {
        Round {
            target: target.into(),
            issued_at,
            rtts: self.rtts,
            packets_sent: self.packets_sent,
            packets_received: self.packets_received,
            stats: self.stats,
            raw: self.raw,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe could not be carried out (spawn failure, unknown host, ...)
    #[error("probe failed: {0}")]
    Failed(String),

    /// The probe did not finish within the round deadline
    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),

    /// The probe ran but its output could not be reduced to statistics
    #[error("malformed probe output: {0}")]
    Malformed(String),
}

impl ProbeError {
    /// Whether the round should still be recorded as a total loss
    pub fn counts_as_loss(&self) -> bool {
        !matches!(self, ProbeError::Malformed(_))
    }
}

/// Executes echo probes against a target
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str, params: &ProbeParams) -> Result<ProbeReport, ProbeError>;
}
