//! Helper functions for integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use pingwatch::{
    Round, RttStats,
    actors::historian::HistorianHandle,
    alerts::AlertEvent,
    config::Thresholds,
    context::Context,
    probe::{ProbeError, ProbeParams, ProbeReport, Prober},
};
use tokio::sync::broadcast;

/// Prober answering from a per-target script
///
/// Once a target's script runs dry every further probe fails.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<Result<ProbeReport, ProbeError>>>>,
}

impl ScriptedProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, target: &str, outcome: Result<ProbeReport, ProbeError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &str, _params: &ProbeParams) -> Result<ProbeReport, ProbeError> {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ProbeError::Failed("script exhausted".to_string())))
    }
}

pub fn stats(avg_ms: f64, mdev_ms: f64) -> RttStats {
    RttStats {
        min_ms: avg_ms / 2.0,
        avg_ms,
        max_ms: avg_ms * 2.0 + mdev_ms,
        mdev_ms,
    }
}

/// Probe report with `received` replies averaging 10ms
pub fn report(sent: u32, received: u32) -> ProbeReport {
    ProbeReport {
        packets_sent: sent,
        packets_received: received,
        rtts: (0..sent)
            .map(|i| (i < received).then_some(10.0))
            .collect(),
        stats: (received > 0).then(|| stats(10.0, 1.0)),
        raw: format!("{sent} packets transmitted, {received} received"),
    }
}

pub fn round(target: &str, sent: u32, received: u32) -> Round {
    report(sent, received).into_round(target, Utc::now())
}

pub fn round_with_stats(target: &str, avg_ms: f64, mdev_ms: f64) -> Round {
    Round {
        stats: Some(stats(avg_ms, mdev_ms)),
        ..round(target, 10, 10)
    }
}

pub fn spawn_historian(
    capacity: usize,
    targets: &[&str],
) -> (HistorianHandle, broadcast::Receiver<AlertEvent>) {
    let targets = targets.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    let context = Arc::new(Context::new(&targets, false));
    let (alert_tx, alert_rx) = broadcast::channel(256);
    let historian = HistorianHandle::spawn(capacity, Thresholds::default(), context, alert_tx);
    (historian, alert_rx)
}
