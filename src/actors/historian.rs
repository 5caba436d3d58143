//! HistorianActor - Sole owner of every target's round history
//!
//! ## Ownership
//!
//! Histories live inside this actor and nowhere else. Pollers submit rounds
//! and report consumers query tallies through the command channel; commands
//! are handled strictly one after another, so no history is ever touched by
//! two operations at once and no lock is needed around it.
//!
//! ## Message Flow
//!
//! ```text
//! Poller-1 ─┐                                   ┌─→ console
//! Poller-N ─┼─ Submit ─→ validate → evaluate →  │
//!           │            store → (alert) ───────┼─→ broadcast AlertEvent
//! Reports ──┴─ Report / Drill / Snapshot ─→ oneshot answer
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{Local, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

use crate::{
    Round,
    alerts::{AlertEvent, AlertManager, last_reply_line},
    config::Thresholds,
    context::Context,
    history::History,
    monitors::AlertState,
    tally::Tally,
};

use super::messages::{HistorianCommand, HistorianStats};

pub struct HistorianActor {
    /// Per-target history, created on the first round for a target
    histories: HashMap<String, History>,

    /// Rounds kept per target
    capacity: usize,

    alerts: AlertManager,

    context: Arc<Context>,

    /// Command receiver
    command_rx: mpsc::Receiver<HistorianCommand>,

    /// Broadcast sender for the alert stream
    alert_tx: broadcast::Sender<AlertEvent>,

    stats: HistorianStats,
}

impl HistorianActor {
    pub fn new(
        capacity: usize,
        thresholds: Thresholds,
        context: Arc<Context>,
        command_rx: mpsc::Receiver<HistorianCommand>,
        alert_tx: broadcast::Sender<AlertEvent>,
    ) -> Self {
        debug!("creating historian keeping {capacity} rounds per target");

        Self {
            histories: HashMap::new(),
            capacity,
            alerts: AlertManager::new(thresholds),
            context,
            command_rx,
            alert_tx,
            stats: HistorianStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives or every handle is dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting historian actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                HistorianCommand::Submit { round } => self.submit(round),

                HistorianCommand::Report { respond_to } => {
                    let _ = respond_to.send(self.report());
                }

                HistorianCommand::Drill { target, respond_to } => {
                    let _ = respond_to.send(self.drill(&target));
                }

                HistorianCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.snapshot());
                }

                HistorianCommand::GetStats { respond_to } => {
                    let _ = respond_to.send(self.get_stats());
                }

                HistorianCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("historian actor stopped");
    }

    /// Validate, evaluate and store one round, publishing an alert if needed
    #[instrument(skip(self, round), fields(target = %round.target))]
    fn submit(&mut self, round: Round) {
        if let Err(e) = round.validate() {
            warn!("dropping invalid round: {e}");
            self.stats.rejected += 1;
            return;
        }

        let state = AlertState::evaluate(&round, self.alerts.thresholds());
        trace!(
            "round {}/{} → {state:?}",
            round.packets_received, round.packets_sent
        );

        let capacity = self.capacity;
        let history = self
            .histories
            .entry(round.target.clone())
            .or_insert_with(|| History::new(capacity));

        // alerts are composed after the round is in, so the drill-down
        // tally includes it
        let alert_round = state.is_alert().then(|| round.clone());
        history.push(round);
        self.stats.accepted += 1;

        let Some(round) = alert_round else {
            return;
        };

        let tally = Tally::from_history(&round.target, history);
        let event = self
            .alerts
            .compose(&round, state, &tally, &self.context, Local::now());
        debug!("{}", event.lines.join(" | "));
        self.stats.alerts += 1;

        // It's OK if nobody listens to the alert stream
        if self.alert_tx.send(event).is_err() {
            trace!("no receivers for alert event");
        }
    }

    fn sorted_tallies(&self) -> Vec<Tally> {
        let mut tallies = self
            .histories
            .iter()
            .map(|(target, history)| Tally::from_history(target, history))
            .collect::<Vec<_>>();
        tallies.sort_by(|a, b| a.target.cmp(&b.target));
        tallies
    }

    fn report(&self) -> Vec<String> {
        self.sorted_tallies()
            .iter()
            .map(|tally| tally.summary_line(self.context.name_width))
            .collect()
    }

    fn drill(&self, target: &str) -> Vec<String> {
        let Some(history) = self.histories.get(target) else {
            return vec![Tally::pending(target).drill_line()];
        };

        let tally = Tally::from_history(target, history);
        let mut lines = vec![tally.drill_line()];

        if history.latest().is_some_and(|r| !r.has_replies()) {
            lines.push(last_reply_line(tally.last_reply, &self.context, Utc::now()));
        }

        lines
    }

    fn snapshot(&self) -> Vec<Tally> {
        self.sorted_tallies()
    }

    fn get_stats(&self) -> HistorianStats {
        HistorianStats {
            targets: self.histories.len(),
            stored_rounds: self.histories.values().map(History::len).sum(),
            ..self.stats.clone()
        }
    }
}

/// Handle for talking to the HistorianActor
///
/// Cheap to clone; every poller and report consumer holds one.
#[derive(Clone)]
pub struct HistorianHandle {
    sender: mpsc::Sender<HistorianCommand>,
}

impl HistorianHandle {
    /// Spawn the historian actor
    pub fn spawn(
        capacity: usize,
        thresholds: Thresholds,
        context: Arc<Context>,
        alert_tx: broadcast::Sender<AlertEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);

        let actor = HistorianActor::new(capacity, thresholds, context, cmd_rx, alert_tx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Hand a finished round to the historian
    pub async fn submit(&self, round: Round) -> Result<()> {
        self.sender
            .send(HistorianCommand::Submit { round })
            .await
            .context("failed to send Submit command")
    }

    /// Summary lines for every target, sorted by target name
    pub async fn report(&self) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HistorianCommand::Report { respond_to: tx })
            .await
            .context("failed to send Report command")?;

        rx.await.context("failed to receive report")
    }

    /// Drill-down lines for one target
    pub async fn drill(&self, target: impl Into<String>) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HistorianCommand::Drill {
                target: target.into(),
                respond_to: tx,
            })
            .await
            .context("failed to send Drill command")?;

        rx.await.context("failed to receive drill-down")
    }

    /// Structured tallies for every target
    pub async fn snapshot(&self) -> Result<Vec<Tally>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HistorianCommand::Snapshot { respond_to: tx })
            .await
            .context("failed to send Snapshot command")?;

        rx.await.context("failed to receive snapshot")
    }

    pub async fn get_stats(&self) -> Option<HistorianStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HistorianCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Shutdown the historian actor
    pub async fn shutdown(&self) {
        let _ = self.sender.send(HistorianCommand::Shutdown).await;
    }
}
