//! PollerActor - Probes one target forever
//!
//! ## Message Flow
//!
//! ```text
//! Startup jitter → Probe target → Build Round → Submit to historian → Sleep
//!                       ↑                                              │
//!                       └──────────────────────────────────────────────┘
//!          Commands (PollNow, Shutdown) are served while sleeping
//! ```
//!
//! A failed probe is still a round: it is recorded as a total loss so the
//! target keeps showing up in reports. Only output that cannot be reduced to
//! statistics is dropped, with a diagnostic.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, trace, warn};

use crate::probe::{ProbeParams, Prober};

use super::{historian::HistorianHandle, messages::PollerCommand};

/// Wait used when a delay does not fit into an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Actor that probes a single target
pub struct PollerActor {
    target: String,

    prober: Arc<dyn Prober>,

    params: ProbeParams,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<PollerCommand>,

    historian: HistorianHandle,

    /// Pause between two rounds
    interval_duration: Duration,

    /// Delay before the very first round
    startup_delay: Duration,
}

impl PollerActor {
    pub fn new(
        target: String,
        prober: Arc<dyn Prober>,
        params: ProbeParams,
        interval_duration: Duration,
        startup_delay: Duration,
        command_rx: mpsc::Receiver<PollerCommand>,
        historian: HistorianHandle,
    ) -> Self {
        Self {
            target,
            prober,
            params,
            command_rx,
            historian,
            interval_duration,
            startup_delay,
        }
    }

    /// Run the actor's main loop
    ///
    /// This runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    /// - The historian is gone
    #[instrument(skip(self), fields(target = %self.target))]
    pub async fn run(mut self) {
        debug!("starting poller, first round in {:?}", self.startup_delay);

        let mut next_round = after(self.startup_delay);

        loop {
            tokio::select! {
                _ = sleep_until(next_round) => {
                    if let Err(e) = self.poll().await {
                        warn!("historian unavailable, stopping poller: {e:#}");
                        break;
                    }
                    next_round = after(self.interval_duration);
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::PollNow { respond_to } => {
                            debug!("received PollNow command");
                            let result = self.poll().await;
                            let _ = respond_to.send(result);
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("poller stopped");
    }

    /// Run one round and hand it to the historian
    ///
    /// Probe failures are folded into the round; only a dead historian is an
    /// error.
    async fn poll(&self) -> Result<()> {
        let issued_at = Utc::now();
        trace!("probing {}", self.target);

        let round = match self.prober.probe(&self.target, &self.params).await {
            Ok(report) => report.into_round(self.target.clone(), issued_at),
            Err(e) if e.counts_as_loss() => {
                debug!("{}: {e}", self.target);
                crate::Round::failed(self.target.clone(), issued_at, self.params.count)
            }
            Err(e) => {
                warn!("{}: discarding round: {e}", self.target);
                return Ok(());
            }
        };

        self.historian
            .submit(round)
            .await
            .context("failed to submit round")
    }
}

/// Instant `delay` from now, pushed out to the far future instead of overflowing
fn after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Handle for controlling a PollerActor
#[derive(Clone)]
pub struct PollerHandle {
    /// Command sender
    sender: mpsc::Sender<PollerCommand>,
}

impl PollerHandle {
    /// Spawn a new poller actor for `target`
    pub fn spawn(
        target: String,
        prober: Arc<dyn Prober>,
        params: ProbeParams,
        interval: Duration,
        startup_delay: Duration,
        historian: HistorianHandle,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = PollerActor::new(
            target,
            prober,
            params,
            interval,
            startup_delay,
            cmd_rx,
            historian,
        );

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Trigger an immediate round
    pub async fn poll_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Gracefully shut down the poller
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PollerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
