//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to one actor via mpsc
//! 2. **Events**: Alerts are broadcast to every interested subscriber
//! 3. **Request/Response**: Queries carry a oneshot sender for the answer

use tokio::sync::oneshot;

use crate::{Round, tally::Tally};

/// Commands that can be sent to a PollerActor
#[derive(Debug)]
pub enum PollerCommand {
    /// Run a round right away (bypassing the interval timer)
    ///
    /// The answer tells whether the round reached the historian.
    PollNow {
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Stop after any round in flight
    Shutdown,
}

/// Commands that can be sent to the HistorianActor
///
/// The historian handles exactly one command at a time, so a query either
/// fully precedes or fully follows any submit.
#[derive(Debug)]
pub enum HistorianCommand {
    /// Ingest the result of one probe round
    Submit { round: Round },

    /// One summary line per target, sorted by target name
    Report {
        respond_to: oneshot::Sender<Vec<String>>,
    },

    /// Drill-down lines for a single target
    Drill {
        target: String,
        respond_to: oneshot::Sender<Vec<String>>,
    },

    /// Structured tallies for every known target, sorted by target name
    Snapshot {
        respond_to: oneshot::Sender<Vec<Tally>>,
    },

    /// Counters describing the historian itself
    GetStats {
        respond_to: oneshot::Sender<HistorianStats>,
    },

    /// Gracefully shut down the historian
    Shutdown,
}

/// Historian statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorianStats {
    /// Targets with at least one stored round
    pub targets: usize,

    /// Rounds currently held across all histories
    pub stored_rounds: usize,

    /// Rounds accepted since startup
    pub accepted: u64,

    /// Rounds dropped as invalid since startup
    pub rejected: u64,

    /// Alerts published since startup
    pub alerts: u64,
}

/// Commands that can be sent to the ConsoleActor
#[derive(Debug)]
pub enum ConsoleCommand {
    /// Write a group of lines without interleaving anything else
    Print { lines: Vec<String> },

    /// Answer once everything sent before has been written out
    Flush { respond_to: oneshot::Sender<()> },

    /// Gracefully shut down the console
    Shutdown,
}
