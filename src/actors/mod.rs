//! Actor-based monitoring system
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │ pingwatch (main)│
//!                    └────────┬────────┘
//!                             │ spawns
//!                ┌────────────┼────────────┐
//!                │            │            │
//!        ┌───────▼───────┐    │    ┌───────▼───────┐
//!        │   Poller-1    │    │    │   Poller-N    │
//!        │  (target A)   │    │    │  (target N)   │
//!        └───────┬───────┘    │    └───────┬───────┘
//!                │ Submit     │            │ Submit
//!                └────────────┼────────────┘
//!                             │
//!                   ┌─────────▼──────────┐
//!                   │  HistorianActor    │◄──── Report / Drill / Snapshot
//!                   │  (owns histories)  │      (console commands, API)
//!                   └─────────┬──────────┘
//!                             │ broadcast AlertEvent
//!                   ┌─────────▼──────────┐
//!                   │   ConsoleActor     │──► stdout
//!                   └────────────────────┘
//! ```
//!
//! ## Actor Types
//!
//! - **PollerActor**: Probes one target per round at the configured interval
//! - **HistorianActor**: Stores rounds, computes tallies, raises alerts
//! - **ConsoleActor**: Serializes every line of program output
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Events**: Alerts go out on a broadcast channel for fan-out
//! 3. **Request/Response**: oneshot channels for queries

pub mod console;
pub mod historian;
pub mod messages;
pub mod poller;
