//! Process-wide context
//!
//! Created once at startup and handed to the historian and the console. It
//! is never torn down; the process runs until it is killed.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Widest target column used in summary reports
pub const MAX_NAME_WIDTH: usize = 25;

#[derive(Debug, Clone)]
pub struct Context {
    /// When monitoring started
    pub started_at: DateTime<Utc>,

    /// Column width for target names in summary lines
    pub name_width: usize,

    /// Echo raw probe output together with alerts
    pub verbose: bool,
}

impl Context {
    pub fn new(targets: &[String], verbose: bool) -> Self {
        Self {
            started_at: Utc::now(),
            name_width: name_width(targets),
            verbose,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.uptime_at(Utc::now())
    }

    pub fn uptime_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).to_std().unwrap_or_default()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            name_width: MAX_NAME_WIDTH,
            verbose: false,
        }
    }
}

/// Widest target name, capped at [`MAX_NAME_WIDTH`]
pub fn name_width(targets: &[String]) -> usize {
    targets
        .iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH)
}
