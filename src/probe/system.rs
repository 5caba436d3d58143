use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{instrument, trace};

use super::{ProbeError, ProbeParams, ProbeReport, Prober, parse::parse_output};

/// Probes targets with the operating system's `ping` binary
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(target: &str, params: &ProbeParams) -> Vec<String> {
        vec![
            "-n".to_string(),
            "-c".to_string(),
            params.count.to_string(),
            "-i".to_string(),
            format!("{}", params.interval.as_secs_f64()),
            "-s".to_string(),
            params.size.to_string(),
            "-W".to_string(),
            params.timeout.as_secs().max(1).to_string(),
            target.to_string(),
        ]
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for SystemPing {
    #[instrument(skip(self, params))]
    async fn probe(&self, target: &str, params: &ProbeParams) -> Result<ProbeReport, ProbeError> {
        let deadline = params.round_deadline();

        let child = Command::new(&self.program)
            .args(Self::args(target, params))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(deadline, child)
            .await
            .map_err(|_| ProbeError::TimedOut(deadline))?
            .map_err(|e| ProbeError::Failed(format!("could not run {}: {e}", self.program)))?;

        let raw = String::from_utf8_lossy(&output.stdout);
        trace!("{} exited with {}", self.program, output.status);

        match parse_output(&raw, params.count) {
            // ping exits non-zero on total loss but still prints a summary
            Ok(report) => Ok(report),
            Err(ProbeError::Malformed(_)) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let reason = stderr.trim();
                Err(ProbeError::Failed(if reason.is_empty() {
                    format!("{} exited with {}", self.program, output.status)
                } else {
                    reason.to_string()
                }))
            }
            Err(e) => Err(e),
        }
    }
}
