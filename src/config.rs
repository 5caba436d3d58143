use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::probe::ProbeParams;

/// Config file name looked up in the user's config directory
const CONFIG_FILE_NAME: &str = "pingwatch.json";

/// Environment variable naming an explicit config file
const CONFIG_ENV: &str = "PINGWATCH_CONFIG";

/// Longest accepted `checkInterval`, in seconds (one day)
const MAX_CHECK_INTERVAL: u64 = 86_400;

/// Longest accepted `reportInterval`, in seconds (one week)
const MAX_REPORT_INTERVAL: u64 = 604_800;

const MAX_HISTORY_LENGTH: usize = 100_000;

const MAX_PACKET_COUNT: u32 = 10_000;

/// Longest accepted `packetInterval`, in seconds
const MAX_PACKET_INTERVAL: f64 = 60.0;

/// Longest accepted `packetTimeout`, in seconds
const MAX_PACKET_TIMEOUT: u64 = 3_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub ping: PingConfig,

    pub targets: Vec<String>,
}

/// Bind settings for the HTTP snapshot endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebConfig {
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,

    #[serde(default = "crate::util::get_default_addr")]
    pub ip: IpAddr,

    #[serde(default = "crate::util::get_default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            ip: crate::util::get_default_addr(),
            port: crate::util::get_default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingConfig {
    /// Seconds to wait between two rounds against the same target
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Number of rounds kept per target
    #[serde(default = "default_history_length")]
    pub history_length: usize,

    #[serde(default = "default_packet_count")]
    pub packet_count: u32,

    /// Seconds between two packets of the same round
    #[serde(default = "default_packet_interval")]
    pub packet_interval: f64,

    /// ICMP payload size in bytes
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,

    /// Seconds to wait for the last reply of a round
    #[serde(default = "default_packet_timeout")]
    pub packet_timeout: u64,

    #[serde(default = "default_jitter_multiple")]
    pub jitter_multiple: f64,

    /// Lost packets per round tolerated before a loss alert fires
    #[serde(default = "default_loss_tolerance", alias = "packetThreshold")]
    pub loss_tolerance: u32,

    /// Start every poller at once instead of staggering them
    #[serde(default)]
    pub synchronized: bool,

    /// Seconds between unsolicited full reports, disabled when absent
    #[serde(default)]
    pub report_interval: Option<u64>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            history_length: default_history_length(),
            packet_count: default_packet_count(),
            packet_interval: default_packet_interval(),
            packet_size: default_packet_size(),
            packet_timeout: default_packet_timeout(),
            jitter_multiple: default_jitter_multiple(),
            loss_tolerance: default_loss_tolerance(),
            synchronized: false,
            report_interval: None,
        }
    }
}

impl PingConfig {
    pub fn probe_params(&self) -> ProbeParams {
        ProbeParams {
            count: self.packet_count,
            interval: Duration::try_from_secs_f64(self.packet_interval)
                .unwrap_or_else(|_| Duration::from_secs_f64(default_packet_interval())),
            size: self.packet_size,
            timeout: Duration::from_secs(self.packet_timeout),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            loss_tolerance: self.loss_tolerance,
            jitter_multiple: self.jitter_multiple,
        }
    }
}

/// Alert thresholds applied to every round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub loss_tolerance: u32,
    pub jitter_multiple: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            loss_tolerance: default_loss_tolerance(),
            jitter_multiple: default_jitter_multiple(),
        }
    }
}

fn default_web_enabled() -> bool {
    true
}

fn default_check_interval() -> u64 {
    50
}

fn default_history_length() -> usize {
    100
}

fn default_packet_count() -> u32 {
    10
}

fn default_packet_interval() -> f64 {
    1.0
}

fn default_packet_size() -> u32 {
    56
}

fn default_packet_timeout() -> u64 {
    2
}

fn default_jitter_multiple() -> f64 {
    2.0
}

fn default_loss_tolerance() -> u32 {
    1
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.targets.is_empty() {
            bail!("no targets configured");
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.trim().is_empty() {
                bail!("empty target name");
            }
            if !seen.insert(target.as_str()) {
                bail!("duplicate target {target}");
            }
        }

        self.ping.validate()
    }
}

impl PingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_CHECK_INTERVAL).contains(&self.check_interval) {
            bail!("checkInterval must be between 1 and {MAX_CHECK_INTERVAL} seconds");
        }
        if !(1..=MAX_HISTORY_LENGTH).contains(&self.history_length) {
            bail!("historyLength must be between 1 and {MAX_HISTORY_LENGTH}");
        }
        if !(1..=MAX_PACKET_COUNT).contains(&self.packet_count) {
            bail!("packetCount must be between 1 and {MAX_PACKET_COUNT}");
        }
        if !(self.packet_interval > 0.0 && self.packet_interval <= MAX_PACKET_INTERVAL) {
            bail!("packetInterval must be above 0 and at most {MAX_PACKET_INTERVAL} seconds");
        }
        if self.packet_timeout > MAX_PACKET_TIMEOUT {
            bail!("packetTimeout must be at most {MAX_PACKET_TIMEOUT} seconds");
        }
        if !(self.jitter_multiple.is_finite() && self.jitter_multiple >= 0.0) {
            bail!("jitterMultiple must be a non-negative number");
        }
        if self
            .report_interval
            .is_some_and(|secs| secs > MAX_REPORT_INTERVAL)
        {
            bail!("reportInterval must be at most {MAX_REPORT_INTERVAL} seconds");
        }

        Ok(())
    }
}

/// Config file used when none is passed on the command line
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config =
        serde_json::from_str(content).context("invalid configuration file provided")?;
    config.validate()?;
    Ok(config)
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&file_content).inspect(|config| trace!("loaded config: {config:?}"))
}
