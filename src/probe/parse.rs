//! Reduces `ping` output to a [`ProbeReport`]
//!
//! Understands the iputils and BSD output formats:
//!
//! ```text
//! 64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.512 ms
//! ...
//! 10 packets transmitted, 9 received, 10% packet loss, time 9012ms
//! rtt min/avg/max/mdev = 0.401/0.512/0.733/0.081 ms
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::{ProbeError, ProbeReport};
use crate::RttStats;

static REPLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"icmp_seq=(\d+)\b.*\btime[=<]\s*(\d+(?:\.\d+)?)\s*ms").expect("valid regex")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) packets transmitted, (\d+) (?:packets )?received").expect("valid regex")
});

static RTT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:rtt|round-trip) min/avg/max/(?:mdev|stddev) = (\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?) ms",
    )
    .expect("valid regex")
});

pub fn parse_output(raw: &str, count: u32) -> Result<ProbeReport, ProbeError> {
    let summary = SUMMARY_RE
        .captures(raw)
        .ok_or_else(|| ProbeError::Malformed("no packet summary".to_string()))?;

    let packets_sent = parse_number::<u32>(&summary[1])?;
    let packets_received = parse_number::<u32>(&summary[2])?;

    let rtts = collect_rtts(raw, count, zero_based_sequence(raw, &summary[0]));

    let stats = if packets_received == 0 {
        None
    } else if let Some(m) = RTT_RE.captures(raw) {
        Some(RttStats {
            min_ms: parse_number(&m[1])?,
            avg_ms: parse_number(&m[2])?,
            max_ms: parse_number(&m[3])?,
            mdev_ms: parse_number(&m[4])?,
        })
    } else {
        let samples = rtts.iter().flatten().copied().collect::<Vec<_>>();
        let stats = stats_from_samples(&samples);
        if stats.is_none() {
            return Err(ProbeError::Malformed(format!(
                "{packets_received} replies reported without round-trip times"
            )));
        }
        stats
    };

    Ok(ProbeReport {
        packets_sent,
        packets_received,
        rtts,
        stats,
        raw: raw.to_string(),
    })
}

/// BSD ping numbers packets from 0, iputils from 1
fn zero_based_sequence(raw: &str, summary: &str) -> bool {
    summary.contains("packets received")
        || raw.contains("round-trip")
        || raw.contains("Request timeout for icmp_seq")
        || raw.contains("icmp_seq=0 ")
}

/// Places every reply at its sequence slot, duplicates and strays are dropped
fn collect_rtts(raw: &str, count: u32, zero_based: bool) -> Vec<Option<f64>> {
    let replies = raw
        .lines()
        .filter(|line| !line.contains("DUP!"))
        .filter_map(|line| {
            let m = REPLY_RE.captures(line)?;
            let seq = m[1].parse::<usize>().ok()?;
            let time = m[2].parse::<f64>().ok()?;
            Some((seq, time))
        })
        .collect::<Vec<_>>();

    let base = if zero_based { 0 } else { 1 };

    let mut rtts = vec![None; count as usize];
    for (seq, time) in replies {
        if let Some(slot) = seq.checked_sub(base).and_then(|i| rtts.get_mut(i))
            && slot.is_none()
        {
            *slot = Some(time);
        }
    }

    rtts
}

/// min/avg/max and population standard deviation over defined samples
pub fn stats_from_samples(samples: &[f64]) -> Option<RttStats> {
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let min_ms = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max_ms = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg_ms = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - avg_ms).powi(2)).sum::<f64>() / n;

    Some(RttStats {
        min_ms,
        avg_ms,
        max_ms,
        mdev_ms: variance.sqrt(),
    })
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, ProbeError> {
    s.parse()
        .map_err(|_| ProbeError::Malformed(format!("unparsable number {s:?}")))
}
