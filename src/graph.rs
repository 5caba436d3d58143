//! Alerts per hour of day, drawn from a saved alert log

use std::io::{self, BufRead};
use std::sync::LazyLock;

use regex::Regex;

/// Matches primary alert lines and captures the hour of their timestamp
static ALERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]{2}\s+\d{1,2}\s+(\d{2}):\d{2}:\d{2}\s+\S+:\s+(?:packet loss|jitter)\b")
        .expect("alert line regex is valid")
});

/// Widest bar drawn for a single hour
const BAR_WIDTH: usize = 100;

/// Hour of day of an alert line, `None` for any other line
pub fn alert_hour(line: &str) -> Option<usize> {
    let captures = ALERT_RE.captures(line)?;
    let hour = captures[1].parse::<usize>().ok()?;
    (hour < 24).then_some(hour)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyCounts {
    counts: [usize; 24],
}

impl HourlyCounts {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = Self::default();
        for hour in lines.into_iter().filter_map(|l| alert_hour(l.as_ref())) {
            counts.counts[hour] += 1;
        }
        counts
    }

    pub fn read(reader: impl BufRead) -> io::Result<Self> {
        let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
        Ok(Self::from_lines(lines))
    }

    pub fn count(&self, hour: usize) -> usize {
        self.counts.get(hour).copied().unwrap_or(0)
    }

    pub fn busiest(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// One row per hour, bars scaled so that `max` alerts fill the full width
    ///
    /// Without `max` the busiest hour fills it. Hours above `max` are capped.
    pub fn render(&self, max: Option<usize>) -> Vec<String> {
        let scale = max.filter(|m| *m > 0).unwrap_or_else(|| self.busiest());

        self.counts
            .iter()
            .enumerate()
            .map(|(hour, &count)| {
                if count == 0 || scale == 0 {
                    return format!("{hour:02} {count:>6}");
                }
                let width = (count * BAR_WIDTH / scale).min(BAR_WIDTH);
                format!("{hour:02} {count:>6} {}", "*".repeat(width))
            })
            .collect()
    }
}
