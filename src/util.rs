use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use rand::Rng;

const WEB_PORT: &str = "PINGWATCH_WEB_PORT";

const DEFAULT_PORT: u16 = 9444;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

/// Port from the environment, falling back to the configured one
pub fn get_port(configured: u16) -> u16 {
    let port_from_env = std::env::var(WEB_PORT);
    port_from_env.map_or(configured, |res| res.parse().unwrap_or(configured))
}

const WEB_ADDR: &str = "PINGWATCH_WEB_ADDR";

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

pub fn get_default_addr() -> IpAddr {
    DEFAULT_ADDR
}

/// Address from the environment, falling back to the configured one
pub fn get_addr(configured: IpAddr) -> IpAddr {
    let addr_from_env = std::env::var(WEB_ADDR);
    addr_from_env.map_or(configured, |res| res.parse().unwrap_or(configured))
}

/// Per-target stagger window
const STAGGER_STEP: Duration = Duration::from_millis(250);

/// Random startup delay in `[0, 250ms × target_count)`, zero when synchronized
pub fn startup_jitter(target_count: usize, synchronized: bool) -> Duration {
    let window = STAGGER_STEP.as_millis() as u64 * target_count as u64;
    if synchronized || window == 0 {
        return Duration::ZERO;
    }

    Duration::from_millis(rand::thread_rng().gen_range(0..window))
}

/// Compact human rendering such as `1h 2m 3s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3600, rest % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    let mut parts = vec![];
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }

    parts.join(" ")
}
