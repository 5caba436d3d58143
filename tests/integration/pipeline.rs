//! Integration tests for the full pipeline
//!
//! These tests verify that actors work correctly together:
//! - Poller → Historian → alert stream
//! - Historian → console output
//! - Unreachable targets stay visible in reports

use std::sync::Arc;
use std::time::Duration;

use pingwatch::{
    actors::{console::ConsoleHandle, poller::PollerHandle},
    probe::{ProbeError, ProbeParams},
    tally::DRILL_PREFIX,
};
use pretty_assertions::assert_eq;
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast::error::TryRecvError;

use crate::helpers::*;

fn spawn_poller(
    target: &str,
    prober: Arc<ScriptedProber>,
    historian: pingwatch::actors::historian::HistorianHandle,
) -> PollerHandle {
    PollerHandle::spawn(
        target.to_string(),
        prober,
        ProbeParams::default(),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
        historian,
    )
}

#[tokio::test]
async fn test_three_rounds_end_to_end() {
    let (historian, mut alerts) = spawn_historian(100, &["a"]);
    let prober = ScriptedProber::new();
    prober.push("a", Ok(report(10, 10)));
    prober.push("a", Ok(report(10, 10)));
    prober.push("a", Ok(report(10, 7)));
    let poller = spawn_poller("a", prober, historian.clone());

    for _ in 0..2 {
        poller.poll_now().await.unwrap();
    }
    // two clean rounds do not alert
    historian.snapshot().await.unwrap();
    assert_eq!(alerts.try_recv().unwrap_err(), TryRecvError::Empty);

    poller.poll_now().await.unwrap();

    let tally = historian.snapshot().await.unwrap().remove(0);
    assert_eq!(tally.total_pings, 30);
    assert_eq!(tally.total_pongs, 27);
    assert_eq!(tally.loss_percent, 10);
    assert_eq!(tally.rounds, 3);

    let event = alerts.recv().await.unwrap();
    assert!(event.state.loss_exceeded);
    assert_eq!(event.lines.len(), 2);
    assert!(event.lines[0].ends_with(" a: packet loss 3/10 (tolerance 1)"));
    assert_eq!(
        event.lines[1],
        format!("{DRILL_PREFIX}a 27/30 10% loss, 10.00 ms avg, 1.00 ms mdev")
    );

    poller.shutdown().await.unwrap();
    historian.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_target_stays_in_report() {
    let (historian, mut alerts) = spawn_historian(100, &["dead", "live"]);
    let prober = ScriptedProber::new();
    prober.push("live", Ok(report(10, 10)));
    prober.push("dead", Err(ProbeError::TimedOut(Duration::from_secs(13))));

    let live = spawn_poller("live", prober.clone(), historian.clone());
    let dead = spawn_poller("dead", prober, historian.clone());
    live.poll_now().await.unwrap();
    dead.poll_now().await.unwrap();

    let report = historian.report().await.unwrap();
    assert_eq!(report.len(), 2);
    assert!(report[0].starts_with("dead "));
    assert!(report[0].contains("100% loss"));
    assert!(report[1].starts_with("live "));
    assert!(report[1].contains("  0% loss"));

    let drill = historian.drill("dead").await.unwrap();
    assert_eq!(drill[0], format!("{DRILL_PREFIX}dead 0/10 100% loss, - ms avg, - ms mdev"));
    assert!(drill[1].starts_with(&format!("{DRILL_PREFIX}last reply unknown, at least")));

    let event = alerts.recv().await.unwrap();
    assert_eq!(event.target, "dead");
    assert_eq!(event.lines.len(), 3);

    live.shutdown().await.unwrap();
    dead.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_output_leaves_history_unchanged() {
    let (historian, _alerts) = spawn_historian(100, &["a"]);
    let prober = ScriptedProber::new();
    prober.push("a", Ok(report(10, 10)));
    prober.push("a", Err(ProbeError::Malformed("no summary line".to_string())));
    let poller = spawn_poller("a", prober, historian.clone());

    poller.poll_now().await.unwrap();
    poller.poll_now().await.unwrap();

    let stats = historian.get_stats().await.unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.stored_rounds, 1);
}

#[tokio::test]
async fn test_invalid_round_is_dropped_by_historian() {
    let (historian, _alerts) = spawn_historian(100, &["a"]);

    let mut bogus = round("a", 10, 10);
    bogus.packets_received = 11;
    historian.submit(bogus).await.unwrap();
    historian.submit(round("a", 0, 0)).await.unwrap();

    assert!(historian.snapshot().await.unwrap().is_empty());
    let stats = historian.get_stats().await.unwrap();
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.accepted, 0);
}

#[tokio::test]
async fn test_window_forgets_oldest_rounds() {
    let (historian, _alerts) = spawn_historian(3, &["a"]);

    historian.submit(round("a", 10, 0)).await.unwrap();
    historian.submit(round("a", 10, 0)).await.unwrap();
    for _ in 0..3 {
        historian.submit(round("a", 10, 10)).await.unwrap();
    }

    let tally = historian.snapshot().await.unwrap().remove(0);
    assert_eq!(tally.rounds, 3);
    assert_eq!(tally.total_pings, 30);
    assert_eq!(tally.total_pongs, 30);
    assert_eq!(tally.loss_percent, 0);
}

#[tokio::test]
async fn test_jitter_alert_reaches_console() {
    let (writer, mut reader) = tokio::io::duplex(64 * 1024);
    let (historian, alerts) = spawn_historian(10, &["a"]);
    let console = ConsoleHandle::spawn(writer, alerts, false);

    historian.submit(round_with_stats("a", 20.0, 40.0)).await.unwrap();
    historian.submit(round_with_stats("a", 20.0, 41.0)).await.unwrap();
    historian.get_stats().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    console.flush().await.unwrap();

    let mut buf = vec![0; 64 * 1024];
    let n = reader.read(&mut buf).await.unwrap();
    let output = String::from_utf8_lossy(&buf[..n]).to_string();
    let lines = output.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 2, "only the second round alerts: {output}");
    assert!(lines[0].ends_with(" a: jitter 41.00 ms mdev > 20.00 ms avg × 2"));
    assert_eq!(
        lines[1],
        format!("{DRILL_PREFIX}a 20/20 0% loss, 20.00 ms avg, 41.00 ms mdev")
    );

    console.shutdown().await;
}

#[tokio::test]
async fn test_pending_target_query() {
    let (historian, _alerts) = spawn_historian(10, &["a"]);

    assert!(historian.report().await.unwrap().is_empty());
    assert_eq!(
        historian.drill("a").await.unwrap(),
        vec![format!("{DRILL_PREFIX}a pending, no rounds yet")]
    );
}
