//! Concurrency and race condition tests
//!
//! These tests verify that the historian stays consistent under concurrent use:
//! - Many tasks submitting for different targets at once
//! - Queries racing with submits
//! - Several pollers sharing one historian

use std::time::Duration;

use futures::future::join_all;
use pingwatch::{actors::poller::PollerHandle, probe::ProbeParams};

use crate::helpers::*;

#[tokio::test]
async fn test_concurrent_targets_do_not_corrupt_each_other() {
    let (historian, _alerts) = spawn_historian(20, &["left", "right"]);

    let tasks = ["left", "right"].map(|target| {
        let historian = historian.clone();
        tokio::spawn(async move {
            for i in 0..50u32 {
                // left loses one packet every round, right never does
                let received = if target == "left" { 9 } else { 10 };
                historian.submit(round(target, 10, received)).await.unwrap();
                if i % 7 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        })
    });
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = historian.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 2);

    let (left, right) = (&snapshot[0], &snapshot[1]);
    assert_eq!(left.target, "left");
    assert_eq!(left.rounds, 20);
    assert_eq!(left.total_pings, 200);
    assert_eq!(left.total_pongs, 180);
    assert_eq!(left.loss_percent, 10);

    assert_eq!(right.target, "right");
    assert_eq!(right.rounds, 20);
    assert_eq!(right.total_pongs, 200);
    assert_eq!(right.loss_percent, 0);

    let stats = historian.get_stats().await.unwrap();
    assert_eq!(stats.accepted, 100);
    assert_eq!(stats.stored_rounds, 40);
}

#[tokio::test]
async fn test_queries_race_with_submits() {
    let targets = ["delta", "alpha", "charlie", "bravo"];
    let (historian, _alerts) = spawn_historian(10, &targets);

    let submitter = {
        let historian = historian.clone();
        tokio::spawn(async move {
            for _ in 0..25 {
                for target in targets {
                    historian.submit(round(target, 10, 10)).await.unwrap();
                }
            }
        })
    };

    let queries = (0..20).map(|_| {
        let historian = historian.clone();
        async move {
            let report = historian.report().await.unwrap();
            let mut sorted = report.clone();
            sorted.sort();
            assert_eq!(report, sorted, "report lines must be ordered by target");

            for tally in historian.snapshot().await.unwrap() {
                assert!(tally.rounds <= 10);
                assert_eq!(tally.total_pings, tally.rounds as u64 * 10);
            }
        }
    });
    join_all(queries).await;
    submitter.await.unwrap();

    let report = historian.report().await.unwrap();
    let names = report
        .iter()
        .map(|line| line.split_whitespace().next().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["alpha", "bravo", "charlie", "delta"]);
}

#[tokio::test]
async fn test_scheduled_pollers_share_historian() {
    let (historian, _alerts) = spawn_historian(100, &["a", "b", "c"]);
    let prober = ScriptedProber::new();
    for target in ["a", "b", "c"] {
        for _ in 0..100 {
            prober.push(target, Ok(report(4, 4)));
        }
    }

    let pollers = ["a", "b", "c"]
        .iter()
        .map(|target| {
            PollerHandle::spawn(
                target.to_string(),
                prober.clone(),
                ProbeParams::default(),
                Duration::from_millis(10),
                Duration::ZERO,
                historian.clone(),
            )
        })
        .collect::<Vec<_>>();

    tokio::time::sleep(Duration::from_millis(200)).await;
    join_all(pollers.iter().map(PollerHandle::shutdown)).await;

    let snapshot = historian.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 3);
    for tally in snapshot {
        assert!(tally.rounds >= 3, "{} only ran {} rounds", tally.target, tally.rounds);
        assert_eq!(tally.total_pings, tally.total_pongs);
        assert_eq!(tally.loss_percent, 0);
    }
}
