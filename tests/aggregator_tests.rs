// Aggregator tests: completeness, deadline race, failure isolation

mod common;

use async_trait::async_trait;
use common::{FakeProbes, Scripted, monitor_config};
use fleetstatus::aggregator::Aggregator;
use fleetstatus::collector::{Collector, standard_collectors};
use fleetstatus::health::HealthThresholds;
use fleetstatus::models::*;
use fleetstatus::probe::Reachability;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEADLINE: Duration = Duration::from_secs(10);
const EPSILON: Duration = Duration::from_millis(50);

fn aggregator(probes: FakeProbes) -> Aggregator {
    Aggregator::new(probes.shared(), monitor_config())
}

fn assert_all_kinds_present(snapshot: &StatusSnapshot) {
    for kind in SubsystemKind::ALL {
        assert_eq!(snapshot.systems.get(kind).kind, kind);
    }
    let json = serde_json::to_value(snapshot).unwrap();
    let systems = json["systems"].as_object().unwrap();
    let mut keys: Vec<&str> = systems.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["network", "recording", "sampleExtractor", "storage", "transferService"]
    );
}

#[tokio::test(start_paused = true)]
async fn healthy_fleet_reports_real_states() {
    let snapshot = aggregator(FakeProbes::healthy())
        .get_unified_status(DEADLINE)
        .await;
    assert_all_kinds_present(&snapshot);
    assert!(snapshot.systems.iter().all(|s| s.state != SubsystemState::Unknown));
    assert_eq!(snapshot.systems.recording.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.transfer_service.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.sample_extractor.state, SubsystemState::Idle);
    assert_eq!(snapshot.systems.storage.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.network.state, SubsystemState::Running);
    assert_eq!(snapshot.overall.severity, Severity::Healthy);
    assert_eq!(snapshot.overall.summary, "3 recording");
}

#[tokio::test(start_paused = true)]
async fn hanging_probe_is_cut_off_at_deadline() {
    let mut probes = FakeProbes::healthy();
    probes.reachability = Scripted::Hang;
    let agg = aggregator(probes);

    let started = Instant::now();
    let snapshot = agg.get_unified_status(DEADLINE).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= DEADLINE);
    assert!(elapsed <= DEADLINE + EPSILON, "took {:?}", elapsed);
    assert_all_kinds_present(&snapshot);
    assert_eq!(snapshot.systems.network.state, SubsystemState::Unknown);
    assert_eq!(snapshot.systems.network.message.as_deref(), Some("timed out"));
    assert_eq!(snapshot.overall.severity, Severity::Error);
    assert_eq!(
        snapshot.overall.issues.last().map(String::as_str),
        Some("Status check timeout: network")
    );
    // Finished collectors keep their real results.
    assert_eq!(snapshot.systems.recording.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.storage.state, SubsystemState::Running);
}

#[tokio::test(start_paused = true)]
async fn every_probe_hanging_still_returns_complete_snapshot() {
    let probes = FakeProbes {
        recorders: Scripted::Hang,
        transfer_service: Scripted::Hang,
        transfers: Scripted::Hang,
        sampler: Scripted::Hang,
        mounts: Scripted::Hang,
        disk: Scripted::Hang,
        reachability: Scripted::Hang,
        schedule: Scripted::Hang,
        files: Scripted::Hang,
        unmounted: Vec::new(),
        unreadable: Vec::new(),
    };
    let started = Instant::now();
    let snapshot = aggregator(probes).get_unified_status(DEADLINE).await;
    assert!(started.elapsed() <= DEADLINE + EPSILON);
    assert_all_kinds_present(&snapshot);
    assert!(snapshot.systems.iter().all(|s| s.state == SubsystemState::Unknown));
    assert_eq!(snapshot.overall.severity, Severity::Error);
    assert_eq!(
        snapshot.overall.issues.last().map(String::as_str),
        Some("Status check timeout: recording, transferService, sampleExtractor, storage, network")
    );
}

#[tokio::test(start_paused = true)]
async fn network_probe_timeout_is_isolated() {
    let mut probes = FakeProbes::healthy();
    probes.reachability = Scripted::TimeOut;
    let snapshot = aggregator(probes).get_unified_status(DEADLINE).await;

    assert!(snapshot.systems.network.state.is_impaired());
    assert_eq!(
        snapshot.systems.network.metric_bool(keys::REACHABLE),
        Some(false)
    );
    assert!(snapshot.overall.severity >= Severity::Warning);
    assert_eq!(snapshot.overall.issues, vec!["Remote storage unreachable"]);
    assert_eq!(snapshot.systems.recording.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.transfer_service.state, SubsystemState::Running);
    assert_eq!(snapshot.systems.sample_extractor.state, SubsystemState::Idle);
    assert_eq!(snapshot.systems.storage.state, SubsystemState::Running);
}

#[tokio::test(start_paused = true)]
async fn any_combination_of_failures_yields_five_entries() {
    let outcomes = [
        Scripted::Fail("denied"),
        Scripted::TimeOut,
        Scripted::Fact(Reachability { reachable: false }),
    ];
    for (i, reach) in outcomes.into_iter().enumerate() {
        let mut probes = FakeProbes::healthy();
        probes.reachability = reach;
        if i % 2 == 0 {
            probes.disk = Scripted::Fail("df: no such file");
            probes.recorders = Scripted::TimeOut;
        } else {
            probes.mounts = Scripted::Fail("mountinfo unreadable");
            probes.schedule = Scripted::TimeOut;
        }
        let snapshot = aggregator(probes).get_unified_status(DEADLINE).await;
        assert_all_kinds_present(&snapshot);
        for status in snapshot.systems.iter() {
            assert_eq!(status.state.is_impaired(), status.message.is_some());
        }
    }
}

struct PanickingCollector;

#[async_trait]
impl Collector for PanickingCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::SampleExtractor
    }

    async fn collect(&self) -> SubsystemStatus {
        panic!("sampler collector bug");
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_collector_is_degraded_not_fatal() {
    let config = monitor_config();
    let mut collectors: Vec<Arc<dyn Collector>> =
        standard_collectors(FakeProbes::healthy().shared(), config.clone())
            .into_iter()
            .filter(|c| c.kind() != SubsystemKind::SampleExtractor)
            .collect();
    collectors.push(Arc::new(PanickingCollector));
    let agg = Aggregator::with_collectors(collectors, config.thresholds(), DEADLINE);

    let snapshot = agg.status().await;
    assert_all_kinds_present(&snapshot);
    assert_eq!(snapshot.systems.sample_extractor.state, SubsystemState::Degraded);
    assert_eq!(
        snapshot.systems.sample_extractor.message.as_deref(),
        Some("collector panicked")
    );
    assert_eq!(snapshot.overall.severity, Severity::Healthy);
}

#[tokio::test(start_paused = true)]
async fn missing_collector_is_reported_unknown() {
    let agg = Aggregator::with_collectors(vec![], HealthThresholds::default(), DEADLINE);
    let snapshot = agg.status().await;
    assert_all_kinds_present(&snapshot);
    assert!(snapshot.systems.iter().all(|s| s.state == SubsystemState::Unknown));
    assert!(!snapshot.overall.issues.iter().any(|i| i.contains("timeout")));
}

#[tokio::test(start_paused = true)]
async fn each_call_builds_a_fresh_snapshot() {
    let agg = aggregator(FakeProbes::healthy());
    let first = agg.status().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let second = agg.status().await;
    assert_eq!(first.overall, second.overall);
    assert!(second.systems.network.collected_at >= first.systems.network.collected_at);
}
