//! End-to-end polling pipeline with scripted sources and a paused clock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use statuswatch::{
    ErrorCategory, FetchError, InstanceId, Phase, RefreshInterval, Scheduler, SchedulerOptions,
    StatusSnapshot, StatusSource,
};

/// One scripted fetch outcome.
enum Step {
    /// Raw payload bytes, run through the normalizer.
    Payload(&'static str),
    Fail(FetchError),
    /// Never completes; the scheduler's fetch timeout fires.
    Hang,
}

#[derive(Default)]
struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
}

impl std::fmt::Debug for ScriptedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSource")
            .field("remaining", &self.steps.lock().len())
            .finish()
    }
}

impl ScriptedSource {
    fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
        })
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Payload(body)) => statuswatch_adapters::decode(body.as_bytes()),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

const FIRST: &str = r#"{
    "cpu": { "utilisation": 0.10, "frequencies": { "cpu2": { "now": 2000 }, "cpu0": { "now": 1000 } } },
    "network": { "interface": "eth0", "rx": 1000, "tx": 500 },
    "storage": { "sdb": { "total": 10, "available": 5 }, "sda": { "total": 20, "available": 10 } }
}"#;
const SECOND: &str = r#"{ "cpu": { "utilisation": 0.20 }, "network": { "rx": 6000, "tx": 700 } }"#;
const THIRD: &str = r#"{ "cpu": { "utilisation": 0.30 }, "network": { "rx": 4000, "tx": 900 } }"#;

fn id() -> InstanceId {
    InstanceId::from("nas")
}

fn scheduler() -> Scheduler {
    Scheduler::with_options(SchedulerOptions {
        history_capacity: 5,
        fetch_timeout: Duration::from_millis(500),
    })
}

/// Let the clock run through `n` refresh periods of one second.
async fn ticks(n: u64) {
    tokio::time::sleep(Duration::from_millis(n * 1_000 + 10)).await;
}

#[tokio::test(start_paused = true)]
async fn stale_data_survives_background_timeout() {
    let source = ScriptedSource::new([
        Step::Payload(FIRST),
        Step::Payload(SECOND),
        Step::Payload(THIRD),
        Step::Hang,
    ]);
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source, RefreshInterval::OneSecond);

    // The fourth fetch hangs and times out half a second later.
    ticks(4).await;
    assert_eq!(handle.phase(), Phase::Ready);
    assert_eq!(handle.len(), 3);
    assert!(handle.error().is_none());

    let current = handle.current().unwrap();
    assert_eq!(current.network.as_ref().unwrap().rx, Some(4000));
}

#[tokio::test(start_paused = true)]
async fn first_failure_is_surfaced_then_cleared() {
    let source = ScriptedSource::new([
        Step::Fail(FetchError::Connection("refused".to_string())),
        Step::Payload(FIRST),
    ]);
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source, RefreshInterval::OneSecond);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.phase(), Phase::Error);
    assert_eq!(handle.error().unwrap().category, ErrorCategory::Transport);
    assert!(handle.current().is_none());

    ticks(1).await;
    assert_eq!(handle.phase(), Phase::Ready);
    assert!(handle.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn decode_failure_before_any_success() {
    let source = ScriptedSource::new([Step::Payload("[1, 2, 3]")]);
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source, RefreshInterval::OneSecond);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.phase(), Phase::Error);
    assert_eq!(handle.error().unwrap().category, ErrorCategory::Decode);
}

#[tokio::test(start_paused = true)]
async fn forced_fetch_failure_is_surfaced() {
    let source = ScriptedSource::new([
        Step::Payload(FIRST),
        Step::Fail(FetchError::Http("HTTP 503".to_string())),
        Step::Payload(SECOND),
    ]);
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source, RefreshInterval::FiveSeconds);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.phase(), Phase::Ready);

    assert!(scheduler.force_fetch(&id()));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.phase(), Phase::Error);
    // The last good snapshot is still available while the error shows.
    assert_eq!(handle.len(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.phase(), Phase::Ready);
    assert_eq!(handle.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn normalized_history_feeds_chart_series() {
    let source = ScriptedSource::new([
        Step::Payload(FIRST),
        Step::Payload(SECOND),
        Step::Payload(THIRD),
    ]);
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source, RefreshInterval::OneSecond);
    ticks(2).await;

    let first = handle.with_history(|h| h.iter().next().cloned()).unwrap();
    let cores: Vec<u32> = first.cpu.unwrap().cpu_cores.iter().map(|c| c.index).collect();
    assert_eq!(cores, vec![0, 2]);
    let volumes: Vec<String> = first.storage.unwrap().into_iter().map(|v| v.name).collect();
    assert_eq!(volumes, vec!["sda", "sdb"]);

    let usage = handle.series(5, |s| s.cpu.as_ref()?.utilisation);
    assert_eq!(usage, vec![None, None, Some(0.10), Some(0.20), Some(0.30)]);

    let rx = handle.delta(5, |s| s.network.as_ref()?.rx);
    assert_eq!(rx, vec![0, 0, 5000, 2000]);
}

#[tokio::test(start_paused = true)]
async fn interval_change_never_doubles_the_timer() {
    let source = ScriptedSource::new((0..20).map(|_| Step::Payload(SECOND)));
    let mut scheduler = scheduler();
    let handle = scheduler.start(id(), source.clone(), RefreshInterval::OneSecond);

    for interval in [RefreshInterval::TwoSeconds, RefreshInterval::TenSeconds] {
        assert!(scheduler.set_interval(&id(), interval));
        assert_eq!(scheduler.active_tasks(), 1);
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    let after_restarts = handle.len();

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(handle.len(), after_restarts);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.len(), after_restarts + 1);
}
