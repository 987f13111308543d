//! Fixed-delay polling loop.
//!
//! The scheduler alternates between two phases forever:
//!
//! ```text
//!   start ─▶ POLLING ──(pass finished, ok or not)──▶ WAITING
//!               ▲                                      │
//!               └────────────(interval elapsed)────────┘
//! ```
//!
//! [`Scheduler::tick`] is the single recovery boundary. The pass runs in its
//! own task, so an error *or* a panic anywhere below it is logged and
//! counted here and never reaches the loop. That task is aborted if the
//! tick itself is dropped, so cancelling the loop cancels any pass in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::AbortOnDropHandle;
use tracing::{info, warn};

use crate::discovery::{DiscoveryWalker, PassSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Polling,
    Waiting,
}

/// Result of one POLLING phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(PassSummary),
    Failed(String),
}

/// Drives the discovery walker at a fixed cadence.
#[derive(Clone)]
pub struct Scheduler {
    walker: DiscoveryWalker,
    interval: Duration,
    passes_completed: Arc<AtomicU64>,
    passes_failed: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(walker: DiscoveryWalker, interval: Duration) -> Self {
        Self {
            walker,
            interval,
            passes_completed: Arc::new(AtomicU64::new(0)),
            passes_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Poll forever. The first pass starts immediately.
    pub async fn run(self) {
        info!(interval = ?self.interval, "polling scheduler started");

        let mut phase = Phase::Polling;
        loop {
            phase = match phase {
                Phase::Polling => {
                    self.tick().await;
                    Phase::Waiting
                }
                Phase::Waiting => {
                    tokio::time::sleep(self.interval).await;
                    Phase::Polling
                }
            };
        }
    }

    /// Run exactly one pass, swallowing any failure.
    pub async fn tick(&self) -> TickOutcome {
        let walker = self.walker.clone();
        // Dropping the tick (e.g. when the loop task is aborted) aborts the pass too.
        let pass =
            AbortOnDropHandle::new(tokio::spawn(async move { walker.run_one_pass().await }));
        let joined = pass.await;

        let outcome = match joined {
            Ok(Ok(summary)) => TickOutcome::Completed(summary),
            Ok(Err(e)) => TickOutcome::Failed(e.to_string()),
            Err(e) => TickOutcome::Failed(format!("pass aborted: {}", e)),
        };

        match &outcome {
            TickOutcome::Completed(summary) => {
                self.passes_completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    services = summary.services,
                    endpoints = summary.endpoints,
                    records = summary.records,
                    stored = self.walker.store().len(),
                    "poll pass completed"
                );
            }
            TickOutcome::Failed(reason) => {
                self.passes_failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %reason, "poll pass failed; retrying next tick");
            }
        }

        outcome
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed.load(Ordering::Relaxed)
    }

    pub fn passes_failed(&self) -> u64 {
        self.passes_failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::fetch::{Fetch, FetchError};
    use crate::store::RecordStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicBool;

    struct DownBus;

    #[async_trait]
    impl Fetch for DownBus {
        async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            Err(FetchError::Response {
                url: url.to_string(),
                status: 502,
            })
        }
    }

    struct PanickingBus;

    #[async_trait]
    impl Fetch for PanickingBus {
        async fn fetch(&self, _url: &str) -> Result<Value, FetchError> {
            panic!("fetcher bug");
        }
    }

    struct OneRecordBus;

    #[async_trait]
    impl Fetch for OneRecordBus {
        async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            Ok(if url.ends_with("/bus/services") {
                json!([{"id": "svc"}])
            } else if url.ends_with("/capabilities") {
                json!({"endpoints": [{"rel": "ping", "href": "/ping"}]})
            } else {
                json!({"value": 1})
            })
        }
    }

    fn scheduler(fetcher: Arc<dyn Fetch>, interval: Duration) -> Scheduler {
        let walker = DiscoveryWalker::new(BusConfig::default(), fetcher, RecordStore::new());
        Scheduler::new(walker, interval)
    }

    #[tokio::test]
    async fn test_tick_reports_failure_without_propagating() {
        let s = scheduler(Arc::new(DownBus), Duration::from_secs(5));
        let outcome = s.tick().await;
        assert!(matches!(outcome, TickOutcome::Failed(ref msg) if msg.contains("502")));
        assert_eq!(s.passes_failed(), 1);
        assert_eq!(s.passes_completed(), 0);
    }

    #[tokio::test]
    async fn test_tick_survives_panicking_pass() {
        let s = scheduler(Arc::new(PanickingBus), Duration::from_secs(5));
        assert!(matches!(s.tick().await, TickOutcome::Failed(_)));
        assert!(matches!(s.tick().await, TickOutcome::Failed(_)));
        assert_eq!(s.passes_failed(), 2);
    }

    #[tokio::test]
    async fn test_tick_counts_completed_pass() {
        let s = scheduler(Arc::new(OneRecordBus), Duration::from_secs(5));
        let outcome = s.tick().await;
        assert_eq!(
            outcome,
            TickOutcome::Completed(PassSummary {
                services: 1,
                endpoints: 1,
                records: 1
            })
        );
        assert_eq!(s.passes_completed(), 1);
    }

    /// Answers discovery immediately but stalls on endpoint data.
    struct StallingBus {
        stalled: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Fetch for StallingBus {
        async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            if url.ends_with("/bus/services") {
                return Ok(json!([{"id": "svc"}]));
            }
            if url.ends_with("/capabilities") {
                return Ok(json!({"endpoints": [{"rel": "slow", "href": "/slow"}]}));
            }
            self.stalled.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(json!({"value": 1}))
        }
    }

    async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if done() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        done()
    }

    #[tokio::test]
    async fn test_loop_keeps_going_after_failures() {
        let s = scheduler(Arc::new(DownBus), Duration::from_millis(50));
        let handle = tokio::spawn(s.clone().run());

        assert!(
            wait_until(|| s.passes_failed() >= 3).await,
            "only {} passes",
            s.passes_failed()
        );
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_loop_waits_between_passes() {
        let s = scheduler(Arc::new(OneRecordBus), Duration::from_secs(60));
        let handle = tokio::spawn(s.clone().run());

        // First pass fires without waiting for the interval.
        assert!(wait_until(|| s.passes_completed() >= 1).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(s.passes_completed(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_aborting_loop_cancels_pass_in_flight() {
        let stalled = Arc::new(AtomicBool::new(false));
        let bus = StallingBus {
            stalled: stalled.clone(),
        };
        let s = scheduler(Arc::new(bus), Duration::from_secs(60));
        let handle = tokio::spawn(s.clone().run());

        assert!(wait_until(|| stalled.load(Ordering::SeqCst)).await);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(s.walker.store().is_empty());
        assert_eq!(s.passes_completed(), 0);
    }
}
