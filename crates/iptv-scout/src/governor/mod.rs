//! Bounded fan-out/fan-in for batches of network probes
//!
//! A [`BatchExecutor`] runs one async unit per input item. Every unit must be
//! admitted through an [`AdmissionGate`] before it does any I/O, and its
//! deadline starts once it has been admitted. Each unit writes into its own
//! result slot; a unit that fails, times out or panics leaves its slot empty
//! and never disturbs its siblings. The batch returns once every unit has
//! finished one way or another.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{UnitError, UnitResult};

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Counting admission gate with `capacity` permits.
///
/// Owned by a single pipeline run; clones share the same permits.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<GateCounters>,
}

/// Held by an admitted unit; dropping it frees the permit
#[derive(Debug)]
pub struct Admission {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(GateCounters::default()),
        }
    }

    /// Wait for a free permit
    pub async fn admit(&self) -> UnitResult<Admission> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| UnitError::GateClosed)?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Ok(Admission {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    /// Refuse every waiting and future admission
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously admitted units seen so far
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Per-batch counters, logged when the batch finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    /// Units that produced a result
    pub completed: usize,
    /// Units that finished cleanly without a result (e.g. below threshold)
    pub dropped: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub panicked: usize,
    pub peak_in_flight: usize,
}

#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Present results in input order
    pub results: Vec<T>,
    pub stats: BatchStats,
}

enum UnitOutcome<T> {
    Completed(T),
    Dropped,
    Failed(UnitError),
    TimedOut,
}

/// Runs batches of units behind an admission gate with a per-unit deadline
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    gate: AdmissionGate,
    unit_timeout: Duration,
    label: &'static str,
}

impl BatchExecutor {
    pub fn new(label: &'static str, concurrency: usize, unit_timeout: Duration) -> Self {
        Self::with_gate(label, AdmissionGate::new(concurrency), unit_timeout)
    }

    pub fn with_gate(label: &'static str, gate: AdmissionGate, unit_timeout: Duration) -> Self {
        Self {
            gate,
            unit_timeout,
            label,
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Run `unit` once per item and collect the results that were produced.
    ///
    /// `Ok(Some(_))` fills the unit's slot, `Ok(None)` and `Err(_)` leave it
    /// empty. Unit errors are only logged at debug level.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, unit: F) -> BatchOutcome<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UnitResult<Option<T>>> + Send + 'static,
    {
        let total = items.len();
        let unit = Arc::new(unit);
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut stats = BatchStats {
            total,
            ..BatchStats::default()
        };

        debug!(
            "{}: dispatching {} units (concurrency {}, unit timeout {:?})",
            self.label,
            total,
            self.gate.capacity(),
            self.unit_timeout
        );

        let mut join_set = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let gate = self.gate.clone();
            let unit = unit.clone();
            let unit_timeout = self.unit_timeout;

            join_set.spawn(async move {
                let _admission = match gate.admit().await {
                    Ok(admission) => admission,
                    Err(e) => return (index, UnitOutcome::Failed(e)),
                };
                let outcome = match tokio::time::timeout(unit_timeout, unit(item)).await {
                    Ok(Ok(Some(value))) => UnitOutcome::Completed(value),
                    Ok(Ok(None)) => UnitOutcome::Dropped,
                    Ok(Err(e)) => UnitOutcome::Failed(e),
                    Err(_) => UnitOutcome::TimedOut,
                };
                (index, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, UnitOutcome::Completed(value))) => {
                    slots[index] = Some(value);
                    stats.completed += 1;
                }
                Ok((_, UnitOutcome::Dropped)) => stats.dropped += 1,
                Ok((index, UnitOutcome::Failed(e))) => {
                    debug!("{}: unit {} failed ({}): {}", self.label, index, e.kind(), e);
                    stats.failed += 1;
                }
                Ok((index, UnitOutcome::TimedOut)) => {
                    debug!(
                        "{}: unit {} exceeded {:?}",
                        self.label, index, self.unit_timeout
                    );
                    stats.timed_out += 1;
                }
                Err(e) => {
                    if e.is_panic() {
                        warn!("{}: unit panicked: {}", self.label, e);
                        stats.panicked += 1;
                    } else {
                        stats.failed += 1;
                    }
                }
            }
        }

        stats.peak_in_flight = self.gate.peak_in_flight();
        info!(
            "{}: {} units finished, {} results ({} dropped, {} failed, {} timed out, {} panicked, peak in flight {})",
            self.label,
            stats.total,
            stats.completed,
            stats.dropped,
            stats.failed,
            stats.timed_out,
            stats.panicked,
            stats.peak_in_flight
        );

        BatchOutcome {
            results: slots.into_iter().flatten().collect(),
            stats,
        }
    }
}
