//! Execution Simulator - simulated suite runs with live progress.
//!
//! Each running suite owns a tick task that adds a random increment to its
//! progress on a fixed interval. When progress reaches 100 the run is removed
//! and a single [`ExecutionEvent::Completed`] is broadcast. Suites run
//! concurrently and independently; the map of active runs is the only shared
//! mutable state.
//!
//! Progress is observed either by subscribing to events or by polling
//! [`ExecutionSimulator::snapshot`].

use crate::catalog::SuiteCatalog;
use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use crate::models::{ExecutionState, SuiteId, SuitePhase};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

/// Source of per-tick progress increments.
pub trait RandomSource: Send + Sync {
    /// Returns an increment in `[0, max)`.
    fn next_increment(&self, max: f64) -> f64;
}

/// Uniform increments from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_increment(&self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(0.0..max)
    }
}

/// Replays a fixed list of increments, cycling when exhausted.
///
/// Increments are returned as given, ignoring `max`. An empty list yields
/// zero forever.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: Mutex<usize>,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_increment(&self, _max: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let value = self.values[*cursor % self.values.len()];
        *cursor = cursor.wrapping_add(1);
        value
    }
}

/// Outcome of one progress tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Still running at the given progress
    Advanced(f64),
    /// Reached 100
    Finished,
}

/// Progress of a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressRun {
    progress: f64,
}

impl ProgressRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Applies one increment.
    ///
    /// Negative and non-finite increments count as zero. Crossing 100 clamps
    /// progress to exactly 100 and finishes the run.
    pub fn advance(&mut self, increment: f64) -> Tick {
        let increment = if increment.is_finite() && increment > 0.0 {
            increment
        } else {
            0.0
        };

        let next = self.progress + increment;
        if next >= 100.0 {
            self.progress = 100.0;
            return Tick::Finished;
        }

        self.progress = next;
        debug_assert!(
            (0.0..100.0).contains(&self.progress),
            "running progress out of range: {}",
            self.progress
        );
        Tick::Advanced(next)
    }
}

/// Events broadcast by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// A run began
    Started {
        suite_id: SuiteId,
        run_id: u64,
        suite_name: String,
    },
    /// Progress changed
    Progress {
        suite_id: SuiteId,
        run_id: u64,
        progress: f64,
    },
    /// A run reached 100; sent exactly once per run
    Completed {
        suite_id: SuiteId,
        run_id: u64,
        suite_name: String,
    },
    /// A run was stopped before completing
    Cancelled { suite_id: SuiteId, run_id: u64 },
}

impl ExecutionEvent {
    /// Suite the event belongs to.
    pub fn suite_id(&self) -> &str {
        match self {
            ExecutionEvent::Started { suite_id, .. }
            | ExecutionEvent::Progress { suite_id, .. }
            | ExecutionEvent::Completed { suite_id, .. }
            | ExecutionEvent::Cancelled { suite_id, .. } => suite_id,
        }
    }

    /// Run the event belongs to.
    pub fn run_id(&self) -> u64 {
        match self {
            ExecutionEvent::Started { run_id, .. }
            | ExecutionEvent::Progress { run_id, .. }
            | ExecutionEvent::Completed { run_id, .. }
            | ExecutionEvent::Cancelled { run_id, .. } => *run_id,
        }
    }
}

/// Internal state for a running suite.
struct ActiveRun {
    run_id: u64,
    run: ProgressRun,
    /// Tick task, aborted on stop
    handle: JoinHandle<()>,
}

/// Starts, stops and tracks simulated suite runs.
#[derive(Clone)]
pub struct ExecutionSimulator {
    catalog: Arc<SuiteCatalog>,
    /// Running suites (suite_id -> run)
    active: Arc<RwLock<HashMap<SuiteId, ActiveRun>>>,
    events: broadcast::Sender<ExecutionEvent>,
    random: Arc<dyn RandomSource>,
    config: SimulatorConfig,
    next_run_id: Arc<AtomicU64>,
}

impl ExecutionSimulator {
    /// Creates a simulator with thread-local random increments.
    pub fn new(catalog: Arc<SuiteCatalog>, config: SimulatorConfig) -> Self {
        Self::with_random(catalog, config, Arc::new(ThreadRandom))
    }

    /// Creates a simulator with a custom increment source.
    pub fn with_random(
        catalog: Arc<SuiteCatalog>,
        config: SimulatorConfig,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(1024);
        Self {
            catalog,
            active: Arc::new(RwLock::new(HashMap::new())),
            events,
            random,
            config,
            next_run_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Catalog of runnable suites.
    pub fn catalog(&self) -> &SuiteCatalog {
        &self.catalog
    }

    /// Subscribes to run events.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Starts a run of `suite_id` at 0% and returns its run ID.
    ///
    /// Returns immediately; progress arrives through events.
    pub async fn start(&self, suite_id: &str) -> Result<u64, SimulatorError> {
        let suite = self
            .catalog
            .get(suite_id)
            .ok_or_else(|| SimulatorError::UnknownSuite(suite_id.to_string()))?;

        let mut active = self.active.write().await;
        if active.contains_key(suite_id) {
            return Err(SimulatorError::AlreadyRunning(suite_id.to_string()));
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = tokio::spawn(self.clone().tick_loop(
            suite.id.clone(),
            suite.name.clone(),
            run_id,
        ));
        active.insert(
            suite.id.clone(),
            ActiveRun {
                run_id,
                run: ProgressRun::new(),
                handle,
            },
        );

        let _ = self.events.send(ExecutionEvent::Started {
            suite_id: suite.id.clone(),
            run_id,
            suite_name: suite.name.clone(),
        });
        tracing::info!("Started {} (run {})", suite.name, run_id);

        Ok(run_id)
    }

    /// Stops a running suite without a completion event.
    pub async fn stop(&self, suite_id: &str) -> Result<(), SimulatorError> {
        if !self.catalog.contains(suite_id) {
            return Err(SimulatorError::UnknownSuite(suite_id.to_string()));
        }

        let mut active = self.active.write().await;
        let Some(run) = active.remove(suite_id) else {
            return Err(SimulatorError::NotRunning(suite_id.to_string()));
        };
        run.handle.abort();

        let _ = self.events.send(ExecutionEvent::Cancelled {
            suite_id: suite_id.to_string(),
            run_id: run.run_id,
        });
        tracing::info!(
            "Stopped {} at {:.0}% (run {})",
            suite_id,
            run.run.progress(),
            run.run_id
        );

        Ok(())
    }

    /// Stops every running suite and returns their IDs, sorted.
    pub async fn stop_all(&self) -> Vec<SuiteId> {
        let mut active = self.active.write().await;
        let mut stopped: Vec<SuiteId> = Vec::with_capacity(active.len());

        for (suite_id, run) in active.drain() {
            run.handle.abort();
            let _ = self.events.send(ExecutionEvent::Cancelled {
                suite_id: suite_id.clone(),
                run_id: run.run_id,
            });
            stopped.push(suite_id);
        }

        stopped.sort();
        if !stopped.is_empty() {
            tracing::info!("Stopped {} running suites", stopped.len());
        }
        stopped
    }

    /// Progress of every running suite, in catalog order.
    pub async fn snapshot(&self) -> Vec<ExecutionState> {
        let active = self.active.read().await;
        self.catalog
            .iter()
            .filter_map(|suite| {
                active
                    .get(&suite.id)
                    .map(|run| running_state(&suite.id, run))
            })
            .collect()
    }

    /// Progress of one suite, if it is running.
    pub async fn active(&self, suite_id: &str) -> Option<ExecutionState> {
        let active = self.active.read().await;
        active.get(suite_id).map(|run| running_state(suite_id, run))
    }

    pub async fn phase(&self, suite_id: &str) -> SuitePhase {
        if self.is_running(suite_id).await {
            SuitePhase::Running
        } else {
            SuitePhase::Idle
        }
    }

    pub async fn is_running(&self, suite_id: &str) -> bool {
        self.active.read().await.contains_key(suite_id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    async fn tick_loop(self, suite_id: SuiteId, suite_name: String, run_id: u64) {
        let interval = self.config.tick_interval();

        loop {
            tokio::time::sleep(interval).await;
            let increment = self.random.next_increment(self.config.max_increment);

            let mut active = self.active.write().await;
            let Some(entry) = active.get_mut(&suite_id) else {
                return;
            };
            if entry.run_id != run_id {
                return;
            }

            match entry.run.advance(increment) {
                Tick::Advanced(progress) => {
                    tracing::debug!("{} at {:.1}%", suite_id, progress);
                    let _ = self.events.send(ExecutionEvent::Progress {
                        suite_id: suite_id.clone(),
                        run_id,
                        progress,
                    });
                }
                Tick::Finished => {
                    active.remove(&suite_id);
                    let _ = self.events.send(ExecutionEvent::Progress {
                        suite_id: suite_id.clone(),
                        run_id,
                        progress: 100.0,
                    });
                    let _ = self.events.send(ExecutionEvent::Completed {
                        suite_id,
                        run_id,
                        suite_name: suite_name.clone(),
                    });
                    tracing::info!("{} finished successfully (run {})", suite_name, run_id);
                    return;
                }
            }
        }
    }
}

fn running_state(suite_id: &str, run: &ActiveRun) -> ExecutionState {
    ExecutionState {
        suite_id: suite_id.to_string(),
        progress: run.run.progress(),
        running: true,
    }
}
