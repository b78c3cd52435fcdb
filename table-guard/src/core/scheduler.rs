//! Background full-table revalidation.
//!
//! A [`RevalidationScheduler`] owns one worker task. Every
//! [`request`](RevalidationScheduler::request) bumps a generation counter; the
//! worker always runs the latest request and publishes a result only while
//! its generation is still current. A pass in progress reads the counter
//! between rows and stops once a newer request has arrived.
//!
//! Bumping the counter together with queueing a request, and checking the
//! counter together with publishing, both happen under one sequencing lock,
//! so concurrent callers can never leave an older result published.

use super::provider::TableSnapshot;
use super::result::ValidationError;
use super::validator::Validator;
use crate::error::{GuardError, Result};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Tuning for a [`RevalidationScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Buffer size of the event channel; slow subscribers lag past it
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

impl SchedulerConfig {
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Whether a full pass is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
}

/// Lifecycle notifications of revalidation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationEvent {
    Started { generation: u64 },
    /// The run's result was published.
    Completed { generation: u64, errors: usize },
    /// A newer request arrived first; nothing was published.
    Superseded { generation: u64 },
    /// The run hit an engine fault; the published list is unchanged.
    Failed { generation: u64, message: String },
}

impl RevalidationEvent {
    pub fn generation(&self) -> u64 {
        match self {
            RevalidationEvent::Started { generation }
            | RevalidationEvent::Completed { generation, .. }
            | RevalidationEvent::Superseded { generation }
            | RevalidationEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// The error list of the last completed run.
#[derive(Debug, Clone, Default)]
pub struct PublishedErrors {
    /// Generation of the request that produced `errors`; 0 before any run
    pub generation: u64,
    pub errors: Arc<Vec<ValidationError>>,
}

struct Request {
    generation: u64,
    snapshot: Arc<TableSnapshot>,
    validator: Arc<Validator>,
}

/// Runs full-table passes off the caller's task, publishing only the result
/// of the latest request.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use table_guard::core::{RevalidationScheduler, SchedulerConfig, TableSnapshot, Validator};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> table_guard::error::Result<()> {
/// let scheduler = RevalidationScheduler::new(SchedulerConfig::default());
/// let mut published = scheduler.subscribe();
///
/// let table = Arc::new(TableSnapshot::from_records(["id"], [["1"]]));
/// let generation = scheduler.request(table, Arc::new(Validator::empty()))?;
///
/// published.wait_for(|p| p.generation == generation).await.unwrap();
/// scheduler.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct RevalidationScheduler {
    generation: Arc<AtomicU64>,
    sequence: Arc<std::sync::Mutex<()>>,
    closed: AtomicBool,
    requests: mpsc::UnboundedSender<Request>,
    shutdown: watch::Sender<bool>,
    published: watch::Receiver<PublishedErrors>,
    state: watch::Receiver<SchedulerState>,
    events: broadcast::Sender<RevalidationEvent>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RevalidationScheduler {
    /// Starts the worker task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: SchedulerConfig) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let sequence = Arc::new(std::sync::Mutex::new(()));
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (published_tx, published_rx) = watch::channel(PublishedErrors::default());
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let worker = Worker {
            generation: generation.clone(),
            sequence: sequence.clone(),
            requests: request_rx,
            shutdown: shutdown_rx,
            published: published_tx,
            state: state_tx,
            events: events_tx.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            generation,
            sequence,
            closed: AtomicBool::new(false),
            requests: request_tx,
            shutdown: shutdown_tx,
            published: published_rx,
            state: state_rx,
            events: events_tx,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Queues a full pass over `snapshot`, superseding any earlier request.
    ///
    /// Returns the generation assigned to this request.
    pub fn request(&self, snapshot: Arc<TableSnapshot>, validator: Arc<Validator>) -> Result<u64> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GuardError::SchedulerClosed);
        }
        let generation = {
            let _sequenced = sequenced(&self.sequence);
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            self.requests
                .send(Request {
                    generation,
                    snapshot,
                    validator,
                })
                .map_err(|_| GuardError::SchedulerClosed)?;
            generation
        };
        debug!(generation, "Revalidation requested");
        Ok(generation)
    }

    /// The generation of the most recent request.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The currently published error list.
    pub fn published(&self) -> PublishedErrors {
        self.published.borrow().clone()
    }

    /// Watches the published error list.
    pub fn subscribe(&self) -> watch::Receiver<PublishedErrors> {
        self.published.clone()
    }

    /// Receives lifecycle events from now on.
    pub fn events(&self) -> broadcast::Receiver<RevalidationEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Stops accepting requests, stops the pass in progress and waits for the
    /// worker to exit.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Outdates the running pass so it stops at the next row.
        self.outdate();
        let _ = self.shutdown.send(true);

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Revalidation worker ended abnormally: {}", e);
            }
        }
        info!("Revalidation scheduler shut down");
    }

    fn outdate(&self) {
        let _sequenced = sequenced(&self.sequence);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for RevalidationScheduler {
    fn drop(&mut self) {
        self.outdate();
        let _ = self.shutdown.send(true);
    }
}

/// Holds the sequencing lock; a poisoned lock guards no data, so it is reused.
fn sequenced(lock: &std::sync::Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    generation: Arc<AtomicU64>,
    sequence: Arc<std::sync::Mutex<()>>,
    requests: mpsc::UnboundedReceiver<Request>,
    shutdown: watch::Receiver<bool>,
    published: watch::Sender<PublishedErrors>,
    state: watch::Sender<SchedulerState>,
    events: broadcast::Sender<RevalidationEvent>,
}

impl Worker {
    #[instrument(skip(self))]
    async fn run(mut self) {
        debug!("Revalidation worker started");

        loop {
            let request = tokio::select! {
                biased;
                Ok(()) = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                request = self.requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let latest = self.drain_to_latest(request);
            self.execute(latest).await;
        }

        debug!("Revalidation worker stopped");
    }

    /// Skips every queued request but the one with the highest generation.
    fn drain_to_latest(&mut self, mut request: Request) -> Request {
        while let Ok(queued) = self.requests.try_recv() {
            let skipped = if queued.generation > request.generation {
                std::mem::replace(&mut request, queued)
            } else {
                queued
            };
            self.emit(RevalidationEvent::Superseded {
                generation: skipped.generation,
            });
        }
        request
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Publishes `errors` unless a newer request has been made. Returns the
    /// number of errors published.
    fn publish_if_current(&self, generation: u64, errors: Vec<ValidationError>) -> Option<usize> {
        let _sequenced = sequenced(&self.sequence);
        if !self.is_current(generation) {
            return None;
        }
        let count = errors.len();
        self.published.send_replace(PublishedErrors {
            generation,
            errors: Arc::new(errors),
        });
        Some(count)
    }

    async fn execute(&mut self, request: Request) {
        let generation = request.generation;
        if !self.is_current(generation) {
            self.emit(RevalidationEvent::Superseded { generation });
            return;
        }

        self.state.send_replace(SchedulerState::Running);
        self.emit(RevalidationEvent::Started { generation });

        let counter = self.generation.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let should_stop = || counter.load(Ordering::Acquire) != generation;
            request.validator.run_pass(&request.snapshot, &should_stop)
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                GuardError::engine_fault(panic_message(e.into_panic()))
            } else {
                GuardError::engine_fault(e.to_string())
            }
        })
        .and_then(|pass| pass);

        let outcome = outcome.map(|pass| {
            pass.and_then(|errors| self.publish_if_current(generation, errors))
        });

        match outcome {
            Ok(Some(count)) => {
                info!(generation, errors = count, "Published revalidation result");
                self.emit(RevalidationEvent::Completed {
                    generation,
                    errors: count,
                });
            }
            Ok(None) => {
                warn!(generation, "Revalidation superseded, result discarded");
                self.emit(RevalidationEvent::Superseded { generation });
            }
            Err(e) => {
                error!(generation, error = %e, "Revalidation failed");
                self.emit(RevalidationEvent::Failed {
                    generation,
                    message: e.to_string(),
                });
            }
        }

        self.state.send_replace(SchedulerState::Idle);
    }

    fn emit(&self, event: RevalidationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("full pass panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("full pass panicked: {message}")
    } else {
        "full pass panicked".to_string()
    }
}
