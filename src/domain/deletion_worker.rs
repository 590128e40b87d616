//! Asynchronous batched soft-deletion.
//!
//! Deletion requests are accepted immediately and applied later in batches:
//!
//! ```text
//!                   ┌──────────┐  round-robin  ┌──────────┐  batch_size  ┌─────────┐
//! DeletionQueue ──▶ │dispatcher│ ────────────▶ │ worker i │ ───────────▶ │ storage │
//!    (unbounded)    └──────────┘   (bounded)   └──────────┘              └─────────┘
//! ```
//!
//! Request `n` goes to worker `n mod workers`, so order is preserved per
//! worker but not across workers. Each worker owns its batch buffer and calls
//! [`UrlRepository::delete_batch`] whenever the buffer reaches `batch_size`.
//! On [`DeletionPool::stop`] the intake is closed, every queued request is
//! forwarded, and each worker flushes its partial batch before exiting.
//!
//! A failed batch is logged and dropped; the worker keeps going.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::entities::DeleteRequest;
use crate::domain::repositories::UrlRepository;

/// Default capacity of each worker's input channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Sizing of a [`DeletionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Number of workers, at least 1.
    pub workers: usize,
    /// Requests per `delete_batch` call, at least 1.
    pub batch_size: usize,
    /// Capacity of each worker's channel; a full channel stalls the dispatcher.
    pub queue_capacity: usize,
}

impl PoolSettings {
    pub fn new(workers: usize, batch_size: usize) -> Self {
        Self {
            workers,
            batch_size,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    fn validate(&self) -> Result<(), PoolError> {
        if self.workers == 0 {
            return Err(PoolError::InvalidSettings("workers must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(PoolError::InvalidSettings("batch size must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidSettings("queue capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Lifecycle of a [`DeletionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Stopped,
    Running,
    Draining,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("deletion pool is already running")]
    AlreadyRunning,

    #[error("deletion pool is not running")]
    NotRunning,

    #[error("invalid deletion pool settings: {0}")]
    InvalidSettings(&'static str),
}

/// Returned by [`DeletionQueue::submit`] once the pool has been stopped.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("deletion queue is closed")]
pub struct QueueClosed;

/// Cloneable submission handle for a running pool.
///
/// Submitting never waits: the intake is unbounded and backpressure is
/// absorbed by the dispatcher.
#[derive(Debug, Clone)]
pub struct DeletionQueue {
    intake: mpsc::UnboundedSender<DeleteRequest>,
}

impl DeletionQueue {
    /// Enqueues a soft-delete of `short_key` on behalf of `owner_id`.
    pub fn submit(&self, owner_id: &str, short_key: &str) -> Result<(), QueueClosed> {
        self.submit_request(DeleteRequest::new(owner_id, short_key))
    }

    pub fn submit_request(&self, request: DeleteRequest) -> Result<(), QueueClosed> {
        self.intake.send(request).map_err(|_| QueueClosed)
    }

    /// Enqueues one request per key. Returns how many were accepted.
    pub fn submit_all<I>(&self, owner_id: &str, short_keys: I) -> Result<usize, QueueClosed>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut accepted = 0;
        for short_key in short_keys {
            self.submit_request(DeleteRequest::new(owner_id, short_key))?;
            accepted += 1;
        }
        Ok(accepted)
    }

    pub fn is_closed(&self) -> bool {
        self.intake.is_closed()
    }
}

/// Counters reported by one worker when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// `delete_batch` calls made, failed ones included.
    pub batches: usize,
    /// Requests handed to storage.
    pub items: usize,
    /// Records that actually changed state.
    pub deleted: u64,
    pub failed_batches: usize,
}

/// Per-worker statistics collected by [`DeletionPool::stop`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub workers: Vec<WorkerStats>,
}

impl DrainReport {
    pub fn total_batches(&self) -> usize {
        self.workers.iter().map(|w| w.batches).sum()
    }

    pub fn total_items(&self) -> usize {
        self.workers.iter().map(|w| w.items).sum()
    }

    pub fn total_deleted(&self) -> u64 {
        self.workers.iter().map(|w| w.deleted).sum()
    }

    pub fn failed_batches(&self) -> usize {
        self.workers.iter().map(|w| w.failed_batches).sum()
    }
}

struct RunningPool {
    queue: DeletionQueue,
    shutdown: oneshot::Sender<()>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<WorkerStats>>,
}

/// Fan-out worker pool applying soft-deletes in batches.
pub struct DeletionPool {
    repository: Arc<dyn UrlRepository>,
    settings: PoolSettings,
    state: PoolState,
    running: Option<RunningPool>,
}

impl DeletionPool {
    /// Creates a stopped pool.
    pub fn new(repository: Arc<dyn UrlRepository>, settings: PoolSettings) -> Self {
        Self {
            repository,
            settings,
            state: PoolState::Stopped,
            running: None,
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    /// Returns the submission handle while the pool is running.
    pub fn queue(&self) -> Option<DeletionQueue> {
        self.running.as_ref().map(|r| r.queue.clone())
    }

    /// Spawns the workers and the dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyRunning`] unless the pool is stopped, and
    /// [`PoolError::InvalidSettings`] for zero-sized settings.
    pub fn start(&mut self) -> Result<DeletionQueue, PoolError> {
        if self.state != PoolState::Stopped {
            return Err(PoolError::AlreadyRunning);
        }
        self.settings.validate()?;

        let mut senders = Vec::with_capacity(self.settings.workers);
        let mut workers = Vec::with_capacity(self.settings.workers);

        for id in 0..self.settings.workers {
            let (tx, rx) = mpsc::channel(self.settings.queue_capacity);
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(
                id,
                rx,
                self.repository.clone(),
                self.settings.batch_size,
            )));
        }

        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let dispatcher = tokio::spawn(run_dispatcher(intake_rx, shutdown_rx, senders));

        let queue = DeletionQueue { intake: intake_tx };
        self.running = Some(RunningPool {
            queue: queue.clone(),
            shutdown: shutdown_tx,
            dispatcher,
            workers,
        });
        self.state = PoolState::Running;

        info!(
            "Deletion pool started: {} workers, batch size {}",
            self.settings.workers, self.settings.batch_size
        );

        Ok(queue)
    }

    /// Closes the intake and waits until every queued request has been flushed.
    ///
    /// Requests submitted before this call are all handed to storage; later
    /// submissions fail with [`QueueClosed`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotRunning`] if the pool was not started.
    pub async fn stop(&mut self) -> Result<DrainReport, PoolError> {
        let running = self.running.take().ok_or(PoolError::NotRunning)?;
        self.state = PoolState::Draining;
        debug!("Deletion pool draining");

        // The dispatcher also drains when the sender is dropped, so a failed
        // send only means it already exited.
        let _ = running.shutdown.send(());

        if let Err(e) = running.dispatcher.await {
            error!("Deletion dispatcher terminated abnormally: {}", e);
        }

        let mut report = DrainReport::default();
        for (id, worker) in running.workers.into_iter().enumerate() {
            match worker.await {
                Ok(stats) => report.workers.push(stats),
                Err(e) => {
                    error!("Deletion worker {} terminated abnormally: {}", id, e);
                    report.workers.push(WorkerStats::default());
                }
            }
        }

        self.state = PoolState::Stopped;
        info!(
            "Deletion pool stopped: {} requests in {} batches, {} records deleted, {} failed batches",
            report.total_items(),
            report.total_batches(),
            report.total_deleted(),
            report.failed_batches()
        );

        Ok(report)
    }
}

async fn run_dispatcher(
    mut intake: mpsc::UnboundedReceiver<DeleteRequest>,
    mut shutdown: oneshot::Receiver<()>,
    workers: Vec<mpsc::Sender<DeleteRequest>>,
) {
    let mut next = 0;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            request = intake.recv() => match request {
                Some(request) => forward(&workers, &mut next, request).await,
                None => break,
            },
        }
    }

    // Refuse new submissions, then hand over whatever is already queued.
    intake.close();
    while let Some(request) = intake.recv().await {
        forward(&workers, &mut next, request).await;
    }

    debug!("Deletion dispatcher exited");
    // Dropping `workers` closes every worker channel.
}

async fn forward(workers: &[mpsc::Sender<DeleteRequest>], next: &mut usize, request: DeleteRequest) {
    let id = *next;
    *next = (*next + 1) % workers.len();

    if let Err(mpsc::error::SendError(request)) = workers[id].send(request).await {
        error!(
            "Deletion worker {} is gone, dropping request for key {}",
            id, request.short_key
        );
    }
}

async fn run_worker(
    id: usize,
    mut rx: mpsc::Receiver<DeleteRequest>,
    repository: Arc<dyn UrlRepository>,
    batch_size: usize,
) -> WorkerStats {
    debug!("Deletion worker {} started", id);

    let mut stats = WorkerStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    while let Some(request) = rx.recv().await {
        batch.push(request);
        if batch.len() >= batch_size {
            flush(id, repository.as_ref(), &mut batch, &mut stats).await;
        }
    }

    if !batch.is_empty() {
        flush(id, repository.as_ref(), &mut batch, &mut stats).await;
    }

    debug!("Deletion worker {} exited", id);
    stats
}

async fn flush(
    id: usize,
    repository: &dyn UrlRepository,
    batch: &mut Vec<DeleteRequest>,
    stats: &mut WorkerStats,
) {
    stats.batches += 1;
    stats.items += batch.len();
    metrics::counter!("deletion_batches_total").increment(1);
    metrics::counter!("deletion_items_total").increment(batch.len() as u64);

    match repository.delete_batch(batch).await {
        Ok(deleted) => {
            stats.deleted += deleted;
            debug!(
                "Worker {} flushed {} requests, {} records deleted",
                id,
                batch.len(),
                deleted
            );
        }
        Err(e) => {
            stats.failed_batches += 1;
            metrics::counter!("deletion_batch_failures_total").increment(1);
            error!(
                "Worker {} failed to delete batch of {} requests: {}",
                id,
                batch.len(),
                e
            );
        }
    }

    batch.clear();
}
