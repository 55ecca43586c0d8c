//! Cache Coordinator Task
//!
//! Background task that owns the eviction cache and applies every cache
//! operation one at a time, fed by a lookup queue and an insertion queue.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, EvictionCache};
use crate::error::{Result, ServeError};
use crate::tasks::messages::{InsertionRequest, LookupOutcome, LookupRequest, StreamOutcome};

// == Coordinator Handle ==
/// Cloneable sender side of the coordinator.
///
/// This is the only way to reach the cache. Sends wait while a queue is full.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    lookups: mpsc::Sender<LookupRequest>,
    insertions: mpsc::Sender<InsertionRequest>,
    stats: watch::Receiver<CacheStats>,
}

impl CoordinatorHandle {
    // == Lookup ==
    /// Asks whether `name` is cached, marking it recently used on a hit.
    pub async fn lookup(&self, name: &str) -> Result<LookupOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.lookups
            .send(LookupRequest {
                name: name.to_string(),
                reply,
            })
            .await
            .map_err(|_| ServeError::CoordinatorUnavailable)?;
        outcome.await.map_err(|_| ServeError::CoordinatorUnavailable)
    }

    // == Submit Insertion ==
    /// Queues a file capture for insertion once its stream completes.
    pub async fn submit_insertion(&self, request: InsertionRequest) -> Result<()> {
        self.insertions
            .send(request)
            .await
            .map_err(|_| ServeError::CoordinatorUnavailable)
    }

    // == Stats ==
    /// Returns the statistics published after the coordinator's last turn.
    pub fn stats(&self) -> CacheStats {
        self.stats.borrow().clone()
    }
}

// == Settlement ==
/// A pending insertion whose stream has finished one way or another.
struct Settled {
    name: String,
    applied: oneshot::Sender<bool>,
    outcome: Settlement,
}

enum Settlement {
    Ready(Vec<u8>),
    Aborted,
    Dropped,
    TimedOut,
    DrainFailed(ServeError),
}

/// Waits for a stream's completion signal and drains its capture.
///
/// Runs beside the coordinator so a slow client never holds up other cache
/// operations.
async fn await_completion(request: InsertionRequest, timeout: Duration) -> Settled {
    let InsertionRequest {
        name,
        completion,
        applied,
    } = request;

    let outcome = match tokio::time::timeout(timeout, completion).await {
        Err(_) => Settlement::TimedOut,
        Ok(Err(_)) => Settlement::Dropped,
        Ok(Ok(StreamOutcome::Aborted)) => Settlement::Aborted,
        Ok(Ok(StreamOutcome::Delivered(capture))) => match capture.drain() {
            Ok(bytes) => Settlement::Ready(bytes),
            Err(e) => Settlement::DrainFailed(e),
        },
    };

    Settled {
        name,
        applied,
        outcome,
    }
}

// == Cache Coordinator ==
/// Sole owner of the eviction cache.
pub struct CacheCoordinator {
    cache: EvictionCache,
    lookups: mpsc::Receiver<LookupRequest>,
    insertions: mpsc::Receiver<InsertionRequest>,
    /// Insertions waiting on their completion signal
    pending: JoinSet<Settled>,
    completion_timeout: Duration,
    stats: watch::Sender<CacheStats>,
}

impl CacheCoordinator {
    // == Constructor ==
    /// Wraps `cache` in a coordinator and returns the handle that reaches it.
    ///
    /// `queue_depth` bounds each inbound queue (minimum 1).
    pub fn new(
        cache: EvictionCache,
        queue_depth: usize,
        completion_timeout: Duration,
    ) -> (Self, CoordinatorHandle) {
        let (lookup_tx, lookup_rx) = mpsc::channel(queue_depth.max(1));
        let (insert_tx, insert_rx) = mpsc::channel(queue_depth.max(1));
        let (stats_tx, stats_rx) = watch::channel(cache.stats());

        let coordinator = Self {
            cache,
            lookups: lookup_rx,
            insertions: insert_rx,
            pending: JoinSet::new(),
            completion_timeout,
            stats: stats_tx,
        };
        let handle = CoordinatorHandle {
            lookups: lookup_tx,
            insertions: insert_tx,
            stats: stats_rx,
        };
        (coordinator, handle)
    }

    // == Run ==
    /// Serves requests until every handle is dropped and all pending
    /// insertions have settled.
    pub async fn run(mut self) {
        info!(
            max_size = self.cache.max_size(),
            "Cache coordinator started"
        );

        let mut lookups_open = true;
        let mut insertions_open = true;

        while lookups_open || insertions_open || !self.pending.is_empty() {
            tokio::select! {
                request = self.lookups.recv(), if lookups_open => match request {
                    Some(request) => self.handle_lookup(request),
                    None => lookups_open = false,
                },
                request = self.insertions.recv(), if insertions_open => match request {
                    Some(request) => self.handle_insertion(request),
                    None => insertions_open = false,
                },
                Some(joined) = self.pending.join_next(), if !self.pending.is_empty() => {
                    self.settle(joined);
                }
                else => break,
            }
        }

        info!("Cache coordinator stopped");
    }

    // == Handle Lookup ==
    fn handle_lookup(&mut self, request: LookupRequest) {
        let outcome = match self.cache.get(&request.name) {
            Some(data) => {
                debug!(name = %request.name, size = data.len(), "cache hit");
                LookupOutcome::Found(data)
            }
            None => {
                debug!(name = %request.name, "cache miss");
                LookupOutcome::NotFound
            }
        };

        self.publish_stats();
        if request.reply.send(outcome).is_err() {
            debug!(name = %request.name, "lookup caller went away");
        }
    }

    // == Handle Insertion ==
    fn handle_insertion(&mut self, request: InsertionRequest) {
        debug!(name = %request.name, "insertion pending stream completion");
        self.pending
            .spawn(await_completion(request, self.completion_timeout));
    }

    // == Settle ==
    fn settle(&mut self, joined: std::result::Result<Settled, JoinError>) {
        let settled = match joined {
            Ok(settled) => settled,
            Err(e) => {
                self.cache.record_discard();
                self.publish_stats();
                error!(error = %e, "insertion waiter failed");
                return;
            }
        };

        let name = settled.name;
        let cached = match settled.outcome {
            Settlement::Ready(bytes) => {
                let size = bytes.len();
                let inserted = self.cache.put(&name, bytes);
                if inserted {
                    info!(name = %name, size, "cached file");
                }
                inserted
            }
            Settlement::Aborted | Settlement::Dropped => {
                self.cache.record_discard();
                debug!(name = %name, "stream did not complete, capture discarded");
                false
            }
            Settlement::TimedOut => {
                self.cache.record_discard();
                warn!(
                    name = %name,
                    timeout_secs = self.completion_timeout.as_secs(),
                    "stream completion timed out, capture discarded"
                );
                false
            }
            Settlement::DrainFailed(e) => {
                self.cache.record_discard();
                warn!(name = %name, error = %e, "could not read capture, insertion skipped");
                false
            }
        };

        self.publish_stats();
        let _ = settled.applied.send(cached);
    }

    /// Publishes current statistics; done before replying so a caller that
    /// has its answer also sees the stats that produced it.
    fn publish_stats(&self) {
        self.stats.send_replace(self.cache.stats());
    }
}

/// Spawns the coordinator task for `cache`.
///
/// # Returns
/// The handle used to reach the cache, and the task's JoinHandle. The task
/// ends once every clone of the handle is dropped.
pub fn spawn_coordinator(
    cache: EvictionCache,
    queue_depth: usize,
    completion_timeout: Duration,
) -> (CoordinatorHandle, JoinHandle<()>) {
    let (coordinator, handle) = CacheCoordinator::new(cache, queue_depth, completion_timeout);
    (handle, tokio::spawn(coordinator.run()))
}
