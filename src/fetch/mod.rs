//! Fetch Module
//!
//! Per-request file retrieval: asks the coordinator for a cached copy and,
//! on a miss, streams from disk through a tee that captures the bytes for
//! the cache.

mod source;
mod tee;

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::Result;
use crate::tasks::{CaptureBuffer, CoordinatorHandle, InsertionRequest, LookupOutcome, StreamOutcome};

pub use source::{FileInfo, ServeRoot};
pub use tee::TeeReader;

// == Fetch Pipeline ==
/// Resolves requests against the cache first and the serve root second.
#[derive(Debug, Clone)]
pub struct FetchPipeline {
    root: ServeRoot,
    coordinator: CoordinatorHandle,
}

impl FetchPipeline {
    pub fn new(root: ServeRoot, coordinator: CoordinatorHandle) -> Self {
        Self { root, coordinator }
    }

    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }

    // == Fetch ==
    /// Returns a readable stream for `name`.
    ///
    /// On a miss the file is opened and an insertion request is queued
    /// before the stream is returned. The caller must read the stream and
    /// then call [`FetchStream::finish`]; dropping it instead counts as a
    /// failed delivery.
    ///
    /// # Errors
    /// - `NotFound` if the file does not exist
    /// - `IsDirectory` if the name resolves to a directory
    /// - `InvalidName` if the name leaves the serve root
    /// - `CoordinatorUnavailable` if the cache task has stopped
    pub async fn fetch(&self, name: &str) -> Result<FetchStream> {
        // Bad names never reach the cache or its stats.
        self.root.resolve(name)?;

        match self.coordinator.lookup(name).await? {
            LookupOutcome::Found(data) => {
                debug!(name, size = data.len(), "serving from cache");
                Ok(FetchStream::cached(name, data))
            }
            LookupOutcome::NotFound => {
                let (file, len) = self.root.open(name).await?;
                debug!(name, size = len, "serving from disk");

                let (completion_tx, completion) = oneshot::channel();
                let (applied, applied_rx) = oneshot::channel();
                self.coordinator
                    .submit_insertion(InsertionRequest {
                        name: name.to_string(),
                        completion,
                        applied,
                    })
                    .await?;

                let reader = TeeReader::new(file, CaptureBuffer::new(len));
                Ok(FetchStream::captured(name, len, reader, completion_tx, applied_rx))
            }
        }
    }
}

// == Fetch Stream ==
enum Body {
    Cached(Cursor<Arc<[u8]>>),
    Captured {
        reader: TeeReader<File>,
        completion: oneshot::Sender<StreamOutcome>,
        applied: oneshot::Receiver<bool>,
    },
}

/// File contents for one request, from the cache or from disk.
pub struct FetchStream {
    name: String,
    len: u64,
    body: Body,
}

impl FetchStream {
    fn cached(name: &str, data: Arc<[u8]>) -> Self {
        Self {
            name: name.to_string(),
            len: data.len() as u64,
            body: Body::Cached(Cursor::new(data)),
        }
    }

    fn captured(
        name: &str,
        len: u64,
        reader: TeeReader<File>,
        completion: oneshot::Sender<StreamOutcome>,
        applied: oneshot::Receiver<bool>,
    ) -> Self {
        Self {
            name: name.to_string(),
            len,
            body: Body::Captured {
                reader,
                completion,
                applied,
            },
        }
    }

    /// Total number of bytes the stream will yield.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self.body, Body::Cached(_))
    }

    // == Finish ==
    /// Reports how delivery went and waits for the cache's decision.
    ///
    /// Pass `delivered = true` only when every byte reached the client.
    /// Returns true if this stream's capture was added to the cache.
    pub async fn finish(self, delivered: bool) -> bool {
        let Body::Captured {
            reader,
            completion,
            applied,
        } = self.body
        else {
            return false;
        };

        let outcome = if delivered {
            StreamOutcome::Delivered(reader.into_capture())
        } else {
            StreamOutcome::Aborted
        };
        if completion.send(outcome).is_err() {
            debug!(name = %self.name, "coordinator stopped waiting for this stream");
            return false;
        }
        applied.await.unwrap_or(false)
    }
}

impl AsyncRead for FetchStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().body {
            Body::Cached(cursor) => Pin::new(cursor).poll_read(cx, buf),
            Body::Captured { reader, .. } => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

impl std::fmt::Debug for FetchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchStream")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("cache_hit", &self.is_cache_hit())
            .finish()
    }
}
