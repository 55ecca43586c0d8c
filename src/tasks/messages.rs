//! Coordinator Messages
//!
//! Request types carried over the coordinator's inbound queues.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::{Result, ServeError};

/// Upper bound on up-front capture allocation; larger files grow as read.
const MAX_CAPTURE_PREALLOC: usize = 1024 * 1024;

// == Lookup ==
/// Answer to a lookup: exactly one of these is sent per request.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The file is cached; here are its bytes
    Found(Arc<[u8]>),
    /// The file is not cached
    NotFound,
}

/// Asks the coordinator whether `name` is cached.
#[derive(Debug)]
pub struct LookupRequest {
    pub name: String,
    pub reply: oneshot::Sender<LookupOutcome>,
}

// == Insertion ==
/// How the stream feeding a capture buffer ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// Every byte reached the client; the buffer holds the whole file
    Delivered(CaptureBuffer),
    /// Streaming stopped early; the buffer is partial and must not be cached
    Aborted,
}

/// Offers a file that is being streamed to the cache.
///
/// Submitted at miss time, before streaming starts. The coordinator only
/// touches the captured bytes once `completion` resolves, and reports on
/// `applied` whether the file ended up cached.
#[derive(Debug)]
pub struct InsertionRequest {
    pub name: String,
    pub completion: oneshot::Receiver<StreamOutcome>,
    pub applied: oneshot::Sender<bool>,
}

// == Capture Buffer ==
/// Bytes observed passing through a tee stream during a miss.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    bytes: Vec<u8>,
    expected_len: u64,
}

impl CaptureBuffer {
    /// Creates an empty buffer for a stream promising `expected_len` bytes.
    pub fn new(expected_len: u64) -> Self {
        let prealloc = usize::try_from(expected_len)
            .unwrap_or(MAX_CAPTURE_PREALLOC)
            .min(MAX_CAPTURE_PREALLOC);
        Self {
            bytes: Vec::with_capacity(prealloc),
            expected_len,
        }
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // == Drain ==
    /// Hands over the captured bytes if they form the complete file.
    pub fn drain(self) -> Result<Vec<u8>> {
        let captured = u64::try_from(self.bytes.len()).unwrap_or(u64::MAX);
        if captured != self.expected_len {
            return Err(ServeError::CacheDrainFailure(format!(
                "captured {} of {} bytes",
                self.bytes.len(),
                self.expected_len
            )));
        }
        Ok(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_drain_complete() {
        let mut capture = CaptureBuffer::new(5);
        capture.extend(b"he");
        capture.extend(b"llo");
        assert_eq!(capture.len(), 5);
        assert_eq!(capture.drain().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_capture_drain_short() {
        let mut capture = CaptureBuffer::new(5);
        capture.extend(b"hel");
        let result = capture.drain();
        assert!(matches!(result, Err(ServeError::CacheDrainFailure(_))));
    }

    #[test]
    fn test_capture_drain_long() {
        let mut capture = CaptureBuffer::new(2);
        capture.extend(b"hello");
        assert!(capture.drain().is_err());
    }

    #[test]
    fn test_capture_empty_file() {
        let capture = CaptureBuffer::new(0);
        assert!(capture.is_empty());
        assert_eq!(capture.drain().unwrap(), Vec::<u8>::new());
    }
}
