//! Tee Reader
//!
//! An `AsyncRead` wrapper that copies every byte it yields into a capture
//! buffer.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use crate::tasks::CaptureBuffer;

/// Reads from `inner` and records each delivered chunk in `capture`.
///
/// The capture is owned here while reads are in flight and only leaves
/// through [`TeeReader::into_capture`], so nothing else can observe it half
/// written.
#[derive(Debug)]
pub struct TeeReader<R> {
    inner: R,
    capture: CaptureBuffer,
}

impl<R> TeeReader<R> {
    pub fn new(inner: R, capture: CaptureBuffer) -> Self {
        Self { inner, capture }
    }

    /// Bytes captured so far.
    #[cfg(test)]
    pub(crate) fn captured(&self) -> usize {
        self.capture.len()
    }

    /// Consumes the reader, returning what it captured.
    pub fn into_capture(self) -> CaptureBuffer {
        self.capture
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for TeeReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        this.capture.extend(&buf.filled()[before..]);
        Poll::Ready(Ok(()))
    }
}
