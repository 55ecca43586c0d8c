//! Connection Handler
//!
//! Drives one request/response cycle over an accepted connection.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{Result, ServeError};
use crate::fetch::FetchPipeline;
use crate::server::protocol::{read_request_name, write_length_header};

/// Serves a single request on `stream`.
///
/// Reads the name frame (giving up after `request_timeout`), writes the
/// length header, then streams exactly that many bytes. Any failure returns early; the caller drops the
/// connection, which is all the client ever sees of an error. The fetch is
/// reported as delivered only after the whole body was written and flushed,
/// so a partial response never reaches the cache.
///
/// # Returns
/// Number of body bytes sent.
pub async fn handle_connection<S>(
    mut stream: S,
    pipeline: &FetchPipeline,
    request_timeout: Duration,
) -> Result<u64>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = read_request_name(&mut stream, request_timeout).await?;
    info!(name = %name, "client requesting file");

    let mut body = pipeline.fetch(&name).await?;
    let len = body.len();

    if let Err(e) = write_length_header(&mut stream, len).await {
        body.finish(false).await;
        return Err(ServeError::StreamWriteFailure(format!(
            "could not write length header: {}",
            e
        )));
    }

    let copied = tokio::io::copy(&mut (&mut body).take(len), &mut stream).await;
    let sent = match copied {
        Ok(sent) => sent,
        Err(e) => {
            body.finish(false).await;
            return Err(ServeError::StreamWriteFailure(e.to_string()));
        }
    };

    if sent != len {
        body.finish(false).await;
        return Err(ServeError::StreamWriteFailure(format!(
            "sent {} of {} bytes",
            sent, len
        )));
    }

    if let Err(e) = stream.flush().await {
        body.finish(false).await;
        return Err(ServeError::StreamWriteFailure(e.to_string()));
    }

    // Close only after the cache has decided, so a client that sees EOF also
    // sees the file cached on its next request.
    let hit = body.is_cache_hit();
    let cached = body.finish(true).await;
    if let Err(e) = stream.shutdown().await {
        debug!(name = %name, error = %e, "shutdown after send failed");
    }
    debug!(name = %name, sent, hit, cached, "file sent");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionCache;
    use crate::fetch::ServeRoot;
    use crate::server::protocol::encode_name_frame;
    use crate::tasks::spawn_coordinator;
    use tokio::io::duplex;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn pipeline_with(name: &str, body: &[u8]) -> (tempfile::TempDir, FetchPipeline) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), body).unwrap();
        let root = ServeRoot::new(dir.path());
        let (handle, _task) =
            spawn_coordinator(EvictionCache::new(1024), 4, Duration::from_secs(30));
        (dir, FetchPipeline::new(root, handle))
    }

    /// Runs one request through an in-memory pipe and returns the raw reply.
    async fn round_trip(pipeline: &FetchPipeline, request: &[u8]) -> (Result<u64>, Vec<u8>) {
        let (mut client, server) = duplex(64 * 1024);
        client.write_all(request).await.unwrap();
        client.shutdown().await.unwrap();

        let result = handle_connection(server, pipeline, REQUEST_TIMEOUT).await;
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        (result, reply)
    }

    #[tokio::test]
    async fn test_serves_header_and_body() {
        let (_dir, pipeline) = pipeline_with("a.txt", b"hello");
        let frame = encode_name_frame("a.txt").unwrap();

        let (result, reply) = round_trip(&pipeline, &frame).await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(&reply[..8], &5u64.to_be_bytes());
        assert_eq!(&reply[8..], b"hello");
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let (_dir, pipeline) = pipeline_with("a.txt", b"hello");
        let frame = encode_name_frame("a.txt").unwrap();

        let (_, first) = round_trip(&pipeline, &frame).await;
        let (_, second) = round_trip(&pipeline, &frame).await;

        assert_eq!(first, second);
        let stats = pipeline.coordinator().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_short_request_gets_no_reply() {
        let (_dir, pipeline) = pipeline_with("a.txt", b"hello");

        let (result, reply) = round_trip(&pipeline, b"a.txt").await;

        assert!(matches!(result, Err(ServeError::MalformedRequest(_))));
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_gets_no_reply() {
        let (_dir, pipeline) = pipeline_with("a.txt", b"hello");
        let frame = encode_name_frame("b.txt").unwrap();

        let (result, reply) = round_trip(&pipeline, &frame).await;

        assert!(matches!(result, Err(ServeError::NotFound(_))));
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_client_gone_before_body_not_cached() {
        let (_dir, pipeline) = pipeline_with("big.bin", &vec![9u8; 4096]);
        let frame = encode_name_frame("big.bin").unwrap();

        // Pipe smaller than the body, and the client hangs up after the request.
        let (mut client, server) = duplex(512);
        client.write_all(&frame).await.unwrap();
        drop(client);

        let result = handle_connection(server, &pipeline, REQUEST_TIMEOUT).await;
        assert!(matches!(result, Err(ServeError::StreamWriteFailure(_))));
        assert_eq!(pipeline.coordinator().stats().insertions, 0);
    }

    #[tokio::test]
    async fn test_partial_frame_from_idle_client_is_dropped() {
        let (_dir, pipeline) = pipeline_with("a.txt", b"hello");

        // The client sends part of a frame and keeps its end open.
        let (mut client, server) = duplex(1024);
        client.write_all(b"a.txt").await.unwrap();

        let result = tokio::time::timeout(
            REQUEST_TIMEOUT,
            handle_connection(server, &pipeline, Duration::from_millis(50)),
        )
        .await
        .expect("handler should give up on the partial frame");

        assert!(matches!(result, Err(ServeError::MalformedRequest(_))));
        assert_eq!(pipeline.coordinator().stats().misses, 0);
        drop(client);
    }
}
