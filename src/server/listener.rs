//! Accept Loop
//!
//! Accepts TCP connections and hands each to its own task.

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::fetch::FetchPipeline;
use crate::server::connection::handle_connection;

/// Accepts connections on `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task; a failed accept or request is
/// logged and never stops the loop. A client gets `request_timeout` to send
/// its name frame. Connections already in progress are
/// left to finish on their own.
pub async fn serve<F>(
    listener: TcpListener,
    pipeline: FetchPipeline,
    request_timeout: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    if let Ok(addr) = listener.local_addr() {
        info!("File server listening on {}", addr);
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("File server no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    let pipeline = pipeline.clone();
                    tokio::spawn(async move {
                        match handle_connection(socket, &pipeline, request_timeout).await {
                            Ok(sent) => debug!(%peer, sent, "connection complete"),
                            Err(e) => warn!(%peer, error = %e, "connection dropped"),
                        }
                    });
                }
                Err(e) => warn!(error = %e, "connection accept failed"),
            },
        }
    }
}
