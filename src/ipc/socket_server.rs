use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::Notify;

use crate::error::{MaskgateError, Result};
use crate::ipc::{ProxyRequest, ProxyResponse, MAX_REQUEST_BYTES, MAX_RESPONSE_BYTES};

/// Boxed request handler used by [`ProxyServer::serve`].
pub type Handler =
    dyn Fn(ProxyRequest) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send>> + Send + Sync;

/// Unix socket server for the masking proxy.
pub struct ProxyServer {
    socket_path: PathBuf,
    shutdown_signal: Arc<Notify>,
}

impl ProxyServer {
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            shutdown_signal: Arc::new(Notify::new()),
        }
    }

    /// Start listening for connections. Each connection is handled in a spawned task.
    pub async fn serve<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(ProxyRequest) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send>>
            + Send
            + Sync
            + 'static,
    {
        // Remove a stale socket left by a previous run
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| MaskgateError::Ipc {
                reason: format!(
                    "failed to bind socket at {}: {}",
                    self.socket_path.display(),
                    e
                ),
            })?;
        set_socket_permissions(&self.socket_path);

        tracing::info!(socket = %self.socket_path.display(), "proxy listening");

        let handler: Arc<Handler> = Arc::new(handler);
        let shutdown = self.shutdown_signal.clone();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let handler = handler.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handler).await {
                                    tracing::warn!(error = %e, "connection error");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept error");
                        }
                    }
                }
                _ = shutdown.notified() => {
                    tracing::info!("proxy shutting down");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }

    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown_signal.clone()
    }
}

/// Handle a single client connection: one JSON request line, one JSON response line.
async fn handle_connection(stream: tokio::net::UnixStream, handler: Arc<Handler>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader.take(MAX_REQUEST_BYTES as u64));
    let mut line = Vec::new();

    buf_reader
        .read_until(b'\n', &mut line)
        .await
        .map_err(|e| MaskgateError::Ipc {
            reason: format!("read failed: {}", e),
        })?;

    let response = if line.len() >= MAX_REQUEST_BYTES && !line.ends_with(b"\n") {
        tracing::warn!(limit = MAX_REQUEST_BYTES, "request too large");
        ProxyResponse::Error {
            message: format!("request exceeds {} bytes", MAX_REQUEST_BYTES),
        }
    } else {
        match serde_json::from_slice::<ProxyRequest>(line.trim_ascii()) {
            Ok(request) => handler(request).await,
            Err(e) => ProxyResponse::Error {
                message: format!("invalid request JSON: {}", e),
            },
        }
    };

    let mut response_json = serde_json::to_string(&response)?;
    if response_json.len() >= MAX_RESPONSE_BYTES {
        tracing::warn!(
            size = response_json.len(),
            limit = MAX_RESPONSE_BYTES,
            "response too large"
        );
        response_json = serde_json::to_string(&ProxyResponse::Error {
            message: format!("response exceeds {} bytes", MAX_RESPONSE_BYTES),
        })?;
    }
    response_json.push('\n');

    writer
        .write_all(response_json.as_bytes())
        .await
        .map_err(|e| MaskgateError::Ipc {
            reason: format!("write failed: {}", e),
        })?;
    writer.shutdown().await.map_err(|e| MaskgateError::Ipc {
        reason: format!("shutdown failed: {}", e),
    })?;

    Ok(())
}

/// Owner-only access to the socket (0600).
#[cfg(unix)]
fn set_socket_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    let _ = std::fs::set_permissions(path, perms);
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &std::path::Path) {}
