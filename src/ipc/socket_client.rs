use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::error::{MaskgateError, Result};
use crate::ipc::{ProxyRequest, ProxyResponse, MAX_REQUEST_BYTES, MAX_RESPONSE_BYTES};
use crate::proxy::{ChatExchange, HealthStatus};

fn ipc_err(what: &str, e: impl std::fmt::Display) -> MaskgateError {
    MaskgateError::Ipc {
        reason: format!("{what} failed: {e}"),
    }
}

/// Unix socket client for talking to a running proxy.
pub struct ProxyClient {
    socket_path: PathBuf,
    timeout_secs: u64,
}

impl ProxyClient {
    pub fn new(socket_path: PathBuf, timeout_secs: u64) -> Self {
        Self {
            socket_path,
            timeout_secs,
        }
    }

    /// Send a request and wait for the response, bounded by the client timeout.
    pub async fn request(&self, req: &ProxyRequest) -> Result<ProxyResponse> {
        if !self.socket_path.exists() {
            return Err(MaskgateError::SocketNotFound {
                path: self.socket_path.clone(),
            });
        }

        tokio::time::timeout(Duration::from_secs(self.timeout_secs), self.round_trip(req))
            .await
            .map_err(|_| MaskgateError::RequestTimeout {
                timeout_secs: self.timeout_secs,
            })?
    }

    /// Send a user query; a service-side failure comes back as `Ipc`.
    pub async fn query(&self, user_query: &str) -> Result<ChatExchange> {
        let req = ProxyRequest::Query {
            user_query: user_query.to_string(),
        };
        match self.request(&req).await? {
            ProxyResponse::Exchange(exchange) => Ok(exchange),
            ProxyResponse::Error { message } => Err(MaskgateError::Ipc { reason: message }),
            other => Err(MaskgateError::Ipc {
                reason: format!("unexpected response: {other:?}"),
            }),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        match self.request(&ProxyRequest::Health).await? {
            ProxyResponse::Health(status) => Ok(status),
            ProxyResponse::Error { message } => Err(MaskgateError::Ipc { reason: message }),
            other => Err(MaskgateError::Ipc {
                reason: format!("unexpected response: {other:?}"),
            }),
        }
    }

    async fn round_trip(&self, req: &ProxyRequest) -> Result<ProxyResponse> {
        let mut line = serde_json::to_string(req)?;
        line.push('\n');
        if line.len() > MAX_REQUEST_BYTES {
            return Err(MaskgateError::Ipc {
                reason: format!("request exceeds {MAX_REQUEST_BYTES} bytes"),
            });
        }

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| ipc_err("connect", e))?;
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ipc_err("write", e))?;
        writer.shutdown().await.map_err(|e| ipc_err("shutdown write", e))?;

        let mut response_line = Vec::new();
        BufReader::new(reader.take(MAX_RESPONSE_BYTES as u64))
            .read_until(b'\n', &mut response_line)
            .await
            .map_err(|e| ipc_err("read", e))?;
        if response_line.len() >= MAX_RESPONSE_BYTES && !response_line.ends_with(b"\n") {
            return Err(MaskgateError::Ipc {
                reason: format!("response exceeds {MAX_RESPONSE_BYTES} bytes"),
            });
        }

        serde_json::from_slice(response_line.trim_ascii())
            .map_err(|e| ipc_err("decode response", e))
    }
}
