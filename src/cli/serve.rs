use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::ipc::{handle_request, ProxyRequest, ProxyResponse};
use crate::ipc::socket_server::ProxyServer;
use crate::proxy::ChatProxy;

/// Serve masked queries on a Unix socket until interrupted.
pub async fn run(config: Option<&PathBuf>, socket: Option<&PathBuf>) -> Result<()> {
    let (config, base_dir) = super::load_config(config)?;
    let socket_path = socket.cloned().unwrap_or_else(|| config.socket_path());
    let proxy = Arc::new(ChatProxy::from_config(&config, &base_dir)?);

    tracing::info!(
        detectors = ?proxy.pipeline().detector_names(),
        "pipeline ready"
    );

    let server = ProxyServer::new(socket_path);
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.notify_one();
        }
    });

    server
        .serve(move |request: ProxyRequest| -> Pin<Box<dyn Future<Output = ProxyResponse> + Send>> {
            let proxy = proxy.clone();
            Box::pin(async move { handle_request(&proxy, request).await })
        })
        .await
}
