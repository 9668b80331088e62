use std::path::PathBuf;

use crate::error::Result;
use crate::ipc::socket_client::ProxyClient;
use crate::proxy::{ChatExchange, ChatProxy};

/// Run one masked round trip in-process and print the exchange.
pub async fn run_query(
    config: Option<&PathBuf>,
    file: Option<&PathBuf>,
    text: Option<&str>,
) -> Result<()> {
    let (config, base_dir) = super::load_config(config)?;
    let proxy = ChatProxy::from_config(&config, &base_dir)?;

    let exchange = match text {
        Some(text) => proxy.query(text).await?,
        None => proxy.query_document(&super::read_input(file)?).await?,
    };
    print_exchange(&exchange)
}

/// Send a query to a running service and print the exchange.
pub async fn run_ask(
    config: Option<&PathBuf>,
    text: &str,
    socket: Option<&PathBuf>,
    timeout_secs: u64,
) -> Result<()> {
    let (config, _) = super::load_config(config)?;
    let socket_path = socket.cloned().unwrap_or_else(|| config.socket_path());
    let client = ProxyClient::new(socket_path, timeout_secs);

    let exchange = client.query(text).await?;
    print_exchange(&exchange)
}

/// Ask a running service for its health status.
pub async fn run_health(config: Option<&PathBuf>, socket: Option<&PathBuf>) -> Result<()> {
    let (config, _) = super::load_config(config)?;
    let socket_path = socket.cloned().unwrap_or_else(|| config.socket_path());
    let client = ProxyClient::new(socket_path, 5);

    let status = client.health().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_exchange(exchange: &ChatExchange) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(exchange)?);
    Ok(())
}
