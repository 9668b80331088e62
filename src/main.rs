use clap::Parser;
use tracing::Level;

use maskgate::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = args.config.as_ref();
    match &args.command {
        Command::Mask { file } => cli::mask::run(config, file.as_ref())?,
        Command::Query { file, text } => {
            cli::query::run_query(config, file.as_ref(), text.as_deref()).await?
        }
        Command::Serve { socket } => cli::serve::run(config, socket.as_ref()).await?,
        Command::Ask {
            text,
            socket,
            timeout,
        } => cli::query::run_ask(config, text, socket.as_ref(), *timeout).await?,
        Command::Health { socket } => cli::query::run_health(config, socket.as_ref()).await?,
    }
    Ok(())
}
