pub mod mask;
pub mod query;
pub mod serve;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ProxyConfig;
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(name = "maskgate", version, about = "Mask sensitive text before it reaches a language model")]
pub struct Cli {
    /// Config file. Default: .maskgate/config.yml, then ~/.config/maskgate/config.yml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the masked form of a text (file or stdin). The token map is not printed.
    Mask {
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Mask, send to the configured model, unmask; print the exchange as JSON.
    Query {
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,
        /// Query text given inline instead of a file.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
    },
    /// Serve queries on a Unix socket.
    Serve {
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Send a query to a running `serve` instance.
    Ask {
        text: String,
        #[arg(long)]
        socket: Option<PathBuf>,
        /// Seconds to wait for the service.
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
    /// Check that a running `serve` instance answers.
    Health {
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

/// Load the explicit config file, or the project/global one. Returns the
/// config and the directory relative paths in it resolve against.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<(ProxyConfig, PathBuf)> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match explicit {
        Some(path) => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| cwd.clone());
            Ok((ProxyConfig::load_from(path)?, base))
        }
        None => Ok((ProxyConfig::load_project(&cwd)?, cwd.join(".maskgate"))),
    }
}

/// Read the whole input file, or stdin.
pub fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}
