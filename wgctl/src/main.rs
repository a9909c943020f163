//! Command-line inspector for tunnel definition files.
//!
//! `wgctl` exercises the translator side of the core: it parses a
//! tunnel definition and either prints a summary or writes the binary
//! driver blob. Lifecycle operations need the platform driver and live
//! in the embedding application, not here.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use wg_core::logging::{init_logging, LogOptions};
use wg_core::{TunnelConfig, HEADER_SIZE, PEER_RECORD_SIZE};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevelArg> for tracing::Level {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Trace => tracing::Level::TRACE,
            LogLevelArg::Debug => tracing::Level::DEBUG,
            LogLevelArg::Info => tracing::Level::INFO,
            LogLevelArg::Warn => tracing::Level::WARN,
            LogLevelArg::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = "Examples:\n  wgctl check office.conf\n  wgctl check office.conf --output json\n  wgctl encode office.conf -o office.blob")]
struct Args {
    /// Log level
    #[arg(short, long, value_enum, default_value = "warn", env = "WGCTL_LOG_LEVEL")]
    log_level: LogLevelArg,

    /// Output format for command results (table|json)
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a tunnel definition and print a summary
    Check {
        /// Path to the tunnel definition file
        file: PathBuf,
    },
    /// Parse a tunnel definition and write the driver blob
    Encode {
        /// Path to the tunnel definition file
        file: PathBuf,

        /// Where to write the blob
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct PeerSummary {
    public_key_set: bool,
    endpoint: Option<String>,
    allowed_ips: Vec<String>,
}

#[derive(Serialize)]
struct ConfigSummary {
    listen_port: u16,
    addresses: Vec<String>,
    peers: Vec<PeerSummary>,
    blob_len: usize,
}

impl ConfigSummary {
    fn from_config(config: &TunnelConfig) -> Self {
        ConfigSummary {
            listen_port: config.interface.listen_port,
            addresses: config
                .interface
                .addresses
                .iter()
                .map(|c| c.to_string())
                .collect(),
            peers: config
                .peers
                .iter()
                .map(|p| PeerSummary {
                    public_key_set: true,
                    endpoint: p.endpoint.map(|e| e.to_string()),
                    allowed_ips: p.allowed_ips.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
            blob_len: HEADER_SIZE + config.peers.len() * PEER_RECORD_SIZE,
        }
    }
}

fn print_summary(fmt: OutputFormat, summary: &ConfigSummary) -> Result<()> {
    match fmt {
        OutputFormat::Table => {
            println!("listen port : {}", summary.listen_port);
            println!(
                "addresses   : {}",
                if summary.addresses.is_empty() {
                    "(none)".to_string()
                } else {
                    summary.addresses.join(", ")
                }
            );
            println!("peers       : {}", summary.peers.len());
            for (i, peer) in summary.peers.iter().enumerate() {
                println!(
                    "  peer {i}: endpoint {}, allowed {}",
                    peer.endpoint.as_deref().unwrap_or("(unset)"),
                    if peer.allowed_ips.is_empty() {
                        "(none)".to_string()
                    } else {
                        peer.allowed_ips.join(", ")
                    }
                );
            }
            println!("blob length : {} bytes", summary.blob_len);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = init_logging(LogOptions {
        level: args.log_level.into(),
        ..Default::default()
    });

    match args.command {
        Command::Check { file } => {
            let config = TunnelConfig::from_file(&file)
                .with_context(|| format!("checking {}", file.display()))?;
            print_summary(args.output, &ConfigSummary::from_config(&config))?;
        }
        Command::Encode { file, output } => {
            let config = TunnelConfig::from_file(&file)
                .with_context(|| format!("translating {}", file.display()))?;
            let blob = config.encode()?;
            fs::write(&output, &blob)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(blob_len = blob.len(), output = %output.display(), "blob written");
            print_summary(args.output, &ConfigSummary::from_config(&config))?;
        }
    }

    Ok(())
}
