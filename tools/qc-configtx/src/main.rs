//! qc-configtx: offline work on channel configuration documents.
//!
//! Trees are read and written as JSON; updates are written in their
//! canonical binary encoding, exactly as they are signed and submitted.

mod commands;

use clap::{Parser, Subcommand};
use quantum_telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use std::path::PathBuf;

/// qc-configtx: compute, inspect and edit configuration updates
#[derive(Parser, Debug)]
#[command(name = "qc-configtx")]
#[command(about = "Offline tooling for channel configuration updates")]
struct Args {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format: pretty, json or off (overrides QC_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the update turning one tree into another
    ComputeUpdate {
        #[arg(long)]
        original: PathBuf,
        #[arg(long)]
        updated: PathBuf,
        /// Where to write the encoded update
        #[arg(long)]
        output: PathBuf,
    },
    /// Print an encoded update as JSON
    DecodeUpdate {
        #[arg(long)]
        input: PathBuf,
    },
    /// List the consenters of a tree
    Consenters {
        #[arg(long)]
        config: PathBuf,
    },
    /// Append a consenter and write the edited tree
    AddConsenter {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        /// File holding the client TLS certificate
        #[arg(long)]
        client_cert: PathBuf,
        /// File holding the server TLS certificate
        #[arg(long)]
        server_cert: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Remove every consenter holding a certificate and write the edited tree
    RemoveConsenter {
        #[arg(long)]
        config: PathBuf,
        /// File holding the client or server TLS certificate
        #[arg(long)]
        cert: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::for_tool("qc-configtx")?.with_verbosity(args.verbose);
    if let Some(format) = args.log_format {
        telemetry = telemetry.with_format(format);
    }
    let _telemetry = init_telemetry(telemetry)?;

    match args.command {
        Command::ComputeUpdate {
            original,
            updated,
            output,
        } => {
            let summary = commands::compute_update(&original, &updated, &output)?;
            println!("{}", summary);
        }
        Command::DecodeUpdate { input } => {
            println!("{}", commands::decode_update(&input)?);
        }
        Command::Consenters { config } => {
            for line in commands::list_consenters(&config)? {
                println!("{}", line);
            }
        }
        Command::AddConsenter {
            config,
            host,
            port,
            client_cert,
            server_cert,
            output,
        } => {
            commands::add_consenter(&config, host, port, &client_cert, &server_cert, &output)?;
        }
        Command::RemoveConsenter {
            config,
            cert,
            output,
        } => {
            let removed = commands::remove_consenter(&config, &cert, &output)?;
            if removed == 0 {
                eprintln!("no consenter holds that certificate; tree written unchanged");
            }
        }
    }
    Ok(())
}
