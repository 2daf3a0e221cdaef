use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use burstwire_interfaces::SerialLink;
use burstwire_node::{logging, session};

#[derive(Parser)]
#[command(name = "burstwire", about = "Reliable serial data-transfer tester (protocol V4)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initiate a session: handshake, transmit, receive, exchange results
    Client {
        /// Serial port (e.g. /dev/ttyUSB0 or COM3)
        port: String,
        /// Line rate in bits per second
        baud: u32,
        /// Payload bytes per frame
        #[arg(value_parser = clap::value_parser!(i32).range(1..=65_525))]
        payload_size: i32,
        /// Number of frames in each direction
        #[arg(value_parser = clap::value_parser!(i32).range(1..))]
        frame_count: i32,
    },
    /// Respond to a client session
    Server {
        /// Serial port (e.g. /dev/ttyUSB0 or COM3)
        port: String,
        /// Line rate in bits per second
        baud: u32,
    },
}

impl Command {
    fn role(&self) -> session::Role {
        match self {
            Command::Client { .. } => session::Role::Client,
            Command::Server { .. } => session::Role::Server,
        }
    }

    fn port_and_baud(&self) -> (&str, u32) {
        match self {
            Command::Client { port, baud, .. } | Command::Server { port, baud } => (port, *baud),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let role = cli.command.role();
    let (port, baud) = cli.command.port_and_baud();

    let verbose = matches!(
        &cli.command,
        Command::Client { payload_size, .. } if *payload_size > 10_000
    );
    let log_path = PathBuf::from(logging::log_file_name(role.as_str(), port));
    if let Err(e) = logging::init(&log_path, verbose) {
        eprintln!("failed to open log file {}: {e}", log_path.display());
        return ExitCode::FAILURE;
    }
    tracing::info!(role = role.as_str(), log = %log_path.display(), "burstwire starting");

    let link = match SerialLink::open(port, baud) {
        Ok(link) => Arc::new(link),
        Err(e) => {
            tracing::error!(port, baud, error = %e, "failed to open serial port");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Command::Client {
            payload_size,
            frame_count,
            ..
        } => session::run_client(link, payload_size, frame_count)
            .await
            .map(|_| ()),
        Command::Server { .. } => session::run_server(link).await.map(|_| ()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
