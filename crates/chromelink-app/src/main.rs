// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chromelink — native-side object bridge for WebView chrome clients
//
// Entry point. Loads configuration, initialises logging, starts the
// in-process remote side on the tokio runtime, drives a scripted host session
// on a blocking thread, and prints the remote's transcript as JSON lines.

mod remote;
mod session;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

use chromelink_core::config::BridgeConfig;
use chromelink_core::error::Result;
use chromelink_messaging::ChannelMessenger;

use remote::{SimulatedRemote, write_transcript};

/// Run a scripted chrome-client session against an in-process remote side.
#[derive(Parser, Debug)]
#[command(name = "chromelink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the transcript here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    transcript: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chromelink: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match run(config, args.transcript.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path),
        None => Ok(BridgeConfig::default()),
    }
}

async fn run(config: BridgeConfig, transcript_path: Option<&Path>) -> Result<()> {
    let session_id = Uuid::new_v4();
    info!(session = %session_id, first_host_handle = config.first_host_handle, "Chromelink starting");

    let (messenger, receiver) = ChannelMessenger::new();
    let remote = tokio::spawn(SimulatedRemote::new(session_id).run(receiver));

    let report = tokio::task::spawn_blocking(move || session::run(&config, messenger))
        .await
        .map_err(std::io::Error::from)??;
    let transcript = remote.await.map_err(std::io::Error::from)?;

    match transcript_path {
        Some(path) => write_transcript(&transcript, BufWriter::new(File::create(path)?))?,
        None => write_transcript(&transcript, std::io::stdout().lock())?,
    }

    info!(
        session = %session_id,
        messages = transcript.len(),
        report = %serde_json::to_string(&report)?,
        "Chromelink finished"
    );
    Ok(())
}
