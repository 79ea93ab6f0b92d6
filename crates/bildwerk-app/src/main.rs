// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk: permission-gated image acquisition
//
// Entry point. Initialises logging, resolves the data directory and the
// persisted acquirer settings, and runs one command against the desktop
// bridge.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bildwerk_bridge::{CenterCropEngine, DesktopBridge};
use bildwerk_core::human_errors::humanize_outcome;
use bildwerk_core::types::SessionId;
use bildwerk_core::AcquirerConfig;
use clap::{Parser, Subcommand};

use services::app_services::{self, AppServices, Delivered};
use services::data_dir;

#[derive(Parser)]
#[command(name = "bildwerk")]
#[command(about = "Acquire a validated, upright JPEG from an image file")]
#[command(version)]
struct Cli {
    /// Data directory holding config.json (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the work directory for temporaries, artifacts and sessions
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one acquisition and print the delivered outcome
    Pick {
        /// Image to select; without it the picker is dismissed
        #[arg(long)]
        file: Option<PathBuf>,

        /// Request payload, e.g. '{"minWidth": 640, "enableCrop": true}'
        #[arg(long, default_value = "{}")]
        request: String,

        /// Offer the built-in center crop when the request enables cropping
        #[arg(long)]
        center_crop: bool,
    },
    /// Show a stored session as JSON
    Status { session: SessionId },
    /// End an outstanding session
    Abandon { session: SessionId },
    /// Print the effective settings, optionally saving them as config.json
    Config {
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "bildwerk failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let data_dir = match cli.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            dir
        }
        None => data_dir::data_dir()?,
    };

    let mut config = match app_services::load_config(&data_dir) {
        Some(config) => config,
        None => AcquirerConfig {
            work_dir: data_dir::data_subdir("work")?,
            ..AcquirerConfig::default()
        },
    };
    if let Some(work_dir) = cli.work_dir {
        config.work_dir = work_dir;
    }
    tracing::info!(work_dir = %config.work_dir.display(), "Bildwerk starting");

    match cli.command {
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                app_services::persist_config(&data_dir, &config)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Pick {
            file,
            request,
            center_crop,
        } => {
            let mut bridge = DesktopBridge::new(file);
            if center_crop {
                bridge = bridge.with_crop_engine(Arc::new(CenterCropEngine));
            }
            let mut services = AppServices::init(config, Arc::new(bridge)).await?;
            match services.pick(&request).await? {
                Some(delivered) => Ok(report(&delivered)),
                None => {
                    println!("session outstanding");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Status { session } => {
            let services =
                AppServices::init(config, Arc::new(DesktopBridge::new(None))).await?;
            match services.session(session)? {
                Some(stored) => {
                    println!("{}", serde_json::to_string_pretty(&stored)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no session {session}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Abandon { session } => {
            let mut services =
                AppServices::init(config, Arc::new(DesktopBridge::new(None))).await?;
            match services.abandon(session)? {
                Some(delivered) => Ok(report(&delivered)),
                None => {
                    println!("session {session} already finished");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}

/// Print the host callback and payload, plus a readable explanation for
/// failures.
fn report(delivered: &Delivered) -> ExitCode {
    let outcome = &delivered.outcome;
    println!(
        "{} {} {}",
        delivered.session,
        outcome.channel().method_name(),
        outcome.payload()
    );
    match humanize_outcome(outcome) {
        Some(human) => {
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}
