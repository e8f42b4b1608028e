//! dogtalk CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or unknown profile
//! - 3: Validation failure

use std::process::ExitCode;

use clap::Parser;
use dogtalk_profile::ProfileError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// Process exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "dogtalk=debug" } else { "dogtalk=info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    // Ignore a second init (e.g. under a test harness)
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let root = match cli.root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("❌ Error: cannot determine working directory: {}", e);
                return ExitCode::from(ExitCodes::GENERAL_ERROR);
            }
        },
    };

    let result = match cli.command {
        Commands::Register(args) => commands::register::execute(args, &root).await,
        Commands::Profiles(args) => commands::profiles::execute(args, &root).await,
        Commands::Chat(args) => commands::chat::execute(args, &root).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map an error to its exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(profile_error) = cause.downcast_ref::<ProfileError>() {
            return match profile_error {
                ProfileError::Validation(_) | ProfileError::NotEnoughPhotos { .. } => {
                    ExitCodes::VALIDATION_FAILURE
                }
                ProfileError::NotFound(_) | ProfileError::InvalidGender(_) => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
