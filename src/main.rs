//! Workout Timer CLI - an interval training timer
//!
//! This tool drives timed workout sessions:
//! - A configurable exercise interval per exercise
//! - A configurable break between exercises
//! - Pause/resume and audio cues, with history of completed workouts

use anyhow::Result;
use clap::{CommandFactory, Parser};

use workout::cli::{Cli, Commands, Display, ExercisesCommands, IpcClient};
use workout::daemon::{self, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    // Set verbose logging if requested
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start) => {
            let client = IpcClient::new()?;
            let response = client.start().await?;
            if response.status == "error" {
                Display::show_error(&response.message);
            } else {
                Display::show_start_success(&response);
            }
        }
        Some(Commands::Pause) => {
            let client = IpcClient::new()?;
            let response = client.pause().await?;
            if response.status == "error" {
                Display::show_error(&response.message);
            } else {
                Display::show_pause_success(&response);
            }
        }
        Some(Commands::Stop) => {
            let client = IpcClient::new()?;
            let response = client.stop().await?;
            Display::show_stop_success(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::new()?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Exercises { command }) => {
            let client = IpcClient::new()?;
            match command.unwrap_or(ExercisesCommands::List) {
                ExercisesCommands::List => {
                    let response = client.exercises().await?;
                    Display::show_exercises(&response);
                }
                ExercisesCommands::Include { id } => {
                    let response = client.include(id, true).await?;
                    if response.status == "error" {
                        Display::show_error(&response.message);
                    } else {
                        Display::show_exercises(&response);
                    }
                }
                ExercisesCommands::Exclude { id } => {
                    let response = client.include(id, false).await?;
                    if response.status == "error" {
                        Display::show_error(&response.message);
                    } else {
                        Display::show_exercises(&response);
                    }
                }
            }
        }
        Some(Commands::Durations(args)) => {
            let client = IpcClient::new()?;
            let response = client.durations(args.exercise, args.break_time).await?;
            if response.status == "error" {
                Display::show_error(&response.message);
            } else {
                Display::show_durations(&response);
            }
        }
        Some(Commands::History { clear }) => {
            let client = IpcClient::new()?;
            if clear {
                let response = client.history_clear().await?;
                Display::show_message(&response);
            } else {
                let response = client.history().await?;
                Display::show_history(&response);
            }
        }
        Some(Commands::Daemon(args)) => {
            daemon::run(DaemonOptions {
                state_dir: args.state_dir,
                no_sound: args.no_sound,
            })
            .await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
