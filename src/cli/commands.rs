//! Command definitions for the Workout Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Workout Timer CLI - an interval training timer
#[derive(Parser, Debug)]
#[command(
    name = "workout",
    version,
    about = "インターバルワークアウトタイマーCLI",
    long_about = "ターミナル上で動作するインターバルトレーニング用タイマー。\n\
                  エクササイズと休憩を交互に繰り返し、音でタイミングを知らせます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a workout session, or resume a paused one
    Start,

    /// Pause the current session
    Pause,

    /// Stop the current session
    Stop,

    /// Show current session status
    Status,

    /// Manage the exercise list
    Exercises {
        /// Exercise subcommand (defaults to list)
        #[command(subcommand)]
        command: Option<ExercisesCommands>,
    },

    /// Show or change the interval durations
    Durations(DurationsArgs),

    /// Show recorded workout history
    History {
        /// Clear the recorded history instead of listing it
        #[arg(long)]
        clear: bool,
    },

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Exercise list subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ExercisesCommands {
    /// List all exercises
    List,

    /// Include an exercise in the workout
    Include {
        /// Exercise identifier
        id: u32,
    },

    /// Exclude an exercise from the workout
    Exclude {
        /// Exercise identifier
        id: u32,
    },
}

// ============================================================================
// Durations Command Arguments
// ============================================================================

/// Arguments for the durations command
#[derive(Args, Debug, Clone)]
pub struct DurationsArgs {
    /// Exercise duration in seconds (5-3600)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(5..=3600)
    )]
    pub exercise: Option<u32>,

    /// Break duration in seconds (5-1800)
    #[arg(
        short,
        long = "break",
        value_parser = clap::value_parser!(u32).range(5..=1800)
    )]
    pub break_time: Option<u32>,
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// State directory override (defaults to ~/.workout)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Disable audio playback
    #[arg(long)]
    pub no_sound: bool,
}

// ============================================================================
// Tests
// ============================================================================
