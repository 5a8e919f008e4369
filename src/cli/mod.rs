//! CLI module for the Workout Timer.
//!
//! This module contains:
//! - `commands`: clap command definitions
//! - `client`: IPC client for daemon communication
//! - `display`: formatted terminal output

pub mod client;
pub mod commands;
pub mod display;

pub use client::IpcClient;
pub use commands::{Cli, Commands, DaemonArgs, DurationsArgs, ExercisesCommands};
pub use display::Display;
