//! CLI module for the kiosk.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `watch`: Periodic due-check loop

pub mod commands;
pub mod display;
pub mod watch;

pub use commands::{AddArgs, AlarmCommand, Cli, Commands, PlayArgs, TimeOfDay, WatchArgs};
pub use display::Display;
pub use watch::{DueWatcher, MinuteGate};
