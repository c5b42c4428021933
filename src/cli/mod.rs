//! CLI module for the OneThing pilot.
//!
//! This module provides the command-line interface for managing
//! OneThingAI GPU instances.

mod commands;
mod output;

pub use commands::{
    BillTypeArg, BusinessTypeArg, Cli, Commands, ImageCommands, InstanceCommands, OutputFormat,
    ScaleCommands,
};
pub use output::OutputFormatter;
