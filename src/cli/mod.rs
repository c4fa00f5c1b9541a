//! Command-line interface
//!
//! This module contains the CLI commands and argument parsing
//! for running a node and talking to one.

pub mod commands;

pub use commands::{AccountArg, Command, NodeArgs, Opt};
