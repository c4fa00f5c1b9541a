//! Configuration management
//!
//! This module handles the node settings: listen address, peers, mining
//! difficulty, batch size, worker count and the genesis account table.

pub mod settings;

pub use settings::{Config, MAX_DIFFICULTY};
