//! CLI module
//!
//! Command-line interface for the collector.
//!
//! # Commands
//!
//! - `collect` - Run the full pipeline and write artifacts
//! - `check` - Make one small request to test the key and endpoint

mod commands;
mod logging;
mod runner;

pub use commands::{Cli, Commands};
pub use logging::init_logging;
pub use runner::{collect, Collection, Runner};
