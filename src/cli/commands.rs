//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Polygon.io ticker reference collector
#[derive(Parser, Debug)]
#[command(name = "ticker-collector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Collect tickers, validate them and write all artifacts
    Collect {
        /// Stop after this many accepted records
        #[arg(long)]
        max_records: Option<usize>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Market filter (`all` removes the filter)
        #[arg(long)]
        market: Option<String>,

        /// Directory for the output artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Make one small request and print what comes back
    Check {
        /// Number of tickers to request (1 to 1000)
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=1000))]
        sample: u32,

        /// Save the raw response JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_collect_overrides() {
        let cli = Cli::try_parse_from([
            "ticker-collector",
            "-C",
            "collector.yaml",
            "collect",
            "--max-records",
            "50",
            "--max-pages",
            "2",
            "--market",
            "crypto",
            "-o",
            "out",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("collector.yaml")));
        assert_eq!(
            cli.command,
            Commands::Collect {
                max_records: Some(50),
                max_pages: Some(2),
                market: Some("crypto".to_string()),
                output_dir: Some(PathBuf::from("out")),
            }
        );
    }

    #[test]
    fn test_parse_check_defaults() {
        let cli = Cli::try_parse_from(["ticker-collector", "check", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::Check {
                sample: 5,
                save: None
            }
        );
    }

    #[test]
    fn test_check_sample_range() {
        for bad in ["0", "1001"] {
            assert!(Cli::try_parse_from(["ticker-collector", "check", "--sample", bad]).is_err());
        }

        let cli = Cli::try_parse_from(["ticker-collector", "check", "--sample", "1000"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { sample: 1000, .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["ticker-collector", "collect", "--log-file", "run.log"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["ticker-collector"]).is_err());
    }
}
