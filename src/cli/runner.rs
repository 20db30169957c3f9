//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::CollectorConfig;
use crate::engine::{CollectionEngine, FinalizedRun, StopReason};
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::output::{write_json, ArtifactWriter, Artifacts};
use crate::quality::{QualityReport, QualityScorer};
use crate::types::JsonValue;
use std::path::Path;
use tracing::info;

/// Everything one collection produced
#[derive(Debug, Clone)]
pub struct Collection {
    pub run: FinalizedRun,
    pub report: QualityReport,
    pub artifacts: Artifacts,
}

/// Run the whole pipeline for a validated config.
///
/// The API key is resolved before any request is made; a missing key is a
/// fatal error. Fetch failures do not fail this function: they end up in
/// the run's stop reason and the artifacts are still written.
pub async fn collect(config: &CollectorConfig) -> Result<Collection> {
    let api_key = config.auth.resolve_api_key()?;
    let engine = CollectionEngine::from_config(config, api_key)?;

    let run = engine.run().await;
    let report = QualityScorer::new(&config.quality).score(&run.records, &run.validation);
    let artifacts = ArtifactWriter::new(&config.output, &config.source).write(&run, &report)?;

    Ok(Collection {
        run,
        report,
        artifacts,
    })
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Collect { .. } => self.collect().await,
            Commands::Check { sample, save } => self.check(*sample, save.as_deref()).await,
        }
    }

    /// Load the config file (or defaults), apply command-line overrides, validate
    pub fn load_config(&self) -> Result<CollectorConfig> {
        let mut config = match &self.cli.config {
            Some(path) => CollectorConfig::from_file(path)?,
            None => CollectorConfig::default(),
        };
        apply_overrides(&mut config, &self.cli.command);
        config.validate()?;
        Ok(config)
    }

    async fn collect(&self) -> Result<()> {
        let config = self.load_config()?;
        let collection = collect(&config).await?;
        let run = &collection.run;

        println!(
            "Collected {} records in {} pages ({} requests, {:.0}% successful)",
            run.records.len(),
            run.pages_fetched,
            run.requests.total_requests,
            run.requests.success_rate() * 100.0
        );
        println!("Quality score: {:.3}", collection.report.overall_score);
        println!("Stopped: {}", run.stop_reason.describe());
        for path in collection.artifacts.paths() {
            println!("  wrote {}", path.display());
        }

        if let StopReason::AuthRejected { error } = &run.stop_reason {
            return Err(Error::Other(format!(
                "Collection aborted, {error}; check the API key"
            )));
        }
        Ok(())
    }

    async fn check(&self, sample: u32, save: Option<&Path>) -> Result<()> {
        let config = self.load_config()?;
        let api_key = config.auth.resolve_api_key()?;
        let fetcher = Fetcher::from_config(&config, api_key)?;

        info!("Requesting {} tickers from {}", sample, config.source.endpoint_url());
        let body = fetcher.sample(sample).await?;

        let results = body
            .get("results")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        if results.is_empty() {
            println!("No results returned");
        }
        for row in results {
            println!("{} - {}", str_field(row, "ticker"), str_field(row, "name"));
        }

        if let Some(path) = save {
            write_json(path, &body)?;
            println!("Saved raw response to {}", path.display());
        }
        Ok(())
    }
}

/// Apply `collect` flags on top of the loaded config
fn apply_overrides(config: &mut CollectorConfig, command: &Commands) {
    if let Commands::Collect {
        max_records,
        max_pages,
        market,
        output_dir,
    } = command
    {
        if let Some(max_records) = max_records {
            config.limits.max_records = *max_records;
        }
        if let Some(max_pages) = max_pages {
            config.limits.max_pages = Some(*max_pages);
        }
        if let Some(market) = market {
            config.source.market = if market.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(market.clone())
            };
        }
        if let Some(dir) = output_dir {
            config.output.dir = path_string(dir);
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn str_field<'a>(row: &'a JsonValue, name: &str) -> &'a str {
    row.get(name).and_then(JsonValue::as_str).unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn collect_command() -> Commands {
        Commands::Collect {
            max_records: Some(10),
            max_pages: Some(1),
            market: Some("ALL".to_string()),
            output_dir: Some(PathBuf::from("elsewhere")),
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = CollectorConfig::default();
        apply_overrides(&mut config, &collect_command());

        assert_eq!(config.limits.max_records, 10);
        assert_eq!(config.limits.max_pages, Some(1));
        assert_eq!(config.source.market, None);
        assert_eq!(config.output.dir, "elsewhere");
    }

    #[test]
    fn test_check_leaves_config_alone() {
        let mut config = CollectorConfig::default();
        apply_overrides(
            &mut config,
            &Commands::Check {
                sample: 3,
                save: None,
            },
        );
        assert_eq!(config, CollectorConfig::default());
    }

    #[test]
    fn test_load_config_rejects_invalid_override() {
        let runner = Runner::new(Cli {
            config: None,
            verbose: false,
            log_file: None,
            command: Commands::Collect {
                max_records: Some(0),
                max_pages: None,
                market: None,
                output_dir: None,
            },
        });
        let err = runner.load_config().unwrap_err();
        assert!(err.is_fatal());
    }
}
