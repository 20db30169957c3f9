//! Artifact writer
//!
//! Writes the records, metadata, quality report and collection summary of a
//! finalized run into the output directory.

use super::documents::{CollectionSummary, Metadata};
use super::markdown::{render_quality_report, render_summary};
use crate::config::{OutputConfig, SourceConfig};
use crate::engine::FinalizedRun;
use crate::error::{Error, Result};
use crate::quality::QualityReport;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of everything one `write` call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub records: PathBuf,
    pub metadata: PathBuf,
    pub quality_json: PathBuf,
    pub quality_markdown: PathBuf,
    pub summary_markdown: PathBuf,
    pub summary_json: PathBuf,
}

impl Artifacts {
    /// All paths, in write order
    pub fn paths(&self) -> [&Path; 6] {
        [
            &self.records,
            &self.metadata,
            &self.quality_json,
            &self.quality_markdown,
            &self.summary_markdown,
            &self.summary_json,
        ]
    }
}

/// Writes run artifacts to disk
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    config: OutputConfig,
    source: SourceConfig,
}

impl ArtifactWriter {
    /// Create a writer for the given output and source settings
    pub fn new(config: &OutputConfig, source: &SourceConfig) -> Self {
        Self {
            config: config.clone(),
            source: source.clone(),
        }
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        Path::new(&self.config.dir)
    }

    /// Write every artifact, creating the output directory if needed.
    ///
    /// Reads the run and report only; a failure leaves earlier files in place.
    pub fn write(&self, run: &FinalizedRun, report: &QualityReport) -> Result<Artifacts> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| {
            Error::output(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let artifacts = Artifacts {
            records: dir.join(&self.config.records_file),
            metadata: dir.join(&self.config.metadata_file),
            quality_json: dir.join(&self.config.quality_json_file),
            quality_markdown: dir.join(&self.config.quality_markdown_file),
            summary_markdown: dir.join(&self.config.summary_markdown_file),
            summary_json: dir.join(&self.config.summary_json_file),
        };

        let metadata = Metadata::new(run, &self.source);
        let summary = CollectionSummary::new(run, report, &self.source);

        write_json(&artifacts.records, &run.records)?;
        write_json(&artifacts.metadata, &metadata)?;
        write_json(&artifacts.quality_json, report)?;
        write_text(&artifacts.quality_markdown, &render_quality_report(report))?;
        write_text(&artifacts.summary_markdown, &render_summary(&summary))?;
        write_json(&artifacts.summary_json, &summary)?;

        info!(
            "Wrote {} records and 5 reports to {}",
            run.records.len(),
            dir.display()
        );
        Ok(artifacts)
    }
}

/// Serialize `value` as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| {
        Error::output(format!("Failed to write {}: {e}", path.display()))
    })?;
    writer.write_all(b"\n").and_then(|()| writer.flush()).map_err(|e| {
        Error::output(format!("Failed to write {}: {e}", path.display()))
    })
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    writer
        .write_all(content.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| Error::output(format!("Failed to write {}: {e}", path.display())))
}

fn create(path: &Path) -> Result<File> {
    File::create(path)
        .map_err(|e| Error::output(format!("Failed to create {}: {e}", path.display())))
}
