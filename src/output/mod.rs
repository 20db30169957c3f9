//! Output module
//!
//! Turns a finalized run and its quality report into files.
//!
//! # Overview
//!
//! This module provides:
//! - `ArtifactWriter` - Writes all artifacts into the output directory
//! - `Metadata` / `CollectionSummary` - JSON documents describing the run
//! - Markdown renderers for the quality report and the summary

mod documents;
mod markdown;
mod writer;

pub use documents::{
    recommendations, CollectionSummary, CollectionWindow, Metadata, ToolInfo, VariableInfo,
};
pub use markdown::{render_quality_report, render_summary};
pub use writer::{write_json, ArtifactWriter, Artifacts};

#[cfg(test)]
mod tests;
