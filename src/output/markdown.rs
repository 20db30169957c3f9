//! Markdown rendering of the quality report and the collection summary

use super::documents::CollectionSummary;
use crate::quality::QualityReport;
use crate::validate::RejectReason;
use std::fmt::Write;

/// Render `quality_report.md`
pub fn render_quality_report(report: &QualityReport) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Data Quality Report\n");
    let _ = writeln!(md, "- **Records:** {}", report.record_count);
    let _ = writeln!(md, "- **Overall score:** {:.3}", report.overall_score);
    let _ = writeln!(
        md,
        "\n> The overall score is the unweighted mean of per-field completeness. \
         It is a quick indicator, not a statistically rigorous quality measure.\n"
    );

    let _ = writeln!(md, "## Completeness\n");
    let _ = writeln!(md, "| Field | Populated | Total | Completeness |");
    let _ = writeln!(md, "|---|---:|---:|---:|");
    for c in &report.completeness {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {:.1}% |",
            c.field,
            c.populated,
            c.total,
            c.completeness * 100.0
        );
    }

    let _ = writeln!(md, "\n## Distributions\n");
    if report.distributions.is_empty() {
        let _ = writeln!(md, "_No distributions configured._");
    }
    for dist in &report.distributions {
        let _ = writeln!(
            md,
            "### {} ({} distinct)\n",
            dist.field, dist.distinct
        );
        if dist.top.is_empty() {
            let _ = writeln!(md, "_No values._\n");
            continue;
        }
        let _ = writeln!(md, "| Value | Count | Share |");
        let _ = writeln!(md, "|---|---:|---:|");
        for entry in &dist.top {
            let _ = writeln!(
                md,
                "| {} | {} | {:.1}% |",
                escape_cell(&entry.value),
                entry.count,
                entry.share * 100.0
            );
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Rejections\n");
    let _ = writeln!(md, "| Reason | Rows |");
    let _ = writeln!(md, "|---|---:|");
    for reason in RejectReason::ALL {
        let _ = writeln!(md, "| {} | {} |", reason.code(), report.rejections.get(reason));
    }

    let anomalies = &report.anomalies;
    let _ = writeln!(md, "\n## Anomalies\n");
    let _ = writeln!(
        md,
        "- **Duplicate tickers:** {}",
        list_or_none(&anomalies.duplicate_tickers)
    );
    let _ = writeln!(
        md,
        "- **Invalid tickers:** {}",
        list_or_none(&anomalies.invalid_tickers)
    );
    if anomalies.missing_by_field.is_empty() {
        let _ = writeln!(md, "- **Missing fields:** none");
    } else {
        let missing: Vec<String> = anomalies
            .missing_by_field
            .iter()
            .map(|(field, count)| format!("{field} ({count})"))
            .collect();
        let _ = writeln!(md, "- **Missing fields:** {}", missing.join(", "));
    }

    md
}

/// Render `collection_summary.md`
pub fn render_summary(summary: &CollectionSummary) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Collection Summary\n");
    if summary.partial {
        let _ = writeln!(
            md,
            "> **Partial result:** collection stopped early ({}).\n",
            escape_cell(&summary.stop_reason.describe())
        );
    }

    let _ = writeln!(md, "## Run\n");
    let _ = writeln!(md, "| Metric | Value |");
    let _ = writeln!(md, "|---|---|");
    let _ = writeln!(md, "| Endpoint | `{}` |", summary.endpoint);
    let _ = writeln!(md, "| Started | {} |", summary.start_time.to_rfc3339());
    let _ = writeln!(md, "| Finished | {} |", summary.end_time.to_rfc3339());
    let _ = writeln!(md, "| Duration | {:.1}s |", summary.duration_secs);
    let _ = writeln!(md, "| Total requests | {} |", summary.total_requests);
    let _ = writeln!(md, "| Successful requests | {} |", summary.successful_requests);
    let _ = writeln!(md, "| Failed requests | {} |", summary.failed_requests);
    let _ = writeln!(md, "| Success rate | {:.1}% |", summary.success_rate * 100.0);
    let _ = writeln!(md, "| Pages fetched | {} |", summary.pages_fetched);
    let _ = writeln!(md, "| Rows received | {} |", summary.raw_records);
    let _ = writeln!(md, "| Records collected | {} |", summary.records_collected);
    let _ = writeln!(md, "| Rows rejected | {} |", summary.records_rejected);
    let _ = writeln!(md, "| Quality score | {:.3} |", summary.data_quality_score);
    let _ = writeln!(md, "| Final delay multiplier | {:.2} |", summary.delay_multiplier);
    let _ = writeln!(
        md,
        "| Stop reason | {} |",
        escape_cell(&summary.stop_reason.describe())
    );

    let _ = writeln!(md, "\n## Issues\n");
    if summary.issues.is_empty() {
        let _ = writeln!(md, "None.");
    }
    for issue in &summary.issues {
        let _ = writeln!(md, "- {}", escape_cell(issue));
    }

    let _ = writeln!(md, "\n## Recommendations\n");
    for rec in &summary.recommendations {
        let _ = writeln!(md, "- {}", escape_cell(rec));
    }

    md
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Keep free text on one line and out of table column splits
fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .replace('|', "\\|")
}
