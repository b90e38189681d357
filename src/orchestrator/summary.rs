use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde_json::json;

use super::RunReport;
use crate::strategy::InstallOutcome;
use crate::ui::prelude::*;

/// Table of failed entries, or `None` when everything went through.
pub fn failure_table(report: &RunReport) -> Option<Table> {
    let failed: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.outcome.is_failed())
        .collect();
    if failed.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Package", "Source", "Reason"]);

    for record in failed {
        let reason = match &record.outcome {
            InstallOutcome::Failed(reason) => reason.as_str(),
            _ => "",
        };
        table.add_row(vec![
            Cell::new(record.index),
            Cell::new(&record.entry.identifier).fg(Color::Red),
            Cell::new(record.entry.tag.display_name()),
            Cell::new(reason),
        ]);
    }
    Some(table)
}

/// End-of-run summary.
pub fn print_summary(report: &RunReport) {
    let headline = format!(
        "{} installed, {} already present, {} failed",
        report.installed(),
        report.skipped(),
        report.failed()
    );

    if get_output_format() == OutputFormat::Json {
        let failures: Vec<_> = report
            .records
            .iter()
            .filter_map(|r| match &r.outcome {
                InstallOutcome::Failed(reason) => Some(json!({
                    "index": r.index,
                    "identifier": r.entry.identifier,
                    "tag": r.entry.tag.display_name(),
                    "reason": reason,
                })),
                _ => None,
            })
            .collect();
        emit(
            Level::Info,
            "provision.summary",
            &headline,
            Some(json!({
                "processed": report.processed,
                "installed": report.installed(),
                "skipped": report.skipped(),
                "failed": failures,
                "dotfiles": report.dotfiles.as_ref().map(|d| json!({
                    "files": d.files,
                    "links": d.links,
                })),
            })),
        );
        return;
    }

    separator(false);
    match failure_table(report) {
        None => emit(
            Level::Success,
            "provision.summary",
            &format!("{} {}", char::from(NerdFont::Rocket), headline),
            None,
        ),
        Some(table) => {
            emit(
                Level::Warn,
                "provision.summary",
                &format!("{} {}", char::from(NerdFont::Warning), headline),
                None,
            );
            println!("{table}");
            for failure in report.failures() {
                emit(Level::Debug, "provision.failure", &failure.to_string(), None);
            }
        }
    }
}
