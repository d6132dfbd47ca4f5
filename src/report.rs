use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::{AggregationResult, ComponentAverages, DiscrepancyRecord, Ranking, RoomFilter};

/// JSON export layout.
#[derive(Debug, Serialize)]
pub struct ReportExport<'a> {
    pub errors: &'a [DiscrepancyRecord],
    pub average: &'a ComponentAverages,
    #[serde(rename = "branchwise-average")]
    pub branchwise_average: BTreeMap<&'a str, f64>,
    #[serde(rename = "branchwise-students")]
    pub branchwise_students: BTreeMap<&'a str, usize>,
    pub rankers: &'a Ranking,
}

impl<'a> ReportExport<'a> {
    pub fn new(result: &'a AggregationResult) -> Self {
        let groups = &result.group_averages;
        ReportExport {
            errors: &result.discrepancies,
            average: &result.component_averages,
            branchwise_average: groups
                .iter()
                .map(|(tag, group)| (tag.as_str(), group.average))
                .collect(),
            branchwise_students: groups
                .iter()
                .map(|(tag, group)| (tag.as_str(), group.students))
                .collect(),
            rankers: &result.ranking,
        }
    }
}

pub fn build_report(
    result: &AggregationResult,
    filter: RoomFilter,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let scope = match filter.room_number() {
        Some(room) => format!("room {room}"),
        None => "all rooms".to_string(),
    };

    let _ = writeln!(output, "Gradebook audit for {scope}");
    let _ = writeln!(
        output,
        "Generated {} across {} students",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        result.included_rows
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "The discrepancy found in the table:");
    if result.discrepancies.is_empty() {
        let _ = writeln!(output, "No discrepancies found.");
    } else {
        for error in &result.discrepancies {
            let _ = writeln!(
                output,
                "There is a error at Serial No. {} \t Expected Total Marks: {:.3} \t Given: {:.3}",
                error.serial_id, error.expected_total, error.actual_total
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "The averages of each components:");
    for (component, value) in result.component_averages.iter() {
        let _ = writeln!(output, "{} {:.3}", component.title(), value);
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "The Total Averages Batch-wise:");
    if result.group_averages.is_empty() {
        let _ = writeln!(output, "No branch codes found.");
    } else {
        for (tag, group) in &result.group_averages {
            let _ = writeln!(
                output,
                "{} {:.2} ({} students)",
                tag, group.average, group.students
            );
        }
    }
    let _ = writeln!(output);

    output.push_str(&build_toppers(&result.ranking));
    output
}

pub fn build_toppers(ranking: &Ranking) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Class toppers are:");
    for (place, ranker) in ranking.places() {
        let _ = writeln!(
            output,
            "{} \t Emplid {} \t Marks {:.3}",
            place, ranker.emplid, ranker.marks
        );
    }
    output
}

pub fn export_json(result: &AggregationResult, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&ReportExport::new(result))?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "report exported");
    Ok(())
}
