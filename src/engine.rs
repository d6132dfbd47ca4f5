use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{AuditError, Result};
use crate::models::{
    AggregationResult, Component, ComponentAverages, ComponentSums, Correction,
    DiscrepancyRecord, GroupAverage, GroupAverages, Ranker, Ranking, RoomFilter, RowRecord,
};
use crate::rounding::fixed_round;

pub fn aggregate(rows: &[RowRecord], filter: RoomFilter) -> Result<AggregationResult> {
    let mut sums = ComponentSums::default();
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut slots = RankSlots::default();
    let mut discrepancies = Vec::new();
    let mut corrections = Vec::new();
    let mut count = 0usize;
    let mut skipped = 0usize;

    for (position, row) in rows.iter().enumerate() {
        if !filter.admits(row.room_number) {
            skipped += 1;
            continue;
        }

        let mut pre_compre = 0.0;
        for (component, marks) in Component::PRE_COMPRE.iter().zip(row.component_scores) {
            sums.add(*component, marks);
            pre_compre += marks;
        }

        let total = fixed_round(pre_compre + row.compre_score, 3);
        sums.add(Component::PreCompre, pre_compre);
        sums.add(Component::Compre, row.compre_score);
        sums.add(Component::Total, total);

        if let Some((discrepancy, correction)) = reconcile(position, row, total) {
            debug!(
                serial = %discrepancy.serial_id,
                expected = discrepancy.expected_total,
                stored = discrepancy.actual_total,
                "stored total disagrees with components"
            );
            discrepancies.push(discrepancy);
            corrections.push(correction);
        }

        for tag in group_tags(&row.campus_id) {
            let entry = groups.entry(tag.to_string()).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += 1;
        }

        count += 1;
        slots.offer(&row.student_id, total);
    }

    if count == 0 {
        return Err(AuditError::EmptyResultSet {
            skipped,
            ranking: slots.into_ranking(),
        });
    }

    let group_averages: GroupAverages = groups
        .into_iter()
        .map(|(tag, (sum, students))| {
            (
                tag,
                GroupAverage {
                    average: fixed_round(sum / students as f64, 2),
                    students,
                },
            )
        })
        .collect();

    info!(
        included = count,
        skipped,
        discrepancies = discrepancies.len(),
        groups = group_averages.len(),
        "gradebook aggregated"
    );

    Ok(AggregationResult {
        discrepancies,
        corrections,
        component_averages: ComponentAverages::from_sums(&sums, count),
        group_averages,
        ranking: slots.into_ranking(),
        included_rows: count,
    })
}

pub fn reconcile(
    position: usize,
    row: &RowRecord,
    computed_total: f64,
) -> Option<(DiscrepancyRecord, Correction)> {
    if computed_total == row.stored_total {
        return None;
    }

    Some((
        DiscrepancyRecord {
            serial_id: row.serial_id.clone(),
            expected_total: computed_total,
            actual_total: row.stored_total,
        },
        Correction {
            position,
            serial_id: row.serial_id.clone(),
            corrected_total: format!("{computed_total:.2}"),
        },
    ))
}

/// Non-overlapping `[A-Z][0-9]` pairs, left to right, repeats kept.
pub fn group_tags(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i].is_ascii_uppercase() && bytes[i + 1].is_ascii_digit() {
            tags.push(&text[i..i + 2]);
            i += 2;
        } else {
            i += 1;
        }
    }

    tags
}

// The first slot whose marks are strictly exceeded is overwritten; nothing shifts down.
#[derive(Debug, Default)]
pub struct RankSlots {
    ranking: Ranking,
}

impl RankSlots {
    pub fn offer(&mut self, emplid: &str, marks: f64) {
        let slot = if marks > self.ranking.first.marks {
            &mut self.ranking.first
        } else if marks > self.ranking.second.marks {
            &mut self.ranking.second
        } else if marks > self.ranking.third.marks {
            &mut self.ranking.third
        } else {
            return;
        };

        *slot = Ranker {
            emplid: emplid.to_string(),
            marks,
        };
    }

    pub fn into_ranking(self) -> Ranking {
        self.ranking
    }
}
