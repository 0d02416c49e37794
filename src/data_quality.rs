// ✅ Data Quality Summary - issue counts over an interpreted batch

use crate::interpreter::InterpretedRecord;
use crate::issues::IssueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total_records: usize,
    pub clean_records: usize,
    pub location_success_count: usize,
    pub with_event_date_count: usize,

    /// Records raising each issue type; a record counts once per type
    pub issue_counts: BTreeMap<IssueType, usize>,
}

impl QualitySummary {
    pub fn from_records(records: &[InterpretedRecord]) -> Self {
        let mut summary = QualitySummary {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            if !record.has_issues() {
                summary.clean_records += 1;
            }
            if record.location_success {
                summary.location_success_count += 1;
            }
            if record.event_date_from.is_some() {
                summary.with_event_date_count += 1;
            }

            let mut seen: Vec<IssueType> = Vec::new();
            for issue in &record.issues {
                if !seen.contains(&issue.issue_type) {
                    seen.push(issue.issue_type);
                    *summary.issue_counts.entry(issue.issue_type).or_insert(0) += 1;
                }
            }
        }

        summary
    }

    /// Share of records without any issue, 0.0 for an empty batch
    pub fn clean_ratio(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.clean_records as f64 / self.total_records as f64
    }

    pub fn count(&self, issue_type: IssueType) -> usize {
        self.issue_counts.get(&issue_type).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        let top = self
            .issue_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(issue_type, count)| format!("{} ({})", issue_type, count))
            .unwrap_or_else(|| "none".to_string());

        format!(
            "{} records: {:.1}% clean, {} located, {} dated | most frequent issue: {}",
            self.total_records,
            self.clean_ratio() * 100.0,
            self.location_success_count,
            self.with_event_date_count,
            top
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
