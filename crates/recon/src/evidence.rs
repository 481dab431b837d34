use std::collections::BTreeMap;

use crate::model::{ClassifiedRow, ReconSummary, ReconciliationOutcome};

/// Compute summary statistics from classified rows.
pub fn compute_summary(rows: &[ClassifiedRow], removed: usize, duplicates_skipped: usize) -> ReconSummary {
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unchanged = 0;
    let mut code_changed = 0;
    let mut new = 0;
    let mut conflicts = 0;

    for r in rows {
        *outcome_counts.entry(r.outcome.to_string()).or_insert(0) += 1;

        match r.outcome {
            ReconciliationOutcome::Unchanged => unchanged += 1,
            ReconciliationOutcome::CodeChanged { .. } => code_changed += 1,
            ReconciliationOutcome::New => new += 1,
            ReconciliationOutcome::Conflict { .. } => conflicts += 1,
        }
    }
    if removed > 0 {
        outcome_counts.insert("removed".into(), removed);
    }

    ReconSummary {
        total_incoming: rows.len(),
        unchanged,
        code_changed,
        new,
        conflicts,
        removed,
        duplicates_skipped,
        outcome_counts,
    }
}
