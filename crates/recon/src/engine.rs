use std::collections::HashSet;

use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::index::{names_match, CurrentIndex, NameTypeKey, PriorCodeIndex};
use crate::model::{
    ClassifiedRow, HistoricalProductRecord, IncomingRow, ReconInput, ReconMeta, ReconResult, ReconciliationOutcome,
};

/// Classify one incoming row. First matching rule wins.
fn classify(
    row: &IncomingRow,
    first_upload: bool,
    current: &CurrentIndex<'_>,
    prior: &PriorCodeIndex,
    incoming_codes: &HashSet<&str>,
) -> ReconciliationOutcome {
    if first_upload {
        return ReconciliationOutcome::Unchanged;
    }

    if let Some(existing) = current.by_code(&row.code) {
        return if names_match(&row.name, &existing.name) {
            ReconciliationOutcome::Unchanged
        } else {
            ReconciliationOutcome::Conflict {
                incoming_name: row.name.clone(),
                existing_name: existing.name.clone(),
            }
        };
    }

    let key = NameTypeKey::new(&row.name, &row.product_type);

    // Renamed within the current version; the old code must have left the set
    if let Some(old) = current
        .by_name(&key)
        .iter()
        .find(|rec| rec.code != row.code && !incoming_codes.contains(rec.code.as_str()))
    {
        return ReconciliationOutcome::CodeChanged {
            old_code: old.code.clone(),
        };
    }

    match prior.latest_code(&key) {
        Some(old_code) if old_code != row.code => ReconciliationOutcome::CodeChanged {
            old_code: old_code.to_string(),
        },
        _ => ReconciliationOutcome::New,
    }
}

/// Run reconciliation. Returns classified rows, removed records, the records
/// to create for the target version, and a summary.
pub fn reconcile(input: &ReconInput) -> Result<ReconResult, ReconError> {
    if input.target_version.trim().is_empty() {
        return Err(ReconError::EmptyTargetVersion);
    }

    let mut incoming_codes: HashSet<&str> = HashSet::new();
    for row in &input.incoming {
        if !incoming_codes.insert(row.code.as_str()) {
            return Err(ReconError::DuplicateIncoming { code: row.code.clone() });
        }
    }

    let current_versions: HashSet<&str> = input.current.iter().map(|r| r.version_id.as_str()).collect();
    let first_upload = input.current.is_empty() && input.history.is_empty();
    let current = CurrentIndex::build(&input.current);
    let prior = PriorCodeIndex::build(&input.history, &current_versions);
    log::debug!(
        "reconcile: {} incoming, {} current, {} prior name key(s)",
        input.incoming.len(),
        input.current.len(),
        prior.len()
    );

    let rows: Vec<ClassifiedRow> = input
        .incoming
        .iter()
        .map(|row| ClassifiedRow {
            row: row.clone(),
            outcome: classify(row, first_upload, &current, &prior, &incoming_codes),
        })
        .collect();

    // Removed: current records missing from the incoming set, within the
    // incoming partitions, and not carried forward by a code change.
    let carried: HashSet<&str> = rows
        .iter()
        .filter_map(|r| match &r.outcome {
            ReconciliationOutcome::CodeChanged { old_code } => Some(old_code.as_str()),
            _ => None,
        })
        .collect();
    let incoming_types: HashSet<&str> = input.incoming.iter().map(|r| r.product_type.as_str()).collect();
    let removed: Vec<HistoricalProductRecord> = input
        .current
        .iter()
        .filter(|rec| {
            incoming_types.contains(rec.product_type.as_str())
                && !incoming_codes.contains(rec.code.as_str())
                && !carried.contains(rec.code.as_str())
        })
        .cloned()
        .collect();

    let produced: Vec<HistoricalProductRecord> = rows
        .iter()
        .filter_map(|r| {
            r.outcome.status().map(|status| HistoricalProductRecord {
                code: r.row.code.clone(),
                name: r.row.name.clone(),
                product_type: r.row.product_type.clone(),
                version_id: input.target_version.clone(),
                status,
            })
        })
        .collect();

    let summary = compute_summary(&rows, removed.len(), input.duplicates_skipped);
    log::info!(
        "reconciled {} row(s) into {}: {} unchanged, {} code changed, {} new, {} conflict(s), {} removed",
        summary.total_incoming,
        input.target_version,
        summary.unchanged,
        summary.code_changed,
        summary.new,
        summary.conflicts,
        summary.removed
    );

    let mut versions: Vec<&str> = current_versions.into_iter().collect();
    versions.sort_unstable();
    Ok(ReconResult {
        meta: ReconMeta {
            target_version: input.target_version.clone(),
            current_version: (!versions.is_empty()).then(|| versions.join(",")),
            first_upload,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        rows,
        removed,
        produced,
    })
}
