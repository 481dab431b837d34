// Operator decisions on conflicts, and the publication gate.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{Conflict, HistoricalProductRecord, ReconResult, ReconciliationOutcome, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDecision {
    /// Take the incoming name (or the operator's override).
    Replace,
    /// Keep the existing name.
    Ignore,
    /// Keep both products. Always rejected: one code, one live record.
    KeepBoth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_name: Option<String>,
    pub decision: ResolutionDecision,
}

impl ConflictResolution {
    pub fn new(code: impl Into<String>, decision: ResolutionDecision) -> Self {
        Self {
            code: code.into(),
            chosen_name: None,
            decision,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.chosen_name = Some(name.into());
        self
    }
}

/// Turn one decision into the record to publish.
pub fn resolve_conflict(
    conflict: &Conflict,
    resolution: &ConflictResolution,
    target_version: &str,
) -> Result<HistoricalProductRecord, ReconError> {
    if resolution.code != conflict.code {
        return Err(ReconError::UnknownConflict {
            code: resolution.code.clone(),
        });
    }

    let name = match resolution.decision {
        ResolutionDecision::Replace => resolution
            .chosen_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&conflict.incoming_name)
            .to_string(),
        ResolutionDecision::Ignore => conflict.existing_name.clone(),
        ResolutionDecision::KeepBoth => {
            return Err(ReconError::KeepBothUnsupported {
                code: conflict.code.clone(),
            })
        }
    };

    Ok(HistoricalProductRecord {
        code: conflict.code.clone(),
        name,
        product_type: conflict.product_type.clone(),
        version_id: target_version.to_string(),
        status: RecordStatus::Unchanged,
    })
}

/// Merge produced records with resolved conflicts into the final record set,
/// in incoming order.
///
/// Fails if a resolution names a code that is not in conflict, a code is
/// resolved twice, a decision is keep-both, or any conflict is left open.
pub fn finalize(
    result: &ReconResult,
    resolutions: &[ConflictResolution],
) -> Result<Vec<HistoricalProductRecord>, ReconError> {
    let conflicts: HashMap<String, Conflict> = result
        .conflicts()
        .into_iter()
        .map(|c| (c.code.clone(), c))
        .collect();

    let mut resolved: HashMap<&str, HistoricalProductRecord> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for resolution in resolutions {
        if !seen.insert(resolution.code.as_str()) {
            return Err(ReconError::DuplicateResolution {
                code: resolution.code.clone(),
            });
        }
        let conflict = conflicts.get(&resolution.code).ok_or_else(|| ReconError::UnknownConflict {
            code: resolution.code.clone(),
        })?;
        let record = resolve_conflict(conflict, resolution, &result.meta.target_version)?;
        resolved.insert(resolution.code.as_str(), record);
    }

    let mut unresolved: Vec<String> = conflicts
        .keys()
        .filter(|code| !resolved.contains_key(code.as_str()))
        .cloned()
        .collect();
    if !unresolved.is_empty() {
        unresolved.sort();
        return Err(ReconError::UnresolvedConflicts { codes: unresolved });
    }

    let mut produced = result.produced.iter();
    let mut records = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        match row.outcome {
            ReconciliationOutcome::Conflict { .. } => {
                if let Some(record) = resolved.remove(row.row.code.as_str()) {
                    records.push(record);
                }
            }
            _ => records.extend(produced.next().cloned()),
        }
    }

    log::info!(
        "finalized {} record(s) for {} ({} conflict(s) resolved)",
        records.len(),
        result.meta.target_version,
        resolutions.len()
    );
    Ok(records)
}
