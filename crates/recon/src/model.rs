use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use shelfline_core::NormalizedRow;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The classification that created a historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Unchanged,
    CodeChanged,
    New,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::CodeChanged => write!(f, "code_changed"),
            Self::New => write!(f, "new"),
        }
    }
}

/// One product as published in one catalogue version. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalProductRecord {
    pub code: String,
    pub name: String,
    pub product_type: String,
    pub version_id: String,
    pub status: RecordStatus,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A parsed row tagged with the product-type partition it is uploaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRow {
    pub code: String,
    pub name: String,
    pub product_type: String,
}

impl IncomingRow {
    pub fn new(code: impl Into<String>, name: impl Into<String>, product_type: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            product_type: product_type.into(),
        }
    }

    /// Tag a parse run's rows with one product type.
    pub fn from_rows(rows: &[NormalizedRow], product_type: &str) -> Vec<Self> {
        rows.iter()
            .map(|r| Self::new(r.code.clone(), r.display_name.clone(), product_type))
            .collect()
    }
}

/// Pre-loaded snapshots plus the operator's target version.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub incoming: Vec<IncomingRow>,
    /// Records of the current published version.
    pub current: Vec<HistoricalProductRecord>,
    /// Every historical record, oldest first. May include the current
    /// version's records; they are ignored for the cross-version lookup.
    pub history: Vec<HistoricalProductRecord>,
    /// Version id stamped on every produced record.
    pub target_version: String,
    /// Duplicate-code rows dropped while parsing, carried into the summary.
    pub duplicates_skipped: usize,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Unchanged,
    CodeChanged { old_code: String },
    New,
    Conflict { incoming_name: String, existing_name: String },
}

impl ReconciliationOutcome {
    /// Status of the record this outcome produces. `None` for conflicts,
    /// which wait for an operator decision.
    pub fn status(&self) -> Option<RecordStatus> {
        match self {
            Self::Unchanged => Some(RecordStatus::Unchanged),
            Self::CodeChanged { .. } => Some(RecordStatus::CodeChanged),
            Self::New => Some(RecordStatus::New),
            Self::Conflict { .. } => None,
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::CodeChanged { .. } => write!(f, "code_changed"),
            Self::New => write!(f, "new"),
            Self::Conflict { .. } => write!(f, "conflict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    pub row: IncomingRow,
    pub outcome: ReconciliationOutcome,
}

/// An incoming row whose code exists under a different name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub code: String,
    pub product_type: String,
    pub incoming_name: String,
    pub existing_name: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_incoming: usize,
    pub unchanged: usize,
    pub code_changed: usize,
    pub new: usize,
    pub conflicts: usize,
    pub removed: usize,
    pub duplicates_skipped: usize,
    pub outcome_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub target_version: String,
    /// Version of the current catalogue, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    pub first_upload: bool,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// One entry per incoming row, in input order.
    pub rows: Vec<ClassifiedRow>,
    /// Current records absent from the incoming set.
    pub removed: Vec<HistoricalProductRecord>,
    /// Records created for every non-conflict outcome.
    pub produced: Vec<HistoricalProductRecord>,
}

impl ReconResult {
    fn with_outcome<'a>(&'a self, pred: impl Fn(&ReconciliationOutcome) -> bool + 'a) -> impl Iterator<Item = &'a ClassifiedRow> {
        self.rows.iter().filter(move |r| pred(&r.outcome))
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.with_outcome(|o| matches!(o, ReconciliationOutcome::Unchanged))
    }

    pub fn changed(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.with_outcome(|o| matches!(o, ReconciliationOutcome::CodeChanged { .. }))
    }

    pub fn new_rows(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.with_outcome(|o| matches!(o, ReconciliationOutcome::New))
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.rows
            .iter()
            .filter_map(|r| match &r.outcome {
                ReconciliationOutcome::Conflict {
                    incoming_name,
                    existing_name,
                } => Some(Conflict {
                    code: r.row.code.clone(),
                    product_type: r.row.product_type.clone(),
                    incoming_name: incoming_name.clone(),
                    existing_name: existing_name.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}
