use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconError {
    /// Produced records must be stamped with a version.
    #[error("target version id is empty")]
    EmptyTargetVersion,
    /// The same code appears twice in the incoming set (across partitions).
    #[error("incoming code '{code}' appears more than once")]
    DuplicateIncoming { code: String },
    /// Two live records cannot share one code.
    #[error("conflict '{code}': keep-both is not supported; choose replace or ignore")]
    KeepBothUnsupported { code: String },
    #[error("no conflict for code '{code}'")]
    UnknownConflict { code: String },
    #[error("conflict '{code}' resolved more than once")]
    DuplicateResolution { code: String },
    /// Publication gate: every conflict needs a decision.
    #[error("{} unresolved conflict(s): {}", .codes.len(), .codes.join(", "))]
    UnresolvedConflicts { codes: Vec<String> },
}
