//! `shelfline-recon`: catalogue version reconciliation.
//!
//! Pure engine crate: receives the incoming rows plus pre-loaded current and
//! historical snapshots, returns classified change sets. Conflicts wait for
//! operator decisions, applied by [`resolve::finalize`].

pub mod engine;
pub mod error;
pub mod evidence;
pub mod index;
pub mod model;
pub mod resolve;

pub use engine::reconcile;
pub use error::ReconError;
pub use model::{
    ClassifiedRow, Conflict, HistoricalProductRecord, IncomingRow, ReconInput, ReconResult, ReconciliationOutcome,
    RecordStatus,
};
pub use resolve::{finalize, resolve_conflict, ConflictResolution, ResolutionDecision};
