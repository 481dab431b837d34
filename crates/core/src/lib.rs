//! `shelfline-core`: shared catalogue types.
//!
//! Row/position model, product-code and name normalization, and the ingest
//! configuration consumed by `shelfline-io`.

pub mod code;
pub mod config;
pub mod error;
pub mod model;
pub mod name;

pub use code::CodePattern;
pub use config::IngestConfig;
pub use error::ConfigError;
pub use model::{
    name_collisions, CellPos, NameCollision, NormalizedRow, SkipCounts, SkipReason, SkippedRowRecord,
};
pub use name::{clean_name, is_padding};
