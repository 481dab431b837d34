//! `shelfline-io`: spreadsheet catalogue ingestion.
//!
//! Opens xlsx/xls/xlsb/ods bytes, detects the sheet layout, extracts rows and
//! embedded images, and matches images to rows by position. Image upload goes
//! through the caller's [`BlobStore`].

pub mod error;
pub mod images;
pub mod layout;
pub mod matcher;
mod ooxml;
pub mod pipeline;
pub mod upload;
pub mod workbook;

pub use error::{IngestError, UploadError};
pub use images::{ExtractedImage, ExtractionTier, ImageFormat, MediaBlob};
pub use layout::{parse_sheet, LayoutKind, ParsedSheet};
pub use matcher::{match_images, MatchOutcome, MatchTier, MatchedImage};
pub use pipeline::{ingest, ingest_file, IngestOutput, IngestSummary};
pub use upload::{upload_matched, BlobStore, UploadReport};
