use thiserror::Error;

/// Structural failures. Everything row- or image-level is counted instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The bytes are not a spreadsheet container we can open.
    #[error("cannot parse file: {0}")]
    Unreadable(String),
    #[error("cannot parse file: workbook contains no sheets")]
    NoSheets,
    #[error("cannot parse file: failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
    #[error("cannot parse file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload of '{key}' failed: {message}")]
    Failed { key: String, message: String },
}
