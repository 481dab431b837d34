use serde::Deserialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Ingestion parameters. Every field has a default, so an empty TOML document
/// (or `IngestConfig::default()`) gives the stock behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    #[serde(default)]
    pub code: CodeConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeConfig {
    /// Digits in a normalized code; shorter numerics are zero-padded.
    #[serde(default = "default_code_length")]
    pub length: usize,
    /// Raw digit count below which a number is not treated as a code.
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: default_code_length(),
            min_digits: default_min_digits(),
        }
    }
}

/// Layout heuristics. The scan depths and band spacing are empirical.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Rows searched for a header row.
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,
    /// Rows inspected when deciding on the column-per-product block layout.
    #[serde(default = "default_block_scan_rows")]
    pub block_scan_rows: usize,
    /// Rows searched for a first band in the banded layout.
    #[serde(default = "default_band_scan_rows")]
    pub band_scan_rows: usize,
    /// Minimum distance between successive band code rows.
    #[serde(default = "default_band_min_gap")]
    pub band_min_gap: usize,
    /// Minimum code cells (lower row) and text cells (upper row) in a band.
    #[serde(default = "default_band_min_cells")]
    pub band_min_cells: usize,
    /// Rows below the header probed for the all-codes column fallback.
    #[serde(default = "default_code_probe_rows")]
    pub code_probe_rows: usize,
    /// Rows below the header probed for the longest-text column fallback.
    #[serde(default = "default_name_probe_rows")]
    pub name_probe_rows: usize,
    /// Non-empty samples a column needs to qualify as the name column.
    #[serde(default = "default_name_min_samples")]
    pub name_min_samples: usize,
    /// Block layout is re-checked against the header layout when
    /// `skipped > block_skip_ratio * rows`.
    #[serde(default = "default_block_skip_ratio")]
    pub block_skip_ratio: usize,
    /// Invalid-code skips that send an empty header-layout result to the
    /// banded layout.
    #[serde(default = "default_banded_min_invalid")]
    pub banded_min_invalid: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: default_header_scan_rows(),
            block_scan_rows: default_block_scan_rows(),
            band_scan_rows: default_band_scan_rows(),
            band_min_gap: default_band_min_gap(),
            band_min_cells: default_band_min_cells(),
            code_probe_rows: default_code_probe_rows(),
            name_probe_rows: default_name_probe_rows(),
            name_min_samples: default_name_min_samples(),
            block_skip_ratio: default_block_skip_ratio(),
            banded_min_invalid: default_banded_min_invalid(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Longer edge of every normalized image, in pixels.
    #[serde(default = "default_target_edge_px")]
    pub target_edge_px: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            target_edge_px: default_target_edge_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Row window for the "nearest in column" tier.
    #[serde(default = "default_window_rows")]
    pub window_rows: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            window_rows: default_window_rows(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Uploads in flight per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_code_length() -> usize {
    5
}
fn default_min_digits() -> usize {
    3
}
fn default_header_scan_rows() -> usize {
    25
}
fn default_block_scan_rows() -> usize {
    20
}
fn default_band_scan_rows() -> usize {
    120
}
fn default_band_min_gap() -> usize {
    3
}
fn default_band_min_cells() -> usize {
    3
}
fn default_code_probe_rows() -> usize {
    15
}
fn default_name_probe_rows() -> usize {
    50
}
fn default_name_min_samples() -> usize {
    3
}
fn default_block_skip_ratio() -> usize {
    10
}
fn default_banded_min_invalid() -> usize {
    5
}
fn default_target_edge_px() -> u32 {
    192
}
fn default_window_rows() -> usize {
    50
}
fn default_concurrency() -> usize {
    8
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl IngestConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: IngestConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code.length == 0 {
            return Err(invalid("code.length", "must be at least 1"));
        }
        if self.code.min_digits == 0 || self.code.min_digits > self.code.length {
            return Err(invalid(
                "code.min_digits",
                format!("must be between 1 and code.length ({})", self.code.length),
            ));
        }
        if self.layout.band_min_gap == 0 {
            return Err(invalid("layout.band_min_gap", "must be at least 1"));
        }
        if self.layout.band_min_cells == 0 {
            return Err(invalid("layout.band_min_cells", "must be at least 1"));
        }
        if self.layout.name_min_samples == 0 {
            return Err(invalid("layout.name_min_samples", "must be at least 1"));
        }
        if self.images.target_edge_px == 0 {
            return Err(invalid("images.target_edge_px", "must be at least 1"));
        }
        if self.upload.concurrency == 0 {
            return Err(invalid("upload.concurrency", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
