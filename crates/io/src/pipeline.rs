//! Ingestion pipeline: open, parse, extract images, match.
//!
//! Upload is left to the caller ([`crate::upload::upload_matched`]) since it
//! is the only async, side-effecting step.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;
use shelfline_core::{CellPos, IngestConfig, SkipCounts};

use crate::error::IngestError;
use crate::images::{self, ExtractedImage, ExtractionTier, ImageExtraction};
use crate::layout::{parse_sheet, LayoutKind, ParsedSheet};
use crate::matcher::{match_images, MatchOutcome, MatchSummary};
use crate::workbook;

#[derive(Debug)]
pub struct IngestOutput {
    pub sheet_name: String,
    pub sheet: ParsedSheet,
    pub extraction_tier: Option<ExtractionTier>,
    pub images_normalized: usize,
    pub images_passed_through: usize,
    /// Unpositioned media the order-based tier had no row position for.
    pub images_unplaced: usize,
    /// Image column assigned from anchor positions when the header had none.
    pub inferred_image_col: Option<usize>,
    pub matches: MatchOutcome,
}

/// Serializable run report.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub sheet_name: String,
    pub layout: LayoutKind,
    pub rows: usize,
    pub skip_counts: SkipCounts,
    pub name_collisions: usize,
    pub extraction_tier: Option<ExtractionTier>,
    pub images_normalized: usize,
    pub images_passed_through: usize,
    pub images_unplaced: usize,
    pub inferred_image_col: Option<usize>,
    pub matching: MatchSummary,
}

impl IngestOutput {
    /// Every extracted image by anchor position, matched or not.
    pub fn image_map(&self) -> BTreeMap<CellPos, &[u8]> {
        self.matches
            .matched
            .iter()
            .map(|m| &m.image)
            .chain(self.matches.unclaimed.iter())
            .map(|img| (img.position, img.bytes.as_slice()))
            .collect()
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            sheet_name: self.sheet_name.clone(),
            layout: self.sheet.layout,
            rows: self.sheet.rows.len(),
            skip_counts: self.sheet.skip_counts,
            name_collisions: self.sheet.name_collisions.len(),
            extraction_tier: self.extraction_tier,
            images_normalized: self.images_normalized,
            images_passed_through: self.images_passed_through,
            images_unplaced: self.images_unplaced,
            inferred_image_col: self.inferred_image_col,
            matching: self.matches.summary(),
        }
    }
}

/// Column holding the most image anchors; leftmost on ties.
pub fn dominant_image_column(images: &[ExtractedImage]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for img in images {
        *counts.entry(img.position.col).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(col_a, n_a), (col_b, n_b)| n_a.cmp(n_b).then(col_b.cmp(col_a)))
        .map(|(col, _)| col)
}

/// Give every row an expected image cell in `col` on its own row.
fn assign_image_column(sheet: &mut ParsedSheet, col: usize) {
    for row in &mut sheet.rows {
        row.image_position = Some(CellPos::new(row.source_position.row, col));
    }
    if let Some(columns) = sheet.columns.as_mut() {
        columns.image_col = Some(col);
    }
}

fn needs_image_column(sheet: &ParsedSheet, extraction: &ImageExtraction) -> bool {
    sheet.layout == LayoutKind::Header
        && sheet.columns.is_some_and(|c| c.image_col.is_none())
        && matches!(
            extraction.tier,
            Some(ExtractionTier::Structured) | Some(ExtractionTier::RawArchive)
        )
}

/// Run the synchronous part of ingestion over in-memory bytes.
///
/// Fails only when the container cannot be opened or has no sheets.
pub fn ingest(bytes: &[u8], cfg: &IngestConfig) -> Result<IngestOutput, IngestError> {
    let source = workbook::open(bytes)?;
    let mut sheet = parse_sheet(&source.grid, cfg);

    let extraction = images::extract_images(&source, bytes, &sheet.rows, &cfg.images);

    let mut inferred_image_col = None;
    if needs_image_column(&sheet, &extraction) {
        if let Some(col) = dominant_image_column(&extraction.images) {
            log::info!("no image column in header; using anchor column {}", col);
            assign_image_column(&mut sheet, col);
            inferred_image_col = Some(col);
        }
    }

    let ImageExtraction {
        tier,
        images,
        normalized,
        passed_through,
        unplaced,
    } = extraction;
    let matches = match_images(&sheet.rows, images, &cfg.matching);

    Ok(IngestOutput {
        sheet_name: source.sheet_name().to_string(),
        sheet,
        extraction_tier: tier,
        images_normalized: normalized,
        images_passed_through: passed_through,
        images_unplaced: unplaced,
        inferred_image_col,
        matches,
    })
}

/// [`ingest`] a file from disk.
pub fn ingest_file(path: impl AsRef<Path>, cfg: &IngestConfig) -> Result<IngestOutput, IngestError> {
    let path = path.as_ref();
    log::debug!("reading {}", path.display());
    let bytes = std::fs::read(path)?;
    ingest(&bytes, cfg)
}
