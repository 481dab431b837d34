// Row–image matching by position with escalating tolerance.
//
// Each tier is a selection function over the unused pool. Tiers run as full
// passes over all still-unmatched rows, tightest first, and the pool is moved
// from one pass to the next. Matching never crosses columns.
//
// This is not per-row "first hit wins": every row's exact candidate is
// claimed before any row tries a looser tier, so an early row cannot take a
// later row's exact image through the window or column tiers.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use shelfline_core::config::MatchConfig;
use shelfline_core::{CellPos, NormalizedRow};

use crate::images::ExtractedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Image anchored exactly at the expected cell.
    Exact,
    /// Same column, one or two rows off.
    Adjacent,
    /// Same column, nearest within the configured row window.
    Window,
    /// Same column, nearest anywhere.
    Column,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Adjacent => write!(f, "adjacent"),
            Self::Window => write!(f, "window"),
            Self::Column => write!(f, "column"),
        }
    }
}

/// Unused images, sorted by anchor position.
#[derive(Debug, Default)]
pub struct ImagePool {
    images: Vec<ExtractedImage>,
}

impl ImagePool {
    pub fn new(mut images: Vec<ExtractedImage>) -> Self {
        images.sort_by_key(|img| img.position);
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn index_of(&self, pos: CellPos) -> Option<usize> {
        self.images.binary_search_by_key(&pos, |img| img.position).ok()
    }

    fn take(&mut self, idx: usize) -> ExtractedImage {
        self.images.remove(idx)
    }

    /// Nearest image in the target column within `max_distance` rows.
    /// Ties go to the upper image.
    fn nearest_in_column(&self, target: CellPos, max_distance: Option<usize>) -> Option<usize> {
        self.images
            .iter()
            .enumerate()
            .filter(|(_, img)| img.position.col == target.col)
            .map(|(i, img)| (img.position.row.abs_diff(target.row), img.position.row, i))
            .filter(|(dist, _, _)| max_distance.map_or(true, |m| *dist <= m))
            .min()
            .map(|(_, _, i)| i)
    }

    pub fn into_images(self) -> Vec<ExtractedImage> {
        self.images
    }
}

type SelectFn = fn(&ImagePool, CellPos, &MatchConfig) -> Option<usize>;

fn select_exact(pool: &ImagePool, target: CellPos, _cfg: &MatchConfig) -> Option<usize> {
    pool.index_of(target)
}

fn select_adjacent(pool: &ImagePool, target: CellPos, _cfg: &MatchConfig) -> Option<usize> {
    const OFFSETS: [isize; 4] = [1, -1, 2, -2];
    OFFSETS.iter().find_map(|&off| {
        let row = target.row.checked_add_signed(off)?;
        pool.index_of(CellPos::new(row, target.col))
    })
}

fn select_window(pool: &ImagePool, target: CellPos, cfg: &MatchConfig) -> Option<usize> {
    pool.nearest_in_column(target, Some(cfg.window_rows))
}

fn select_column(pool: &ImagePool, target: CellPos, _cfg: &MatchConfig) -> Option<usize> {
    pool.nearest_in_column(target, None)
}

const TIERS: [(MatchTier, SelectFn); 4] = [
    (MatchTier::Exact, select_exact as SelectFn),
    (MatchTier::Adjacent, select_adjacent as SelectFn),
    (MatchTier::Window, select_window as SelectFn),
    (MatchTier::Column, select_column as SelectFn),
];

/// A row waiting for an image: index into the row slice plus expected cell.
type Pending = (usize, CellPos);

struct TierPass {
    matched: Vec<(usize, MatchTier, ExtractedImage)>,
    pending: Vec<Pending>,
    pool: ImagePool,
}

fn run_tier(tier: MatchTier, select: SelectFn, pending: Vec<Pending>, mut pool: ImagePool, cfg: &MatchConfig) -> TierPass {
    let mut matched = Vec::new();
    let mut still_pending = Vec::new();
    for (row_idx, target) in pending {
        match select(&pool, target, cfg) {
            Some(idx) => matched.push((row_idx, tier, pool.take(idx))),
            None => still_pending.push((row_idx, target)),
        }
    }
    TierPass {
        matched,
        pending: still_pending,
        pool,
    }
}

#[derive(Debug, Clone)]
pub struct MatchedImage {
    pub code: String,
    pub tier: MatchTier,
    pub image: ExtractedImage,
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// In row order.
    pub matched: Vec<MatchedImage>,
    /// Codes of rows that expected an image and got none.
    pub rows_without_image: Vec<String>,
    /// Rows the layout assigned no image cell.
    pub rows_without_position: usize,
    pub unclaimed: Vec<ExtractedImage>,
}

/// Serializable tallies of a [`MatchOutcome`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub matched: usize,
    pub by_tier: BTreeMap<MatchTier, usize>,
    pub rows_without_image: usize,
    pub rows_without_position: usize,
    pub unclaimed_images: usize,
}

impl MatchOutcome {
    pub fn summary(&self) -> MatchSummary {
        let mut by_tier = BTreeMap::new();
        for m in &self.matched {
            *by_tier.entry(m.tier).or_insert(0) += 1;
        }
        MatchSummary {
            matched: self.matched.len(),
            by_tier,
            rows_without_image: self.rows_without_image.len(),
            rows_without_position: self.rows_without_position,
            unclaimed_images: self.unclaimed.len(),
        }
    }

    /// Code → matched image.
    pub fn by_code(&self) -> BTreeMap<&str, &ExtractedImage> {
        self.matched.iter().map(|m| (m.code.as_str(), &m.image)).collect()
    }
}

/// Match each row with an expected image position to at most one image.
pub fn match_images(rows: &[NormalizedRow], images: Vec<ExtractedImage>, cfg: &MatchConfig) -> MatchOutcome {
    let mut pending: Vec<Pending> = Vec::new();
    let mut rows_without_position = 0;
    for (i, row) in rows.iter().enumerate() {
        match row.image_position {
            Some(pos) => pending.push((i, pos)),
            None => rows_without_position += 1,
        }
    }

    let mut pool = ImagePool::new(images);
    let mut matched = Vec::new();
    for (tier, select) in TIERS {
        if pending.is_empty() || pool.is_empty() {
            break;
        }
        let pass = run_tier(tier, select, pending, pool, cfg);
        log::debug!("match tier {}: {} matched", tier, pass.matched.len());
        matched.extend(pass.matched);
        pending = pass.pending;
        pool = pass.pool;
    }

    matched.sort_by_key(|(row_idx, _, _)| *row_idx);
    let outcome = MatchOutcome {
        matched: matched
            .into_iter()
            .map(|(row_idx, tier, image)| MatchedImage {
                code: rows[row_idx].code.clone(),
                tier,
                image,
            })
            .collect(),
        rows_without_image: pending.iter().map(|(i, _)| rows[*i].code.clone()).collect(),
        rows_without_position,
        unclaimed: pool.into_images(),
    };

    log::info!(
        "matched {} image(s); {} row(s) without image, {} image(s) unclaimed",
        outcome.matched.len(),
        outcome.rows_without_image.len(),
        outcome.unclaimed.len()
    );
    outcome
}
