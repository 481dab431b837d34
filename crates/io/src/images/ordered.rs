// Tier 3: order-based placement for media without position metadata.

use shelfline_core::{CellPos, NormalizedRow};

use super::{ExtractedImage, MediaBlob};

#[derive(Debug, Default)]
pub struct Placement {
    pub placed: Vec<ExtractedImage>,
    /// Blobs beyond the number of expected positions.
    pub unplaced: Vec<MediaBlob>,
}

/// Pair the Nth blob with the Nth expected image position, positions taken
/// row-major then column-major. Rows without an expected position take no
/// part; surplus blobs are returned unplaced.
pub fn place_by_order(media: Vec<MediaBlob>, rows: &[NormalizedRow]) -> Placement {
    let mut expected: Vec<CellPos> = rows.iter().filter_map(|r| r.image_position).collect();
    expected.sort();
    expected.dedup();

    let mut placement = Placement::default();
    let mut slots = expected.into_iter();
    for blob in media {
        match slots.next() {
            Some(position) => placement.placed.push(ExtractedImage {
                position,
                bytes: blob.bytes,
                format: blob.format,
            }),
            None => placement.unplaced.push(blob),
        }
    }

    if !placement.unplaced.is_empty() {
        log::warn!(
            "{} media blob(s) left over after order-based placement",
            placement.unplaced.len()
        );
    }
    placement
}
