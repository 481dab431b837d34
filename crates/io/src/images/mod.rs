//! Embedded image recovery.
//!
//! Three tiers, each tried only when the previous one finds nothing:
//!
//! 1. `structured`: the sheet's conventionally named drawing part paired
//!    with the package media list.
//! 2. `archive`: the worksheet → drawing → media relationship chain walked
//!    by hand, accepting fixed and range anchors.
//! 3. [`ordered`]: unpositioned media paired with the rows' expected image
//!    cells purely by order.
//!
//! Every image leaving this module has been through [`normalize`].

mod anchors;
mod archive;
pub mod normalize;
pub mod ordered;
mod structured;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use shelfline_core::config::ImageConfig;
use shelfline_core::{CellPos, NormalizedRow};

use crate::ooxml;
use crate::workbook::SourceWorkbook;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
    Tiff,
    Emf,
    Wmf,
    Unknown,
}

impl ImageFormat {
    /// Sniff the format from content, falling back to a file extension.
    pub fn detect(bytes: &[u8], extension: Option<&str>) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => Self::Png,
            Ok(image::ImageFormat::Jpeg) => Self::Jpeg,
            Ok(image::ImageFormat::Gif) => Self::Gif,
            Ok(image::ImageFormat::Bmp) => Self::Bmp,
            Ok(image::ImageFormat::WebP) => Self::Webp,
            Ok(image::ImageFormat::Tiff) => Self::Tiff,
            _ => extension.map(Self::from_extension).unwrap_or(Self::Unknown),
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" | "jpe" => Self::Jpeg,
            "gif" => Self::Gif,
            "bmp" | "dib" => Self::Bmp,
            "webp" => Self::Webp,
            "tif" | "tiff" => Self::Tiff,
            "emf" => Self::Emf,
            "wmf" => Self::Wmf,
            _ => Self::Unknown,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Emf => "emf",
            Self::Wmf => "wmf",
            Self::Unknown => "bin",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Emf => "image/emf",
            Self::Wmf => "image/wmf",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// An image with the cell it is anchored to. Lives for one ingestion run.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub position: CellPos,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl fmt::Debug for ExtractedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedImage")
            .field("position", &self.position)
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

/// An image with no position metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaBlob")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Structured,
    RawArchive,
    OrderBased,
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::RawArchive => write!(f, "raw_archive"),
            Self::OrderBased => write!(f, "order_based"),
        }
    }
}

/// Output of one extraction run.
#[derive(Debug, Default)]
pub struct ImageExtraction {
    /// Tier that produced the images; `None` when no tier found any.
    pub tier: Option<ExtractionTier>,
    pub images: Vec<ExtractedImage>,
    /// Images resized and re-encoded.
    pub normalized: usize,
    /// Images whose original bytes were kept (decode/resize/encode failed or
    /// no encoder for the format).
    pub passed_through: usize,
    /// Unpositioned blobs the order-based tier could not place.
    pub unplaced: usize,
}

impl ImageExtraction {
    /// Position → image bytes. When two images share an anchor cell the first
    /// one wins.
    pub fn by_position(&self) -> BTreeMap<CellPos, &[u8]> {
        let mut map = BTreeMap::new();
        for img in &self.images {
            map.entry(img.position).or_insert(img.bytes.as_slice());
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Positioned raw image (before normalization) from tier 1 or 2.
#[derive(Debug, Clone)]
pub(crate) struct RawImage {
    pub position: CellPos,
    pub media_path: String,
    pub bytes: Vec<u8>,
}

/// Run tiers 1 and 2 against the container bytes. Independent of rows.
pub fn extract_positioned(bytes: &[u8], sheet_index: usize) -> Option<(ExtractionTier, Vec<ExtractedImage>)> {
    let mut archive = ooxml::open_package(bytes)?;

    let structured = structured::read(&mut archive, sheet_index);
    let (tier, raw) = if !structured.is_empty() {
        (ExtractionTier::Structured, structured)
    } else {
        let walked = archive::read(&mut archive, sheet_index);
        if walked.is_empty() {
            return None;
        }
        (ExtractionTier::RawArchive, walked)
    };

    let images = raw
        .into_iter()
        .map(|r| {
            let ext = r.media_path.rsplit('.').next();
            ExtractedImage {
                position: r.position,
                format: ImageFormat::detect(&r.bytes, ext),
                bytes: r.bytes,
            }
        })
        .collect();
    Some((tier, images))
}

/// Unpositioned media for the order-based tier: package media entries when
/// the container is a zip package, otherwise the reader's picture list.
/// Media referenced only by other worksheets' drawings is left out.
pub fn collect_media(bytes: &[u8], sheet_index: usize, pictures: &[(String, Vec<u8>)]) -> Vec<MediaBlob> {
    if let Some(mut archive) = ooxml::open_package(bytes) {
        let names = ooxml::media_entries(&archive);
        if !names.is_empty() {
            let foreign = archive::media_of_other_sheets(&mut archive, sheet_index);
            if !foreign.is_empty() {
                log::debug!("sheet {}: {} media entr(ies) belong to other sheets", sheet_index, foreign.len());
            }
            return names
                .into_iter()
                .filter(|name| !foreign.contains(name))
                .filter_map(|name| {
                    let data = ooxml::read_part_bytes(&mut archive, &name)?;
                    let ext = name.rsplit('.').next().map(str::to_string);
                    Some(MediaBlob {
                        format: ImageFormat::detect(&data, ext.as_deref()),
                        bytes: data,
                        name,
                    })
                })
                .collect();
        }
    }

    pictures
        .iter()
        .enumerate()
        .map(|(i, (ext, data))| MediaBlob {
            name: format!("picture{}.{}", i + 1, ext),
            bytes: data.clone(),
            format: ImageFormat::detect(data, Some(ext)),
        })
        .collect()
}

/// Full three-tier extraction. `rows` are only consulted by the order-based
/// tier, which needs expected image positions.
pub fn extract_images(source: &SourceWorkbook, bytes: &[u8], rows: &[NormalizedRow], cfg: &ImageConfig) -> ImageExtraction {
    let (tier, images, unplaced) = match extract_positioned(bytes, source.sheet_index) {
        Some((tier, images)) => (Some(tier), images, 0),
        None => {
            let media = collect_media(bytes, source.sheet_index, &source.pictures);
            if media.is_empty() {
                (None, Vec::new(), 0)
            } else {
                let placement = ordered::place_by_order(media, rows);
                let tier = if placement.placed.is_empty() {
                    None
                } else {
                    Some(ExtractionTier::OrderBased)
                };
                (tier, placement.placed, placement.unplaced.len())
            }
        }
    };

    let mut extraction = ImageExtraction {
        tier,
        unplaced,
        ..Default::default()
    };
    for img in images {
        let out = normalize::normalize(img.bytes, img.format, cfg.target_edge_px);
        if out.resized {
            extraction.normalized += 1;
        } else {
            extraction.passed_through += 1;
        }
        extraction.images.push(ExtractedImage {
            position: img.position,
            bytes: out.bytes,
            format: img.format,
        });
    }

    match extraction.tier {
        Some(tier) => log::info!(
            "extracted {} image(s) via {} tier ({} normalized, {} passed through, {} unplaced)",
            extraction.images.len(),
            tier,
            extraction.normalized,
            extraction.passed_through,
            extraction.unplaced
        ),
        None => log::info!("no embedded images found"),
    }

    extraction
}
