// Thumbnail normalization: scale so the longer edge hits the target size and
// re-encode in the source format. Any failure keeps the original bytes.

use std::io::Cursor;

use image::imageops::FilterType;
use image::DynamicImage;

use super::ImageFormat;

#[derive(Debug)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    /// False when the original bytes were passed through.
    pub resized: bool,
}

impl Normalized {
    fn passthrough(bytes: Vec<u8>) -> Self {
        Self { bytes, resized: false }
    }
}

fn encoder_format(format: ImageFormat) -> Option<image::ImageFormat> {
    match format {
        ImageFormat::Png => Some(image::ImageFormat::Png),
        ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
        ImageFormat::Gif => Some(image::ImageFormat::Gif),
        ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
        _ => None,
    }
}

pub fn normalize(bytes: Vec<u8>, format: ImageFormat, target_edge: u32) -> Normalized {
    let Some(out_format) = encoder_format(format) else {
        return Normalized::passthrough(bytes);
    };

    let decoded = match image::load_from_memory_with_format(&bytes, out_format) {
        Ok(img) => img,
        Err(e) => {
            log::debug!("image decode failed ({:?}): {}", format, e);
            return Normalized::passthrough(bytes);
        }
    };
    if decoded.width() == 0 || decoded.height() == 0 {
        return Normalized::passthrough(bytes);
    }

    let resized = decoded.resize(target_edge, target_edge, FilterType::Triangle);
    // JPEG has no alpha channel
    let resized = match out_format {
        image::ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut out = Cursor::new(Vec::new());
    match resized.write_to(&mut out, out_format) {
        Ok(()) => Normalized {
            bytes: out.into_inner(),
            resized: true,
        },
        Err(e) => {
            log::debug!("image encode failed ({:?}): {}", format, e);
            Normalized::passthrough(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn longer_edge_becomes_target() {
        let out = normalize(png(400, 100), ImageFormat::Png, 192);
        assert!(out.resized);
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.dimensions(), (192, 48));
    }

    #[test]
    fn small_images_are_scaled_up() {
        let out = normalize(png(32, 64), ImageFormat::Png, 192);
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.dimensions(), (96, 192));
    }

    #[test]
    fn jpeg_round_trips_without_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 300, Rgba([1, 2, 3, 255])));
        let mut jpeg = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgba.to_rgb8()).write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();
        let out = normalize(jpeg.into_inner(), ImageFormat::Jpeg, 192);
        assert!(out.resized);
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn undecodable_and_unsupported_pass_through() {
        let junk = b"\x89PNG but not really".to_vec();
        let out = normalize(junk.clone(), ImageFormat::Png, 192);
        assert!(!out.resized);
        assert_eq!(out.bytes, junk);

        let emf = vec![1, 0, 0, 0, 0x6c];
        let out = normalize(emf.clone(), ImageFormat::Emf, 192);
        assert!(!out.resized);
        assert_eq!(out.bytes, emf);
    }
}
