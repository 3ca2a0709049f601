// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — load replacement images, resize them for on-screen
// previews, and encode them as PDF image XObjects. Uses the `image` crate for
// decoding and `flate2` for stream compression.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat};
use lopdf::{Stream, dictionary};
use pdfwerk_core::PageRect;
use pdfwerk_core::error::PdfwerkError;
use tracing::{debug, info, instrument};

/// File extensions offered in the replacement image picker.
pub const REPLACEMENT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// A replacement image ready to be written into a PDF.
#[derive(Debug, Clone)]
pub struct PdfImage {
    /// The image XObject stream.
    pub image: Stream,
    /// Alpha channel as a DeviceGray soft mask, for images with transparency.
    pub soft_mask: Option<Stream>,
}

/// Image processing for a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining. The original encoded bytes are kept until the first
/// transformation so JPEG sources can be embedded without re-encoding.
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
    /// Encoded source bytes and their format, while still untouched.
    encoded: Option<(Vec<u8>, ImageFormat)>,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PdfwerkError> {
        let data = std::fs::read(path.as_ref()).map_err(|err| {
            PdfwerkError::ImageError(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        let processor = Self::from_bytes(&data)?;
        info!(
            width = processor.width(),
            height = processor.height(),
            "Image loaded"
        );
        Ok(processor)
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfwerkError> {
        let image = image::load_from_memory(data)
            .map_err(|err| PdfwerkError::ImageError(format!("failed to decode image: {}", err)))?;
        let encoded = image::guess_format(data).ok().map(|format| (data.to_vec(), format));
        debug!(
            width = image.width(),
            height = image.height(),
            format = ?encoded.as_ref().map(|(_, format)| *format),
            "Image decoded from bytes"
        );
        Ok(Self { image, encoded })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image, encoded: None }
    }

    /// Read only the dimensions from a file header, without decoding pixels.
    pub fn dimensions(path: impl AsRef<std::path::Path>) -> Result<(u32, u32), PdfwerkError> {
        image::image_dimensions(path.as_ref()).map_err(|err| {
            PdfwerkError::ImageError(format!("{}: {}", path.as_ref().display(), err))
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// Uses Lanczos3 filtering.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized = self.image.resize_exact(
            width.max(1),
            height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        Self::from_dynamic(resized)
    }

    /// Where this image lands when drawn into `target`: the whole rectangle,
    /// or the largest centred rectangle with the image's proportions.
    pub fn fit_within(&self, target: &PageRect, keep_aspect_ratio: bool) -> PageRect {
        fit_rect(target, self.width(), self.height(), keep_aspect_ratio)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PdfwerkError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|err| PdfwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buf)
    }

    /// Encode as a PDF image XObject.
    ///
    /// Untouched baseline JPEGs with one or three components are embedded
    /// verbatim (`/DCTDecode`); everything else becomes Flate-compressed 8-bit
    /// RGB with an optional soft mask.
    pub fn to_pdf_image(&self) -> Result<PdfImage, PdfwerkError> {
        let (width, height) = (i64::from(self.width()), i64::from(self.height()));

        if let Some((data, ImageFormat::Jpeg)) = &self.encoded {
            let color_space = match jpeg_components(data) {
                Some(1) => Some("DeviceGray"),
                Some(3) => Some("DeviceRGB"),
                _ => None,
            };
            if let Some(color_space) = color_space {
                debug!(color_space, bytes = data.len(), "Embedding JPEG without re-encoding");
                let image = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => color_space,
                        "BitsPerComponent" => 8i64,
                        "Filter" => "DCTDecode",
                    },
                    data.clone(),
                );
                return Ok(PdfImage { image, soft_mask: None });
            }
        }

        let (rgb, alpha) = if self.image.color().has_alpha() {
            let rgba = self.image.to_rgba8();
            let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(rgba.len() / 4);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            (rgb, Some(alpha))
        } else {
            (self.image.to_rgb8().into_raw(), None)
        };

        let soft_mask = match alpha {
            Some(alpha) => Some(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8i64,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            )),
            None => None,
        };

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
                "Filter" => "FlateDecode",
            },
            deflate(&rgb)?,
        );

        debug!(width, height, soft_mask = soft_mask.is_some(), "Image encoded for PDF");
        Ok(PdfImage { image, soft_mask })
    }
}

/// Fit a `width` x `height` image into `target` (see [`ImageProcessor::fit_within`]).
pub fn fit_rect(target: &PageRect, width: u32, height: u32, keep_aspect_ratio: bool) -> PageRect {
    if !keep_aspect_ratio || width == 0 || height == 0 {
        return *target;
    }
    let scale = (target.width() / width as f32).min(target.height() / height as f32);
    let (w, h) = (width as f32 * scale, height as f32 * scale);
    PageRect::from_origin_size(
        target.x0 + (target.width() - w) / 2.0,
        target.y0 + (target.height() - h) / 2.0,
        w,
        h,
    )
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfwerkError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Component count from the first SOF marker of a JPEG stream.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            0xFF => pos += 1,
            0x01 | 0xD0..=0xD8 => pos += 2,
            // SOFn, excluding DHT (C4), JPG (C8) and DAC (CC).
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return data.get(pos + 9).copied();
            }
            _ => {
                let len = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
                pos += 2 + len;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{write_rgb_image, write_rgba_png};

    #[test]
    fn proportional_fit_is_centred() {
        let target = PageRect::from_origin_size(0.0, 0.0, 200.0, 100.0);
        let fitted = fit_rect(&target, 50, 50, true);
        assert_eq!(fitted, PageRect::from_origin_size(50.0, 0.0, 100.0, 100.0));
        assert_eq!(fit_rect(&target, 50, 50, false), target);
    }

    #[test]
    fn jpeg_is_embedded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgb_image(dir.path(), "photo.jpg", 16, 8, ImageFormat::Jpeg);

        let pdf_image = ImageProcessor::open(&path).unwrap().to_pdf_image().unwrap();
        assert_eq!(pdf_image.image.content, std::fs::read(&path).unwrap());
        assert_eq!(
            pdf_image.image.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
        assert!(pdf_image.soft_mask.is_none());
    }

    #[test]
    fn transparent_png_gets_a_soft_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgba_png(dir.path(), "overlay.png", 4, 4);

        let pdf_image = ImageProcessor::open(&path).unwrap().to_pdf_image().unwrap();
        let mask = pdf_image.soft_mask.expect("soft mask");
        assert_eq!(mask.decompressed_content().unwrap(), vec![128u8; 16]);
        assert_eq!(pdf_image.image.decompressed_content().unwrap().len(), 4 * 4 * 3);
    }

    #[test]
    fn resizing_drops_the_encoded_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgb_image(dir.path(), "photo.jpg", 16, 8, ImageFormat::Jpeg);

        let resized = ImageProcessor::open(&path).unwrap().resize_exact(4, 2);
        assert_eq!((resized.width(), resized.height()), (4, 2));
        let pdf_image = resized.to_pdf_image().unwrap();
        assert_eq!(
            pdf_image.image.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"FlateDecode"
        );
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        let err = ImageProcessor::from_bytes(b"not an image").err().unwrap();
        assert!(matches!(err, PdfwerkError::ImageError(_)));
    }
}
