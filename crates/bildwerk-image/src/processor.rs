// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: quarter-turn rotation, crop and bounded resize over an
// in-memory image, plus JPEG encoding of the final artifact.

use std::path::Path;

use bildwerk_core::error::{BildwerkError, Result};
use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::orientation::Orientation;

/// Encoding quality of every delivered artifact.
pub const OUTPUT_JPEG_QUALITY: u8 = 95;

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping
/// the transformed image; the pre-transform buffer is dropped.
///
/// ```ignore
/// let upright = normalize(&data)?;
/// let jpeg = ImageProcessor::from_dynamic(upright.image)
///     .fit_within(1920, 1080)
///     .to_jpeg_bytes(OUTPUT_JPEG_QUALITY)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
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

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate clockwise by the quarter turn `orientation` calls for.
    /// `Normal` returns the buffer untouched.
    #[instrument(skip(self), fields(orientation = ?orientation))]
    pub fn rotate(self, orientation: Orientation) -> Self {
        let image = match orientation {
            Orientation::Normal => return self,
            Orientation::Rotate90 => self.image.rotate90(),
            Orientation::Rotate180 => self.image.rotate180(),
            Orientation::Rotate270 => self.image.rotate270(),
        };
        info!(
            new_w = image.width(),
            new_h = image.height(),
            "Rotation applied"
        );
        Self { image }
    }

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x).max(1);
        let safe_h = height.min(img_h - safe_y).max(1);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Largest centred region with the aspect ratio `x:y`.
    pub fn center_crop_to_aspect(self, x: f32, y: f32) -> Self {
        if x <= 0.0 || y <= 0.0 {
            return self;
        }
        let (w, h) = (self.image.width(), self.image.height());
        let target = f64::from(x) / f64::from(y);
        let current = f64::from(w) / f64::from(h);

        let (crop_w, crop_h) = if current > target {
            (((f64::from(h) * target).round() as u32).max(1), h)
        } else {
            (w, ((f64::from(w) / target).round() as u32).max(1))
        };

        let left = (w - crop_w.min(w)) / 2;
        let top = (h - crop_h.min(h)) / 2;
        self.crop(left, top, crop_w, crop_h)
    }

    /// Shrink to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Images already inside the box are left alone.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        if self.image.width() <= max_width && self.image.height() <= max_height {
            return self;
        }
        let resized = self
            .image
            .resize(max_width, max_height, image::imageops::FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| BildwerkError::ImageError(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode at [`OUTPUT_JPEG_QUALITY`] and write to `path`. Returns the
    /// number of bytes written.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save_jpeg(&self, path: impl AsRef<Path>) -> Result<u64> {
        let bytes = self.to_jpeg_bytes(OUTPUT_JPEG_QUALITY)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(bytes = bytes.len(), "Artifact written");
        Ok(bytes.len() as u64)
    }
}
