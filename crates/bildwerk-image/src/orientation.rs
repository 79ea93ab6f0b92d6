// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation normalization: full decode, then rotate the pixel buffer
// upright according to embedded EXIF orientation.
//
// Only the three pure rotations are honoured. Mirrored encodings, missing
// tags and unreadable metadata all count as `Normal`.

use std::io::Cursor;

use bildwerk_core::error::{BildwerkError, Result};
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{debug, instrument, warn};

use crate::processor::ImageProcessor;

/// Clockwise correction needed to display the image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    pub fn from_metadata(orientation: ExifOrientation) -> Self {
        match orientation {
            ExifOrientation::Rotate90 => Self::Rotate90,
            ExifOrientation::Rotate180 => Self::Rotate180,
            ExifOrientation::Rotate270 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Self::Normal => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    /// True when correcting swaps width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// An upright pixel buffer and the correction that produced it.
pub struct Normalized {
    pub image: DynamicImage,
    pub orientation: Orientation,
}

/// Decode `data` and rotate it upright.
///
/// Decode failures are errors; metadata failures are not.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn normalize(data: &[u8]) -> Result<Normalized> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| BildwerkError::ImageError(format!("failed to sniff format: {err}")))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|err| BildwerkError::ImageError(format!("failed to open decoder: {err}")))?;

    let orientation = match decoder.orientation() {
        Ok(o) => Orientation::from_metadata(o),
        Err(err) => {
            warn!(error = %err, "orientation metadata unreadable, skipping rotation");
            Orientation::Normal
        }
    };

    let decoded = DynamicImage::from_decoder(decoder)
        .map_err(|err| BildwerkError::ImageError(format!("failed to decode image: {err}")))?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        degrees = orientation.degrees(),
        "Decoded candidate"
    );

    let image = ImageProcessor::from_dynamic(decoded)
        .rotate(orientation)
        .into_dynamic();
    Ok(Normalized { image, orientation })
}
