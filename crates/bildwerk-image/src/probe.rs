// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounds-only probe: dimensions from the container header, size from the
// byte count. No pixel data is decoded here.

use std::io::Cursor;

use bildwerk_core::error::{BildwerkError, Result};
use image::ImageReader;
use tracing::{debug, instrument};

/// What the validator needs to know about a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

/// Read width and height from the header of `data`.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn probe_bounds(data: &[u8]) -> Result<Bounds> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| BildwerkError::ImageError(format!("failed to sniff format: {err}")))?
        .into_dimensions()
        .map_err(|err| BildwerkError::ImageError(format!("failed to read bounds: {err}")))?;

    let bounds = Bounds {
        width,
        height,
        byte_size: data.len() as u64,
    };
    debug!(width, height, byte_size = bounds.byte_size, "Bounds probed");
    Ok(bounds)
}
