// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-image: image handling for the acquisition pipeline.
//
// Provides the bounds-only probe used by constraint validation, the
// constraint checks themselves, EXIF orientation normalization, and the
// processor that crops, resizes and encodes the delivered JPEG.

pub mod constraints;
pub mod orientation;
pub mod probe;
pub mod processor;

pub use constraints::{Violation, validate};
pub use orientation::{Normalized, Orientation, normalize};
pub use probe::{Bounds, probe_bounds};
pub use processor::{ImageProcessor, OUTPUT_JPEG_QUALITY};
