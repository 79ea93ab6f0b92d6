// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Constraint validation against caller-configured limits.
//
// Checks run in a fixed order and stop at the first violation:
// maxFileSize, minWidth, minHeight, maxWidth, maxHeight.

use bildwerk_core::types::Constraints;
use thiserror::Error;
use tracing::debug;

use crate::probe::Bounds;

/// The first limit a candidate broke, with measured and configured values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("file size ({size} bytes) exceeds the limit ({limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("image width ({width}px) is below the minimum ({limit}px)")]
    TooNarrow { width: u32, limit: u32 },

    #[error("image height ({height}px) is below the minimum ({limit}px)")]
    TooShort { height: u32, limit: u32 },

    #[error("image width ({width}px) exceeds the maximum ({limit}px)")]
    TooWide { width: u32, limit: u32 },

    #[error("image height ({height}px) exceeds the maximum ({limit}px)")]
    TooTall { height: u32, limit: u32 },
}

/// Check `bounds` against `constraints`. Zero limits are skipped.
pub fn validate(bounds: &Bounds, constraints: &Constraints) -> Result<(), Violation> {
    let c = constraints;

    if c.max_file_size > 0 && bounds.byte_size > c.max_file_size {
        return Err(Violation::FileTooLarge {
            size: bounds.byte_size,
            limit: c.max_file_size,
        });
    }
    if c.min_width > 0 && bounds.width < c.min_width {
        return Err(Violation::TooNarrow {
            width: bounds.width,
            limit: c.min_width,
        });
    }
    if c.min_height > 0 && bounds.height < c.min_height {
        return Err(Violation::TooShort {
            height: bounds.height,
            limit: c.min_height,
        });
    }
    if c.max_width > 0 && bounds.width > c.max_width {
        return Err(Violation::TooWide {
            width: bounds.width,
            limit: c.max_width,
        });
    }
    if c.max_height > 0 && bounds.height > c.max_height {
        return Err(Violation::TooTall {
            height: bounds.height,
            limit: c.max_height,
        });
    }

    debug!(
        width = bounds.width,
        height = bounds.height,
        "Constraints satisfied"
    );
    Ok(())
}
