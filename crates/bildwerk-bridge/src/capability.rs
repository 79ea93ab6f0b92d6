// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission epochs: which Android permission identifier backs each
// capability kind on a given SDK level.

use bildwerk_core::types::CapabilityKind;

pub const CAMERA: &str = "android.permission.CAMERA";
pub const READ_MEDIA_IMAGES: &str = "android.permission.READ_MEDIA_IMAGES";
pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";

/// Android permission model in force on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionEpoch {
    /// API < 23: everything declared in the manifest is granted at install.
    InstallTime,
    /// API 23..=32: runtime grants, broad storage read.
    BroadStorage,
    /// API >= 33: runtime grants, scoped image read.
    ScopedMedia,
}

impl PermissionEpoch {
    pub fn from_sdk_level(level: u32) -> Self {
        match level {
            0..=22 => Self::InstallTime,
            23..=32 => Self::BroadStorage,
            _ => Self::ScopedMedia,
        }
    }

    /// The runtime permission to request, or `None` when the capability is
    /// granted at install time.
    pub fn identifier(&self, kind: CapabilityKind) -> Option<&'static str> {
        match (self, kind) {
            (Self::InstallTime, _) => None,
            (_, CapabilityKind::LiveCapture) => Some(CAMERA),
            (Self::BroadStorage, CapabilityKind::ReadMedia) => Some(READ_EXTERNAL_STORAGE),
            (Self::ScopedMedia, CapabilityKind::ReadMedia) => Some(READ_MEDIA_IMAGES),
        }
    }

    pub fn requires_runtime_grant(&self) -> bool {
        *self != Self::InstallTime
    }
}
