// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds without any native collaborator.
//
// Every launch returns `PlatformUnavailable`, which the acquirer turns into
// an invocation failure. No crop engine is ever resolved.

use std::path::Path;
use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{ActivityCompletion, CapabilityKind, SessionId};

use crate::traits::*;

/// No-op bridge.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Stub"
    }
}

impl CapabilityLayer for StubBridge {
    fn is_granted(&self, _kind: CapabilityKind) -> Result<bool> {
        tracing::warn!("CapabilityLayer::is_granted called on stub bridge");
        Err(BildwerkError::PlatformUnavailable)
    }

    fn request(&self, _session: SessionId, _kind: CapabilityKind) -> Result<Dispatch<bool>> {
        tracing::warn!("CapabilityLayer::request called on stub bridge");
        Err(BildwerkError::PlatformUnavailable)
    }
}

impl NativeCamera for StubBridge {
    fn has_capture_facility(&self) -> bool {
        false
    }

    fn launch_capture(
        &self,
        _session: SessionId,
        _output: &Path,
    ) -> Result<Dispatch<ActivityCompletion>> {
        tracing::warn!("NativeCamera::launch_capture called on stub bridge");
        Err(BildwerkError::PlatformUnavailable)
    }
}

impl NativeLibraryPicker for StubBridge {
    fn launch_picker(
        &self,
        _session: SessionId,
        _mime_filter: &str,
    ) -> Result<Dispatch<ActivityCompletion>> {
        tracing::warn!("NativeLibraryPicker::launch_picker called on stub bridge");
        Err(BildwerkError::PlatformUnavailable)
    }
}

impl CandidateReader for StubBridge {}

impl CropProvider for StubBridge {
    fn resolve_crop_engine(&self) -> Option<Arc<dyn CropEngine>> {
        None
    }
}
