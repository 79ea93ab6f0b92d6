// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge: the picker of an editor or CLI host.
//
// Desktops have no permission prompts and no camera activity. The library
// "picker" completes immediately with a path the host selected up front.
// A `CenterCropEngine` can stand in for the interactive crop UI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{ActivityCompletion, CandidateRef, CapabilityKind, SessionId};
use bildwerk_image::ImageProcessor;
use tracing::{debug, info, instrument};

use crate::traits::*;

pub struct DesktopBridge {
    selection: Option<PathBuf>,
    crop_engine: Option<Arc<dyn CropEngine>>,
}

impl DesktopBridge {
    /// `selection` is what the picker returns; `None` behaves like the user
    /// dismissing the dialog.
    pub fn new(selection: Option<PathBuf>) -> Self {
        Self {
            selection,
            crop_engine: None,
        }
    }

    pub fn with_crop_engine(mut self, engine: Arc<dyn CropEngine>) -> Self {
        self.crop_engine = Some(engine);
        self
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }
}

impl CapabilityLayer for DesktopBridge {
    fn is_granted(&self, _kind: CapabilityKind) -> Result<bool> {
        Ok(true)
    }

    fn request(&self, _session: SessionId, _kind: CapabilityKind) -> Result<Dispatch<bool>> {
        Ok(Dispatch::Ready(true))
    }
}

impl NativeCamera for DesktopBridge {
    fn has_capture_facility(&self) -> bool {
        false
    }

    fn launch_capture(
        &self,
        _session: SessionId,
        _output: &Path,
    ) -> Result<Dispatch<ActivityCompletion>> {
        Err(BildwerkError::PlatformUnavailable)
    }
}

impl NativeLibraryPicker for DesktopBridge {
    fn launch_picker(
        &self,
        session: SessionId,
        mime_filter: &str,
    ) -> Result<Dispatch<ActivityCompletion>> {
        debug!(%session, mime_filter, "Desktop picker invoked");
        let completion = match &self.selection {
            Some(path) => ActivityCompletion::Completed(Some(CandidateRef::from_path(path))),
            None => ActivityCompletion::Cancelled,
        };
        Ok(Dispatch::Ready(completion))
    }
}

impl CandidateReader for DesktopBridge {}

impl CropProvider for DesktopBridge {
    fn resolve_crop_engine(&self) -> Option<Arc<dyn CropEngine>> {
        self.crop_engine.clone()
    }
}

/// Non-interactive crop: largest centred region with the requested aspect
/// ratio, shrunk to the maximum output size, written upright as JPEG.
///
/// The circle shape only changes the overlay of interactive engines; the
/// output here is always the bounding rectangle.
pub struct CenterCropEngine;

impl CropEngine for CenterCropEngine {
    fn name(&self) -> &str {
        "center-crop"
    }

    #[instrument(skip(self, request), fields(source = %request.source))]
    fn launch(
        &self,
        session: SessionId,
        request: &CropRequest,
    ) -> Result<Dispatch<ActivityCompletion>> {
        let path = request
            .source
            .as_path()
            .ok_or_else(|| BildwerkError::Bridge(format!("cannot open {}", request.source)))?;
        let data = std::fs::read(path)?;

        let upright = bildwerk_image::normalize(&data)?;
        let mut processor = ImageProcessor::from_dynamic(upright.image);
        if let Some(aspect) = request.aspect_ratio {
            processor = processor.center_crop_to_aspect(aspect.x, aspect.y);
        }
        if let Some(max) = request.max_output_size {
            processor = processor.fit_within(max.width, max.height);
        }

        processor.save_jpeg(&request.output)?;
        info!(
            width = processor.width(),
            height = processor.height(),
            "Center crop written"
        );
        Ok(Dispatch::Ready(ActivityCompletion::Completed(Some(
            CandidateRef::from_path(&request.output),
        ))))
    }
}
