// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optional crop adapter.
//
// The crop engine is resolved once per process into a `CropCapability`.
// When it is missing, fails to launch, is cancelled, or finishes abnormally,
// the session keeps its uncropped candidate. Only an engine that reports
// success without a usable output ends the session (code 50).

use std::path::Path;
use std::sync::Arc;

use bildwerk_bridge::{CropEngine, CropRequest, Dispatch, PlatformBridge};
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{ActivityCompletion, CandidateRef, CropSettings, Session};
use tracing::{debug, info, warn};

/// Whether a crop engine is installed.
#[derive(Clone)]
pub enum CropCapability {
    Available(Arc<dyn CropEngine>),
    Unavailable,
}

impl CropCapability {
    pub fn resolve(bridge: &dyn PlatformBridge) -> Self {
        match bridge.resolve_crop_engine() {
            Some(engine) => {
                info!(engine = engine.name(), "crop capability resolved");
                Self::Available(engine)
            }
            None => {
                info!("crop capability unavailable");
                Self::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl std::fmt::Debug for CropCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(engine) => write!(f, "Available({})", engine.name()),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Result of trying to start the crop step.
#[derive(Debug, Clone, PartialEq)]
pub enum CropLaunch {
    Dispatched(Dispatch<ActivityCompletion>),
    /// Continue with the uncropped candidate.
    Bypassed,
}

pub struct OptionalCropAdapter {
    capability: CropCapability,
}

impl OptionalCropAdapter {
    pub fn new(capability: CropCapability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> &CropCapability {
        &self.capability
    }

    /// True when the request asks for a crop and an engine can provide it.
    pub fn applies(&self, settings: &CropSettings) -> bool {
        settings.enabled && self.capability.is_available()
    }

    /// Launch the engine on the session's current candidate.
    pub fn launch(&self, session: &mut Session, work_dir: &Path) -> CropLaunch {
        let settings = session.config.crop;
        if !settings.enabled {
            return CropLaunch::Bypassed;
        }
        let CropCapability::Available(engine) = &self.capability else {
            debug!(session_id = %session.id, "no crop engine, continuing uncropped");
            return CropLaunch::Bypassed;
        };
        let Some(source) = session.source_reference.clone() else {
            return CropLaunch::Bypassed;
        };

        let output = work_dir.join(format!("crop_{}.jpg", session.id));
        session.own(output.clone());
        let request = CropRequest {
            source,
            output,
            shape: settings.shape,
            aspect_ratio: settings.aspect_ratio,
            max_output_size: settings.max_output_size,
        };

        match engine.launch(session.id, &request) {
            Ok(dispatch) => {
                info!(session_id = %session.id, engine = engine.name(), "crop launched");
                CropLaunch::Dispatched(dispatch)
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "crop launch failed, continuing uncropped");
                CropLaunch::Bypassed
            }
        }
    }

    /// Apply the engine's completion. `Err` carries the terminal outcome.
    pub fn resolve(
        &self,
        bridge: &dyn PlatformBridge,
        session: &mut Session,
        completion: ActivityCompletion,
    ) -> Result<(), Outcome> {
        match completion {
            ActivityCompletion::Completed(Some(cropped)) if bridge.candidate_exists(&cropped) => {
                info!(session_id = %session.id, candidate = %cropped, "crop applied");
                // Engines may write somewhere other than the requested output.
                // Whatever local file they hand back is ours to delete, but the
                // candidate they were given never is.
                if let Some(path) = cropped.as_path() {
                    let previous = session.source_reference.as_ref().and_then(CandidateRef::as_path);
                    if previous.as_ref() != Some(&path) {
                        session.own(path);
                    }
                }
                session.source_reference = Some(cropped);
                Ok(())
            }
            ActivityCompletion::Completed(reference) => {
                warn!(session_id = %session.id, reference = ?reference.as_ref().map(CandidateRef::as_str), "crop produced no output");
                Err(Outcome::failed_with(
                    FailureCode::CropNoOutput,
                    "crop produced no usable output",
                ))
            }
            ActivityCompletion::Cancelled => {
                info!(session_id = %session.id, "crop cancelled, continuing uncropped");
                Ok(())
            }
            ActivityCompletion::Abnormal(detail) => {
                warn!(session_id = %session.id, detail = %detail, "crop failed, continuing uncropped");
                Ok(())
            }
        }
    }
}
