// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the OS collaborators of an
// acquisition: the capability layer, the camera and library activities,
// candidate access, the optional crop engine, the foreground service and
// the outcome transport.
//
// Launch methods return `Dispatch::Pending` when the OS will call back
// later (Android activities) and `Dispatch::Ready` when the platform can
// answer synchronously (desktop dialogs, tests).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::outcome::Outcome;
use bildwerk_core::types::{
    ActivityCompletion, AspectRatio, CandidateRef, CapabilityKind, CropShape, OutputSize,
    SessionId,
};

/// Result of launching an OS interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// The OS owns the interaction; the answer arrives through a callback.
    Pending,
    /// The platform answered immediately.
    Ready(T),
}

/// Unified bridge that groups every native collaborator.
pub trait PlatformBridge:
    CapabilityLayer + NativeCamera + NativeLibraryPicker + CandidateReader + CropProvider + Send + Sync
{
    /// Human-readable platform name (e.g. "Android 14", "Desktop").
    fn platform_name(&self) -> &str;
}

/// Maps `CapabilityKind` onto platform permission identifiers and asks the
/// user for them.
pub trait CapabilityLayer {
    /// Whether the capability is already authorized.
    fn is_granted(&self, kind: CapabilityKind) -> Result<bool>;

    /// Ask the user. `Ready(granted)` for synchronous platforms.
    fn request(&self, session: SessionId, kind: CapabilityKind) -> Result<Dispatch<bool>>;
}

/// Live capture through the OS camera facility.
pub trait NativeCamera {
    /// False when no capture activity is registered on the device.
    fn has_capture_facility(&self) -> bool;

    /// Launch the camera, asking it to write its output to `output`.
    /// A `Completed` result carries no reference: the file is the output.
    fn launch_capture(
        &self,
        session: SessionId,
        output: &Path,
    ) -> Result<Dispatch<ActivityCompletion>>;
}

/// Selection of a pre-existing item from the media library.
pub trait NativeLibraryPicker {
    /// Show the picker restricted to `mime_filter`.
    fn launch_picker(
        &self,
        session: SessionId,
        mime_filter: &str,
    ) -> Result<Dispatch<ActivityCompletion>>;
}

/// Read access to candidate artifacts, including platform URIs.
///
/// The defaults handle plain and `file://` paths; platforms with content
/// URIs override both methods.
pub trait CandidateReader {
    fn read_candidate(&self, candidate: &CandidateRef) -> Result<Vec<u8>> {
        let path = candidate
            .as_path()
            .ok_or_else(|| BildwerkError::Bridge(format!("cannot open {candidate}")))?;
        Ok(std::fs::read(path)?)
    }

    /// True when the candidate exists and holds at least one byte.
    fn candidate_exists(&self, candidate: &CandidateRef) -> bool {
        candidate
            .as_path()
            .and_then(|path| std::fs::metadata(path).ok())
            .is_some_and(|meta| meta.is_file() && meta.len() > 0)
    }
}

/// Runtime resolution of the optional crop capability.
pub trait CropProvider {
    /// `None` when no crop engine is installed. Called once per process.
    fn resolve_crop_engine(&self) -> Option<Arc<dyn CropEngine>>;
}

/// Invocation of the optional crop engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub source: CandidateRef,
    /// Session-owned file the engine writes its result to.
    pub output: PathBuf,
    pub shape: CropShape,
    pub aspect_ratio: Option<AspectRatio>,
    pub max_output_size: Option<OutputSize>,
}

/// An installed crop engine.
pub trait CropEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Launch the crop UI. `Completed(None)` means the engine finished but
    /// returned nothing usable.
    fn launch(&self, session: SessionId, request: &CropRequest)
    -> Result<Dispatch<ActivityCompletion>>;
}

/// The notification service that keeps a long-running job in the
/// foreground. Consumed, never implemented, by the acquisition core.
pub trait ForegroundService: Send + Sync {
    fn start(&self, title: &str, content: &str) -> Result<()>;

    /// `progress` is a percentage in `0..=100`.
    fn update(&self, title: &str, content: &str, progress: u8) -> Result<()>;

    fn stop(&self) -> Result<()>;
}

/// Foreground service for hosts without one.
pub struct NoopForegroundService;

impl ForegroundService for NoopForegroundService {
    fn start(&self, _title: &str, _content: &str) -> Result<()> {
        Ok(())
    }

    fn update(&self, _title: &str, _content: &str, _progress: u8) -> Result<()> {
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// Transport that carries the terminal outcome to the host application.
pub trait OutcomeSink: Send + Sync {
    fn deliver(&self, session: SessionId, outcome: &Outcome) -> Result<()>;
}
