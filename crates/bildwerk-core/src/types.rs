// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bildwerk acquisition engine.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BildwerkError, Result};
use crate::outcome::Outcome;

/// Unique identifier for one acquisition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where the image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Pre-existing item chosen from the media library.
    Library,
    /// Live capture through the OS camera facility.
    Camera,
}

impl ImageSource {
    /// The capability that must be granted before the source can be invoked.
    pub fn required_capability(&self) -> CapabilityKind {
        match self {
            Self::Library => CapabilityKind::ReadMedia,
            Self::Camera => CapabilityKind::LiveCapture,
        }
    }
}

/// A named OS capability. Mapping to platform identifiers belongs to the
/// capability layer, never to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityKind {
    LiveCapture,
    ReadMedia,
}

/// Shape of the crop overlay shown by the crop capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropShape {
    #[default]
    Rectangle,
    Circle,
}

/// Size and byte limits a candidate must satisfy. Zero means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub max_file_size: u64,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Constraints {
    /// True when every limit is unbounded.
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }
}

/// Fixed crop aspect ratio, both components strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub x: f32,
    pub y: f32,
}

/// Upper bound for the cropped output, both components strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

/// Options handed to the optional crop capability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropSettings {
    pub enabled: bool,
    pub shape: CropShape,
    pub aspect_ratio: Option<AspectRatio>,
    pub max_output_size: Option<OutputSize>,
}

/// Immutable configuration of one acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerConfig {
    pub source: ImageSource,
    pub constraints: Constraints,
    pub crop: CropSettings,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            source: ImageSource::Library,
            constraints: Constraints::default(),
            crop: CropSettings::default(),
        }
    }
}

/// Opaque handle to a candidate artifact: a filesystem path or a platform
/// URI (e.g. `content://...`) that only the bridge can open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateRef(String);

impl CandidateRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path, if the reference is one (`file://` or bare).
    pub fn as_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.0.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        if self.0.contains("://") {
            return None;
        }
        Some(PathBuf::from(&self.0))
    }
}

impl std::fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an OS activity (source or crop) finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCompletion {
    /// Affirmative completion, with the produced reference if the activity
    /// returns one (the camera writes to a pre-allocated file instead).
    Completed(Option<CandidateRef>),
    /// Explicit user cancellation.
    Cancelled,
    /// Any other abnormal completion.
    Abnormal(String),
}

/// Lifecycle states of a session. Declaration order is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Suspended on the capability decision.
    AwaitingPermission,
    /// Suspended on the camera or library activity.
    AwaitingSource,
    /// Suspended on the optional crop activity.
    AwaitingCrop,
    /// Validate, normalize and encode are running.
    Processing,
    /// The outcome has been delivered.
    Finished,
}

impl SessionState {
    /// Position in the pipeline; transitions only move to a higher rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::AwaitingPermission => 0,
            Self::AwaitingSource => 1,
            Self::AwaitingCrop => 2,
            Self::Processing => 3,
            Self::Finished => 4,
        }
    }
}

/// Externally persistable record of one in-flight acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub config: PickerConfig,
    pub state: SessionState,
    /// The currently active candidate; reassigned by capture and crop.
    pub source_reference: Option<CandidateRef>,
    /// Temporary files created by this session and owned exclusively by it.
    pub owned_temp_resources: Vec<PathBuf>,
    /// Set exactly once, when the session reaches `Finished`.
    pub outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(config: PickerConfig) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            config,
            state: SessionState::AwaitingPermission,
            source_reference: None,
            owned_temp_resources: Vec::new(),
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Move forward to `next`. Revisiting or skipping backwards is rejected.
    pub fn advance_to(&mut self, next: SessionState, event: &'static str) -> Result<()> {
        if next.rank() <= self.state.rank() {
            return Err(BildwerkError::UnexpectedState {
                session: self.id,
                state: self.state,
                event,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a temporary file as owned by this session.
    pub fn own(&mut self, path: PathBuf) {
        if !self.owned_temp_resources.contains(&path) {
            self.owned_temp_resources.push(path);
        }
    }

    /// Hand over every owned temp resource for deletion.
    pub fn take_temp_resources(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.owned_temp_resources)
    }
}
