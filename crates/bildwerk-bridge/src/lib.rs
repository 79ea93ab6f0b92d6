// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-bridge: native collaborator abstractions.
//
// The acquisition core talks to the OS only through the traits in
// `traits`. Platform permission identifiers live in `capability`.

pub mod capability;
pub mod desktop;
pub mod stub;
pub mod traits;

pub use capability::PermissionEpoch;
pub use desktop::{CenterCropEngine, DesktopBridge};
pub use stub::StubBridge;
pub use traits::{
    CandidateReader, CapabilityLayer, CropEngine, CropProvider, CropRequest, Dispatch,
    ForegroundService, NativeCamera, NativeLibraryPicker, NoopForegroundService, OutcomeSink,
    PlatformBridge,
};
