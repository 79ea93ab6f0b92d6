// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission gate: is the capability for the configured source granted,
// and if not, ask.

use bildwerk_bridge::{Dispatch, PlatformBridge};
use bildwerk_core::error::Result;
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{ImageSource, Session};
use tracing::{debug, info};

/// Resolve the capability decision for `session`.
///
/// `Ready(true)` without prompting when the grant already exists.
pub fn ensure(bridge: &dyn PlatformBridge, session: &Session) -> Result<Dispatch<bool>> {
    let kind = session.config.source.required_capability();
    if bridge.is_granted(kind)? {
        debug!(session_id = %session.id, ?kind, "capability already granted");
        return Ok(Dispatch::Ready(true));
    }
    info!(session_id = %session.id, ?kind, "requesting capability");
    bridge.request(session.id, kind)
}

/// Terminal outcome for a denied capability.
pub fn denied(source: ImageSource) -> Outcome {
    match source {
        ImageSource::Camera => Outcome::failed(FailureCode::CameraDenied),
        ImageSource::Library => Outcome::failed(FailureCode::LibraryDenied),
    }
}
