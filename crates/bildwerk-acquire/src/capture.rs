// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture source controller: launch the camera or the library picker and
// interpret how the activity finished.
//
// The camera writes into a file this session pre-allocates and owns; the
// library hands back a reference into storage the session must not touch.

use std::fs::File;
use std::path::Path;

use bildwerk_bridge::{Dispatch, PlatformBridge};
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{ActivityCompletion, CandidateRef, ImageSource, Session};
use tracing::{info, warn};

/// What the source step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Candidate(CandidateRef),
    Cancelled,
    Failed(Outcome),
}

/// Start the configured source. `Err` carries the terminal outcome.
pub fn launch(
    bridge: &dyn PlatformBridge,
    session: &mut Session,
    work_dir: &Path,
    mime_filter: &str,
) -> Result<Dispatch<ActivityCompletion>, Outcome> {
    match session.config.source {
        ImageSource::Camera => {
            if !bridge.has_capture_facility() {
                warn!(session_id = %session.id, "no capture facility registered");
                return Err(Outcome::failed(FailureCode::NoCaptureFacility));
            }

            let output = work_dir.join(format!("capture_{}.jpg", session.id));
            File::create(&output).map_err(|e| {
                Outcome::failed_with(
                    FailureCode::InvocationFailed,
                    format!("cannot allocate capture file: {e}"),
                )
            })?;
            session.own(output.clone());
            session.source_reference = Some(CandidateRef::from_path(&output));

            info!(session_id = %session.id, output = %output.display(), "launching camera");
            bridge
                .launch_capture(session.id, &output)
                .map_err(|e| Outcome::failed_with(FailureCode::InvocationFailed, e.to_string()))
        }
        ImageSource::Library => {
            info!(session_id = %session.id, mime_filter, "launching library picker");
            bridge
                .launch_picker(session.id, mime_filter)
                .map_err(|e| Outcome::failed_with(FailureCode::InvocationFailed, e.to_string()))
        }
    }
}

/// Interpret the source activity's completion.
pub fn resolve(
    bridge: &dyn PlatformBridge,
    session: &Session,
    completion: ActivityCompletion,
) -> SourceResult {
    match completion {
        ActivityCompletion::Cancelled => SourceResult::Cancelled,
        ActivityCompletion::Abnormal(detail) => {
            SourceResult::Failed(Outcome::failed_with(FailureCode::InvocationFailed, detail))
        }
        ActivityCompletion::Completed(reference) => match session.config.source {
            // The pre-allocated file is the output; a returned reference is ignored.
            ImageSource::Camera => match &session.source_reference {
                Some(output) if bridge.candidate_exists(output) => {
                    SourceResult::Candidate(output.clone())
                }
                _ => SourceResult::Failed(Outcome::failed_with(
                    FailureCode::CandidateMissing,
                    "camera produced no image",
                )),
            },
            ImageSource::Library => match reference {
                Some(reference) => SourceResult::Candidate(reference),
                None => SourceResult::Failed(Outcome::failed_with(
                    FailureCode::CandidateMissing,
                    "picker returned no item",
                )),
            },
        },
    }
}
