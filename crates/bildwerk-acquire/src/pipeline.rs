// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The processing stages of a session, in order: read the candidate,
// probe its bounds, validate them, decode and orient, encode and write.
// Blocking; the acquirer runs it on the blocking pool.

use std::path::Path;

use bildwerk_bridge::CandidateReader;
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{CandidateRef, Constraints};
use bildwerk_image::{normalize, probe_bounds, validate};
use tracing::{info, instrument};

use crate::dispatch;
use crate::progress::Progress;

#[instrument(skip(reader, constraints, progress), fields(candidate = %candidate))]
pub fn process<R: CandidateReader + ?Sized>(
    reader: &R,
    candidate: &CandidateRef,
    constraints: &Constraints,
    output: &Path,
    progress: &Progress,
) -> Outcome {
    let data = match reader.read_candidate(candidate) {
        Ok(data) => data,
        Err(e) => {
            return Outcome::failed_with(
                FailureCode::CandidateMissing,
                format!("cannot read {candidate}: {e}"),
            );
        }
    };

    let bounds = match probe_bounds(&data) {
        Ok(bounds) => bounds,
        Err(e) => return Outcome::failed_with(FailureCode::DecodeFailed, e.to_string()),
    };
    if let Err(violation) = validate(&bounds, constraints) {
        info!(%violation, "candidate rejected");
        return Outcome::failed_with(FailureCode::ConstraintViolation, violation.to_string());
    }
    progress.update("Validated", 25);

    let normalized = match normalize(&data) {
        Ok(normalized) => normalized,
        Err(e) => return Outcome::failed_with(FailureCode::DecodeFailed, e.to_string()),
    };
    drop(data);
    progress.update("Oriented", 50);

    let outcome = dispatch::finalize(normalized.image, output);
    progress.update("Written", 90);
    outcome
}
