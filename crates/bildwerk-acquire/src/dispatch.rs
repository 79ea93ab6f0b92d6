// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result dispatcher: writes the final artifact and delivers the one
// terminal outcome of a session.
//
// Terminating a session persists the outcome, releases every temp
// resource it owns, and only then hands the outcome to the sink. The
// terminal write is conditional on the stored row, so of two callers
// finishing one session only the first delivers.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bildwerk_bridge::OutcomeSink;
use bildwerk_core::error::Result;
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{Session, SessionId, SessionState};
use bildwerk_image::ImageProcessor;
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::store::SessionStore;

/// Encode `image` at the fixed output quality to `output` and describe it.
#[instrument(skip(image), fields(output = %output.display()))]
pub fn finalize(image: DynamicImage, output: &Path) -> Outcome {
    let processor = ImageProcessor::from_dynamic(image);
    let (width, height) = (processor.width(), processor.height());

    match processor.save_jpeg(output) {
        Ok(byte_size) => Outcome::Success {
            path: output.to_string_lossy().into_owned(),
            width,
            height,
            byte_size,
        },
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(output) {
                if rm.kind() != ErrorKind::NotFound {
                    warn!(error = %rm, "partial artifact left behind");
                }
            }
            Outcome::failed_with(
                FailureCode::InvocationFailed,
                format!("cannot write artifact: {e}"),
            )
        }
    }
}

pub struct ResultDispatcher {
    sink: Arc<dyn OutcomeSink>,
}

impl ResultDispatcher {
    pub fn new(sink: Arc<dyn OutcomeSink>) -> Self {
        Self { sink }
    }

    /// Deliver an outcome that belongs to no stored session (requests
    /// rejected before a session existed).
    pub fn deliver(&self, id: SessionId, outcome: &Outcome) -> Result<()> {
        info!(session_id = %id, channel = outcome.channel().method_name(), "outcome delivered");
        self.sink.deliver(id, outcome)
    }

    pub fn fail(
        &self,
        store: &SessionStore,
        session: &mut Session,
        code: FailureCode,
        detail: Option<String>,
    ) -> Result<bool> {
        self.complete(store, session, Outcome::Failed { code, detail })
    }

    pub fn cancel(&self, store: &SessionStore, session: &mut Session) -> Result<bool> {
        self.complete(store, session, Outcome::Cancelled)
    }

    /// End `session` with `outcome`. Returns `false` if the session was
    /// already terminal, in this copy or in the store, and nothing was
    /// delivered.
    ///
    /// If the terminal write fails the owned temp resources stay on disk
    /// and listed in the stored row.
    #[instrument(skip(self, store, session, outcome), fields(session_id = %session.id, state = ?session.state))]
    pub fn complete(
        &self,
        store: &SessionStore,
        session: &mut Session,
        outcome: Outcome,
    ) -> Result<bool> {
        if session.is_terminal() {
            warn!(payload = %outcome.payload(), "session already finished, outcome dropped");
            return Ok(false);
        }

        let resources = session.take_temp_resources();
        session.outcome = Some(outcome.clone());
        session.advance_to(SessionState::Finished, "terminal outcome")?;
        let won = match store.save(session) {
            Ok(won) => won,
            Err(e) => {
                session.owned_temp_resources = resources;
                return Err(e);
            }
        };

        release(resources);
        if !won {
            warn!(payload = %outcome.payload(), "session finished elsewhere, outcome dropped");
            discard_artifact(&outcome);
            return Ok(false);
        }
        self.deliver(session.id, &outcome)?;
        Ok(true)
    }
}

/// Remove the artifact of a success that lost the race to finish.
fn discard_artifact(outcome: &Outcome) {
    if let Outcome::Success { path, .. } = outcome {
        release(vec![PathBuf::from(path)]);
    }
}

pub(crate) fn release(resources: Vec<PathBuf>) {
    for path in resources {
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "temp resource released"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to release temp resource"),
        }
    }
}
