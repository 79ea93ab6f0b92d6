// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-level acquirer configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent acquirer settings, fixed for the life of the process.
///
/// Nothing here tunes the output encoding: the artifact is always written at
/// the fixed high-fidelity quality and compression is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquirerConfig {
    /// Root for temporary captures, crop outputs and final artifacts.
    pub work_dir: PathBuf,
    /// Session table file name inside `work_dir`.
    pub session_db: String,
    /// MIME filter handed to the library picker.
    pub library_mime_filter: String,
    /// An outstanding session older than this is abandoned when a new
    /// request arrives. Zero keeps outstanding sessions forever.
    pub stale_session_secs: u64,
    /// Drive the foreground-service notification while processing.
    pub notify_progress: bool,
    /// Notification title used for progress updates.
    pub notification_title: String,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("bildwerk"),
            session_db: "sessions.db".into(),
            library_mime_filter: "image/*".into(),
            stale_session_secs: 30 * 60,
            notify_progress: true,
            notification_title: "Preparing image".into(),
        }
    }
}

impl AcquirerConfig {
    pub fn session_db_path(&self) -> PathBuf {
        self.work_dir.join(&self.session_db)
    }
}
