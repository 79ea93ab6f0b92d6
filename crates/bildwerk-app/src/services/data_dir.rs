// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution for the desktop front end.

use std::path::PathBuf;

use bildwerk_core::error::Result;

const APP_DIR: &str = "bildwerk";

/// Return the application data directory, creating it if needed.
///
/// `BILDWERK_HOME` wins outright. Otherwise the XDG data dir, then
/// `~/.local/share`, then the system temp dir.
pub fn data_dir() -> Result<PathBuf> {
    let dir = resolve(|key| std::env::var(key).ok());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Return a subdirectory inside the data dir (e.g. "work").
pub fn data_subdir(name: &str) -> Result<PathBuf> {
    let dir = data_dir()?.join(name);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(home) = var("BILDWERK_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    let base = if let Some(xdg) = var("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        PathBuf::from(xdg)
    } else if let Some(home) = var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    };
    base.join(APP_DIR)
}
