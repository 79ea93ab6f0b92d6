// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting through the host's foreground service.

use std::sync::Arc;

use bildwerk_bridge::ForegroundService;
use bildwerk_core::AcquirerConfig;
use tracing::warn;

/// Forwards processing milestones to the foreground service when enabled.
///
/// Service errors are logged and never affect the session.
#[derive(Clone)]
pub struct Progress {
    service: Option<Arc<dyn ForegroundService>>,
    title: String,
}

impl Progress {
    pub fn new(service: Arc<dyn ForegroundService>, config: &AcquirerConfig) -> Self {
        Self {
            service: config.notify_progress.then_some(service),
            title: config.notification_title.clone(),
        }
    }

    pub fn start(&self, content: &str) {
        if let Some(service) = &self.service {
            if let Err(e) = service.start(&self.title, content) {
                warn!(error = %e, "foreground service start failed");
            }
        }
    }

    pub fn update(&self, content: &str, percent: u8) {
        if let Some(service) = &self.service {
            if let Err(e) = service.update(&self.title, content, percent.min(100)) {
                warn!(error = %e, percent, "foreground service update failed");
            }
        }
    }

    pub fn stop(&self) {
        if let Some(service) = &self.service {
            if let Err(e) = service.stop() {
                warn!(error = %e, "foreground service stop failed");
            }
        }
    }
}
