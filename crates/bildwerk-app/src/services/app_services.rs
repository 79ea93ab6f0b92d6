// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns the acquirer and the receiving end of its
// outcome channel, and persists acquirer settings as `config.json` in the
// data directory.

use std::path::Path;
use std::sync::Arc;

use bildwerk_acquire::{Acquirer, ChannelSink};
use bildwerk_bridge::{NoopForegroundService, PlatformBridge};
use bildwerk_core::error::Result;
use bildwerk_core::outcome::Outcome;
use bildwerk_core::types::{Session, SessionId};
use bildwerk_core::AcquirerConfig;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";

/// An outcome some session received.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub session: SessionId,
    pub outcome: Outcome,
}

pub struct AppServices {
    acquirer: Acquirer,
    outcomes: UnboundedReceiver<(SessionId, Outcome)>,
}

impl AppServices {
    /// Build and initialise the acquirer over `bridge`.
    pub async fn init(config: AcquirerConfig, bridge: Arc<dyn PlatformBridge>) -> Result<Self> {
        info!(platform = bridge.platform_name(), work_dir = %config.work_dir.display(), "initialising app services");

        let (sink, outcomes) = ChannelSink::new();
        let acquirer = Acquirer::new(bridge, Arc::new(sink), Arc::new(NoopForegroundService), config);
        acquirer.init().await?;

        let mut services = Self { acquirer, outcomes };
        for resumed in services.drain() {
            info!(session_id = %resumed.session, payload = %resumed.outcome.payload(), "interrupted session completed");
        }
        Ok(services)
    }

    /// Run one request. Returns the outcome it produced, or `None` while the
    /// session is still waiting on the platform.
    ///
    /// Requests that fail before a session exists (not initialised,
    /// malformed) still report the outcome delivered for them.
    pub async fn pick(&mut self, request_json: &str) -> Result<Option<Delivered>> {
        let started = self.acquirer.pick_image(request_json).await;
        let mut delivered = self.drain();

        // The request's own outcome is always delivered last; anything before
        // it belongs to a stale session abandoned to make room.
        let own = delivered.pop();
        for earlier in delivered {
            warn!(session_id = %earlier.session, payload = %earlier.outcome.payload(), "earlier session ended");
        }

        match (started, own) {
            (Ok(id), Some(own)) if own.session == id => Ok(Some(own)),
            (Ok(id), other) => {
                if let Some(other) = other {
                    warn!(session_id = %other.session, "outcome for another session");
                }
                info!(session_id = %id, "session waiting on the platform");
                Ok(None)
            }
            (Err(_), Some(own)) => Ok(Some(own)),
            (Err(e), None) => Err(e),
        }
    }

    pub fn session(&self, id: SessionId) -> Result<Option<Session>> {
        self.acquirer.session(id)
    }

    pub fn abandon(&mut self, id: SessionId) -> Result<Option<Delivered>> {
        self.acquirer.abandon(id)?;
        Ok(self.drain().pop())
    }

    fn drain(&mut self) -> Vec<Delivered> {
        let mut delivered = Vec::new();
        while let Ok((session, outcome)) = self.outcomes.try_recv() {
            delivered.push(Delivered { session, outcome });
        }
        delivered
    }
}

// ---------------------------------------------------------------------------
// Config persistence
// ---------------------------------------------------------------------------

pub fn load_config(data_dir: &Path) -> Option<AcquirerConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn persist_config(data_dir: &Path, config: &AcquirerConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "config saved");
    Ok(())
}
