// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outcome sinks for in-process hosts.

use bildwerk_bridge::OutcomeSink;
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::outcome::Outcome;
use bildwerk_core::types::SessionId;
use tokio::sync::mpsc;
use tracing::info;

/// Forwards outcomes over an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(SessionId, Outcome)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SessionId, Outcome)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn deliver(&self, session: SessionId, outcome: &Outcome) -> Result<()> {
        self.tx
            .send((session, outcome.clone()))
            .map_err(|_| BildwerkError::Bridge("outcome receiver dropped".into()))
    }
}

/// Logs the host callback each outcome would be delivered through.
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn deliver(&self, session: SessionId, outcome: &Outcome) -> Result<()> {
        info!(
            session_id = %session,
            method = outcome.channel().method_name(),
            payload = %outcome.payload(),
            "outcome"
        );
        Ok(())
    }
}
