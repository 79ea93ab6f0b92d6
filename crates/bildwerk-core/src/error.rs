// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use thiserror::Error;

use crate::outcome::FailureCode;
use crate::types::{SessionId, SessionState};

/// Top-level error type for all Bildwerk operations.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Request / lifecycle --
    #[error("malformed request configuration: {0}")]
    MalformedRequest(String),

    #[error("acquirer not initialized")]
    NotInitialized,

    #[error("session {0} is still outstanding")]
    SessionBusy(SessionId),

    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    #[error("session {session} cannot accept {event} while {state:?}")]
    UnexpectedState {
        session: SessionId,
        state: SessionState,
        event: &'static str,
    },

    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl BildwerkError {
    /// The wire code a requester sees when this error ends a session.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            Self::MalformedRequest(_) => FailureCode::MalformedRequest,
            Self::NotInitialized => FailureCode::NotInitialized,
            Self::ImageError(_) => FailureCode::DecodeFailed,
            Self::Bridge(_) | Self::PlatformUnavailable | Self::Io(_) => {
                FailureCode::InvocationFailed
            }
            Self::SessionBusy(_)
            | Self::UnknownSession(_)
            | Self::UnexpectedState { .. }
            | Self::Database(_)
            | Self::Serialization(_) => FailureCode::InternalState,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
