// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal outcomes, the numeric failure taxonomy, and the pipe-delimited
// wire payloads existing callers parse.

use serde::{Deserialize, Serialize};

/// Numeric failure codes. The values are part of the caller contract and
/// must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum FailureCode {
    CameraDenied,
    LibraryDenied,
    NoCaptureFacility,
    DecodeFailed,
    CandidateMissing,
    InvocationFailed,
    ConstraintViolation,
    CropNoOutput,
    NotInitialized,
    MalformedRequest,
    InternalState,
}

impl FailureCode {
    pub const ALL: [FailureCode; 11] = [
        Self::CameraDenied,
        Self::LibraryDenied,
        Self::NoCaptureFacility,
        Self::DecodeFailed,
        Self::CandidateMissing,
        Self::InvocationFailed,
        Self::ConstraintViolation,
        Self::CropNoOutput,
        Self::NotInitialized,
        Self::MalformedRequest,
        Self::InternalState,
    ];

    pub fn as_u16(&self) -> u16 {
        match self {
            Self::CameraDenied => 10,
            Self::LibraryDenied => 11,
            Self::NoCaptureFacility => 20,
            Self::DecodeFailed => 30,
            Self::CandidateMissing => 31,
            Self::InvocationFailed => 33,
            Self::ConstraintViolation => 40,
            Self::CropNoOutput => 50,
            Self::NotInitialized => 90,
            Self::MalformedRequest => 91,
            Self::InternalState => 99,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_u16() == code)
    }
}

impl From<FailureCode> for u16 {
    fn from(code: FailureCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for FailureCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_u16(code).ok_or_else(|| format!("unknown failure code {code}"))
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// The single terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Outcome {
    Success {
        path: String,
        width: u32,
        height: u32,
        byte_size: u64,
    },
    Failed {
        code: FailureCode,
        detail: Option<String>,
    },
    Cancelled,
}

/// Host callback an outcome is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeChannel {
    Success,
    Failed,
    Cancelled,
}

impl OutcomeChannel {
    /// Callback method name on the host side.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Success => "OnImagePickerSuccess",
            Self::Failed => "OnImagePickerFailed",
            Self::Cancelled => "OnImagePickerCancelled",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "OnImagePickerSuccess" => Some(Self::Success),
            "OnImagePickerFailed" => Some(Self::Failed),
            "OnImagePickerCancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl Outcome {
    pub fn failed(code: FailureCode) -> Self {
        Self::Failed { code, detail: None }
    }

    pub fn failed_with(code: FailureCode, detail: impl Into<String>) -> Self {
        Self::Failed {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn channel(&self) -> OutcomeChannel {
        match self {
            Self::Success { .. } => OutcomeChannel::Success,
            Self::Failed { .. } => OutcomeChannel::Failed,
            Self::Cancelled => OutcomeChannel::Cancelled,
        }
    }

    /// `path|width|height|byteSize`, `code`, `code|detail`, or empty.
    pub fn payload(&self) -> String {
        match self {
            Self::Success {
                path,
                width,
                height,
                byte_size,
            } => format!("{path}|{width}|{height}|{byte_size}"),
            Self::Failed { code, detail: None } => code.to_string(),
            Self::Failed {
                code,
                detail: Some(detail),
            } => format!("{code}|{detail}"),
            Self::Cancelled => String::new(),
        }
    }

    /// Host-side inverse of [`Outcome::payload`].
    pub fn parse(channel: OutcomeChannel, payload: &str) -> Self {
        match channel {
            OutcomeChannel::Cancelled => Self::Cancelled,
            OutcomeChannel::Success => parse_success(payload),
            OutcomeChannel::Failed => parse_failure(payload),
        }
    }
}

fn parse_success(payload: &str) -> Outcome {
    // The path itself may contain '|', so split the numeric fields off the end.
    let mut fields = payload.rsplitn(4, '|');
    let byte_size = fields.next().and_then(|s| s.parse::<u64>().ok());
    let height = fields.next().and_then(|s| s.parse::<u32>().ok());
    let width = fields.next().and_then(|s| s.parse::<u32>().ok());
    let path = fields.next();

    match (path, width, height, byte_size) {
        (Some(path), Some(width), Some(height), Some(byte_size)) => Outcome::Success {
            path: path.to_string(),
            width,
            height,
            byte_size,
        },
        _ => Outcome::failed_with(FailureCode::InternalState, "invalid response format"),
    }
}

fn parse_failure(payload: &str) -> Outcome {
    if payload.is_empty() {
        return Outcome::failed(FailureCode::InternalState);
    }

    let (head, detail) = match payload.split_once('|') {
        Some((head, detail)) => (head, Some(detail.to_string())),
        None => (payload, None),
    };

    match head.parse::<u16>().ok().and_then(FailureCode::from_u16) {
        Some(code) => Outcome::Failed { code, detail },
        None => Outcome::failed_with(FailureCode::InternalState, payload),
    }
}
