// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for terminal failures.
//
// Every failure code is mapped to plain English with a clear suggestion.
// The core never retries; `retriable` only tells the caller whether issuing
// a fresh request can help.

use crate::outcome::{FailureCode, Outcome};

/// Severity of a failure from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong with this attempt; a fresh request may work.
    Transient,
    /// User must do something (grant access, pick another photo).
    ActionRequired,
    /// Cannot be fixed by retrying: missing hardware, bad integration.
    Permanent,
}

/// A human-readable failure with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether issuing a new request is worthwhile.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a failure code (and its optional detail) into a `HumanError`.
pub fn humanize_failure(code: FailureCode, detail: Option<&str>) -> HumanError {
    match code {
        FailureCode::CameraDenied => HumanError {
            message: "Camera access was not allowed.".into(),
            suggestion: "Allow camera access for this app in your device settings, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureCode::LibraryDenied => HumanError {
            message: "Photo library access was not allowed.".into(),
            suggestion: "Allow access to your photos in your device settings, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureCode::NoCaptureFacility => HumanError {
            message: "This device has no camera app available.".into(),
            suggestion: "Choose a photo from your library instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureCode::DecodeFailed => HumanError {
            message: "We couldn't read that image.".into(),
            suggestion: "The file may be damaged or in an unsupported format. Try a different photo.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureCode::CandidateMissing => HumanError {
            message: "The photo didn't arrive.".into(),
            suggestion: "Please take or choose the photo again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureCode::InvocationFailed => HumanError {
            message: "Something went wrong while getting the photo.".into(),
            suggestion: match detail {
                Some(d) => format!("Please try again. ({d})"),
                None => "Please try again.".into(),
            },
            retriable: true,
            severity: Severity::Transient,
        },

        FailureCode::ConstraintViolation => HumanError {
            message: "That photo doesn't meet the requirements.".into(),
            suggestion: match detail {
                Some(d) => format!("Please choose a different photo. {d}"),
                None => "Please choose a different photo.".into(),
            },
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureCode::CropNoOutput => HumanError {
            message: "Cropping didn't produce an image.".into(),
            suggestion: "Try cropping again, or pick the photo without cropping.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureCode::NotInitialized => HumanError {
            message: "The photo picker isn't ready yet.".into(),
            suggestion: "This is an app problem. Please restart the app.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureCode::MalformedRequest => HumanError {
            message: "The photo request was invalid.".into(),
            suggestion: "This is an app problem. Please report it to the developer.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureCode::InternalState => HumanError {
            message: "Something unexpected happened.".into(),
            suggestion: match detail {
                Some(d) => format!("Please try again. If it keeps happening, report it. ({d})"),
                None => "Please try again. If it keeps happening, report it.".into(),
            },
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Humanize a terminal outcome. Successes and cancellations need no message.
pub fn humanize_outcome(outcome: &Outcome) -> Option<HumanError> {
    match outcome {
        Outcome::Failed { code, detail } => Some(humanize_failure(*code, detail.as_deref())),
        Outcome::Success { .. } | Outcome::Cancelled => None,
    }
}
