// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk: core types, failure taxonomy and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod outcome;
pub mod request;
pub mod types;

pub use config::AcquirerConfig;
pub use error::BildwerkError;
pub use outcome::{FailureCode, Outcome, OutcomeChannel};
pub use request::PickerRequest;
pub use types::*;
