// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-acquire: permission-gated image acquisition.
//
// Pipeline per session: permission gate, capture source, optional crop,
// constraint validation, orientation normalization, result dispatch.
// Sessions live in a SQLite table so they survive process eviction while
// the OS owns the screen.

pub mod capture;
pub mod crop;
pub mod dispatch;
pub mod engine;
pub mod permission;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod store;

#[cfg(test)]
mod scenarios;

pub use crop::{CropCapability, OptionalCropAdapter};
pub use dispatch::ResultDispatcher;
pub use engine::Acquirer;
pub use sink::{ChannelSink, TracingSink};
pub use store::SessionStore;
