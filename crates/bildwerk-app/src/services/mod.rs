// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: wires the desktop bridge, the acquirer and persisted
// settings together for the command line.

pub mod app_services;
pub mod data_dir;
