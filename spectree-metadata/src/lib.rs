// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to spectree's machine-readable output.
//!
//! `spectree list --message-format json` produces a list of [`TreeSummary`] values, and
//! `spectree reconcile --message-format json` produces a list of [`ReconcileSummary`] values.
//! Exit codes are documented in [`SpectreeExitCode`].

mod exit_codes;
mod tree_summary;

pub use exit_codes::*;
pub use tree_summary::*;
