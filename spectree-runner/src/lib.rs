// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for spectree: discovering suites and tests in source files, and matching
//! execution results back onto them.
//!
//! The basic flow is:
//!
//! 1. A [`Scanner`](scanner::Scanner) turns source text into a [`TestTree`](tree::TestTree),
//!    creating tags through a shared [`TagRegistry`](tags::TagRegistry).
//! 2. Trees are kept in a [`TreeStore`](tree::TreeStore), which replaces a file's whole subtree
//!    on every rescan.
//! 3. After the test process runs, [`reconcile`](reconcile::reconcile) assigns outcomes to the
//!    tree's tests from the reported records.

pub mod batcher;
pub mod config;
pub mod errors;
mod helpers;
mod output_format;
pub mod reconcile;
pub mod scanner;
pub mod tags;
pub mod tree;

pub use output_format::{OutputFormat, SerializableFormat};
