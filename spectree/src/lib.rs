// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `spectree` command-line interface.
//!
//! This crate is not meant to be used as a library. For the underlying functionality, see
//! [`spectree-runner`](https://docs.rs/spectree-runner), and for parsing machine-readable output,
//! see [`spectree-metadata`](https://docs.rs/spectree-metadata).

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

pub use dispatch::*;
pub use errors::*;
pub use output::{Color, LOG_ENV, OutputContext, OutputWriter};
