// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for spectree.
//!
//! Configuration is read from an optional TOML file, `.config/spectree.toml` by default. Every
//! setting has a built-in default, and unknown keys produce warnings rather than errors.

mod elements;
mod imp;

pub use elements::*;
pub use imp::*;
