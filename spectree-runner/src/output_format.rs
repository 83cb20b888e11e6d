// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use owo_colors::Style;
use serde::Serialize;
use std::io;

/// Output formats for spectree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// A human-readable output format.
    Human {
        /// Whether to produce verbose output.
        verbose: bool,
    },

    /// Machine-readable output format.
    Serializable(SerializableFormat),
}

/// A serialized, machine-readable output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SerializableFormat {
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl SerializableFormat {
    /// Write this data in the given format to the writer.
    pub fn to_writer(
        self,
        value: &impl Serialize,
        writer: impl io::Write,
    ) -> serde_json::Result<()> {
        match self {
            SerializableFormat::Json => serde_json::to_writer(writer, value),
            SerializableFormat::JsonPretty => serde_json::to_writer_pretty(writer, value),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    pub(crate) file: Style,
    pub(crate) suite: Style,
    pub(crate) test_name: Style,
    pub(crate) field: Style,
    pub(crate) tag: Style,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
    pub(crate) skip: Style,
    pub(crate) count: Style,
}

impl Styles {
    pub(crate) fn new(colorize: bool) -> Self {
        let mut styles = Self::default();
        if colorize {
            styles.colorize();
        }
        styles
    }

    pub(crate) fn colorize(&mut self) {
        self.file = Style::new().magenta().bold();
        self.suite = Style::new().cyan();
        self.test_name = Style::new().blue().bold();
        self.field = Style::new().yellow().bold();
        self.tag = Style::new().purple();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.count = Style::new().bold();
    }
}
