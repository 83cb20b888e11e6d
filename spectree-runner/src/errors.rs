// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by spectree.

use camino::Utf8PathBuf;
use std::{error::Error, fmt, io};
use thiserror::Error;

/// An error that occurred while loading the spectree config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file at `{path}`")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The config file is not valid TOML, or doesn't match the expected schema.
    #[error("failed to parse config file at `{path}`")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },

    /// The config file parsed, but a value in it is invalid.
    #[error("in config file at `{path}`, {message}")]
    Invalid {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// A description of the problem.
        message: String,
    },
}

/// An error that occurred while reading a source file for scanning.
///
/// The scanner never returns this error to callers: it is logged and the file is treated as
/// declaring no tests.
#[derive(Debug, Error)]
#[error("failed to read source file `{path}`")]
pub struct ScanError {
    path: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl ScanError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while parsing the results payload produced by the test process.
#[derive(Debug, Error)]
#[error("failed to parse results payload")]
pub struct PayloadParseError {
    #[source]
    error: serde_json::Error,
}

impl PayloadParseError {
    pub(crate) fn new(error: serde_json::Error) -> Self {
        Self { error }
    }
}

/// An error that occurred while writing a JUnit report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteJunitError {
    /// An error occurred while creating the report file or its parent directory.
    #[error("error writing JUnit output to `{file}`")]
    Fs {
        /// The file being written.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// An error occurred while serializing the report.
    #[error("error serializing JUnit output to `{file}`")]
    Serialize {
        /// The file being written.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },
}

/// An error that occurred while writing a list or results to the output.
#[derive(Debug, Error)]
pub enum WriteOutputError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[source] io::Error),

    /// An error occurred while serializing JSON, or while writing it to the provided output.
    #[error("error serializing to JSON")]
    Json(#[source] serde_json::Error),
}

/// Displays an error along with the chain of errors that caused it, on a single line.
///
/// Used for log messages, where multi-line output would be hard to read.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut next = self.0.source();
        while let Some(error) = next {
            write!(f, ": {error}")?;
            next = error.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error_chain() {
        let error = ScanError::new(
            "/src/missing.test.js",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            DisplayErrorChain::new(&error).to_string(),
            "failed to read source file `/src/missing.test.js`: no such file"
        );
    }
}
