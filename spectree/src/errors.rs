// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::NO_HEADING_TARGET;
use camino::Utf8PathBuf;
use owo_colors::{OwoColorize, Style};
use spectree_metadata::SpectreeExitCode;
use spectree_runner::errors::{ConfigError, WriteJunitError, WriteOutputError};
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// An expected failure in spectree itself, with a documented exit code.
///
/// These are displayed through [`display_to_stderr`](Self::display_to_stderr) rather than as
/// generic error reports.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigError,
    },
    #[error("failed to read results payload")]
    ResultsReadFailed {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read from stdin")]
    StdinReadFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("failed to create async runtime")]
    RuntimeCreateFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("failed to set up Ctrl-C handler")]
    SignalHandlerSetupError {
        #[source]
        err: std::io::Error,
    },
    #[error("error writing JUnit report")]
    WriteJunitError {
        #[from]
        err: WriteJunitError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[from]
        err: WriteOutputError,
    },
    #[error("test run failed")]
    TestsFailed { failed: usize },
    #[error("no tests found")]
    NoTestsFound,
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::RuntimeCreateFailed { .. }
            | Self::SignalHandlerSetupError { .. }
            | Self::StdinReadFailed { .. } => SpectreeExitCode::SETUP_ERROR,
            Self::ResultsReadFailed { .. } => SpectreeExitCode::RESULTS_READ_FAILED,
            Self::WriteJunitError { .. } => SpectreeExitCode::JUNIT_WRITE_FAILED,
            Self::WriteOutputError { .. } => SpectreeExitCode::WRITE_OUTPUT_ERROR,
            Self::TestsFailed { .. } => SpectreeExitCode::TESTS_FAILED,
            Self::NoTestsFound => SpectreeExitCode::NO_TESTS_FOUND,
        }
    }

    /// Displays this error to stderr, followed by the chain of errors that caused it.
    pub fn display_to_stderr(&self, emphasis: Style) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!("failed to load config");
                Some(err as &dyn Error)
            }
            Self::ResultsReadFailed { path, err } => {
                error!(
                    "failed to read results payload at `{}`",
                    path.style(emphasis)
                );
                Some(err as &dyn Error)
            }
            Self::StdinReadFailed { err } => {
                error!("failed to read changed paths from stdin");
                Some(err as &dyn Error)
            }
            Self::RuntimeCreateFailed { err } => {
                error!("failed to create async runtime");
                Some(err as &dyn Error)
            }
            Self::SignalHandlerSetupError { err } => {
                error!("failed to set up Ctrl-C handler");
                Some(err as &dyn Error)
            }
            Self::WriteJunitError { err } => {
                error!("failed to write JUnit report");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
            Self::TestsFailed { failed } => {
                error!(
                    "{} {} failed",
                    failed.style(emphasis),
                    if *failed == 1 { "test" } else { "tests" }
                );
                None
            }
            Self::NoTestsFound => {
                error!("no tests found in the given files");
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
