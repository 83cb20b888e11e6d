// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `spectree` failures.
///
/// `spectree` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum SpectreeExitCode {}

impl SpectreeExitCode {
    /// No errors occurred and spectree exited normally.
    pub const OK: i32 = 0;

    /// Reconciliation assigned a failed outcome to one or more tests.
    pub const TESTS_FAILED: i32 = 100;

    /// None of the scanned files declared any tests.
    pub const NO_TESTS_FOUND: i32 = 4;

    /// A user issue happened while setting up a spectree invocation, for example an invalid
    /// config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The results payload could not be read.
    pub const RESULTS_READ_FAILED: i32 = 104;

    /// Writing a JUnit report produced an error.
    pub const JUNIT_WRITE_FAILED: i32 = 105;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
