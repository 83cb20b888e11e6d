// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for spectree-runner.

use std::time::Duration;

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "file" if `count` is 1, otherwise "files".
    pub fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}

/// Formats a duration the way results are shown to users: seconds with three decimal places.
pub(crate) fn format_duration(duration: Duration) -> String {
    format!("{:.3}s", duration.as_secs_f64())
}

/// Converts a 0-based line or column to the 1-based form used in human output.
pub(crate) fn one_based(n: u32) -> u64 {
    u64::from(n) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Duration::ZERO, "0.000s" ; "zero")]
    #[test_case(Duration::from_millis(1), "0.001s" ; "one millisecond")]
    #[test_case(Duration::from_micros(1_234_567), "1.235s" ; "rounded")]
    fn format_duration_cases(duration: Duration, expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[test]
    fn plurals() {
        assert_eq!(plural::tests_str(0), "tests");
        assert_eq!(plural::tests_str(1), "test");
        assert_eq!(plural::files_str(2), "files");
    }
}
