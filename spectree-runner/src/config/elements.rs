// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Deserialize;
use std::time::Duration;

/// Settings for the source scanner.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscoveryConfig {
    /// Function names that declare suites, e.g. `describe`.
    pub suite_functions: Vec<String>,

    /// Function names that declare tests, e.g. `it`.
    pub test_functions: Vec<String>,

    /// The number of columns a tab counts for when measuring indentation.
    pub tab_width: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            suite_functions: vec!["describe".to_owned(), "context".to_owned(), "suite".to_owned()],
            test_functions: vec!["it".to_owned(), "test".to_owned(), "specify".to_owned()],
            tab_width: 1,
        }
    }
}

/// Settings for batching change notifications in `spectree watch`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WatchConfig {
    /// How long notifications must stop arriving before a batch is dispatched.
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
        }
    }
}

/// Settings for JUnit output.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct JunitConfig {
    /// The name of the JUnit report.
    pub report_name: String,
}

impl Default for JunitConfig {
    fn default() -> Self {
        Self {
            report_name: "spectree-run".to_owned(),
        }
    }
}
