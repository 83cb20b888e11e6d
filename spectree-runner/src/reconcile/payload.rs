// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::PayloadParseError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::{collections::HashSet, time::Duration};

/// A single test result reported by the test process.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// The labels of the test's enclosing suites and the test itself, joined by spaces.
    pub full_title: String,

    /// Whether the test was pending and not run.
    #[serde(default)]
    pub pending: bool,

    /// The time the test took, in milliseconds.
    #[serde(default)]
    pub duration: Option<f64>,

    /// The error the test failed with. Passing tests usually carry no error or an empty one.
    #[serde(default)]
    pub err: Option<ErrorPayload>,
}

impl ExecutionRecord {
    /// Returns the reported duration, if it is present and representable.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
    }

    /// Returns the error payload if it is present and not empty.
    pub fn error(&self) -> Option<&ErrorPayload> {
        self.err.as_ref().filter(|err| !err.is_empty())
    }
}

/// The error attached to a failed record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ErrorPayload {
    /// The error message.
    #[serde(default)]
    pub message: Option<String>,

    /// The raw stack trace.
    #[serde(default)]
    pub stack: Option<String>,

    /// The expected value of a failed assertion. `None` if absent, as opposed to `null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub expected: Option<Value>,

    /// The actual value of a failed assertion. `None` if absent, as opposed to `null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub actual: Option<Value>,
}

impl ErrorPayload {
    /// Returns true if the payload carries nothing at all, e.g. `"err": {}`.
    pub fn is_empty(&self) -> bool {
        self.message.as_deref().is_none_or(str::is_empty)
            && self.stack.as_deref().is_none_or(str::is_empty)
            && self.expected.is_none()
            && self.actual.is_none()
    }
}

// A present `null` is a value, unlike a missing field.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Records(Vec<ExecutionRecord>),
    Report(ReportPayload),
}

/// The shape written by mocha's JSON reporter.
#[derive(Deserialize)]
struct ReportPayload {
    tests: Vec<ExecutionRecord>,
    // Pending tests aren't flagged within `tests`, only listed here.
    #[serde(default)]
    pending: Vec<PendingRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingRecord {
    full_title: String,
}

/// Parses a results payload: either a bare array of records, or a report object with a `tests`
/// array.
pub fn parse_payload(raw: &str) -> Result<Vec<ExecutionRecord>, PayloadParseError> {
    let payload: RawPayload = serde_json::from_str(raw).map_err(PayloadParseError::new)?;
    let records = match payload {
        RawPayload::Records(records) => records,
        RawPayload::Report(report) => {
            let pending: HashSet<_> = report
                .pending
                .into_iter()
                .map(|record| record.full_title)
                .collect();
            report
                .tests
                .into_iter()
                .map(|mut record| {
                    record.pending |= pending.contains(&record.full_title);
                    record
                })
                .collect()
        }
    };
    Ok(records)
}
