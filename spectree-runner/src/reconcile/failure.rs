// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ErrorPayload;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde_json::Value;
use spectree_metadata::{DiffSummary, FrameSummary};
use std::sync::LazyLock;
use tracing::debug;

/// A single frame parsed from a stack trace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackFrame {
    /// The function or method label, if present.
    pub label: Option<String>,

    /// The file, resolved to an absolute path where possible.
    pub file: Utf8PathBuf,

    /// The 0-based line.
    pub line: u32,

    /// The 0-based column.
    pub column: u32,
}

impl StackFrame {
    pub(crate) fn to_summary(&self) -> FrameSummary {
        FrameSummary {
            label: self.label.clone(),
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }
}

/// Rendered expected and actual values of a failed assertion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueDiff {
    /// The rendered expected value.
    pub expected: String,

    /// The rendered actual value.
    pub actual: String,
}

/// Everything known about why a test failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureDetail {
    /// The failure message.
    pub message: String,

    /// Parsed stack frames, innermost first.
    pub frames: Vec<StackFrame>,

    /// Present if the error carried both an expected and an actual value.
    pub diff: Option<ValueDiff>,
}

impl FailureDetail {
    /// Builds failure detail from an error payload. Relative paths in the stack are resolved
    /// against the directory containing `source_file`.
    pub fn new(err: &ErrorPayload, source_file: &Utf8Path) -> Self {
        let stack = err.stack.as_deref().unwrap_or_default();
        let message = match err.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_owned(),
            // Node stacks start with "ErrorName: message".
            _ => stack
                .lines()
                .next()
                .filter(|line| !line.trim_start().starts_with("at "))
                .unwrap_or("test failed")
                .to_owned(),
        };
        let diff = match (&err.expected, &err.actual) {
            (Some(expected), Some(actual)) => Some(ValueDiff {
                expected: render_value(Some(expected)),
                actual: render_value(Some(actual)),
            }),
            _ => None,
        };

        Self {
            message,
            frames: parse_stack(stack, source_file),
            diff,
        }
    }

    /// Returns the first frame located in `file`.
    pub fn first_frame_in(&self, file: &Utf8Path) -> Option<&StackFrame> {
        self.frames.iter().find(|frame| frame.file == file)
    }

    pub(crate) fn diff_summary(&self) -> Option<DiffSummary> {
        self.diff.as_ref().map(|diff| DiffSummary {
            expected: diff.expected.clone(),
            actual: diff.actual.clone(),
        })
    }
}

static FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:(?P<label>.+?)\s+\()?(?P<file>.+?):(?P<line>\d+):(?P<column>\d+)\)?\s*$")
        .expect("frame regex is valid")
});

static SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]+:").expect("scheme regex is valid"));

/// Parses stack frames out of a raw stack string, keeping them in order.
///
/// Lines that don't look like frames are ignored. Frames whose location can't be resolved to a
/// file are dropped.
pub fn parse_stack(stack: &str, source_file: &Utf8Path) -> Vec<StackFrame> {
    let base_dir = source_file.parent().unwrap_or(Utf8Path::new(""));
    stack
        .lines()
        .filter_map(|line| {
            let captures = FRAME_REGEX.captures(line)?;
            let frame = resolve_frame(
                captures.name("label").map(|m| m.as_str()),
                &captures["file"],
                &captures["line"],
                &captures["column"],
                base_dir,
            );
            if frame.is_none() {
                debug!("dropping unresolvable stack frame: {}", line.trim());
            }
            frame
        })
        .collect()
}

fn resolve_frame(
    label: Option<&str>,
    file: &str,
    line: &str,
    column: &str,
    base_dir: &Utf8Path,
) -> Option<StackFrame> {
    // Stack positions are 1-based.
    let line = line.parse::<u32>().ok()?.checked_sub(1)?;
    let column = column.parse::<u32>().ok()?.checked_sub(1)?;

    let file = file.strip_prefix("file://").unwrap_or(file);
    if file.is_empty() || file == "native" || file == "<anonymous>" || SCHEME_REGEX.is_match(file)
    {
        return None;
    }

    let file = Utf8Path::new(file);
    let file = if file.is_absolute() {
        file.to_owned()
    } else {
        base_dir.join(file)
    };

    Some(StackFrame {
        label: label.map(str::to_owned),
        file,
        line,
        column,
    })
}

/// Renders an assertion value for display.
///
/// `None` stands for a missing value and renders as `undefined`.
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_owned(),
        Some(Value::Null) => "null".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(value @ (Value::Array(_) | Value::Object(_))) => serde_json::to_string_pretty(value)
            .unwrap_or_else(|_| value.to_string()),
        Some(value) => value.to_string(),
    }
}
