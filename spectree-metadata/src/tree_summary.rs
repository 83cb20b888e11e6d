// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// The kind of a node in a discovered test tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// The root of a tree: a single source file.
    File,

    /// A suite declaration such as `describe("...")`.
    Suite,

    /// A test declaration such as `it("...")`.
    Test,
}

impl NodeKind {
    /// Returns the string representation of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Suite => "suite",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A range of lines in a source file. Both ends are 0-based and inclusive.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceRange {
    /// The line the declaration starts on.
    pub start: u32,

    /// The last line belonging to the declaration.
    pub end: u32,
}

impl SourceRange {
    /// Creates a range covering a single line.
    pub fn line(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }
}

/// Root element for a serializable list of discovered tests, produced by `spectree list`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TreeSummary {
    /// The source file the tree was discovered in.
    pub file: Utf8PathBuf,

    /// The number of test nodes in the tree.
    pub test_count: usize,

    /// The File node and everything below it.
    pub root: NodeSummary,
}

impl TreeSummary {
    /// Parse JSON output from `spectree list --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// A single node in a [`TreeSummary`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeSummary {
    /// The node identifier: the parent's identifier, a `/`, and the label.
    pub id: String,

    /// The declared name, tag markup included.
    pub label: String,

    /// The kind of node.
    pub kind: NodeKind,

    /// Tags on this node, including inherited ones.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Where the node was declared.
    pub source_range: SourceRange,

    /// Child nodes in declaration order.
    #[serde(default)]
    pub children: Vec<NodeSummary>,
}

/// The outcome status of a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was pending and not run.
    Skipped,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed => f.write_str("failed"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Root element for the serializable output of `spectree reconcile`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReconcileSummary {
    /// The source file whose tree was reconciled.
    pub file: Utf8PathBuf,

    /// Outcomes for each resolved test, in depth-first order.
    pub outcomes: Vec<OutcomeSummary>,

    /// Identifiers of tests that no record matched.
    #[serde(default)]
    pub unresolved: Vec<String>,
}

impl ReconcileSummary {
    /// Returns the number of outcomes with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// The outcome of a single test in a [`ReconcileSummary`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutcomeSummary {
    /// The test node's identifier.
    pub id: String,

    /// The full-title path used to match the test against results.
    pub full_title: String,

    /// The resolved status.
    pub status: OutcomeStatus,

    /// Duration in milliseconds, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    /// The failure message, for failed tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Stack frames, innermost first, for failed tests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameSummary>,

    /// Rendered expected and actual values, for failed assertions that carry both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSummary>,
}

/// A single stack frame. Line and column are 0-based.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrameSummary {
    /// The function or method label, if the frame had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// The absolute path to the file.
    pub file: Utf8PathBuf,

    /// The 0-based line.
    pub line: u32,

    /// The 0-based column.
    pub column: u32,
}

/// Rendered expected and actual values.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiffSummary {
    /// The expected value.
    pub expected: String,

    /// The actual value.
    pub actual: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(r#""file""#, NodeKind::File ; "file")]
    #[test_case(r#""suite""#, NodeKind::Suite ; "suite")]
    #[test_case(r#""test""#, NodeKind::Test ; "test")]
    fn parse_node_kind(input: &str, expected: NodeKind) {
        let kind: NodeKind = serde_json::from_str(input).expect("valid node kind");
        assert_eq!(kind, expected);
        assert_eq!(format!("\"{kind}\""), input);
    }

    #[test]
    fn parse_tree_summary() {
        let json = r#"[
            {
                "file": "/src/a.test.js",
                "test-count": 1,
                "root": {
                    "id": "/src/a.test.js",
                    "label": "a.test.js",
                    "kind": "file",
                    "source-range": { "start": 0, "end": 3 },
                    "children": [
                        {
                            "id": "/src/a.test.js/A",
                            "label": "A",
                            "kind": "suite",
                            "tags": ["slow"],
                            "source-range": { "start": 0, "end": 2 },
                            "children": [
                                {
                                    "id": "/src/a.test.js/A/b",
                                    "label": "b",
                                    "kind": "test",
                                    "tags": ["slow"],
                                    "source-range": { "start": 1, "end": 1 }
                                }
                            ]
                        }
                    ]
                }
            }
        ]"#;

        let summaries = TreeSummary::parse_json(json).expect("valid JSON");
        assert_eq!(summaries.len(), 1);
        let suite = &summaries[0].root.children[0];
        assert_eq!(suite.kind, NodeKind::Suite);
        assert_eq!(suite.children[0].source_range, SourceRange::line(1));
        assert!(suite.children[0].children.is_empty());
    }

    #[test]
    fn reconcile_summary_counts() {
        let outcome = |id: &str, status| OutcomeSummary {
            id: id.to_owned(),
            full_title: id.to_owned(),
            status,
            duration_ms: None,
            message: None,
            frames: Vec::new(),
            diff: None,
        };
        let summary = ReconcileSummary {
            file: "/a.js".into(),
            outcomes: vec![
                outcome("a", OutcomeStatus::Passed),
                outcome("b", OutcomeStatus::Failed),
                outcome("c", OutcomeStatus::Passed),
            ],
            unresolved: vec!["d".to_owned()],
        };
        assert_eq!(summary.count(OutcomeStatus::Passed), 2);
        assert_eq!(summary.count(OutcomeStatus::Failed), 1);
        assert_eq!(summary.count(OutcomeStatus::Skipped), 0);
    }

    #[test]
    fn parse_reconcile_summary() {
        let json = r#"{
            "file": "/src/a.test.js",
            "outcomes": [
                {
                    "id": "/src/a.test.js/A/b",
                    "full-title": "A b",
                    "status": "failed",
                    "duration-ms": 12.5,
                    "message": "expected 1 to equal 2",
                    "frames": [
                        { "label": "Context.<anonymous>", "file": "/src/a.test.js", "line": 1, "column": 4 }
                    ],
                    "diff": { "expected": "2", "actual": "1" }
                }
            ]
        }"#;

        let summary: ReconcileSummary = serde_json::from_str(json).expect("valid JSON");
        assert_eq!(
            summary,
            ReconcileSummary {
                file: "/src/a.test.js".into(),
                outcomes: vec![OutcomeSummary {
                    id: "/src/a.test.js/A/b".to_owned(),
                    full_title: "A b".to_owned(),
                    status: OutcomeStatus::Failed,
                    duration_ms: Some(12.5),
                    message: Some("expected 1 to equal 2".to_owned()),
                    frames: vec![FrameSummary {
                        label: Some("Context.<anonymous>".to_owned()),
                        file: "/src/a.test.js".into(),
                        line: 1,
                        column: 4,
                    }],
                    diff: Some(DiffSummary {
                        expected: "2".to_owned(),
                        actual: "1".to_owned(),
                    }),
                }],
                unresolved: Vec::new(),
            }
        );
    }
}
