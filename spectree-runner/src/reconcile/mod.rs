// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching execution results back onto discovered tests.
//!
//! The test process reports a flat list of [`ExecutionRecord`]s keyed by full title. Reconciling
//! visits every Test node in a [`TestTree`] depth-first, finds the first record whose title
//! matches the node's full title, and turns it into a [`TestOutcome`].
//!
//! Matching is a plain suffix check (see [`title_matches`]). A record titled `"X A b"` matches a
//! test whose full title is `"A b"`.

mod display;
mod failure;
mod junit;
mod payload;

pub use display::*;
pub use failure::*;
pub use junit::*;
pub use payload::*;

use crate::{
    errors::DisplayErrorChain,
    tree::{FailureAnnotation, NodeIndex, TestTree, TreeStore},
};
use camino::{Utf8Path, Utf8PathBuf};
use spectree_metadata::{OutcomeStatus, OutcomeSummary, ReconcileSummary};
use std::time::Duration;
use tracing::{debug, warn};

/// The outcome assigned to a single test.
#[derive(Clone, Debug, PartialEq)]
pub enum TestOutcome {
    /// The test passed.
    Passed {
        /// The reported duration.
        duration: Option<Duration>,
    },

    /// The test failed.
    Failed {
        /// The reported duration.
        duration: Option<Duration>,

        /// Why the test failed.
        detail: FailureDetail,
    },

    /// The test was pending and not run.
    Skipped,
}

impl TestOutcome {
    /// Builds the outcome for a matched record.
    ///
    /// A pending record is always skipped, even if it also carries an error.
    pub fn from_record(record: &ExecutionRecord, source_file: &Utf8Path) -> Self {
        if record.pending {
            return Self::Skipped;
        }
        match record.error() {
            None => Self::Passed {
                duration: record.duration(),
            },
            Some(err) => Self::Failed {
                duration: record.duration(),
                detail: FailureDetail::new(err, source_file),
            },
        }
    }

    /// Returns the status of this outcome.
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Passed { .. } => OutcomeStatus::Passed,
            Self::Failed { .. } => OutcomeStatus::Failed,
            Self::Skipped => OutcomeStatus::Skipped,
        }
    }

    /// Returns the reported duration, if any.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Passed { duration } | Self::Failed { duration, .. } => *duration,
            Self::Skipped => None,
        }
    }

    /// Returns failure detail for failed tests.
    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            Self::Failed { detail, .. } => Some(detail),
            Self::Passed { .. } | Self::Skipped => None,
        }
    }
}

/// A test that a record was matched to.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTest {
    /// The test node's id.
    pub id: String,

    /// The test node's label.
    pub label: String,

    /// The test node's full title.
    pub full_title: String,

    /// The assigned outcome.
    pub outcome: TestOutcome,
}

impl ResolvedTest {
    /// Returns the full titles of the enclosing suites, or `None` for a top-level test.
    pub fn suite_path(&self) -> Option<&str> {
        self.full_title
            .strip_suffix(&self.label)
            .map(str::trim_end)
            .filter(|path| !path.is_empty())
    }
}

/// The result of one reconciliation pass over a tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    file: Utf8PathBuf,
    resolved: Vec<ResolvedTest>,
    unresolved: Vec<String>,
}

impl Reconciliation {
    /// Returns the source file of the reconciled tree.
    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    /// Returns resolved tests in depth-first order.
    pub fn resolved(&self) -> &[ResolvedTest] {
        &self.resolved
    }

    /// Returns the ids of tests that no record matched.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Returns the outcome assigned to the test with the given id.
    pub fn outcome(&self, id: &str) -> Option<&TestOutcome> {
        self.resolved
            .iter()
            .find(|test| test.id == id)
            .map(|test| &test.outcome)
    }

    /// Returns the number of resolved tests with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.resolved
            .iter()
            .filter(|test| test.outcome.status() == status)
            .count()
    }

    /// Returns true if any test failed.
    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failed) > 0
    }

    /// Returns a serializable summary.
    pub fn to_summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            file: self.file.clone(),
            outcomes: self
                .resolved
                .iter()
                .map(|test| {
                    let detail = test.outcome.failure();
                    OutcomeSummary {
                        id: test.id.clone(),
                        full_title: test.full_title.clone(),
                        status: test.outcome.status(),
                        duration_ms: test
                            .outcome
                            .duration()
                            .map(|duration| duration.as_secs_f64() * 1000.0),
                        message: detail.map(|detail| detail.message.clone()),
                        frames: detail
                            .map(|detail| detail.frames.iter().map(StackFrame::to_summary).collect())
                            .unwrap_or_default(),
                        diff: detail.and_then(FailureDetail::diff_summary),
                    }
                })
                .collect(),
            unresolved: self.unresolved.clone(),
        }
    }
}

/// Returns true if a record with title `record_title` applies to a test whose full title is
/// `path`.
///
/// This is a plain suffix check that ignores word boundaries, so `"X A b"` matches `"A b"`, and
/// so does `"XA b"`.
pub fn title_matches(record_title: &str, path: &str) -> bool {
    record_title == path || record_title.ends_with(path)
}

/// Assigns outcomes from `records` to the Test nodes of `tree`.
///
/// Afterwards, the tree's failure annotations are replaced with the failures from this pass, or
/// cleared if nothing failed.
pub fn reconcile(tree: &mut TestTree, records: &[ExecutionRecord]) -> Reconciliation {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    let mut failures = Vec::new();

    for index in tree.tests() {
        let node = tree.node(index);
        let full_title = tree.full_title(index);
        let Some(record) = records
            .iter()
            .find(|record| title_matches(&record.full_title, &full_title))
        else {
            debug!("no result matched `{full_title}` in {}", tree.path());
            unresolved.push(node.id().to_owned());
            continue;
        };

        let outcome = TestOutcome::from_record(record, tree.path());
        if let Some(detail) = outcome.failure() {
            failures.push(annotation_for(tree, index, detail));
        }
        resolved.push(ResolvedTest {
            id: node.id().to_owned(),
            label: node.label().to_owned(),
            full_title,
            outcome,
        });
    }

    if failures.is_empty() && !tree.failures().is_empty() {
        debug!("clearing stale failures for {}", tree.path());
    }
    tree.set_failures(failures);

    Reconciliation {
        file: tree.path().to_owned(),
        resolved,
        unresolved,
    }
}

fn annotation_for(tree: &TestTree, index: NodeIndex, detail: &FailureDetail) -> FailureAnnotation {
    let (line, column) = match detail.first_frame_in(tree.path()) {
        Some(frame) => (frame.line, frame.column),
        None => (tree.node(index).source_range().start, 0),
    };
    FailureAnnotation {
        node_id: tree.node(index).id().to_owned(),
        message: detail.message.clone(),
        line,
        column,
    }
}

/// Parses `raw` and reconciles the records against `tree`.
///
/// If the payload can't be parsed, the error is logged. Then, if `overall_success` reports that
/// the whole run passed, every test is marked passed. Otherwise all tests are left unresolved.
pub fn reconcile_payload(
    tree: &mut TestTree,
    raw: &str,
    overall_success: Option<bool>,
) -> Reconciliation {
    match parse_payload(raw) {
        Ok(records) => reconcile(tree, &records),
        Err(error) => {
            warn!(
                "for {}: {}",
                tree.path(),
                DisplayErrorChain::new(error)
            );
            reconcile_unparsed(tree, overall_success)
        }
    }
}

/// Parses `raw` once and reconciles the records against every tree in `store`, in path order.
///
/// An unparseable payload is logged once, and each tree then falls back the same way
/// [`reconcile_payload`] does.
pub fn reconcile_store(
    store: &mut TreeStore,
    raw: &str,
    overall_success: Option<bool>,
) -> Vec<Reconciliation> {
    match parse_payload(raw) {
        Ok(records) => store.iter_mut().map(|tree| reconcile(tree, &records)).collect(),
        Err(error) => {
            warn!("{}", DisplayErrorChain::new(error));
            store
                .iter_mut()
                .map(|tree| reconcile_unparsed(tree, overall_success))
                .collect()
        }
    }
}

fn reconcile_unparsed(tree: &mut TestTree, overall_success: Option<bool>) -> Reconciliation {
    if overall_success == Some(true) {
        debug!("run succeeded overall, marking every test in {} passed", tree.path());
        mark_all_passed(tree)
    } else {
        Reconciliation {
            file: tree.path().to_owned(),
            resolved: Vec::new(),
            unresolved: tree
                .tests()
                .map(|index| tree.node(index).id().to_owned())
                .collect(),
        }
    }
}

fn mark_all_passed(tree: &mut TestTree) -> Reconciliation {
    let resolved = tree
        .tests()
        .map(|index| ResolvedTest {
            id: tree.node(index).id().to_owned(),
            label: tree.node(index).label().to_owned(),
            full_title: tree.full_title(index),
            outcome: TestOutcome::Passed { duration: None },
        })
        .collect();
    tree.set_failures(Vec::new());
    Reconciliation {
        file: tree.path().to_owned(),
        resolved,
        unresolved: Vec::new(),
    }
}
