// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{FailureDetail, Reconciliation, TestOutcome};
use crate::{errors::WriteJunitError, helpers::one_based};
use camino::Utf8Path;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::fs::File;
use swrite::{SWrite, swrite};

/// Builds a JUnit report with one test suite per reconciled file.
///
/// Unresolved tests aren't included.
pub fn junit_report(report_name: &str, results: &[Reconciliation]) -> Report {
    let mut report = Report::new(report_name);
    report.add_test_suites(results.iter().map(|result| {
        let mut test_suite = TestSuite::new(result.file().as_str());
        for test in result.resolved() {
            let status = match &test.outcome {
                TestOutcome::Passed { .. } => TestCaseStatus::success(),
                TestOutcome::Failed { detail, .. } => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status
                        .set_message(detail.message.as_str())
                        .set_description(failure_description(detail));
                    status
                }
                TestOutcome::Skipped => TestCaseStatus::skipped(),
            };

            let mut test_case = TestCase::new(test.full_title.as_str(), status);
            test_case.set_classname(test.suite_path().unwrap_or(result.file().as_str()));
            if let Some(duration) = test.outcome.duration() {
                test_case.set_time(duration);
            }
            test_suite.add_test_case(test_case);
        }
        test_suite
    }));
    report
}

fn failure_description(detail: &FailureDetail) -> String {
    let mut out = detail.message.clone();
    if let Some(diff) = &detail.diff {
        swrite!(out, "\n\nexpected:\n{}\n\nactual:\n{}", diff.expected, diff.actual);
    }
    if !detail.frames.is_empty() {
        out.push('\n');
    }
    for frame in &detail.frames {
        out.push_str("\n    at ");
        if let Some(label) = &frame.label {
            swrite!(out, "{label} ");
        }
        swrite!(
            out,
            "({}:{}:{})",
            frame.file,
            one_based(frame.line),
            one_based(frame.column)
        );
    }
    out
}

/// Writes `report` to `path`, creating parent directories as needed.
pub fn write_junit(report: &Report, path: &Utf8Path) -> Result<(), WriteJunitError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|error| WriteJunitError::Fs {
            file: dir.to_owned(),
            error,
        })?;
    }

    let f = File::create(path).map_err(|error| WriteJunitError::Fs {
        file: path.to_owned(),
        error,
    })?;
    report
        .serialize(f)
        .map_err(|error| WriteJunitError::Serialize {
            file: path.to_owned(),
            error,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DiscoveryConfig,
        reconcile::{ErrorPayload, ExecutionRecord, reconcile},
        scanner::Scanner,
        tags::TagRegistry,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn results() -> Vec<Reconciliation> {
        let registry = TagRegistry::new();
        let scanner = Scanner::new(&DiscoveryConfig::default(), &registry);
        let mut tree = scanner.scan(
            Utf8Path::new("/project/test/math.test.js"),
            indoc! {r#"
                describe("math", () => {
                  it("adds", () => {});
                  it("compares", () => {});
                  it("later", () => {});
                });
                it("top level", () => {});
            "#},
        );
        let records = [
            ExecutionRecord {
                full_title: "math adds".to_owned(),
                duration: Some(5.0),
                ..ExecutionRecord::default()
            },
            ExecutionRecord {
                full_title: "math compares".to_owned(),
                err: Some(ErrorPayload {
                    message: Some("expected 1 to equal 2".to_owned()),
                    stack: Some("    at Context.<anonymous> (math.test.js:3:5)".to_owned()),
                    expected: Some(json!(2)),
                    actual: Some(json!(1)),
                }),
                ..ExecutionRecord::default()
            },
            ExecutionRecord {
                full_title: "math later".to_owned(),
                pending: true,
                ..ExecutionRecord::default()
            },
            ExecutionRecord {
                full_title: "top level".to_owned(),
                ..ExecutionRecord::default()
            },
        ];
        vec![reconcile(&mut tree, &records)]
    }

    #[test]
    fn report_structure() {
        let report = junit_report("spectree-run", &results());
        let xml = report.to_string().expect("report serializes");

        assert!(xml.contains(r#"<testsuite name="/project/test/math.test.js""#), "{xml}");
        assert!(xml.contains(r#"tests="4""#), "{xml}");
        assert!(xml.contains(r#"failures="1""#), "{xml}");
        assert!(
            xml.contains(r#"<testcase name="math adds" classname="math""#),
            "{xml}"
        );
        assert!(
            xml.contains(r#"<testcase name="top level" classname="/project/test/math.test.js""#),
            "{xml}"
        );
        assert!(xml.contains(r#"message="expected 1 to equal 2""#), "{xml}");
        assert_eq!(xml.matches("<skipped").count(), 1, "{xml}");
    }

    #[test]
    fn description_includes_diff_and_frames() {
        let results = results();
        let detail = results[0].resolved()[1]
            .outcome
            .failure()
            .expect("test failed");
        assert_eq!(
            failure_description(detail),
            indoc! {"
                expected 1 to equal 2

                expected:
                2

                actual:
                1

                    at Context.<anonymous> (/project/test/math.test.js:3:5)"}
        );
    }

    #[test]
    fn write_to_disk() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = dir.path().join("nested/dir/junit.xml");
        let report = junit_report("spectree-run", &results());
        write_junit(&report, &path).expect("report written");

        let xml = std::fs::read_to_string(&path).expect("report readable");
        assert!(xml.contains(r#"<testsuites name="spectree-run""#), "{xml}");
        assert!(xml.contains(r#"<testcase name="math compares""#), "{xml}");
        assert!(xml.contains("<skipped"), "{xml}");
    }
}
