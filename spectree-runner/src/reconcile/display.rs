// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{FailureDetail, Reconciliation, ResolvedTest, TestOutcome};
use crate::{
    errors::WriteOutputError,
    helpers::{format_duration, one_based, plural},
    output_format::{OutputFormat, Styles},
};
use owo_colors::OwoColorize;
use spectree_metadata::{OutcomeStatus, ReconcileSummary};
use std::io::{self, Write};

/// Outputs reconciliation results for several files in the given format.
///
/// Human output ends with a summary line covering every file.
pub fn write_reconciliations(
    results: &[Reconciliation],
    output_format: OutputFormat,
    mut writer: impl Write,
    colorize: bool,
) -> Result<(), WriteOutputError> {
    match output_format {
        OutputFormat::Human { verbose } => {
            write_human(results, &mut writer, verbose, &Styles::new(colorize))
                .map_err(WriteOutputError::Io)
        }
        OutputFormat::Serializable(format) => {
            let summaries: Vec<ReconcileSummary> =
                results.iter().map(Reconciliation::to_summary).collect();
            format
                .to_writer(&summaries, writer)
                .map_err(WriteOutputError::Json)
        }
    }
}

fn write_human(
    results: &[Reconciliation],
    writer: &mut impl Write,
    verbose: bool,
    styles: &Styles,
) -> io::Result<()> {
    for result in results {
        if result.resolved().is_empty() && !verbose {
            continue;
        }
        writeln!(writer, "{}:", result.file().style(styles.file))?;
        for test in result.resolved() {
            write_test(writer, test, styles)?;
        }
        if verbose {
            for id in result.unresolved() {
                writeln!(writer, "{:>12} {id}", "UNRESOLVED".style(styles.field))?;
            }
        }
    }

    let count = |status| results.iter().map(|r| r.count(status)).sum::<usize>();
    let (passed, failed, skipped) = (
        count(OutcomeStatus::Passed),
        count(OutcomeStatus::Failed),
        count(OutcomeStatus::Skipped),
    );
    let total = passed + failed + skipped;
    let summary_style = if failed > 0 { styles.fail } else { styles.pass };
    writeln!(
        writer,
        "{:>12} {} {} in {} {}: {} passed, {} failed, {} skipped",
        "Summary".style(summary_style),
        total.style(styles.count),
        plural::tests_str(total),
        results.len().style(styles.count),
        plural::files_str(results.len()),
        passed.style(styles.count),
        failed.style(styles.count),
        skipped.style(styles.count),
    )
}

fn write_test(writer: &mut impl Write, test: &ResolvedTest, styles: &Styles) -> io::Result<()> {
    let (status, style) = match &test.outcome {
        TestOutcome::Passed { .. } => ("PASS", styles.pass),
        TestOutcome::Failed { .. } => ("FAIL", styles.fail),
        TestOutcome::Skipped => ("SKIP", styles.skip),
    };
    let duration = match test.outcome.duration() {
        Some(duration) => format!("[{:>8}]", format_duration(duration)),
        None => " ".repeat(10),
    };
    writeln!(
        writer,
        "{:>12} {duration} {}",
        status.style(style),
        test.full_title.style(styles.test_name),
    )?;

    if let Some(detail) = test.outcome.failure() {
        write_failure(writer, detail, styles)?;
    }
    Ok(())
}

fn write_failure(writer: &mut impl Write, detail: &FailureDetail, styles: &Styles) -> io::Result<()> {
    const INDENT: &str = "              ";

    for line in detail.message.lines() {
        writeln!(writer, "{INDENT}{line}")?;
    }
    if let Some(diff) = &detail.diff {
        write_value(writer, "expected:", &diff.expected, styles)?;
        write_value(writer, "actual:", &diff.actual, styles)?;
    }
    for frame in &detail.frames {
        write!(writer, "{INDENT}at ")?;
        if let Some(label) = &frame.label {
            write!(writer, "{label} ")?;
        }
        writeln!(
            writer,
            "({}:{}:{})",
            frame.file,
            one_based(frame.line),
            one_based(frame.column),
        )?;
    }
    Ok(())
}

fn write_value(
    writer: &mut impl Write,
    field: &str,
    value: &str,
    styles: &Styles,
) -> io::Result<()> {
    let mut lines = value.lines();
    let first = lines.next().unwrap_or_default();
    writeln!(writer, "              {:<10}{first}", field.style(styles.field))?;
    for line in lines {
        writeln!(writer, "                        {line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DiscoveryConfig,
        output_format::SerializableFormat,
        reconcile::{ErrorPayload, ExecutionRecord, reconcile},
        scanner::Scanner,
        tags::TagRegistry,
    };
    use camino::Utf8Path;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_results() -> Vec<Reconciliation> {
        let registry = TagRegistry::new();
        let scanner = Scanner::new(&DiscoveryConfig::default(), &registry);
        let mut tree = scanner.scan(
            Utf8Path::new("/project/test/math.test.js"),
            indoc! {r#"
                describe("math", () => {
                  it("adds", () => {});
                  it("compares", () => {});
                  it("later", () => {});
                  it("never ran", () => {});
                });
            "#},
        );
        let records = vec![
            ExecutionRecord {
                full_title: "math adds".to_owned(),
                duration: Some(4.0),
                ..ExecutionRecord::default()
            },
            ExecutionRecord {
                full_title: "math compares".to_owned(),
                duration: Some(1250.0),
                err: Some(ErrorPayload {
                    message: Some("expected { a: 1 } to deeply equal { a: 2 }".to_owned()),
                    stack: Some(
                        "AssertionError: boom\n    at Context.<anonymous> (math.test.js:3:22)"
                            .to_owned(),
                    ),
                    expected: Some(json!({ "a": 2 })),
                    actual: Some(json!({ "a": 1 })),
                }),
                ..ExecutionRecord::default()
            },
            ExecutionRecord {
                full_title: "math later".to_owned(),
                pending: true,
                ..ExecutionRecord::default()
            },
        ];
        vec![reconcile(&mut tree, &records)]
    }

    #[test]
    fn human_output() {
        let mut buf = Vec::new();
        write_reconciliations(
            &sample_results(),
            OutputFormat::Human { verbose: true },
            &mut buf,
            false,
        )
        .expect("write succeeded");

        assert_eq!(
            String::from_utf8(buf).expect("valid UTF-8"),
            indoc! {r#"
                /project/test/math.test.js:
                        PASS [  0.004s] math adds
                        FAIL [  1.250s] math compares
                              expected { a: 1 } to deeply equal { a: 2 }
                              expected: {
                                          "a": 2
                                        }
                              actual:   {
                                          "a": 1
                                        }
                              at Context.<anonymous> (/project/test/math.test.js:3:22)
                        SKIP            math later
                  UNRESOLVED /project/test/math.test.js/math/never ran
                     Summary 3 tests in 1 file: 1 passed, 1 failed, 1 skipped
            "#}
        );
    }

    #[test]
    fn json_output() {
        let mut buf = Vec::new();
        write_reconciliations(
            &sample_results(),
            OutputFormat::Serializable(SerializableFormat::Json),
            &mut buf,
            false,
        )
        .expect("write succeeded");
        let summaries: Vec<ReconcileSummary> =
            serde_json::from_slice(&buf).expect("output parses");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].count(OutcomeStatus::Failed), 1);
        let failed = &summaries[0].outcomes[1];
        assert_eq!(failed.frames[0].line, 2);
        assert_eq!(
            failed.diff.as_ref().map(|diff| diff.expected.as_str()),
            Some("{\n  \"a\": 2\n}")
        );
    }
}
