// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-driven tests.

use camino::Utf8Path;
use integration_tests::scan_fixture;
use pretty_assertions::assert_eq;
use spectree_metadata::OutcomeStatus;
use spectree_runner::{
    OutputFormat,
    reconcile::{reconcile_payload, write_reconciliations},
};

/// Compares the verbose outline of a fixture with `<name>.test.outline`.
fn discovery(path: &Utf8Path, contents: String) -> datatest_stable::Result<()> {
    let tree = scan_fixture(path, &contents);

    let mut actual = Vec::new();
    tree.write_human(&mut actual, true, false)?;
    let expected = std::fs::read_to_string(path.with_extension("outline"))?;
    assert_eq!(String::from_utf8(actual)?, expected);

    Ok(())
}

/// Reconciles a fixture against `<name>.test.results.json`, and compares the verbose results
/// with `<name>.test.expected`.
fn reconcile(path: &Utf8Path, contents: String) -> datatest_stable::Result<()> {
    let mut tree = scan_fixture(path, &contents);
    let results = std::fs::read_to_string(path.with_extension("results.json"))?;

    let reconciliation = reconcile_payload(&mut tree, &results, None);
    assert_eq!(
        tree.failures().len(),
        reconciliation.count(OutcomeStatus::Failed),
        "one annotation per failed test"
    );

    let mut actual = Vec::new();
    write_reconciliations(
        &[reconciliation],
        OutputFormat::Human { verbose: true },
        &mut actual,
        false,
    )?;
    let expected = std::fs::read_to_string(path.with_extension("expected"))?;
    assert_eq!(String::from_utf8(actual)?, expected);

    Ok(())
}

datatest_stable::harness! {
    {
        test = discovery,
        root = "fixtures/discovery",
        pattern = r"\.test\.js$",
    },
    {
        test = reconcile,
        root = "fixtures/reconcile",
        pattern = r"\.test\.js$",
    },
}
