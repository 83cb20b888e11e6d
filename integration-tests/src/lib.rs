// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for spectree's data-driven tests.

use camino::Utf8Path;
use spectree_runner::{
    config::DiscoveryConfig, scanner::Scanner, tags::TagRegistry, tree::TestTree,
};

/// Scans a fixture with the default discovery settings.
///
/// The tree is rooted at the fixture's bare file name, so that expected output doesn't depend on
/// where the repository is checked out.
pub fn scan_fixture(path: &Utf8Path, contents: &str) -> TestTree {
    let registry = TagRegistry::new();
    let scanner = Scanner::new(&DiscoveryConfig::default(), &registry);
    let file_name = path.file_name().map_or(path, Utf8Path::new);
    scanner.scan(file_name, contents)
}
