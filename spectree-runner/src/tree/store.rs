// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::TestTree;
use crate::{scanner::Scanner, tags::TagStore};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tracing::debug;

/// Holds one [`TestTree`] per source file.
///
/// Rescans replace a file's whole subtree: nothing is diffed against the previous scan. Callers
/// must serialize rescans of the same file.
#[derive(Clone, Debug, Default)]
pub struct TreeStore {
    trees: BTreeMap<Utf8PathBuf, TestTree>,
}

impl TreeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tree for `path`, creating an empty one the first time the path is seen.
    pub fn get_or_create(&mut self, path: &Utf8Path) -> &mut TestTree {
        self.trees.entry(path.to_owned()).or_insert_with(|| {
            debug!("tree store: creating file node for {path}");
            TestTree::new(path)
        })
    }

    /// Returns the tree for `path`, if one exists.
    pub fn get(&self, path: &Utf8Path) -> Option<&TestTree> {
        self.trees.get(path)
    }

    /// Returns a mutable reference to the tree for `path`, if one exists.
    pub fn get_mut(&mut self, path: &Utf8Path) -> Option<&mut TestTree> {
        self.trees.get_mut(path)
    }

    /// Replaces the children of the tree for `fresh.path()` with those of `fresh`, creating the
    /// File node if necessary.
    pub fn replace_subtree(&mut self, fresh: TestTree) -> &mut TestTree {
        let path = fresh.path().to_owned();
        let tree = self.get_or_create(&path);
        tree.replace_children(fresh);
        tree
    }

    /// Scans `contents` as the new text of `path` and replaces its subtree.
    pub fn rescan<S: TagStore>(
        &mut self,
        scanner: &Scanner<S>,
        path: &Utf8Path,
        contents: &str,
    ) -> &mut TestTree {
        self.replace_subtree(scanner.scan(path, contents))
    }

    /// Reads `path` from disk and replaces its subtree. Read failures leave the file childless.
    pub fn rescan_path<S: TagStore>(
        &mut self,
        scanner: &Scanner<S>,
        path: &Utf8Path,
    ) -> &mut TestTree {
        self.replace_subtree(scanner.scan_path(path))
    }

    /// Removes the tree for `path`.
    pub fn remove(&mut self, path: &Utf8Path) -> Option<TestTree> {
        self.trees.remove(path)
    }

    /// Returns the number of files in the store.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns true if the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Iterates over all trees, ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &TestTree> + '_ {
        self.trees.values()
    }

    /// Iterates mutably over all trees, ordered by path.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TestTree> + '_ {
        self.trees.values_mut()
    }
}
