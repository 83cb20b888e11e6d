// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovered test trees.
//!
//! Every source file gets its own [`TestTree`]: an arena of [`TreeNode`]s rooted at a File node.
//! Scanning a file always builds a fresh arena. Node handles ([`NodeIndex`]) from an older scan
//! must not be used with a newer tree; re-resolve them by id with [`TestTree::find_by_id`].

mod display;
mod store;

pub use store::*;

use crate::tags::TagSet;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use spectree_metadata::{NodeKind, NodeSummary, SourceRange, TreeSummary};

/// A handle to a node within a [`TestTree`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The File node at the root of every tree.
    pub const ROOT: Self = Self(0);
}

/// A single File, Suite or Test node.
#[derive(Clone, Debug)]
pub struct TreeNode {
    kind: NodeKind,
    id: String,
    label: String,
    source_range: SourceRange,
    tags: TagSet,
    parent: Option<NodeIndex>,
    // Keyed by child id. Inserting a duplicate id replaces the earlier child in place.
    children: IndexMap<String, NodeIndex>,
}

impl TreeNode {
    /// Returns the kind of node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the declared label, with any tag markup left in place.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the lines this node was declared on.
    pub fn source_range(&self) -> SourceRange {
        self.source_range
    }

    /// Returns this node's tags, including inherited ones.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Returns the parent node, or `None` for the File node.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns the children of this node, in declaration order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeIndex> + '_ {
        self.children.values().copied()
    }

    pub(crate) fn set_end(&mut self, end: u32) {
        self.source_range.end = end.max(self.source_range.start);
    }
}

/// A failure recorded against a file by the last reconciliation pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureAnnotation {
    /// The id of the failed test.
    pub node_id: String,

    /// The failure message.
    pub message: String,

    /// The 0-based line in this file the failure points at.
    pub line: u32,

    /// The 0-based column in this file the failure points at.
    pub column: u32,
}

/// A File-rooted tree of suites and tests discovered in one source file.
#[derive(Clone, Debug)]
pub struct TestTree {
    path: Utf8PathBuf,
    nodes: Vec<TreeNode>,
    failures: Vec<FailureAnnotation>,
}

impl TestTree {
    /// Creates a tree containing only the File node for `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let label = path.file_name().unwrap_or(path.as_str()).to_owned();
        let root = TreeNode {
            kind: NodeKind::File,
            id: path.as_str().to_owned(),
            label,
            source_range: SourceRange::default(),
            tags: TagSet::new(),
            parent: None,
            children: IndexMap::new(),
        };
        Self {
            path,
            nodes: vec![root],
            failures: Vec::new(),
        }
    }

    /// Returns the path of the source file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the File node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[NodeIndex::ROOT.0]
    }

    /// Returns the node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not produced by this tree.
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.nodes[index.0]
    }

    /// Adds a child under `parent` and returns its index.
    ///
    /// The child's id is `parent id + "/" + label`. If the parent already has a child with that
    /// id, the new node takes its place and the old one becomes unreachable.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeIndex,
        kind: NodeKind,
        label: impl Into<String>,
        source_range: SourceRange,
        tags: TagSet,
    ) -> NodeIndex {
        let label = label.into();
        let id = format!("{}/{}", self.node(parent).id, label);
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(TreeNode {
            kind,
            id: id.clone(),
            label,
            source_range,
            tags,
            parent: Some(parent),
            children: IndexMap::new(),
        });
        self.node_mut(parent).children.insert(id, index);
        index
    }

    /// Returns every node reachable from the File node, depth-first, parents before children.
    pub fn walk(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeIndex::ROOT];
        while let Some(index) = stack.pop() {
            out.push(index);
            // Push in reverse so that children come out in declaration order.
            let children: Vec<_> = self.node(index).children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Returns every Test node, depth-first, in declaration order.
    pub fn tests(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.walk()
            .into_iter()
            .filter(move |&index| self.node(index).kind == NodeKind::Test)
    }

    /// Returns the number of Test nodes.
    pub fn test_count(&self) -> usize {
        self.tests().count()
    }

    /// Looks up a node by id.
    pub fn find_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.walk()
            .into_iter()
            .find(|&index| self.node(index).id == id)
    }

    /// Returns the full-title path of a node: the labels of its Suite ancestors followed by its
    /// own label, joined with single spaces. The File node contributes nothing.
    pub fn full_title(&self, index: NodeIndex) -> String {
        let mut labels = Vec::new();
        let mut current = Some(index);
        while let Some(index) = current {
            let node = self.node(index);
            if node.kind != NodeKind::File {
                labels.push(node.label.as_str());
            }
            current = node.parent;
        }
        labels.reverse();
        labels.join(" ")
    }

    /// Returns the failures recorded by the last reconciliation pass.
    pub fn failures(&self) -> &[FailureAnnotation] {
        &self.failures
    }

    pub(crate) fn set_failures(&mut self, failures: Vec<FailureAnnotation>) {
        self.failures = failures;
    }

    /// Replaces every node below the File node with the nodes from `fresh`.
    ///
    /// `fresh` must have been scanned from the same path. The File node's failure annotations
    /// are kept.
    pub fn replace_children(&mut self, fresh: TestTree) {
        debug_assert_eq!(self.path, fresh.path, "replacement tree is for the same file");
        self.nodes = fresh.nodes;
    }

    /// Returns a serializable summary of this tree.
    pub fn to_summary(&self) -> TreeSummary {
        TreeSummary {
            file: self.path.clone(),
            test_count: self.test_count(),
            root: self.node_summary(NodeIndex::ROOT),
        }
    }

    fn node_summary(&self, index: NodeIndex) -> NodeSummary {
        let node = self.node(index);
        NodeSummary {
            id: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
            tags: node.tags.iter().map(|tag| tag.to_string()).collect(),
            source_range: node.source_range,
            children: node
                .children()
                .map(|child| self.node_summary(child))
                .collect(),
        }
    }
}
