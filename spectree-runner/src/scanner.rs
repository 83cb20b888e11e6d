// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of suites and tests in source text.
//!
//! The scanner is a line-oriented heuristic, not a parser. Each line is checked for suite
//! declarations (`describe("name", ...)`), test declarations (`it("name", ...)`) or a closing
//! call (`});`). Scope is decided purely by indentation: a declaration belongs to the nearest
//! open suite that is indented less than it is. A declaration later on the same line counts as
//! indented by the line's indentation plus the number of brackets still open before it.
//!
//! Declarations spanning several lines are not recognized, and names must be quoted with a
//! single style of quote (`"`, `'` or `` ` ``).

use crate::{
    config::DiscoveryConfig,
    errors::{DisplayErrorChain, ScanError},
    tags::{TagStore, extract_tags},
    tree::{NodeIndex, TestTree},
};
use camino::Utf8Path;
use itertools::Itertools;
use regex::Regex;
use spectree_metadata::{NodeKind, SourceRange};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// A modifier attached to a declaration, as in `describe.skip(...)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Modifier {
    /// The declaration and everything nested in it is excluded from discovery.
    Skip,

    /// Has no effect on discovery.
    Only,
}

/// A suite or test declaration recognized on a single line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration<'a> {
    /// Either [`NodeKind::Suite`] or [`NodeKind::Test`].
    pub kind: NodeKind,

    /// The modifier, if any.
    pub modifier: Option<Modifier>,

    /// The declared name, without quotes.
    pub name: &'a str,
}

static CLOSER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\}(?:\s*\))+\s*;?$").expect("closer regex is valid"));

/// Turns source text into a [`TestTree`].
#[derive(Debug)]
pub struct Scanner<S> {
    declaration_regex: Regex,
    tab_width: usize,
    store: S,
}

#[derive(Copy, Clone, Debug)]
struct OpenNode {
    index: NodeIndex,
    // None for the File node, which is never popped.
    indent: Option<usize>,
}

impl<S: TagStore> Scanner<S> {
    /// Creates a new scanner. Tags are created through `store`.
    pub fn new(config: &DiscoveryConfig, store: S) -> Self {
        Self {
            declaration_regex: declaration_regex(&config.suite_functions, &config.test_functions),
            tab_width: config.tab_width.max(1),
            store,
        }
    }

    /// Reads `path` and scans it.
    ///
    /// If the file can't be read, the failure is logged and a tree with no children is returned.
    pub fn scan_path(&self, path: &Utf8Path) -> TestTree {
        match std::fs::read_to_string(path) {
            Ok(text) => self.scan(path, &text),
            Err(error) => {
                warn!("{}", DisplayErrorChain::new(ScanError::new(path, error)));
                TestTree::new(path)
            }
        }
    }

    /// Scans `text`, the contents of `path`, into a fresh tree.
    pub fn scan(&self, path: &Utf8Path, text: &str) -> TestTree {
        let mut tree = TestTree::new(path);
        let mut stack = vec![OpenNode {
            index: NodeIndex::ROOT,
            indent: None,
        }];
        // Indentation of the skipped suite currently being ignored.
        let mut suppressed_from: Option<usize> = None;
        // The last line that wasn't blank or a comment.
        let mut prev_line = 0;

        for (line_no, line) in text.lines().enumerate() {
            let line_no = u32::try_from(line_no).unwrap_or(u32::MAX);
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }
            let indent = self.indentation(line);

            if let Some(boundary) = suppressed_from {
                if indent > boundary {
                    prev_line = line_no;
                    continue;
                }
                suppressed_from = None;
            }

            let declarations = self.declarations(trimmed);
            if declarations.is_empty() {
                if CLOSER_REGEX.is_match(trimmed) {
                    if let Some(OpenNode {
                        index,
                        indent: Some(open_indent),
                    }) = stack.last().copied()
                    {
                        if indent <= open_indent {
                            tree.node_mut(index).set_end(line_no);
                            stack.pop();
                        }
                    }
                }
                prev_line = line_no;
                continue;
            }

            for (depth, decl) in declarations {
                let indent = indent + depth;
                if let Some(boundary) = suppressed_from {
                    if indent > boundary {
                        continue;
                    }
                    suppressed_from = None;
                }

                if decl.modifier == Some(Modifier::Skip) {
                    if decl.kind == NodeKind::Suite {
                        debug!("{path}:{}: skipping suite `{}`", line_no + 1, decl.name);
                        suppressed_from = Some(indent);
                    }
                    continue;
                }

                pop_enclosing(&mut tree, &mut stack, indent, prev_line);
                let parent = stack.last().map_or(NodeIndex::ROOT, |open| open.index);
                let tags = extract_tags(decl.name, tree.node(parent).tags(), &self.store);
                let index =
                    tree.add_child(parent, decl.kind, decl.name, SourceRange::line(line_no), tags);
                if decl.kind == NodeKind::Suite {
                    stack.push(OpenNode {
                        index,
                        indent: Some(indent),
                    });
                }
            }
            prev_line = line_no;
        }

        for open in stack.into_iter().skip(1) {
            tree.node_mut(open.index).set_end(prev_line);
        }
        let root_end = u32::try_from(text.lines().count().saturating_sub(1)).unwrap_or(u32::MAX);
        tree.node_mut(NodeIndex::ROOT).set_end(root_end);

        tree
    }

    /// Recognizes the first suite or test declaration on a trimmed line.
    pub fn declaration<'a>(&self, trimmed: &'a str) -> Option<Declaration<'a>> {
        self.declarations(trimmed)
            .into_iter()
            .next()
            .map(|(_, decl)| decl)
    }

    /// Recognizes every declaration on a trimmed line, in order.
    ///
    /// Each declaration is paired with the number of brackets open before it. Text inside string
    /// literals and after a `//` comment is ignored.
    pub fn declarations<'a>(&self, trimmed: &'a str) -> Vec<(usize, Declaration<'a>)> {
        let depths = nesting_depths(trimmed);
        self.declaration_regex
            .captures_iter(trimmed)
            .filter_map(|captures| {
                let (kind, function) = match captures.name("suite") {
                    Some(function) => (NodeKind::Suite, function),
                    None => (NodeKind::Test, captures.name("test")?),
                };
                let depth = depths.get(function.start()).copied().flatten()?;
                let modifier = captures.name("modifier").map(|m| match m.as_str() {
                    "skip" => Modifier::Skip,
                    _ => Modifier::Only,
                });
                let name = ["double", "single", "template"]
                    .into_iter()
                    .find_map(|group| captures.name(group))?
                    .as_str();

                Some((
                    depth,
                    Declaration {
                        kind,
                        modifier,
                        name,
                    },
                ))
            })
            .collect()
    }

    fn indentation(&self, line: &str) -> usize {
        line.chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { self.tab_width } else { 1 })
            .sum()
    }
}

/// Pops open suites that can't contain a declaration at `indent`.
fn pop_enclosing(tree: &mut TestTree, stack: &mut Vec<OpenNode>, indent: usize, prev_line: u32) {
    while let Some(OpenNode {
        index,
        indent: Some(open_indent),
    }) = stack.last().copied()
    {
        if indent > open_indent {
            break;
        }
        tree.node_mut(index).set_end(prev_line);
        stack.pop();
    }
}

fn declaration_regex(suite_functions: &[String], test_functions: &[String]) -> Regex {
    let alternation = |functions: &[String]| functions.iter().map(|f| regex::escape(f)).join("|");
    let pattern = format!(
        r#"(?:^|[^\w$.])(?:(?P<suite>{})|(?P<test>{}))(?:\.(?P<modifier>skip|only))?\s*\(\s*(?:"(?P<double>[^"]*)"|'(?P<single>[^']*)'|`(?P<template>[^`]*)`)"#,
        alternation(suite_functions),
        alternation(test_functions),
    );
    Regex::new(&pattern).expect("declaration regex is valid")
}

/// Returns the bracket depth at each byte offset of `code`.
///
/// Offsets inside string literals, after a `//` comment, or in the middle of a multi-byte
/// character map to `None`.
fn nesting_depths(code: &str) -> Vec<Option<usize>> {
    let mut depths = vec![None; code.len()];
    let mut depth = 0_usize;
    let mut quote = None;
    let mut escaped = false;
    let mut chars = code.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        depths[offset] = Some(depth);
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            '/' if chars.peek().is_some_and(|&(_, next)| next == '/') => {
                depths[offset] = None;
                break;
            }
            _ => {}
        }
    }

    depths
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}
