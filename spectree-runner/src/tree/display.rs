// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{NodeIndex, TestTree, TreeStore};
use crate::{
    errors::WriteOutputError,
    helpers::{one_based, plural},
    output_format::{OutputFormat, Styles},
};
use owo_colors::OwoColorize;
use spectree_metadata::{NodeKind, TreeSummary};
use std::io::{self, Write};

impl TreeStore {
    /// Outputs every tree in the store in the given format.
    pub fn write(
        &self,
        output_format: OutputFormat,
        mut writer: impl Write,
        colorize: bool,
    ) -> Result<(), WriteOutputError> {
        match output_format {
            OutputFormat::Human { verbose } => {
                let styles = Styles::new(colorize);
                for tree in self.iter() {
                    tree.write_human_impl(&mut writer, verbose, &styles)
                        .map_err(WriteOutputError::Io)?;
                }
                Ok(())
            }
            OutputFormat::Serializable(format) => format
                .to_writer(&self.to_summaries(), writer)
                .map_err(WriteOutputError::Json),
        }
    }

    /// Returns serializable summaries for every tree, ordered by path.
    pub fn to_summaries(&self) -> Vec<TreeSummary> {
        self.iter().map(TestTree::to_summary).collect()
    }
}

impl TestTree {
    /// Writes this tree in a human-readable format.
    ///
    /// In non-verbose mode, files without tests are omitted.
    pub fn write_human(
        &self,
        writer: impl Write,
        verbose: bool,
        colorize: bool,
    ) -> io::Result<()> {
        self.write_human_impl(writer, verbose, &Styles::new(colorize))
    }

    fn write_human_impl(
        &self,
        mut writer: impl Write,
        verbose: bool,
        styles: &Styles,
    ) -> io::Result<()> {
        let test_count = self.test_count();
        if !verbose && test_count == 0 {
            return Ok(());
        }

        if verbose {
            writeln!(
                writer,
                "{} ({} {}):",
                self.path().style(styles.file),
                test_count.style(styles.count),
                plural::tests_str(test_count),
            )?;
        } else {
            writeln!(writer, "{}:", self.path().style(styles.file))?;
        }

        let top_level: Vec<_> = self.root().children().collect();
        let mut stack: Vec<(NodeIndex, usize)> =
            top_level.into_iter().rev().map(|child| (child, 1)).collect();
        while let Some((index, depth)) = stack.pop() {
            self.write_node(&mut writer, index, depth, verbose, styles)?;
            let children: Vec<_> = self.node(index).children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        if verbose && !self.failures().is_empty() {
            writeln!(writer, "  {}", "failures:".style(styles.field))?;
            for failure in self.failures() {
                writeln!(
                    writer,
                    "    {}:{}: {}: {}",
                    one_based(failure.line),
                    one_based(failure.column),
                    failure.node_id.style(styles.test_name),
                    failure.message,
                )?;
            }
        }

        Ok(())
    }

    fn write_node(
        &self,
        writer: &mut impl Write,
        index: NodeIndex,
        depth: usize,
        verbose: bool,
        styles: &Styles,
    ) -> io::Result<()> {
        let node = self.node(index);
        let indent = "    ".repeat(depth);
        let style = match node.kind() {
            NodeKind::Test => styles.test_name,
            NodeKind::File | NodeKind::Suite => styles.suite,
        };

        if !verbose {
            return writeln!(writer, "{indent}{}", node.label().style(style));
        }

        let range = node.source_range();
        let lines = if range.start == range.end {
            format!("line {}", one_based(range.start))
        } else {
            format!("lines {}-{}", one_based(range.start), one_based(range.end))
        };
        write!(
            writer,
            "{indent}{} {} ({lines})",
            node.kind().style(styles.field),
            node.label().style(style),
        )?;
        if !node.tags().is_empty() {
            write!(writer, " {}", "tags:".style(styles.field))?;
            for tag in node.tags() {
                write!(writer, " {}", tag.style(styles.tag))?;
            }
        }
        writeln!(writer)
    }
}
