//! Text rendering of trees and comparison tables.
//!
//! Trees are drawn one node per line, indented four spaces per level, with
//! leaves marked:
//!
//! ```text
//! [10]
//!     [5, 6, 7] (leaf)
//!     [12, 17, 20, 30] (leaf)
//! ```

use std::fmt;

use crate::tree::{BPlusNode, BPlusTree, BTree, BTreeNode, Key, SearchTree, TreeStats};

const INDENT: &str = "    ";

const EMPTY: &str = "tree is empty";

fn write_node_line(
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    keys: &[Key],
    leaf: bool,
) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    f.write_str("[")?;
    write_keys(f, keys, ", ")?;
    f.write_str("]")?;
    if leaf {
        f.write_str(" (leaf)")?;
    }
    writeln!(f)
}

fn write_keys(f: &mut fmt::Formatter<'_>, keys: &[Key], separator: &str) -> fmt::Result {
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{key}")?;
    }
    Ok(())
}

/// Indented rendering of a `BTree`.
pub struct BTreeView<'a>(pub &'a BTree);

impl BTreeView<'_> {
    fn write_node(f: &mut fmt::Formatter<'_>, node: &BTreeNode, depth: usize) -> fmt::Result {
        write_node_line(f, depth, node.keys(), node.is_leaf())?;
        for child in node.children() {
            Self::write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for BTreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} (degree {}) ===", self.0.name(), self.0.degree())?;
        if self.0.is_empty() {
            return writeln!(f, "{EMPTY}");
        }
        Self::write_node(f, self.0.root(), 0)
    }
}

/// Indented rendering of a `BPlusTree`, followed by its leaf sequence.
pub struct BPlusTreeView<'a>(pub &'a BPlusTree);

impl BPlusTreeView<'_> {
    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &BPlusNode,
        depth: usize,
    ) -> fmt::Result {
        let leaf = matches!(node, BPlusNode::Leaf(_));
        write_node_line(f, depth, self.0.node_keys(node), leaf)?;
        for child in node.children() {
            self.write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for BPlusTreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} (degree {}) ===", self.0.name(), self.0.degree())?;
        if self.0.is_empty() {
            return writeln!(f, "{EMPTY}");
        }
        self.write_node(f, self.0.root(), 0)?;
        writeln!(f)?;
        writeln!(f, "leaf sequence: {}", LeafSequence(self.0))
    }
}

/// The B+-tree's keys read off the leaf chain, space separated.
pub struct LeafSequence<'a>(pub &'a BPlusTree);

impl fmt::Display for LeafSequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_keys(f, &self.0.traverse_leaves(), " ")
    }
}

/// Side-by-side structural comparison of two trees.
pub struct Comparison<'a> {
    pub left: (&'a str, TreeStats),
    pub right: (&'a str, TreeStats),
}

impl<'a> Comparison<'a> {
    /// Compare two trees as they are now.
    #[must_use]
    pub fn of(left: &'a dyn SearchTree, right: &'a dyn SearchTree) -> Self {
        Self {
            left: (left.name(), left.stats()),
            right: (right.name(), right.stats()),
        }
    }
}

impl fmt::Display for Comparison<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left_name, left) = self.left;
        let (right_name, right) = self.right;
        let rule = "-".repeat(50);

        writeln!(
            f,
            "{:<25}{:<12}{:<12}",
            "characteristic", left_name, right_name
        )?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:<25}{:<12}{:<12}",
            "height:", left.height, right.height
        )?;
        writeln!(
            f,
            "{:<25}{:<12}{:<12}",
            "node count:", left.node_count, right.node_count
        )?;
        writeln!(
            f,
            "{:<25}{:<12}{:<12}",
            "degree:", left.degree.get(), right.degree.get()
        )?;
        writeln!(f, "{:<25}{:<12}{:<12}", "keys:", left.keys, right.keys)
    }
}
