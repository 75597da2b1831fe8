//! Classic B-tree.
//!
//! Every node, leaf or internal, stores live keys. Insertion splits full
//! nodes on the way down, so a parent always has room for the median a
//! child split promotes, and the tree only grows in height when the root
//! itself is split.

use tracing::{debug, trace};

use crate::tree::node::{Degree, InternalNode, Key, insert_sorted};
use crate::tree::{InvariantViolation, SearchTree, TreeError};

/// A B-tree node.
#[derive(Debug)]
pub enum BTreeNode {
    /// Keys in ascending order, no children.
    Leaf(Vec<Key>),
    /// Keys interleaved with owned children.
    Internal(InternalNode<Self>),
}

impl BTreeNode {
    /// Keys stored in this node.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        match self {
            Self::Leaf(keys) => keys,
            Self::Internal(node) => &node.keys,
        }
    }

    /// Children of this node. Empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Leaf(_) => &[],
            Self::Internal(node) => &node.children,
        }
    }

    /// Check if this node is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    fn is_full(&self, degree: Degree) -> bool {
        self.keys().len() >= degree.max_keys()
    }

    /// Split a full node, removing and returning its median.
    fn split(&mut self, degree: Degree) -> (Key, Self) {
        match self {
            Self::Leaf(keys) => {
                let mut right = keys.split_off(degree.get() - 1);
                let median = right.remove(0);
                (median, Self::Leaf(right))
            }
            Self::Internal(node) => {
                let (median, right) = node.split(degree);
                (median, Self::Internal(right))
            }
        }
    }

    /// Insert into a subtree whose root is known not to be full.
    fn insert_non_full(&mut self, degree: Degree, key: Key) {
        match self {
            Self::Leaf(keys) => {
                insert_sorted(keys, key);
            }
            Self::Internal(node) => {
                let mut index = node.keys.partition_point(|&k| k < key);
                if node.children[index].is_full(degree) {
                    split_child(node, index, degree);
                    if key > node.keys[index] {
                        index += 1;
                    }
                }
                node.children[index].insert_non_full(degree, key);
            }
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self.children().iter().map(Self::count_nodes).sum::<usize>()
    }

    fn collect_keys(&self, out: &mut Vec<Key>) {
        match self {
            Self::Leaf(keys) => out.extend_from_slice(keys),
            Self::Internal(node) => {
                for (child, key) in node.children.iter().zip(&node.keys) {
                    child.collect_keys(out);
                    out.push(*key);
                }
                if let Some(last) = node.children.last() {
                    last.collect_keys(out);
                }
            }
        }
    }
}

/// Split the full child at `index` and promote its median into `parent`.
fn split_child(parent: &mut InternalNode<BTreeNode>, index: usize, degree: Degree) {
    let (median, right) = parent.children[index].split(degree);
    trace!("split b-tree child {index}, promoting {median}");
    parent.insert_split(index, median, right);
}

/// An in-memory B-tree of unique integer keys.
#[derive(Debug)]
pub struct BTree {
    degree: Degree,
    root: BTreeNode,
    len: usize,
}

impl BTree {
    /// Create an empty tree whose root is a single empty leaf.
    #[must_use]
    pub const fn new(degree: Degree) -> Self {
        Self {
            degree,
            root: BTreeNode::Leaf(Vec::new()),
            len: 0,
        }
    }

    /// Create an empty tree from a raw minimum degree.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidDegree` if `t < 2` or `t > Degree::MAX`.
    pub fn with_degree(t: usize) -> Result<Self, TreeError> {
        Ok(Self::new(Degree::new(t)?))
    }

    /// The minimum degree of the tree.
    #[must_use]
    pub const fn degree(&self) -> Degree {
        self.degree
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> &BTreeNode {
        &self.root
    }

    /// Number of stored keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check whether the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find the node holding `key`.
    ///
    /// The key may live in an internal node, in which case the search stops
    /// there without visiting the leaves below.
    #[must_use]
    pub fn search(&self, key: Key) -> Option<&BTreeNode> {
        let mut node = &self.root;

        loop {
            let keys = node.keys();
            let index = keys.partition_point(|&k| k < key);
            if keys.get(index) == Some(&key) {
                return Some(node);
            }

            match node {
                BTreeNode::Leaf(_) => return None,
                BTreeNode::Internal(inner) => node = &inner.children[index],
            }
        }
    }

    /// Insert a key.
    ///
    /// If the root is full it is split first; this is the only way the tree
    /// grows in height.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateKey` if the key is already stored. The
    /// tree is not modified in that case.
    pub fn insert(&mut self, key: Key) -> Result<(), TreeError> {
        if self.search(key).is_some() {
            return Err(TreeError::DuplicateKey(key));
        }

        if self.root.is_full(self.degree) {
            let old_root = std::mem::replace(&mut self.root, BTreeNode::Leaf(Vec::new()));
            let mut new_root = InternalNode::over(old_root);
            split_child(&mut new_root, 0, self.degree);
            self.root = BTreeNode::Internal(new_root);
            debug!("b-tree root split, height is now {}", self.height());
        }

        self.root.insert_non_full(self.degree, key);
        self.len += 1;
        Ok(())
    }

    /// Number of levels, counting the leaf level.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(first) = node.children().first() {
            height += 1;
            node = first;
        }
        height
    }

    /// Number of nodes, internal and leaf, reachable from the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// All keys in ascending order, by in-order traversal.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_keys(&mut out);
        out
    }
}

impl SearchTree for BTree {
    fn name(&self) -> &'static str {
        "B-tree"
    }

    fn degree(&self) -> Degree {
        self.degree
    }

    fn insert(&mut self, key: Key) -> Result<(), TreeError> {
        Self::insert(self, key)
    }

    fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    fn height(&self) -> usize {
        Self::height(self)
    }

    fn node_count(&self) -> usize {
        Self::node_count(self)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        Self::check_invariants(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(t: usize) -> BTree {
        BTree::with_degree(t).expect("valid degree")
    }

    #[test]
    fn test_empty_tree() {
        let tree = tree(2);
        assert!(tree.is_empty());
        assert!(tree.search(7).is_none());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_single_key_minimum_degree() {
        let mut tree = tree(2);
        tree.insert(42).expect("insert");

        assert!(tree.search(42).is_some());
        assert!(tree.search(7).is_none());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_invalid_degree() {
        assert_eq!(
            BTree::with_degree(1).map(|t| t.len()),
            Err(TreeError::InvalidDegree(1))
        );
        assert_eq!(
            BTree::with_degree(usize::MAX).map(|t| t.len()),
            Err(TreeError::InvalidDegree(usize::MAX))
        );
    }

    #[test]
    fn test_scenario_sequence_degree_three() {
        let mut tree = tree(3);
        let mut root_splits = 0;

        for key in [10, 20, 5, 6, 12, 30, 7, 17] {
            let before = tree.height();
            tree.insert(key).expect("insert");
            if tree.height() > before {
                root_splits += 1;
                assert_eq!(tree.height(), before + 1);
            }
            tree.check_invariants().expect("invariants hold");
        }

        assert_eq!(root_splits, 1);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.root().keys(), &[10]);
        assert_eq!(tree.root().children()[0].keys(), &[5, 6, 7]);
        assert_eq!(tree.root().children()[1].keys(), &[12, 17, 20, 30]);
        assert_eq!(tree.keys(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
    }

    #[test]
    fn test_root_split_happens_when_root_full() {
        let mut tree = tree(3);
        for key in [10, 20, 5, 6, 12] {
            tree.insert(key).expect("insert");
        }
        assert_eq!(tree.root().keys().len(), 5);
        assert_eq!(tree.height(), 1);

        tree.insert(30).expect("insert");
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_search_stops_at_internal_node() {
        let mut tree = tree(2);
        for key in [1, 2, 3, 4] {
            tree.insert(key).expect("insert");
        }
        // Root [2] over [1] and [3, 4].
        let node = tree.search(2).expect("found");
        assert!(!node.is_leaf());
        assert_eq!(node.keys(), &[2]);

        let leaf = tree.search(4).expect("found");
        assert!(leaf.is_leaf());
    }

    #[test]
    fn test_duplicate_rejected_without_mutation() {
        let mut tree = tree(2);
        for key in [1, 2, 3] {
            tree.insert(key).expect("insert");
        }
        // Root is full; a duplicate must not trigger the root split.
        assert_eq!(tree.insert(2), Err(TreeError::DuplicateKey(2)));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_many_inserts_descending() {
        let mut tree = tree(4);
        for key in (0..500).rev() {
            tree.insert(key).expect("insert");
        }

        assert_eq!(tree.len(), 500);
        assert_eq!(tree.keys(), (0..500).collect::<Vec<_>>());
        for key in 0..500 {
            assert!(tree.search(key).is_some(), "missing {key}");
        }
        assert!(tree.search(500).is_none());
        assert!(tree.search(-1).is_none());
        tree.check_invariants().expect("invariants hold");
    }

    #[test]
    fn test_negative_keys() {
        let mut tree = tree(2);
        for key in [-5, 3, -100, 0, 7, -1] {
            tree.insert(key).expect("insert");
        }
        assert_eq!(tree.keys(), vec![-100, -5, -1, 0, 3, 7]);
        tree.check_invariants().expect("invariants hold");
    }
}
