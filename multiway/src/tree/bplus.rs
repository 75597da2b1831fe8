//! B+-tree with a linked leaf chain.
//!
//! Only leaves store keys. Internal keys are routing copies: a leaf split
//! promotes a copy of the right leaf's first key and keeps the original in
//! the leaf. Leaves live in an arena owned by the tree and are chained left
//! to right through `LeafId` links, so a full ordered scan never touches an
//! internal node.
//!
//! Routing rule: `children[i]` holds keys `< keys[i]`, `children[i + 1]`
//! holds keys `>= keys[i]`.

use tracing::{debug, trace};

use crate::tree::node::{Degree, InternalNode, Key, insert_sorted};
use crate::tree::{InvariantViolation, SearchTree, TreeError};

/// Index of a leaf in its tree's leaf arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(usize);

impl LeafId {
    /// Position of the leaf in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A B+-tree leaf.
#[derive(Debug, Default)]
pub struct LeafNode {
    /// Keys in ascending order.
    pub keys: Vec<Key>,
    /// Next leaf in key order. Not an ownership edge.
    pub next: Option<LeafId>,
}

impl LeafNode {
    /// Scan the leaf for an exact match.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Split a full leaf.
    ///
    /// The left leaf keeps the leading `t - 1` keys and the returned right
    /// leaf gets the remaining `t`. The returned separator is a copy of the
    /// right leaf's first key. The right leaf inherits this leaf's `next`;
    /// the caller must point `next` at the new leaf once it has an id.
    #[must_use]
    fn split(&mut self, degree: Degree) -> (Key, Self) {
        debug_assert_eq!(self.keys.len(), degree.max_keys());

        let right_keys = self.keys.split_off(degree.get() - 1);
        let separator = right_keys[0];

        let right = Self {
            keys: right_keys,
            next: self.next,
        };
        (separator, right)
    }
}

/// A B+-tree node. Leaves are referenced by id, internal nodes are owned.
#[derive(Debug)]
pub enum BPlusNode {
    Leaf(LeafId),
    Internal(InternalNode<Self>),
}

impl BPlusNode {
    fn key_count(&self, leaves: &[LeafNode]) -> usize {
        match self {
            Self::Leaf(id) => leaves[id.0].keys.len(),
            Self::Internal(node) => node.keys.len(),
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

    /// Insert into a subtree whose root is known not to be full.
    fn insert_non_full(&mut self, leaves: &mut Vec<LeafNode>, degree: Degree, key: Key) {
        match self {
            Self::Leaf(id) => {
                insert_sorted(&mut leaves[id.0].keys, key);
            }
            Self::Internal(node) => {
                let mut index = node.keys.partition_point(|&k| k <= key);
                if node.children[index].key_count(leaves) >= degree.max_keys() {
                    split_child(node, index, leaves, degree);
                    if key >= node.keys[index] {
                        index += 1;
                    }
                }
                node.children[index].insert_non_full(leaves, degree, key);
            }
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self.children().iter().map(Self::count_nodes).sum::<usize>()
    }
}

/// Split the full child at `index` of `parent`.
///
/// Leaf children copy their separator up and are re-threaded into the
/// leaf chain; internal children move their median up.
fn split_child(
    parent: &mut InternalNode<BPlusNode>,
    index: usize,
    leaves: &mut Vec<LeafNode>,
    degree: Degree,
) {
    let (separator, right) = match &mut parent.children[index] {
        BPlusNode::Leaf(id) => {
            let right_id = LeafId(leaves.len());
            let left = &mut leaves[id.0];
            let (separator, right_leaf) = left.split(degree);
            left.next = Some(right_id);
            leaves.push(right_leaf);
            trace!("split b+ leaf {}, copying up {separator}", id.0);
            (separator, BPlusNode::Leaf(right_id))
        }
        BPlusNode::Internal(child) => {
            let (median, right) = child.split(degree);
            trace!("split b+ internal child {index}, promoting {median}");
            (median, BPlusNode::Internal(right))
        }
    };
    parent.insert_split(index, separator, right);
}

/// An in-memory B+-tree of unique integer keys.
#[derive(Debug)]
pub struct BPlusTree {
    degree: Degree,
    root: BPlusNode,
    leaves: Vec<LeafNode>,
    len: usize,
}

impl BPlusTree {
    /// Create an empty tree whose root is a single empty leaf.
    #[must_use]
    pub fn new(degree: Degree) -> Self {
        Self {
            degree,
            root: BPlusNode::Leaf(LeafId(0)),
            leaves: vec![LeafNode::default()],
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
    pub const fn root(&self) -> &BPlusNode {
        &self.root
    }

    /// Look up a leaf by id.
    #[must_use]
    pub fn leaf(&self, id: LeafId) -> Option<&LeafNode> {
        self.leaves.get(id.0)
    }

    /// Keys stored in a node: leaf keys for a leaf, separators otherwise.
    #[must_use]
    pub fn node_keys<'a>(&'a self, node: &'a BPlusNode) -> &'a [Key] {
        match node {
            BPlusNode::Leaf(id) => self
                .leaves
                .get(id.0)
                .map_or(&[] as &[Key], |leaf| leaf.keys.as_slice()),
            BPlusNode::Internal(inner) => &inner.keys,
        }
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

    fn find_leaf(&self, key: Key) -> LeafId {
        let mut node = &self.root;

        loop {
            match node {
                BPlusNode::Leaf(id) => return *id,
                BPlusNode::Internal(inner) => {
                    let index = inner.keys.partition_point(|&k| k <= key);
                    node = &inner.children[index];
                }
            }
        }
    }

    /// Find the leaf holding `key`.
    ///
    /// Internal nodes only route; the search always ends at a leaf.
    #[must_use]
    pub fn search(&self, key: Key) -> Option<&LeafNode> {
        self.leaf(self.find_leaf(key))
            .filter(|leaf| leaf.contains(key))
    }

    /// Insert a key.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateKey` if the key is already stored. The
    /// tree is not modified in that case.
    pub fn insert(&mut self, key: Key) -> Result<(), TreeError> {
        if self.search(key).is_some() {
            return Err(TreeError::DuplicateKey(key));
        }

        if self.root.key_count(&self.leaves) >= self.degree.max_keys() {
            let old_root = std::mem::replace(&mut self.root, BPlusNode::Leaf(LeafId(0)));
            let mut new_root = InternalNode::over(old_root);
            split_child(&mut new_root, 0, &mut self.leaves, self.degree);
            self.root = BPlusNode::Internal(new_root);
            debug!("b+ tree root split, height is now {}", self.height());
        }

        self.root.insert_non_full(&mut self.leaves, self.degree, key);
        self.len += 1;
        Ok(())
    }

    /// The leftmost leaf, reached by following `children[0]`.
    #[must_use]
    pub fn first_leaf(&self) -> LeafId {
        let mut node = &self.root;
        loop {
            match node {
                BPlusNode::Leaf(id) => return *id,
                BPlusNode::Internal(inner) => match inner.children.first() {
                    Some(first) => node = first,
                    None => return LeafId(0),
                },
            }
        }
    }

    /// Walk the leaf chain from the leftmost leaf.
    #[must_use]
    pub fn leaf_chain(&self) -> LeafChain<'_> {
        LeafChain {
            leaves: &self.leaves,
            current: Some(self.first_leaf()),
        }
    }

    /// All keys in ascending order, read off the leaf chain.
    #[must_use]
    pub fn traverse_leaves(&self) -> Vec<Key> {
        let mut out = Vec::with_capacity(self.len);
        for leaf in self.leaf_chain() {
            out.extend_from_slice(&leaf.keys);
        }
        out
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
}

/// Iterator over the leaves of a `BPlusTree` in key order.
pub struct LeafChain<'a> {
    leaves: &'a [LeafNode],
    current: Option<LeafId>,
}

impl<'a> Iterator for LeafChain<'a> {
    type Item = &'a LeafNode;

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.leaves.get(self.current?.0)?;
        self.current = leaf.next;
        Some(leaf)
    }
}

impl SearchTree for BPlusTree {
    fn name(&self) -> &'static str {
        "B+-tree"
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

    fn tree(t: usize) -> BPlusTree {
        BPlusTree::with_degree(t).expect("valid degree")
    }

    fn leaf_keys(tree: &BPlusTree) -> Vec<Vec<Key>> {
        tree.leaf_chain().map(|leaf| leaf.keys.clone()).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = tree(2);
        assert!(tree.is_empty());
        assert!(tree.search(7).is_none());
        assert!(tree.traverse_leaves().is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_single_key_minimum_degree() {
        let mut tree = tree(2);
        tree.insert(42).expect("insert");

        assert!(tree.search(42).is_some());
        assert!(tree.search(7).is_none());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.traverse_leaves(), vec![42]);
    }

    #[test]
    fn test_scenario_sequence_degree_three() {
        let mut tree = tree(3);
        for key in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(key).expect("insert");
            tree.check_invariants().expect("invariants hold");
        }

        assert_eq!(tree.traverse_leaves(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
        assert_eq!(tree.height(), 2);
        // Leaf split at 30 copied 10 up and kept it in the right leaf.
        assert_eq!(tree.node_keys(tree.root()), &[10]);
        assert_eq!(
            leaf_keys(&tree),
            vec![vec![5, 6, 7], vec![10, 12, 17, 20, 30]]
        );
    }

    #[test]
    fn test_leaf_split_copies_separator() {
        let mut tree = tree(2);
        for key in [1, 2, 3, 4] {
            tree.insert(key).expect("insert");
        }

        // Full leaf [1, 2, 3] splits into [1] and [2, 3]; 2 is copied up.
        assert_eq!(tree.node_keys(tree.root()), &[2]);
        assert_eq!(leaf_keys(&tree), vec![vec![1], vec![2, 3, 4]]);

        let leaf = tree.search(2).expect("separator key still in a leaf");
        assert_eq!(leaf.keys, vec![2, 3, 4]);
    }

    #[test]
    fn test_leaf_split_rethreads_chain() {
        let mut tree = tree(2);
        // Fill the middle leaf so its split lands between two existing leaves.
        for key in [10, 20, 30, 40, 50, 25, 26, 27] {
            tree.insert(key).expect("insert");
        }

        let chain = leaf_keys(&tree);
        let flattened: Vec<Key> = chain.iter().flatten().copied().collect();
        assert_eq!(flattened, vec![10, 20, 25, 26, 27, 30, 40, 50]);
        assert!(chain.len() >= 3);
        tree.check_invariants().expect("invariants hold");
    }

    #[test]
    fn test_search_routes_equal_keys_right() {
        let mut tree = tree(2);
        for key in 1..=20 {
            tree.insert(key).expect("insert");
        }
        for key in 1..=20 {
            let leaf = tree.search(key).expect("found");
            assert!(leaf.contains(key));
        }
        assert!(tree.search(0).is_none());
        assert!(tree.search(21).is_none());
    }

    #[test]
    fn test_internal_split_moves_median() {
        let mut tree = tree(2);
        for key in 1..=12 {
            tree.insert(key).expect("insert");
        }
        assert!(tree.height() >= 3);

        // Every separator appears exactly once across internal levels.
        let mut separators = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if let BPlusNode::Internal(inner) = node {
                separators.extend_from_slice(&inner.keys);
                stack.extend(inner.children.iter());
            }
        }
        let mut deduped = separators.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), separators.len());
        tree.check_invariants().expect("invariants hold");
    }

    #[test]
    fn test_duplicate_rejected_without_mutation() {
        let mut tree = tree(2);
        for key in [1, 2, 3] {
            tree.insert(key).expect("insert");
        }
        assert_eq!(tree.insert(3), Err(TreeError::DuplicateKey(3)));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.traverse_leaves(), vec![1, 2, 3]);
    }

    #[test]
    fn test_traverse_is_restartable() {
        let mut tree = tree(3);
        for key in (0..100).rev() {
            tree.insert(key).expect("insert");
        }
        let first = tree.traverse_leaves();
        let second = tree.traverse_leaves();
        assert_eq!(first, second);
        assert_eq!(first, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_node_count_matches_leaf_chain() {
        let mut tree = tree(3);
        for key in 0..200 {
            tree.insert(key * 7 % 200).expect("insert");
        }
        let leaves = tree.leaf_chain().count();
        assert!(tree.node_count() > leaves);
        assert_eq!(tree.len(), 200);
    }
}
