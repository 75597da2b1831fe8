//! In-memory multiway search trees.
//!
//! Two engines share the same minimum-degree discipline and proactive
//! (split-before-descent) insertion:
//!
//! - [`BTree`]: every node holds live keys; a search may stop at any level.
//! - [`BPlusTree`]: only leaves hold keys; internal keys are routing copies
//!   and leaves are chained left to right for ordered scans.
//!
//! # Usage
//!
//! ```
//! use multiway::tree::{BPlusTree, BTree, Degree};
//!
//! let degree = Degree::new(3).expect("degree >= 2");
//! let mut btree = BTree::new(degree);
//! let mut bplus = BPlusTree::new(degree);
//!
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     btree.insert(key).expect("unique key");
//!     bplus.insert(key).expect("unique key");
//! }
//!
//! assert!(btree.search(12).is_some());
//! assert!(bplus.search(4).is_none());
//! assert_eq!(bplus.traverse_leaves(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
//! ```

mod bplus;
mod btree;
mod invariants;
mod node;


pub use bplus::{BPlusNode, BPlusTree, LeafChain, LeafId, LeafNode};
pub use btree::{BTree, BTreeNode};
pub use invariants::InvariantViolation;
pub use node::{Degree, InternalNode, Key};

/// Operations common to both engines.
///
/// Lets callers compare the two trees without caring which one they hold.
pub trait SearchTree {
    /// Human readable name of the engine.
    fn name(&self) -> &'static str;

    /// The minimum degree the tree was built with.
    fn degree(&self) -> Degree;

    /// Insert a key.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateKey` if the key is already stored.
    fn insert(&mut self, key: Key) -> Result<(), TreeError>;

    /// Check whether a key is stored.
    fn contains(&self, key: Key) -> bool;

    /// Number of levels, counting the leaf level.
    fn height(&self) -> usize;

    /// Number of nodes reachable from the root.
    fn node_count(&self) -> usize;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Check whether the tree holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate the structural invariants of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    fn check_invariants(&self) -> Result<(), InvariantViolation>;

    /// Snapshot of the structural figures used for reporting.
    fn stats(&self) -> TreeStats {
        TreeStats {
            height: self.height(),
            node_count: self.node_count(),
            degree: self.degree(),
            keys: self.len(),
        }
    }
}

/// Structural figures of a tree at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub height: usize,
    pub node_count: usize,
    pub degree: Degree,
    pub keys: usize,
}

/// Errors returned by tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Minimum degree below 2 or too large for the node capacity to fit.
    InvalidDegree(usize),
    /// Key is already stored in the tree.
    DuplicateKey(Key),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDegree(t) if *t < Degree::MIN => {
                write!(f, "invalid degree: {t} (must be at least {})", Degree::MIN)
            }
            Self::InvalidDegree(t) => {
                write!(f, "invalid degree: {t} (must be at most {})", Degree::MAX)
            }
            Self::DuplicateKey(key) => write!(f, "key {key} already exists"),
        }
    }
}

impl std::error::Error for TreeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_error_display() {
        assert_eq!(
            TreeError::InvalidDegree(1).to_string(),
            "invalid degree: 1 (must be at least 2)"
        );
        assert_eq!(
            TreeError::InvalidDegree(usize::MAX).to_string(),
            format!(
                "invalid degree: {} (must be at most {})",
                usize::MAX, Degree::MAX
            )
        );
        assert_eq!(
            TreeError::DuplicateKey(42).to_string(),
            "key 42 already exists"
        );
    }

    #[test]
    fn test_stats_through_trait_objects() {
        let degree = Degree::new(2).expect("valid degree");
        let mut trees: Vec<Box<dyn SearchTree>> =
            vec![Box::new(BTree::new(degree)), Box::new(BPlusTree::new(degree))];

        for tree in &mut trees {
            assert!(tree.is_empty());
            for key in 1..=10 {
                tree.insert(key).expect("insert");
            }
            let stats = tree.stats();
            assert_eq!(stats.keys, 10);
            assert_eq!(stats.degree, degree);
            assert_eq!(stats.height, tree.height());
            assert!(stats.node_count > 1);
            tree.check_invariants().expect("invariants hold");
        }
    }
}
