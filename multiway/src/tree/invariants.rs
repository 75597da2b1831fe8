//! Structural invariant checking for both engines.
//!
//! Checks, for every node reachable from the root:
//! - key count within `t - 1 ..= 2t - 1` (root exempt from the lower bound)
//! - keys strictly ascending and inside the range allowed by the parent
//! - internal nodes own exactly `keys + 1` children
//! - all leaves at the same depth
//!
//! For the B+-tree it also checks that the leaf chain visits exactly the
//! leaves reachable from the root, in left-to-right order.

use std::fmt;

use crate::tree::bplus::{BPlusNode, BPlusTree, LeafId, LeafNode};
use crate::tree::btree::{BTree, BTreeNode};
use crate::tree::node::{Degree, Key};

/// A broken structural invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A node holds too few or too many keys.
    KeyCount {
        depth: usize,
        count: usize,
        min: usize,
        max: usize,
    },
    /// An internal node does not own `keys + 1` children.
    Arity {
        depth: usize,
        keys: usize,
        children: usize,
    },
    /// Keys within a node are not strictly ascending.
    Unordered {
        depth: usize,
        previous: Key,
        next: Key,
    },
    /// A key falls outside the range its parent's separators allow.
    OutOfRange {
        depth: usize,
        key: Key,
        lower: Option<Key>,
        upper: Option<Key>,
    },
    /// Leaves found at different depths.
    UnevenLeaves { expected: usize, found: usize },
    /// A leaf id does not resolve to a leaf.
    DanglingLeaf(LeafId),
    /// The leaf chain diverges from the leaves reachable from the root.
    LeafChain { position: usize },
    /// The recorded key count disagrees with the keys actually stored.
    Len { recorded: usize, actual: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyCount {
                depth,
                count,
                min,
                max,
            } => write!(
                f,
                "node at depth {depth} holds {count} keys (allowed {min}..={max})"
            ),
            Self::Arity {
                depth,
                keys,
                children,
            } => write!(
                f,
                "internal node at depth {depth} has {keys} keys but {children} children"
            ),
            Self::Unordered {
                depth,
                previous,
                next,
            } => write!(
                f,
                "keys out of order at depth {depth}: {previous} before {next}"
            ),
            Self::OutOfRange {
                depth,
                key,
                lower,
                upper,
            } => write!(
                f,
                "key {key} at depth {depth} outside separator range ({lower:?}, {upper:?})"
            ),
            Self::UnevenLeaves { expected, found } => write!(
                f,
                "leaf at depth {found}, expected all leaves at depth {expected}"
            ),
            Self::DanglingLeaf(id) => write!(f, "leaf id {} does not exist", id.index()),
            Self::LeafChain { position } => {
                write!(f, "leaf chain diverges from tree order at leaf {position}")
            }
            Self::Len { recorded, actual } => {
                write!(f, "tree records {recorded} keys but stores {actual}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Which engine's separator semantics apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// Separators are live keys; children hold keys strictly between them.
    BTree,
    /// Separators are copies; the right child may hold a key equal to one.
    BPlus,
}

struct Walk {
    degree: Degree,
    flavor: Flavor,
    leaf_depth: Option<usize>,
    stored_keys: usize,
}

impl Walk {
    const fn new(degree: Degree, flavor: Flavor) -> Self {
        Self {
            degree,
            flavor,
            leaf_depth: None,
            stored_keys: 0,
        }
    }

    fn check_keys(
        &self,
        keys: &[Key],
        depth: usize,
        lower: Option<Key>,
        upper: Option<Key>,
    ) -> Result<(), InvariantViolation> {
        let min = if depth == 0 { 0 } else { self.degree.min_keys() };
        let max = self.degree.max_keys();
        if keys.len() < min || keys.len() > max {
            return Err(InvariantViolation::KeyCount {
                depth,
                count: keys.len(),
                min,
                max,
            });
        }

        for pair in keys.windows(2) {
            if pair[0] >= pair[1] {
                return Err(InvariantViolation::Unordered {
                    depth,
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        for &key in keys {
            let below = lower.is_some_and(|l| match self.flavor {
                Flavor::BTree => key <= l,
                Flavor::BPlus => key < l,
            });
            let above = upper.is_some_and(|u| key >= u);
            if below || above {
                return Err(InvariantViolation::OutOfRange {
                    depth,
                    key,
                    lower,
                    upper,
                });
            }
        }

        Ok(())
    }

    fn leaf(
        &mut self,
        keys: &[Key],
        depth: usize,
        lower: Option<Key>,
        upper: Option<Key>,
    ) -> Result<(), InvariantViolation> {
        self.check_keys(keys, depth, lower, upper)?;

        match self.leaf_depth {
            None => self.leaf_depth = Some(depth),
            Some(expected) if expected != depth => {
                return Err(InvariantViolation::UnevenLeaves {
                    expected,
                    found: depth,
                });
            }
            Some(_) => {}
        }

        self.stored_keys += keys.len();
        Ok(())
    }

    fn internal(
        &mut self,
        keys: &[Key],
        children: usize,
        depth: usize,
        lower: Option<Key>,
        upper: Option<Key>,
    ) -> Result<(), InvariantViolation> {
        self.check_keys(keys, depth, lower, upper)?;

        if keys.is_empty() || children != keys.len() + 1 {
            return Err(InvariantViolation::Arity {
                depth,
                keys: keys.len(),
                children,
            });
        }

        if self.flavor == Flavor::BTree {
            self.stored_keys += keys.len();
        }
        Ok(())
    }

    fn finish(&self, recorded: usize) -> Result<(), InvariantViolation> {
        if self.stored_keys == recorded {
            Ok(())
        } else {
            Err(InvariantViolation::Len {
                recorded,
                actual: self.stored_keys,
            })
        }
    }
}

/// Range allowed for child `index` of a node with the given separators.
fn child_bounds(
    keys: &[Key],
    index: usize,
    lower: Option<Key>,
    upper: Option<Key>,
) -> (Option<Key>, Option<Key>) {
    let low = index
        .checked_sub(1)
        .and_then(|i| keys.get(i).copied())
        .or(lower);
    let high = keys.get(index).copied().or(upper);
    (low, high)
}

fn walk_btree(
    walk: &mut Walk,
    node: &BTreeNode,
    depth: usize,
    lower: Option<Key>,
    upper: Option<Key>,
) -> Result<(), InvariantViolation> {
    match node {
        BTreeNode::Leaf(keys) => walk.leaf(keys, depth, lower, upper),
        BTreeNode::Internal(inner) => {
            walk.internal(&inner.keys, inner.children.len(), depth, lower, upper)?;
            for (index, child) in inner.children.iter().enumerate() {
                let (low, high) = child_bounds(&inner.keys, index, lower, upper);
                walk_btree(walk, child, depth + 1, low, high)?;
            }
            Ok(())
        }
    }
}

fn walk_bplus<'a>(
    walk: &mut Walk,
    tree: &'a BPlusTree,
    node: &BPlusNode,
    depth: usize,
    lower: Option<Key>,
    upper: Option<Key>,
    reachable: &mut Vec<&'a LeafNode>,
) -> Result<(), InvariantViolation> {
    match node {
        BPlusNode::Leaf(id) => {
            let leaf = tree.leaf(*id).ok_or(InvariantViolation::DanglingLeaf(*id))?;
            walk.leaf(&leaf.keys, depth, lower, upper)?;
            reachable.push(leaf);
            Ok(())
        }
        BPlusNode::Internal(inner) => {
            walk.internal(&inner.keys, inner.children.len(), depth, lower, upper)?;
            for (index, child) in inner.children.iter().enumerate() {
                let (low, high) = child_bounds(&inner.keys, index, lower, upper);
                walk_bplus(walk, tree, child, depth + 1, low, high, reachable)?;
            }
            Ok(())
        }
    }
}

impl BTree {
    /// Validate the structural invariants of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut walk = Walk::new(self.degree(), Flavor::BTree);
        walk_btree(&mut walk, self.root(), 0, None, None)?;
        walk.finish(self.len())
    }
}

impl BPlusTree {
    /// Validate the structural invariants of the tree, including the leaf chain.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut walk = Walk::new(self.degree(), Flavor::BPlus);
        let mut reachable = Vec::new();
        walk_bplus(&mut walk, self, self.root(), 0, None, None, &mut reachable)?;
        walk.finish(self.len())?;

        // Bounded so a cycle in the chain cannot loop forever.
        let chained: Vec<&LeafNode> = self.leaf_chain().take(reachable.len() + 1).collect();
        for (position, expected) in reachable.iter().enumerate() {
            match chained.get(position) {
                Some(leaf) if std::ptr::eq(*leaf, *expected) => {}
                _ => return Err(InvariantViolation::LeafChain { position }),
            }
        }
        if chained.len() != reachable.len() {
            return Err(InvariantViolation::LeafChain {
                position: reachable.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::InternalNode;

    fn degree(t: usize) -> Degree {
        Degree::new(t).expect("valid degree")
    }

    #[test]
    fn test_empty_trees_are_valid() {
        BTree::new(degree(2)).check_invariants().expect("valid");
        BPlusTree::new(degree(2)).check_invariants().expect("valid");
    }

    #[test]
    fn test_child_bounds() {
        let keys = [10, 20];
        assert_eq!(child_bounds(&keys, 0, None, Some(50)), (None, Some(10)));
        assert_eq!(child_bounds(&keys, 1, None, Some(50)), (Some(10), Some(20)));
        assert_eq!(child_bounds(&keys, 2, None, Some(50)), (Some(20), Some(50)));
    }

    #[test]
    fn test_walk_detects_underfull_node() {
        let mut walk = Walk::new(degree(3), Flavor::BTree);
        let node = BTreeNode::Internal(InternalNode::with_children(
            BTreeNode::Leaf(vec![1]),
            5,
            BTreeNode::Leaf(vec![6, 7]),
        ));
        let err = walk_btree(&mut walk, &node, 0, None, None)
            .expect_err("underfull leaf");
        assert_eq!(
            err,
            InvariantViolation::KeyCount {
                depth: 1,
                count: 1,
                min: 2,
                max: 5
            }
        );
    }

    #[test]
    fn test_walk_detects_misplaced_key() {
        let mut walk = Walk::new(degree(2), Flavor::BTree);
        let node = BTreeNode::Internal(InternalNode::with_children(
            BTreeNode::Leaf(vec![1]),
            5,
            BTreeNode::Leaf(vec![5]),
        ));
        let err = walk_btree(&mut walk, &node, 0, None, None)
            .expect_err("equal key right of live separator");
        assert!(matches!(err, InvariantViolation::OutOfRange { key: 5, .. }));
    }

    #[test]
    fn test_bplus_allows_separator_copy_on_right() {
        let walk = Walk::new(degree(2), Flavor::BPlus);
        walk.check_keys(&[5, 6], 1, Some(5), None)
            .expect("copied separator is the right leaf's first key");
    }

    #[test]
    fn test_walk_detects_uneven_leaves() {
        let mut walk = Walk::new(degree(2), Flavor::BTree);
        let node = BTreeNode::Internal(InternalNode::with_children(
            BTreeNode::Leaf(vec![1]),
            5,
            BTreeNode::Internal(InternalNode::with_children(
                BTreeNode::Leaf(vec![6]),
                7,
                BTreeNode::Leaf(vec![8]),
            )),
        ));
        let err = walk_btree(&mut walk, &node, 0, None, None)
            .expect_err("uneven");
        assert_eq!(
            err,
            InvariantViolation::UnevenLeaves {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_walk_detects_unordered_keys() {
        let walk = Walk::new(degree(3), Flavor::BTree);
        let err = walk.check_keys(&[3, 2], 0, None, None)
            .expect_err("unordered");
        assert_eq!(
            err,
            InvariantViolation::Unordered {
                depth: 0,
                previous: 3,
                next: 2
            }
        );
    }

    #[test]
    fn test_walk_detects_bad_arity() {
        let mut walk = Walk::new(degree(2), Flavor::BTree);
        let err = walk.internal(&[5], 3, 0, None, None).expect_err("arity");
        assert_eq!(
            err,
            InvariantViolation::Arity {
                depth: 0,
                keys: 1,
                children: 3
            }
        );
    }

    #[test]
    fn test_violation_display() {
        let violation = InvariantViolation::Len {
            recorded: 3,
            actual: 2,
        };
        assert_eq!(violation.to_string(), "tree records 3 keys but stores 2");
    }
}
