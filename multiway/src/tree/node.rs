//! Node types and split mechanics shared by both engines.
//!
//! Both trees follow the same fanout discipline, fixed by the minimum
//! degree `t`:
//! - every node except the root holds between `t - 1` and `2t - 1` keys
//! - an internal node with `k` keys owns exactly `k + 1` children
//!
//! `InternalNode` is generic over its child link so that the median split
//! (median removed from the child and promoted into the parent) is written
//! once and reused by the B-tree and by the B+-tree's internal levels.

use std::fmt;

use crate::tree::TreeError;

/// Keys stored in both trees.
pub type Key = i64;

/// Minimum degree `t` of a tree.
///
/// # Invariants
///
/// - `t >= 2`, so a split always leaves at least one key on each side.
/// - `t <= Degree::MAX`, so `2t - 1` fits in a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Degree(usize);

impl Degree {
    /// Smallest minimum degree that yields well-formed split partitions.
    pub const MIN: usize = 2;

    /// Largest minimum degree whose node capacity `2t - 1` is representable.
    pub const MAX: usize = usize::MAX / 2;

    /// Validate a minimum degree.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidDegree` if `t < 2` or `t > Degree::MAX`.
    pub const fn new(t: usize) -> Result<Self, TreeError> {
        if t < Self::MIN || t > Self::MAX {
            return Err(TreeError::InvalidDegree(t));
        }
        Ok(Self(t))
    }

    /// The raw `t` value.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Maximum number of keys in any node (`2t - 1`).
    #[must_use]
    pub const fn max_keys(self) -> usize {
        2 * self.0 - 1
    }

    /// Minimum number of keys in a non-root node (`t - 1`).
    #[must_use]
    pub const fn min_keys(self) -> usize {
        self.0 - 1
    }
}

impl TryFrom<usize> for Degree {
    type Error = TreeError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Insert `key` into an ascending key vector, shifting larger keys right.
///
/// Returns the position the key landed at.
pub(crate) fn insert_sorted(keys: &mut Vec<Key>, key: Key) -> usize {
    let position = keys.partition_point(|&k| k < key);
    keys.insert(position, key);
    position
}

/// An internal node: `keys.len()` separators and `keys.len() + 1` children.
///
/// `children[i]` holds keys below `keys[i]`, `children[i + 1]` holds keys
/// above it. Whether a key equal to the separator lives left or right is up
/// to the engine.
#[derive(Debug)]
pub struct InternalNode<C> {
    /// Separator keys in ascending order.
    pub keys: Vec<Key>,
    /// Child links. `children.len()` == `keys.len()` + 1 between operations.
    pub children: Vec<C>,
}

impl<C> InternalNode<C> {
    /// Create the temporary root used while growing a tree.
    ///
    /// The node has zero keys and one child; the caller must split that
    /// child before the node is observable.
    #[must_use]
    pub fn over(child: C) -> Self {
        Self {
            keys: Vec::new(),
            children: vec![child],
        }
    }

    /// Create an internal node with one separator and two children.
    #[must_use]
    pub fn with_children(left: C, key: Key, right: C) -> Self {
        Self {
            keys: vec![key],
            children: vec![left, right],
        }
    }

    /// Check if the node holds `2t - 1` keys.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn is_full(&self, degree: Degree) -> bool {
        self.keys.len() >= degree.max_keys()
    }

    /// Split a full node around its median.
    ///
    /// The left node keeps the leading `t - 1` keys and `t` children, the
    /// returned right node gets the trailing `t - 1` keys and `t` children.
    /// The median is removed from both and returned for promotion.
    #[must_use]
    pub fn split(&mut self, degree: Degree) -> (Key, Self) {
        let t = degree.get();
        debug_assert_eq!(self.keys.len(), degree.max_keys());
        debug_assert_eq!(self.children.len(), degree.max_keys() + 1);

        let mut right_keys = self.keys.split_off(t - 1);
        let median = right_keys.remove(0);
        let right_children = self.children.split_off(t);

        let right = Self {
            keys: right_keys,
            children: right_children,
        };
        (median, right)
    }

    /// Insert a promoted separator at `index` and its right sibling at `index + 1`.
    pub fn insert_split(&mut self, index: usize, separator: Key, right: C) {
        self.keys.insert(index, separator);
        self.children.insert(index + 1, right);
    }
}
