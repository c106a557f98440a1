//! Memoization of explored search states.
//!
//! A state is fully determined by the leaf symbols of the reduced first tree together with the
//! clusters of all forest fragments: the reduced tree is the first input tree with each symbol's
//! cluster collapsed into a leaf, and every fragment is the restriction of the second input tree
//! to its cluster.  Two states with equal keys therefore have identical futures, and the second
//! one to be reached can be skipped.

use crate::cluster::Cluster;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// The canonical encoding of a search state
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StateKey {

    /// The leaf symbols of the reduced first tree, sorted
    tree: Vec<usize>,

    /// The clusters of all fragments, sorted
    forest: Vec<Cluster>,
}

impl StateKey {

    /// Build a key from the leaf symbols of the reduced tree and the fragment clusters, in any order
    pub fn new(mut tree: Vec<usize>, mut forest: Vec<Cluster>) -> Self {
        tree.sort_unstable();
        forest.sort();
        StateKey { tree, forest }
    }
}

/// The set of states explored by one search.  Entries are never removed.
#[derive(Debug, Default)]
pub struct ForestCache {

    /// The explored states
    states: RwLock<HashSet<StateKey>>,
}

impl ForestCache {

    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Has this state been explored?
    pub fn contains(&self, key: &StateKey) -> bool {
        self.states.read().unwrap_or_else(PoisonError::into_inner).contains(key)
    }

    /// Record a state as explored.  Returns `false` if it was recorded before.
    pub fn insert(&self, key: StateKey) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.states.write().unwrap_or_else(PoisonError::into_inner).insert(key)
    }

    /// The number of recorded states
    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
