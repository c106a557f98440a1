//! Agreement forests and the branch-and-bound search for minimum (acyclic) agreement forests.
//!
//! The search works on two outgroup-augmented trees.  It repeatedly picks a cherry of the first
//! tree and either merges it, if its leaves are siblings in the forest as well, or branches on the
//! cuts that can make them siblings.  `ForestSearch` explores the branches depth-first for a fixed
//! range of forest sizes and collects the forests it finds in a `Candidates` map.

pub mod bound;
mod cache;
mod search;
mod state;
mod symbols;

pub use self::cache::{ForestCache, StateKey};
pub use self::search::{isomorphic, CancelToken, ForestSearch, Interrupted, SearchStats};
pub use self::state::{Relation, State};
pub use self::symbols::Symbols;

use crate::cluster::Cluster;
use crate::tree::Tree;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// What the search computes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {

    /// The hybridization number, via a maximum acyclic agreement forest
    HybridNumber,

    /// A minimum hybridization network, via all maximum acyclic agreement forests found
    Network,

    /// The rSPR distance, via a maximum agreement forest.  Acyclicity is not enforced.
    RsprDistance,
}

impl Mode {

    /// Do forests in this mode have to be acyclic?
    pub fn requires_acyclicity(&self) -> bool {
        !matches!(self, Mode::RsprDistance)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::HybridNumber
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hybrid" | "hybridization" => Ok(Mode::HybridNumber),
            "network"                  => Ok(Mode::Network),
            "rspr"                     => Ok(Mode::RsprDistance),
            _ => Err(format!("unknown mode `{}', expected hybrid, network or rspr", s)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::HybridNumber => write!(f, "hybridization number"),
            Mode::Network      => write!(f, "hybridization network"),
            Mode::RsprDistance => write!(f, "rSPR distance"),
        }
    }
}

/// An agreement forest: fragments of the second input tree, the root fragment last
#[derive(Clone, Debug)]
pub struct Forest {

    /// The fragments
    fragments: Vec<Tree>,
}

impl Forest {

    /// Build a forest from the clusters of its fragments, in order, by restricting `tree` to them
    pub fn from_clusters(clusters: &[Cluster], tree: &Tree) -> Self {
        Forest { fragments: clusters.iter().map(|cluster| tree.restrict(cluster)).collect() }
    }

    /// The number of fragments
    pub fn size(&self) -> usize {
        self.fragments.len()
    }

    /// Is the forest empty?
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The fragments, root fragment last
    pub fn fragments(&self) -> &[Tree] {
        &self.fragments
    }

    /// The root fragment
    pub fn root_fragment(&self) -> Option<&Tree> {
        self.fragments.last()
    }

    /// The clusters of the fragments, in order
    pub fn clusters(&self) -> Vec<Cluster> {
        self.fragments.iter().map(|fragment| fragment.taxa()).collect()
    }

    /// The sorted fragment clusters, which identify the forest up to the order of its fragments
    pub fn partition(&self) -> Vec<Cluster> {
        let mut clusters = self.clusters();
        clusters.sort();
        clusters
    }

    /// Do the fragments partition the given set of taxa?
    pub fn is_partition_of(&self, taxa: &Cluster) -> bool {
        let mut seen = Cluster::empty(taxa.width());
        for cluster in self.clusters() {
            if cluster.is_empty() || !cluster.is_disjoint(&seen) {
                return false;
            }
            seen.union_with(&cluster);
        }
        &seen == taxa
    }
}

/// The forests found by a search, grouped by size and deduplicated by their partitions
#[derive(Clone, Debug, Default)]
pub struct Candidates {

    /// The forests of each size, in the order they were found
    forests: BTreeMap<usize, Vec<Forest>>,

    /// The partitions of all forests recorded so far
    seen: HashSet<Vec<Cluster>>,
}

impl Candidates {

    /// An empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a forest.  Returns `false` if a forest with the same partition was recorded before.
    pub fn insert(&mut self, forest: Forest) -> bool {
        if !self.seen.insert(forest.partition()) {
            return false;
        }
        self.forests.entry(forest.size()).or_insert_with(Vec::new).push(forest);
        true
    }

    /// Add all forests of another collection
    pub fn merge(&mut self, other: Candidates) {
        for (_, forests) in other.forests {
            for forest in forests {
                self.insert(forest);
            }
        }
    }

    /// Were no forests found?
    pub fn is_empty(&self) -> bool {
        self.forests.is_empty()
    }

    /// The total number of forests
    pub fn len(&self) -> usize {
        self.forests.values().map(|forests| forests.len()).sum()
    }

    /// The smallest size of any recorded forest
    pub fn min_size(&self) -> Option<usize> {
        self.forests.keys().next().cloned()
    }

    /// The forests of the given size
    pub fn forests(&self, size: usize) -> &[Forest] {
        self.forests.get(&size).map(|forests| forests.as_slice()).unwrap_or(&[])
    }

    /// The smallest size together with all forests of that size
    pub fn into_min(self) -> Option<(usize, Vec<Forest>)> {
        self.forests.into_iter().next()
    }
}
