//! The state of one branch of the forest search: the first tree reduced by the contractions made
//! so far, the fragments of the second tree that still take part in the search, and the clusters
//! of fragments that are finished.  States are values; every branch owns its own copy.

use super::cache::StateKey;
use crate::cluster::Cluster;
use crate::tree::{Node, Tree};

/// How the two leaves of a cherry of the reduced first tree sit in the forest
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Relation {

    /// The leaves are siblings in their fragment
    Siblings,

    /// The leaves belong to different fragments
    Separate,

    /// The leaves belong to the same fragment but are not siblings.  Holds the fragment and the
    /// roots of the pendant subtrees hanging off the path between them.
    Pendants(usize, Vec<Node>),
}

/// The state of a search branch
#[derive(Clone, Debug)]
pub struct State {

    /// The reduced first tree, leaves labelled with symbols
    tree: Tree,

    /// The active fragments, leaves labelled with symbols
    fragments: Vec<Tree>,

    /// The clusters of fragments that consist of a single symbol and left the search
    finished: Vec<Cluster>,
}

impl State {

    /// The initial state: both trees uncut
    pub fn new(tree1: &Tree, tree2: &Tree) -> Self {
        State {
            tree:      tree1.clone(),
            fragments: vec![tree2.clone()],
            finished:  vec![],
        }
    }

    /// The reduced first tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The active fragments
    pub fn fragments(&self) -> &[Tree] {
        &self.fragments
    }

    /// The number of fragments, finished or not
    pub fn size(&self) -> usize {
        self.fragments.len() + self.finished.len()
    }

    /// The clusters of the finished fragments
    pub fn finished(&self) -> &[Cluster] {
        &self.finished
    }

    /// The clusters of all fragments, finished ones first
    pub fn clusters(&self) -> Vec<Cluster> {
        let mut clusters = self.finished.clone();
        clusters.extend(self.fragments.iter().map(|fragment| fragment.taxa()));
        clusters
    }

    /// The cache key of this state
    pub fn key(&self) -> StateKey {
        StateKey::new(self.tree.labels().collect(), self.clusters())
    }

    /// The index of the fragment containing the given symbol
    pub fn fragment_of(&self, symbol: usize) -> Option<usize> {
        self.fragments.iter().position(|fragment| fragment.leaf(symbol).is_some())
    }

    /// Move every fragment that has shrunk to a single leaf out of the search, removing its leaf
    /// from the reduced tree
    pub fn remove_singletons(&mut self) {
        let mut i = 0;
        while i < self.fragments.len() {
            if self.fragments[i].leaf_count() == 1 {
                let fragment = self.fragments.remove(i);
                for symbol in fragment.labels() {
                    self.tree.remove_leaf(symbol);
                }
                self.finished.push(fragment.taxa());
            } else {
                i += 1;
            }
        }
    }

    /// Classify the cherry `(a, b)` of the reduced tree by the positions of `a` and `b` in the
    /// forest
    pub fn relation(&self, a: usize, b: usize) -> Option<Relation> {
        let (fa, fb) = (self.fragment_of(a)?, self.fragment_of(b)?);
        if fa != fb {
            return Some(Relation::Separate);
        }
        let fragment = &self.fragments[fa];
        let (u, v)   = (fragment.leaf(a)?, fragment.leaf(b)?);
        if fragment.sibling(u) == Some(v) {
            return Some(Relation::Siblings);
        }
        let lca = fragment.lca(u, v)?;
        let mut pendants = vec![];
        for &leaf in &[u, v] {
            let mut node = leaf;
            while let Some(parent) = fragment.parent(node) {
                if parent == lca {
                    break;
                }
                pendants.extend(fragment.sibling(node));
                node = parent;
            }
        }
        Some(Relation::Pendants(fa, pendants))
    }

    /// The pendant subtree next to the deeper of `a` and `b` in their common fragment: the sibling
    /// of `a` unless `a` hangs directly off the path's top, in which case the sibling of `b`
    pub fn neighbour(&self, fragment: usize, a: usize, b: usize) -> Option<Node> {
        let fragment = &self.fragments[fragment];
        let (u, v)   = (fragment.leaf(a)?, fragment.leaf(b)?);
        let lca      = fragment.lca(u, v)?;
        if fragment.parent(u) != Some(lca) {
            fragment.sibling(u)
        } else {
            fragment.sibling(v)
        }
    }

    /// Merge the cherry `(a, b)` into the leaf `symbol` in the reduced tree and in the forest.
    /// `a` and `b` must be siblings in both.
    pub fn contract(&mut self, a: usize, b: usize, symbol: usize) {
        let contracted = self.tree.contract_sibling_pair(a, b, symbol);
        debug_assert!(contracted.is_some(), "contracting a pair that is not a cherry");
        if let Some(f) = self.fragment_of(a) {
            let contracted = self.fragments[f].contract_sibling_pair(a, b, symbol);
            debug_assert!(contracted.is_some(), "contracting a pair that is not a forest cherry");
        }
    }

    /// Cut the leaf `symbol` off its fragment.  Returns `false` if it forms a fragment on its own
    /// already.
    pub fn cut_leaf(&mut self, symbol: usize) -> bool {
        match self.fragment_of(symbol) {
            Some(f) if self.fragments[f].leaf_count() > 1 => {
                if let Some(leaf) = self.fragments[f].leaf(symbol) {
                    self.cut_node(f, leaf);
                    return true;
                }
                false
            },
            _ => false,
        }
    }

    /// Cut the subtree rooted in `node` off the given fragment, making it a fragment of its own
    pub fn cut_node(&mut self, fragment: usize, node: Node) {
        let cut = self.fragments[fragment].prune_subtree(node);
        self.fragments.push(cut);
    }

    /// Remove a symbol from the reduced tree and the forest altogether
    pub fn drop_leaf(&mut self, symbol: usize) {
        if let Some(f) = self.fragment_of(symbol) {
            self.fragments[f].remove_leaf(symbol);
        }
        self.tree.remove_leaf(symbol);
    }
}
