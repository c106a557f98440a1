//! The branch-and-bound forest search.
//!
//! A search explores the forests whose sizes fall into a given range.  Each recursive call
//! receives its own `State`, removes singleton fragments, consults the cache and the lower bound,
//! and then branches on the first cherry `(a, b)` of the reduced first tree:
//!
//! - If `a` and `b` are siblings in the forest, they are merged.  A second branch cuts both off,
//!   because a merged pair may end up in a cyclic forest where two singletons would not.
//! - If they belong to different fragments, one of them has to become a singleton: cut `a`, or
//!   cut `b`.
//! - If they belong to the same fragment, either one of them is cut, or all pendant subtrees on
//!   the path between them are cut and the pair is merged.  With a single pendant subtree, that
//!   branch is explored first.
//!
//! Once the reduced tree has fewer than three leaves, the forest is complete.  It is checked for
//! acyclicity (unless computing the rSPR distance), ordered, and recorded.

use super::bound;
use super::cache::ForestCache;
use super::state::{Relation, State};
use super::symbols::Symbols;
use super::{Candidates, Forest, Mode};
use crate::acyclic::AcyclicityChecker;
use crate::cluster::Cluster;
use crate::problem::Problem;
use crate::tree::{Node, Tree};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Returned by a search that was cancelled before it finished
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("search interrupted")]
pub struct Interrupted;

/// A flag shared between the party running a search and the party that may cancel it
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {

    /// A fresh token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask all searches holding this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Has the token been cancelled?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Fail with `Interrupted` if the token has been cancelled
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() { Err(Interrupted) } else { Ok(()) }
    }
}

/// Counters describing the work done by a search
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {

    /// Recursive calls
    pub calls: u64,

    /// States skipped because they were explored before
    pub cache_hits: u64,

    /// States skipped because of the lower bound
    pub bound_prunes: u64,

    /// Complete forests rejected as cyclic
    pub cyclic: u64,

    /// Complete forests recorded
    pub emitted: u64,
}

/// The configuration of a search over a pair of outgroup-augmented trees
#[derive(Clone, Debug)]
pub struct ForestSearch<'a> {

    /// The first tree
    tree1: &'a Tree,

    /// The second tree
    tree2: &'a Tree,

    /// The outgroup taxon
    root_taxon: usize,

    /// What to compute
    mode: Mode,

    /// The forest sizes to look for
    range: RangeInclusive<usize>,

    /// Memoize explored states?
    use_cache: bool,

    /// Stop after the first forest found?
    first_only: bool,

    /// Cancellation flag, checked at every recursive call
    cancel: CancelToken,
}

impl<'a> ForestSearch<'a> {

    /// A search for all forests of a problem, with caching enabled
    pub fn new(problem: &'a Problem, mode: Mode) -> Self {
        Self::with_trees(problem.tree1(), problem.tree2(), problem.root_taxon(), mode)
    }

    /// A search over two trees that both carry `root_taxon` as the sibling of their roots
    pub fn with_trees(tree1: &'a Tree, tree2: &'a Tree, root_taxon: usize, mode: Mode) -> Self {
        ForestSearch {
            tree1,
            tree2,
            root_taxon,
            mode,
            range:      1..=tree1.leaf_count(),
            use_cache:  true,
            first_only: false,
            cancel:     CancelToken::new(),
        }
    }

    /// Restrict the search to the given forest sizes
    pub fn range(mut self, range: RangeInclusive<usize>) -> Self {
        self.range = range;
        self
    }

    /// Enable or disable memoization
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Stop as soon as one forest has been found
    pub fn first_only(mut self, first_only: bool) -> Self {
        self.first_only = first_only;
        self
    }

    /// Use the given cancellation token
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the search and return the forests found, grouped by size
    pub fn run(&self) -> Result<(Candidates, SearchStats), Interrupted> {
        let mut run = Run {
            config:     self,
            checker:    AcyclicityChecker::new(self.tree1, self.tree2, self.root_taxon),
            symbols:    Symbols::new(self.tree1.width()),
            cache:      ForestCache::new(),
            candidates: Candidates::new(),
            stats:      SearchStats::default(),
        };

        if isomorphic(self.tree1, self.tree2) {
            run.emit(vec![self.tree2.taxa()]);
        } else {
            run.search(State::new(self.tree1, self.tree2))?;
        }

        trace!(
            "Search for sizes {:?}: {} calls, {} cache hits, {} bound prunes, {} cyclic, {} forests",
            self.range, run.stats.calls, run.stats.cache_hits, run.stats.bound_prunes,
            run.stats.cyclic, run.stats.emitted);
        Ok((run.candidates, run.stats))
    }
}

/// The mutable context of one search run
struct Run<'s, 'a> {

    /// The search being run
    config: &'s ForestSearch<'a>,

    /// Acyclicity test for complete forests
    checker: AcyclicityChecker<'a>,

    /// The symbols minted by contractions
    symbols: Symbols,

    /// The explored states
    cache: ForestCache,

    /// The forests found so far
    candidates: Candidates,

    /// Statistics
    stats: SearchStats,
}

impl<'s, 'a> Run<'s, 'a> {

    /// Has the search found all it was asked to find?
    fn done(&self) -> bool {
        self.config.first_only && !self.candidates.is_empty()
    }

    /// The largest forest size of interest
    fn max_size(&self) -> usize {
        *self.config.range.end()
    }

    /// Explore the given state and everything reachable from it
    fn search(&mut self, mut state: State) -> Result<(), Interrupted> {
        self.config.cancel.check()?;
        if self.done() {
            return Ok(());
        }
        self.stats.calls += 1;

        state.remove_singletons();
        if state.size() > self.max_size() {
            return Ok(());
        }
        if self.config.use_cache && !self.cache.insert(state.key()) {
            self.stats.cache_hits += 1;
            return Ok(());
        }
        if state.tree().leaf_count() < 3 {
            self.finish(&state);
            return Ok(());
        }
        if state.size() + bound::lower_bound(bound::estimate(&state)) > self.max_size() {
            self.stats.bound_prunes += 1;
            return Ok(());
        }

        let (a, b) = match state.tree().first_cherry() {
            Some(cherry) => cherry,
            None         => return Ok(()),
        };

        match state.relation(a, b) {

            Some(Relation::Siblings) => {
                let symbol   = self.symbols.contract(a, b);
                let mut keep = state.clone();
                keep.contract(a, b, symbol);
                self.search(keep)?;
                if self.config.mode.requires_acyclicity() {
                    let mut split = state;
                    split.cut_leaf(a);
                    split.cut_leaf(b);
                    self.search(split)?;
                }
            },

            Some(Relation::Separate) => {
                self.cut(&state, a)?;
                self.cut(&state, b)?;
            },

            Some(Relation::Pendants(fragment, pendants)) => {
                if pendants.len() == 1 {
                    self.cut_pendants(&state, a, b, fragment, &pendants)?;
                    self.cut(&state, a)?;
                    self.cut(&state, b)?;
                } else {
                    self.cut(&state, a)?;
                    self.cut(&state, b)?;
                    self.cut_pendants(&state, a, b, fragment, &pendants)?;
                }
            },

            None => panic!("cherry ({}, {}) of the reduced tree is missing from the forest", a, b),
        }
        Ok(())
    }

    /// Branch: cut the leaf `symbol` off its fragment
    fn cut(&mut self, state: &State, symbol: usize) -> Result<(), Interrupted> {
        let mut state = state.clone();
        state.cut_leaf(symbol);
        self.search(state)
    }

    /// Branch: cut all pendant subtrees between `a` and `b` and merge the pair
    fn cut_pendants(
        &mut self,
        state:    &State,
        a:        usize,
        b:        usize,
        fragment: usize,
        pendants: &[Node],
    ) -> Result<(), Interrupted> {
        let mut state = state.clone();
        for &pendant in pendants {
            state.cut_node(fragment, pendant);
        }
        if state.size() > self.max_size() {
            return Ok(());
        }
        let symbol = self.symbols.contract(a, b);
        state.contract(a, b, symbol);
        self.search(state)
    }

    /// Record the forests completing a state whose reduced tree has fewer than three leaves.  With
    /// two leaves left, they form one fragment, which may be kept or split.
    fn finish(&mut self, state: &State) {
        self.emit(state.clusters());
        let leaves = state.tree().labels().collect::<Vec<usize>>();
        if let [a, b] = leaves[..] {
            let mut split = state.finished().to_vec();
            split.push(self.symbols.cluster(a).clone());
            split.push(self.symbols.cluster(b).clone());
            self.emit(split);
        }
    }

    /// Check a complete forest, given by the clusters of its fragments, and record it
    fn emit(&mut self, clusters: Vec<Cluster>) {
        let size = clusters.len();
        if !self.config.range.contains(&size) {
            return;
        }
        if size == 1 && clusters[0].len() == 1 {
            return;
        }
        debug_assert!(self.is_partition(&clusters), "emitted fragments do not partition the taxa");

        let order = if self.config.mode.requires_acyclicity() {
            match self.checker.order(&clusters) {
                Some(order) => order,
                None        => {
                    self.stats.cyclic += 1;
                    return;
                },
            }
        } else {
            let root_taxon = self.config.root_taxon;
            let mut order = (0..size).collect::<Vec<usize>>();
            order.sort_by_key(|&i| clusters[i].contains(root_taxon));
            order
        };

        let ordered = order.into_iter().map(|i| clusters[i].clone()).collect::<Vec<_>>();
        if self.candidates.insert(Forest::from_clusters(&ordered, self.config.tree2)) {
            self.stats.emitted += 1;
        }
    }

    /// Do the clusters partition the taxa of the input trees?
    fn is_partition(&self, clusters: &[Cluster]) -> bool {
        let taxa = self.config.tree1.taxa();
        let mut seen = Cluster::empty(taxa.width());
        clusters.iter().all(|cluster| {
            let disjoint = cluster.is_disjoint(&seen);
            seen.union_with(cluster);
            disjoint
        }) && seen == taxa
    }
}

/// Are the two trees isomorphic?  Matching cherries are merged level by level until a single leaf
/// is left or the cherries of the two trees differ.
pub fn isomorphic(tree1: &Tree, tree2: &Tree) -> bool {
    if tree1.taxa() != tree2.taxa() {
        return false;
    }
    let mut tree1 = tree1.clone();
    let mut tree2 = tree2.clone();
    let mut next  = tree1.labels().chain(tree2.labels()).max().map_or(0, |max| max + 1);
    loop {
        if tree1.leaf_count() <= 1 {
            return true;
        }
        let cherries1 = tree1.cherries().into_iter().collect::<BTreeSet<_>>();
        let cherries2 = tree2.cherries().into_iter().collect::<BTreeSet<_>>();
        if cherries1 != cherries2 {
            return false;
        }
        for (a, b) in cherries1 {
            tree1.contract_sibling_pair(a, b, next);
            tree2.contract_sibling_pair(a, b, next);
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Run an exhaustive search and return the minimum size and the number of minimum forests
    fn minimum(newick: &str, mode: Mode) -> (usize, usize) {
        let problem = Problem::from_newick(newick).unwrap();
        let (candidates, _) = ForestSearch::new(&problem, mode).run().unwrap();
        for size in 1..=problem.taxon_count() {
            for forest in candidates.forests(size) {
                assert!(forest.is_partition_of(&problem.taxa().all()));
            }
        }
        let (size, forests) = candidates.into_min().unwrap();
        (size, forests.len())
    }

    /// Isomorphism does not depend on the order of children
    #[test]
    fn isomorphism() {
        let p = Problem::from_newick("((a,b),(c,(d,e)));\n(((e,d),c),(b,a));\n").unwrap();
        assert!(isomorphic(p.tree1(), p.tree2()));
        let p = Problem::from_newick("((a,b),(c,(d,e)));\n((a,b),(d,(c,e)));\n").unwrap();
        assert!(!isomorphic(p.tree1(), p.tree2()));
        assert!(isomorphic(p.tree1(), p.tree1()));
    }

    /// Identical trees are answered without search
    #[test]
    fn identical_trees() {
        let problem = Problem::from_newick("(((a,b),c),d);\n(((a,b),c),d);\n").unwrap();
        let (candidates, stats) = ForestSearch::new(&problem, Mode::HybridNumber).run().unwrap();
        assert_eq!(candidates.min_size(), Some(1));
        assert_eq!(stats.calls, 0);
    }

    /// One SPR move
    #[test]
    fn one_move() {
        assert_eq!(minimum("(((a,b),c),d);\n((a,(b,c)),d);\n", Mode::HybridNumber).0, 2);
        assert_eq!(minimum("(((a,b),c),d);\n((a,(b,c)),d);\n", Mode::RsprDistance).0, 2);
    }

    /// The cyclic partition {a,b}, {c,d}, {rho} is never reported as an acyclic forest
    #[test]
    fn cyclic_pair() {
        let newick  = "((a,(c,d)),b);\n((c,(a,b)),d);\n";
        assert_eq!(minimum(newick, Mode::RsprDistance).0, 3);
        assert_eq!(minimum(newick, Mode::HybridNumber).0, 3);

        let problem = Problem::from_newick(newick).unwrap();
        let width   = problem.taxon_count();
        let mut cyclic = vec![
            Cluster::from_taxa(width, vec![0, 1]),
            Cluster::from_taxa(width, vec![2, 3]),
            Cluster::singleton(width, 4),
        ];
        cyclic.sort();
        let (candidates, _) = ForestSearch::new(&problem, Mode::HybridNumber).run().unwrap();
        for forest in candidates.forests(3) {
            assert!(forest.partition() != cyclic);
        }
    }

    /// A size range that excludes the minimum finds nothing smaller
    #[test]
    fn size_range() {
        let problem = Problem::from_newick("(((a,b),c),d);\n((a,(b,c)),d);\n").unwrap();
        let search  = ForestSearch::new(&problem, Mode::HybridNumber);
        let (candidates, _) = search.clone().range(1..=1).run().unwrap();
        assert!(candidates.is_empty());
        let (candidates, _) = search.clone().range(2..=2).run().unwrap();
        assert_eq!(candidates.min_size(), Some(2));
        let (candidates, _) = search.range(3..=3).first_only(true).run().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates.min_size(), Some(3));
    }

    /// A cancelled search stops immediately
    #[test]
    fn cancelled() {
        let problem = Problem::from_newick("(((a,b),c),d);\n((a,(b,c)),d);\n").unwrap();
        let token   = CancelToken::new();
        token.cancel();
        let result  = ForestSearch::new(&problem, Mode::HybridNumber).cancel_token(token).run();
        assert_eq!(result.unwrap_err(), Interrupted);
    }
}
