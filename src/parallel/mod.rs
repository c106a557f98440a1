//! The size-parallel search for a minimum agreement forest.
//!
//! `ParallelSizeSearch` runs one `ForestSearch` per candidate forest size on a pool of worker
//! threads, starting at a lower bound derived from the approximation in `forest::bound`.  The
//! master/worker machinery lives in the `master` and `worker` submodules.  Every task owns its
//! trees and its cache; the only shared state is the master's per-size bookkeeping, which is
//! updated from worker messages.

mod master;
mod worker;

use self::master::Master;
use crate::error::Result;
use crate::forest::{bound, isomorphic, Forest, Mode, State};
use crate::network::{Network, NetworkBuilder};
use crate::problem::Problem;
use std::time::Duration;
use tracing::info;

/// How to run a search
#[derive(Clone, Debug)]
pub struct SearchConfig {

    /// The number of worker threads
    pub num_threads: usize,

    /// What to compute
    pub mode: Mode,

    /// Memoize explored states within each size task?
    pub use_cache: bool,

    /// Collect all forests of the minimum size, not just one?  Always done in network mode.
    pub all_forests: bool,

    /// Stop after this long and report bounds instead of an exact answer
    pub time_limit: Option<Duration>,
}

impl SearchConfig {

    /// May a size task stop at its first forest?
    pub fn first_only(&self) -> bool {
        !self.all_forests && self.mode != Mode::Network
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            num_threads: default_threads(),
            mode:        Mode::default(),
            use_cache:   true,
            all_forests: false,
            time_limit:  None,
        }
    }
}

/// One thread less than the number of cores, but at least one
pub fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// The result of a search
#[derive(Clone, Debug)]
pub enum Outcome {

    /// The minimum forest size with the forests of that size found, and their networks in network
    /// mode
    Exact {
        size:     usize,
        forests:  Vec<Forest>,
        networks: Vec<Network>,
    },

    /// The search was stopped early.  No forest is smaller than `lower_bound`; `best` holds the
    /// smallest forests found, if any.
    Bounded {
        lower_bound: usize,
        best:        Option<(usize, Vec<Forest>)>,
    },
}

impl Outcome {

    /// Is this the exact minimum?
    pub fn is_exact(&self) -> bool {
        matches!(self, Outcome::Exact { .. })
    }

    /// The rSPR distance or hybridization number, if known exactly
    pub fn distance(&self) -> Option<usize> {
        match self {
            Outcome::Exact { size, .. } => Some(size - 1),
            Outcome::Bounded { .. }     => None,
        }
    }

    /// The smallest and, if known, largest possible distance
    pub fn distance_bounds(&self) -> (usize, Option<usize>) {
        match self {
            Outcome::Exact { size, .. } => (size - 1, Some(size - 1)),
            Outcome::Bounded { lower_bound, best } =>
                (lower_bound.saturating_sub(1), best.as_ref().map(|(size, _)| size - 1)),
        }
    }

    /// The smallest forests found
    pub fn forests(&self) -> &[Forest] {
        match self {
            Outcome::Exact { forests, .. }                 => forests,
            Outcome::Bounded { best: Some((_, forests)), .. } => forests,
            Outcome::Bounded { best: None, .. }            => &[],
        }
    }

    /// The networks built from the forests
    pub fn networks(&self) -> &[Network] {
        match self {
            Outcome::Exact { networks, .. } => networks,
            Outcome::Bounded { .. }         => &[],
        }
    }
}

/// Receives progress updates from a running search
pub trait Progress {

    /// The search is `percent` done; `message` describes where it stands
    fn report(&self, percent: f64, message: &str);
}

/// Logs progress at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn report(&self, percent: f64, message: &str) {
        info!("[{:5.1}%] {}", percent, message);
    }
}

/// Discards progress updates
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _percent: f64, _message: &str) {}
}

/// A search for the minimum forest size over all sizes in parallel
pub struct ParallelSizeSearch<'a> {

    /// The input
    problem: &'a Problem,

    /// How to search
    config: SearchConfig,
}

impl<'a> ParallelSizeSearch<'a> {

    /// Create a search for the given problem
    pub fn new(problem: &'a Problem, config: SearchConfig) -> Self {
        ParallelSizeSearch { problem, config }
    }

    /// A lower bound on the minimum forest size
    pub fn size_hint(&self) -> usize {
        let (tree1, tree2) = (self.problem.tree1(), self.problem.tree2());
        if isomorphic(tree1, tree2) {
            1
        } else {
            1 + bound::lower_bound(bound::estimate(&State::new(tree1, tree2)))
        }
    }

    /// Find the minimum forest size, starting from `size_hint()`
    pub fn run(&self, progress: &dyn Progress) -> Result<Outcome> {
        self.run_from(self.size_hint(), progress)
    }

    /// Find the minimum forest size, starting from `hint`, which must not exceed it
    pub fn run_from(&self, hint: usize, progress: &dyn Progress) -> Result<Outcome> {
        let last    = self.problem.taxon_count();
        let first   = hint.max(1).min(last);
        let threads = self.config.num_threads.max(1).min(last - first + 1);
        info!("Searching forest sizes {} to {} for the {} with {} threads",
              first, last, self.config.mode, threads);

        let master = Master::new(self.problem, &self.config, first..=last, threads)?;
        Ok(match master.run(progress)? {
            Outcome::Exact { size, forests, .. } => {
                let networks = if self.config.mode == Mode::Network {
                    forests.iter()
                        .map(|forest| NetworkBuilder::build(
                            forest, self.problem.tree1(), self.problem.tree2(),
                            self.problem.root_taxon()))
                        .collect()
                } else {
                    vec![]
                };
                Outcome::Exact { size, forests, networks }
            },
            bounded => bounded,
        })
    }
}
