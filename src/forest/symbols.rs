//! Leaf symbols of the reduced trees.  Symbols `0..width` are the taxa themselves; contracting a
//! cherry mints a new symbol for the pair, whose cluster is the union of both halves.
//! Contracting the same pair twice yields the same symbol, so a symbol always stands for the same
//! cluster no matter which branch of the search created it.

use crate::cluster::Cluster;
use std::collections::HashMap;

/// An arena of symbols together with their clusters
#[derive(Clone, Debug)]
pub struct Symbols {

    /// The cluster of each symbol
    clusters: Vec<Cluster>,

    /// Map from contracted pairs to their symbols
    pairs: HashMap<(usize, usize), usize>,
}

impl Symbols {

    /// Create an arena whose only symbols are the `width` taxa
    pub fn new(width: usize) -> Self {
        Symbols {
            clusters: (0..width).map(|taxon| Cluster::singleton(width, taxon)).collect(),
            pairs:    HashMap::new(),
        }
    }

    /// The symbol standing for the union of `a` and `b`
    pub fn contract(&mut self, a: usize, b: usize) -> usize {
        let pair = if a < b { (a, b) } else { (b, a) };
        if let Some(&symbol) = self.pairs.get(&pair) {
            return symbol;
        }
        let symbol = self.clusters.len();
        let cluster = self.clusters[a].union(&self.clusters[b]);
        self.clusters.push(cluster);
        self.pairs.insert(pair, symbol);
        symbol
    }

    /// The cluster of taxa a symbol stands for
    pub fn cluster(&self, symbol: usize) -> &Cluster {
        &self.clusters[symbol]
    }
}
