//! Clusters are sets of taxa represented as bit-vectors over a fixed taxon ordering.  All
//! clusters that are compared with each other must have the same width, which is the number of
//! taxa of the current subproblem.

use fixedbitset::FixedBitSet;
use std::fmt;

/// A set of taxa, one bit per taxon
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cluster(FixedBitSet);

impl Cluster {

    /// The empty cluster over `width` taxa
    pub fn empty(width: usize) -> Self {
        Cluster(FixedBitSet::with_capacity(width))
    }

    /// The cluster containing only `taxon`
    pub fn singleton(width: usize, taxon: usize) -> Self {
        let mut cluster = Self::empty(width);
        cluster.insert(taxon);
        cluster
    }

    /// Build a cluster from a list of taxa
    pub fn from_taxa<I: IntoIterator<Item = usize>>(width: usize, taxa: I) -> Self {
        let mut cluster = Self::empty(width);
        for taxon in taxa {
            cluster.insert(taxon);
        }
        cluster
    }

    /// The number of taxa this cluster can represent
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Add a taxon to the cluster
    pub fn insert(&mut self, taxon: usize) {
        self.0.insert(taxon);
    }

    /// Remove a taxon from the cluster
    pub fn remove(&mut self, taxon: usize) {
        self.0.set(taxon, false);
    }

    /// Does the cluster contain `taxon`?
    pub fn contains(&self, taxon: usize) -> bool {
        self.0.contains(taxon)
    }

    /// The number of taxa in the cluster
    pub fn len(&self) -> usize {
        self.0.count_ones(..)
    }

    /// Is the cluster empty?
    pub fn is_empty(&self) -> bool {
        self.0.count_ones(..) == 0
    }

    /// Is every taxon of this cluster also in `other`?
    pub fn is_subset(&self, other: &Cluster) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Subset test that excludes equality
    pub fn is_proper_subset(&self, other: &Cluster) -> bool {
        self.is_subset(other) && self != other
    }

    /// Do the two clusters share no taxon?
    pub fn is_disjoint(&self, other: &Cluster) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Add all taxa of `other` to this cluster
    pub fn union_with(&mut self, other: &Cluster) {
        self.0.union_with(&other.0);
    }

    /// Keep only the taxa that are also in `other`
    pub fn intersect_with(&mut self, other: &Cluster) {
        self.0.intersect_with(&other.0);
    }

    /// Remove all taxa of `other` from this cluster
    pub fn difference_with(&mut self, other: &Cluster) {
        self.0.difference_with(&other.0);
    }

    /// The union of two clusters as a new cluster
    pub fn union(&self, other: &Cluster) -> Cluster {
        let mut union = self.clone();
        union.union_with(other);
        union
    }

    /// The intersection of two clusters as a new cluster
    pub fn intersection(&self, other: &Cluster) -> Cluster {
        let mut intersection = self.clone();
        intersection.intersect_with(other);
        intersection
    }

    /// Iterator over the taxa in the cluster, in increasing order
    pub fn taxa(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.ones()
    }

    /// The smallest taxon in the cluster
    pub fn first(&self) -> Option<usize> {
        self.0.ones().next()
    }
}

/// Clusters print as `{0,3,4}`
impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for taxon in self.taxa() {
            if first {
                first = false;
            } else {
                write!(f, ",")?;
            }
            write!(f, "{}", taxon)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Subset and proper subset tests
    #[test]
    fn subsets() {
        let ab  = Cluster::from_taxa(5, vec![0, 1]);
        let abc = Cluster::from_taxa(5, vec![0, 1, 2]);
        let d   = Cluster::singleton(5, 3);
        assert!(ab.is_subset(&abc));
        assert!(ab.is_proper_subset(&abc));
        assert!(abc.is_subset(&abc));
        assert!(!abc.is_proper_subset(&abc));
        assert!(!d.is_subset(&abc));
        assert!(d.is_disjoint(&abc));
    }

    /// Set operations keep the width fixed
    #[test]
    fn set_operations() {
        let ab = Cluster::from_taxa(4, vec![0, 1]);
        let bc = Cluster::from_taxa(4, vec![1, 2]);
        assert_eq!(ab.union(&bc), Cluster::from_taxa(4, vec![0, 1, 2]));
        assert_eq!(ab.intersection(&bc), Cluster::singleton(4, 1));
        let mut a = ab.clone();
        a.difference_with(&bc);
        assert_eq!(a, Cluster::singleton(4, 0));
        assert_eq!(a.width(), 4);
        assert_eq!(ab.len(), 2);
        assert_eq!(format!("{}", ab.union(&bc)), "{0,1,2}");
    }
}
