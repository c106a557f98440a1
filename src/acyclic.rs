//! The acyclicity test for agreement forests.
//!
//! Every fragment other than the root fragment is attached somewhere inside each input tree: at
//! the lowest common ancestor of its taxa.  If the attachment point of fragment `f` lies strictly
//! below that of fragment `g` in either tree, then `f` has to be re-attached before `g`, which
//! gives an edge `f -> g` of the inheritance graph.  A forest is acyclic if this graph is, and a
//! topological order of it (root fragment last) is the order in which a network can be assembled
//! from the forest.

use crate::cluster::Cluster;
use crate::tree::Tree;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Checks forests over two fixed trees
#[derive(Clone, Copy, Debug)]
pub struct AcyclicityChecker<'a> {

    /// The first input tree
    tree1: &'a Tree,

    /// The second input tree
    tree2: &'a Tree,

    /// The outgroup taxon, which identifies the root fragment
    root_taxon: usize,
}

impl<'a> AcyclicityChecker<'a> {

    /// Create a checker for forests of the given trees
    pub fn new(tree1: &'a Tree, tree2: &'a Tree, root_taxon: usize) -> Self {
        AcyclicityChecker { tree1, tree2, root_taxon }
    }

    /// The clusters of the attachment points of a fragment in both trees
    fn attachment(&self, fragment: &Cluster) -> Option<(Cluster, Cluster)> {
        let lca1 = self.tree1.find_lca(fragment)?;
        let lca2 = self.tree2.find_lca(fragment)?;
        Some((self.tree1.cluster(lca1), self.tree2.cluster(lca2)))
    }

    /// Order the fragments, given by their clusters, so that every fragment comes before all
    /// fragments it must be attached below.  Ties are broken by the fragments' positions in the
    /// input.  The root fragment comes last.  Returns `None` if the forest is cyclic.
    pub fn order(&self, fragments: &[Cluster]) -> Option<Vec<usize>> {
        let root = fragments.iter().position(|fragment| fragment.contains(self.root_taxon));
        let mut attachments = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            if Some(i) == root {
                attachments.push(None);
            } else {
                attachments.push(Some(self.attachment(fragment)?));
            }
        }

        let n = fragments.len();
        let mut successors = vec![vec![]; n];
        let mut in_degree  = vec![0; n];
        for (i, f) in attachments.iter().enumerate() {
            for (j, g) in attachments.iter().enumerate() {
                if let (Some((f1, f2)), Some((g1, g2))) = (f, g) {
                    if f1.is_proper_subset(g1) || f2.is_proper_subset(g2) {
                        successors[i].push(j);
                        in_degree[j] += 1;
                    }
                }
            }
        }

        let mut ready = (0..n)
            .filter(|&i| Some(i) != root && in_degree[i] == 0)
            .map(Reverse)
            .collect::<BinaryHeap<_>>();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &j in &successors[i] {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        let expected = if root.is_some() { n - 1 } else { n };
        if order.len() < expected {
            return None;
        }
        order.extend(root);
        Some(order)
    }

    /// Is the forest acyclic?
    pub fn is_acyclic(&self, fragments: &[Cluster]) -> bool {
        self.order(fragments).is_some()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::problem::Problem;

    /// The clusters of the given taxa, by label
    fn forest(problem: &Problem, fragments: &[&[&str]]) -> Vec<Cluster> {
        let taxa = problem.taxa();
        fragments.iter()
            .map(|labels| Cluster::from_taxa(
                taxa.len(), labels.iter().map(|label| taxa.id(label).unwrap())))
            .collect()
    }

    /// Two fragments whose attachment points nest in opposite directions form a cycle
    #[test]
    fn cyclic_forest() {
        let problem = Problem::from_newick("((a,(c,d)),b);\n((c,(a,b)),d);\n").unwrap();
        let checker = AcyclicityChecker::new(problem.tree1(), problem.tree2(), problem.root_taxon());
        let cyclic  = forest(&problem, &[&["a", "b"], &["c", "d"], &["rho"]]);
        assert_eq!(checker.order(&cyclic), None);
        assert!(!checker.is_acyclic(&cyclic));
    }

    /// Fragments are ordered inside-out, root fragment last
    #[test]
    fn acyclic_forest() {
        let problem = Problem::from_newick("(((a,b),c),d);\n((a,(b,c)),d);\n").unwrap();
        let checker = AcyclicityChecker::new(problem.tree1(), problem.tree2(), problem.root_taxon());
        let fragments = forest(&problem, &[&["a", "b", "d", "rho"], &["c"]]);
        assert_eq!(checker.order(&fragments), Some(vec![1, 0]));

        let fragments = forest(&problem, &[&["d", "rho"], &["b"], &["a", "c"]]);
        assert_eq!(checker.order(&fragments), Some(vec![1, 2, 0]));

        let singletons = forest(&problem, &[&["rho"], &["d"], &["c"], &["b"], &["a"]]);
        assert_eq!(checker.order(&singletons), Some(vec![1, 2, 3, 4, 0]));
    }
}
