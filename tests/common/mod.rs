//! Helpers shared by the integration tests: random tree pairs and a brute-force oracle that finds
//! maximum (acyclic) agreement forests by trying every partition of the taxa.

#![allow(dead_code)]

use agreement_forest::cluster::Cluster;
use agreement_forest::problem::Problem;
use agreement_forest::tree::{Node, Tree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// A random rooted binary tree over `t0`, ..., `t(n-1)` in Newick format, without the semicolon
pub fn random_tree(rng: &mut StdRng, n: usize) -> String {
    let mut subtrees = (0..n).map(|i| format!("t{}", i)).collect::<Vec<String>>();
    while subtrees.len() > 1 {
        let left  = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        let right = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        subtrees.push(format!("({},{})", left, right));
    }
    subtrees.pop().unwrap_or_default()
}

/// A reproducible random pair of trees over `n` taxa
pub fn random_problem(seed: u64, n: usize) -> (String, Problem) {
    let mut rng = StdRng::seed_from_u64(seed);
    let newick  = format!("{};\n{};\n", random_tree(&mut rng, n), random_tree(&mut rng, n));
    let problem = Problem::from_newick(&newick).unwrap();
    (newick, problem)
}

/// The input trees of a problem without the outgroup
pub fn input_trees(problem: &Problem) -> (Tree, Tree) {
    let mut taxa = problem.taxa().all();
    taxa.remove(problem.root_taxon());
    (problem.tree1().restrict(&taxa), problem.tree2().restrict(&taxa))
}

/// The minimum sizes of agreement forests and acyclic agreement forests, outgroup fragment included
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OracleSizes {
    pub maf:  usize,
    pub maaf: usize,
}

/// Try every partition of the taxa
pub fn oracle(problem: &Problem) -> OracleSizes {
    let n = problem.taxon_count();
    let mut best  = OracleSizes { maf: n, maaf: n };
    let mut block = vec![0; n];
    partitions(&mut block, 0, 0, &mut |blocks| {
        if blocks.len() >= best.maaf && blocks.len() >= best.maf {
            return;
        }
        if is_agreement_forest(problem, blocks) {
            best.maf = best.maf.min(blocks.len());
            if blocks.len() < best.maaf && is_acyclic(problem, blocks) {
                best.maaf = blocks.len();
            }
        }
    });
    best
}

/// All agreement forests of a problem, each given by the clusters of its blocks
pub fn agreement_forests(problem: &Problem) -> Vec<Vec<Cluster>> {
    let mut forests = vec![];
    let mut block   = vec![0; problem.taxon_count()];
    partitions(&mut block, 0, 0, &mut |blocks| {
        if is_agreement_forest(problem, blocks) {
            forests.push(blocks.to_vec());
        }
    });
    forests
}

/// The size of the smallest of the given forests in which every cluster is a union of blocks
pub fn min_refining(forests: &[Vec<Cluster>], clusters: &[Cluster]) -> Option<usize> {
    forests.iter()
        .filter(|blocks| blocks.iter().all(|b| clusters.iter().any(|c| b.is_subset(c))))
        .map(|blocks| blocks.len())
        .min()
}

/// Enumerate all set partitions of `0..block.len()` as restricted growth strings
fn partitions<F: FnMut(&[Cluster])>(block: &mut Vec<usize>, next: usize, count: usize, f: &mut F) {
    let n = block.len();
    if next == n {
        let blocks = (0..count)
            .map(|b| Cluster::from_taxa(n, (0..n).filter(|&t| block[t] == b)))
            .collect::<Vec<_>>();
        f(&blocks);
        return;
    }
    for b in 0..=count {
        block[next] = b;
        partitions(block, next + 1, count.max(b + 1), f);
    }
}

/// The clusters of a tree restricted to a set of taxa
fn restricted_clusters(tree: &Tree, taxa: &Cluster) -> HashSet<Cluster> {
    tree.restrict(taxa).clusters().into_iter().collect()
}

/// The nodes spanned by a set of taxa: descendants of their LCA whose clusters meet the set
fn spanned_nodes(tree: &Tree, taxa: &Cluster) -> HashSet<Node> {
    let lca = match tree.find_lca(taxa) {
        Some(lca) => lca,
        None      => return HashSet::new(),
    };
    tree.nodes()
        .filter(|&v| tree.is_ancestor(lca, v) && !tree.cluster(v).is_disjoint(taxa))
        .collect()
}

/// Do the blocks form an agreement forest of both trees?
pub fn is_agreement_forest(problem: &Problem, blocks: &[Cluster]) -> bool {
    let (tree1, tree2) = (problem.tree1(), problem.tree2());
    if !blocks.iter().all(|b| restricted_clusters(tree1, b) == restricted_clusters(tree2, b)) {
        return false;
    }
    [tree1, tree2].iter().all(|tree| {
        let mut used = HashSet::new();
        blocks.iter().all(|b| spanned_nodes(tree, b).into_iter().all(|v| used.insert(v)))
    })
}

/// Is the inheritance graph of the blocks acyclic?  Block `i` points to block `j` if the root of
/// `i` is a proper ancestor of the root of `j` in either tree.
pub fn is_acyclic(problem: &Problem, blocks: &[Cluster]) -> bool {
    let k = blocks.len();
    let roots = [problem.tree1(), problem.tree2()].iter()
        .map(|tree| blocks.iter().map(|b| tree.find_lca(b)).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let trees = [problem.tree1(), problem.tree2()];
    let edge  = |i: usize, j: usize| (0..2).any(|t| match (roots[t][i], roots[t][j]) {
        (Some(u), Some(v)) => u != v && trees[t].is_ancestor(u, v),
        _                  => false,
    });

    // Repeatedly remove blocks without incoming edges
    let mut removed = vec![false; k];
    for _ in 0..k {
        let source = (0..k).find(|&j| !removed[j] && (0..k).all(|i| removed[i] || !edge(i, j)));
        match source {
            Some(j) => removed[j] = true,
            None    => return false,
        }
    }
    true
}
