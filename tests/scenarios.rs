use agreement_forest::acyclic::AcyclicityChecker;
use agreement_forest::cluster::Cluster;
use agreement_forest::error::Error;
use agreement_forest::forest::{ForestSearch, Mode};
use agreement_forest::newick;
use agreement_forest::parallel::{NoProgress, ParallelSizeSearch, SearchConfig};
use agreement_forest::problem::Problem;
use std::collections::BTreeSet;

/// Run the parallel search with the given pool size
fn distance(newick: &str, threads: usize, mode: Mode) -> Option<usize> {
    let problem = Problem::from_newick(newick).unwrap();
    let config  = SearchConfig { num_threads: threads, mode, ..SearchConfig::default() };
    ParallelSizeSearch::new(&problem, config).run(&NoProgress).unwrap().distance()
}

/// Two identical trees: one fragment, distance 0, found without searching
#[test]
fn identical_trees() {
    let newick  = "(((a,b),c),d);\n(((a,b),c),d);\n";
    let problem = Problem::from_newick(newick).unwrap();
    let (candidates, stats) = ForestSearch::new(&problem, Mode::HybridNumber).run().unwrap();
    assert_eq!(candidates.min_size(), Some(1));
    assert_eq!(stats.calls, 0);
    assert_eq!(distance(newick, 1, Mode::HybridNumber), Some(0));
    assert_eq!(distance(newick, 1, Mode::RsprDistance), Some(0));
}

/// Trees one SPR move apart: two fragments, distance 1
#[test]
fn one_spr_move() {
    let newick = "(((a,b),c),d);\n((a,(b,c)),d);\n";
    for &mode in &[Mode::HybridNumber, Mode::Network, Mode::RsprDistance] {
        assert_eq!(distance(newick, 2, mode), Some(1));
    }
}

/// Fragments whose attachment points nest in opposite directions in the two trees are cyclic
#[test]
fn cyclic_forest() {
    let problem = Problem::from_newick("((a,(c,d)),b);\n((c,(a,b)),d);\n").unwrap();
    let taxa    = problem.taxa();
    let cluster = |labels: &[&str]| Cluster::from_taxa(
        taxa.len(), labels.iter().map(|label| taxa.id(label).unwrap()));
    let checker = AcyclicityChecker::new(problem.tree1(), problem.tree2(), problem.root_taxon());
    assert!(!checker.is_acyclic(&[cluster(&["a", "b"]), cluster(&["c", "d"]), cluster(&["rho"])]));
    assert!(checker.is_acyclic(&[cluster(&["c"]), cluster(&["d"]), cluster(&["a", "b", "rho"])]));
}

/// The pool size does not change the minimum or the minimum forests
#[test]
fn pool_sizes() {
    let problem = Problem::from_newick(
        "(((a,b),(c,d)),((e,f),g));\n(((a,c),(b,g)),((e,d),f));\n").unwrap();
    let run = |threads| {
        let config = SearchConfig { num_threads: threads, all_forests: true, ..SearchConfig::default() };
        let outcome = ParallelSizeSearch::new(&problem, config).run(&NoProgress).unwrap();
        let forests = outcome.forests().iter()
            .map(|forest| forest.partition())
            .collect::<BTreeSet<_>>();
        (outcome.distance(), forests)
    };
    let (single, pooled) = (run(1), run(6));
    assert!(single.0.is_some());
    assert_eq!(single, pooled);
}

/// Malformed input is rejected before the search
#[test]
fn invalid_input() {
    assert!(matches!(Problem::from_newick("((a,b),c);\n"), Err(Error::TreeCount(1))));
    assert!(matches!(Problem::from_newick("((a,b),c);\n((a,b),d);\n"), Err(Error::TaxaMismatch(_))));
    assert!(matches!(Problem::from_newick("(a,b,c);\n((a,b),c);\n"), Err(Error::Parse(_))));
    assert!(matches!(Problem::from_newick("((a,b),rho);\n((a,b),rho);\n"), Err(Error::Parse(_))));
}

/// A forest prints as one Newick tree per fragment
#[test]
fn forest_output() {
    let problem = Problem::from_newick("(((a,b),c),d);\n((a,(b,c)),d);\n").unwrap();
    let (candidates, _) = ForestSearch::new(&problem, Mode::RsprDistance).run().unwrap();
    let (_, forests) = candidates.into_min().unwrap();
    let text = newick::format_forest(forests[0].fragments(), |t| problem.taxa().label(t).to_string());
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("rho"));
}
