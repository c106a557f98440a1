mod common;

use agreement_forest::forest::{bound, ForestSearch, Mode, Relation, State, Symbols};
use agreement_forest::parallel::{NoProgress, Outcome, ParallelSizeSearch, SearchConfig};
use common::{agreement_forests, input_trees, is_acyclic, is_agreement_forest, min_refining, oracle,
             random_problem};
use std::collections::{BTreeSet, HashSet};

/// The seeds and tree sizes of the random instances
fn instances() -> impl Iterator<Item = (u64, usize)> {
    (0..24).map(|seed| (seed, 4 + seed as usize % 4))
}

/// The minimum forest size found by a sequential search
fn minimum(problem: &agreement_forest::problem::Problem, mode: Mode, use_cache: bool) -> usize {
    let (candidates, _) = ForestSearch::new(problem, mode).use_cache(use_cache).run().unwrap();
    candidates.min_size().unwrap()
}

/// The search finds the same minimum sizes as exhaustive enumeration, with and without the cache
#[test]
fn search_matches_oracle() {
    for (seed, n) in instances() {
        let (newick, problem) = random_problem(seed, n);
        let sizes = oracle(&problem);
        assert_eq!(minimum(&problem, Mode::RsprDistance, true), sizes.maf, "rSPR for {}", newick);
        assert_eq!(minimum(&problem, Mode::HybridNumber, true), sizes.maaf, "MAAF for {}", newick);
        assert_eq!(minimum(&problem, Mode::RsprDistance, false), sizes.maf, "no cache: {}", newick);
        assert_eq!(minimum(&problem, Mode::HybridNumber, false), sizes.maaf, "no cache: {}", newick);
    }
}

/// The estimate never undershoots the cuts needed, and the derived bound never overshoots them
#[test]
fn estimator_bounds() {
    for (seed, n) in instances() {
        let (newick, problem) = random_problem(seed, n);
        let sizes    = oracle(&problem);
        let estimate = bound::estimate(&State::new(problem.tree1(), problem.tree2()));
        assert!(estimate >= sizes.maf - 1, "estimate {} too small for {}", estimate, newick);
        assert!(bound::lower_bound(estimate) <= sizes.maf - 1, "bound too large for {}", newick);
    }
}

/// The bound holds not only initially but in every state the search can reach: the state's size
/// plus the bound never exceeds the size of the smallest agreement forest refining the state
#[test]
fn bound_on_reachable_states() {
    for (seed, n) in instances().take(12) {
        let (newick, problem) = random_problem(seed, n);
        let forests     = agreement_forests(&problem);
        let mut symbols = Symbols::new(problem.tree1().width());
        let mut seen    = HashSet::new();
        let mut states  = vec![State::new(problem.tree1(), problem.tree2())];
        while let Some(mut state) = states.pop() {
            state.remove_singletons();
            if !seen.insert(state.key()) {
                continue;
            }
            let best  = min_refining(&forests, &state.clusters()).unwrap();
            let bound = state.size() + bound::lower_bound(bound::estimate(&state));
            assert!(bound <= best, "bound {} above {} in {:?} for {}",
                    bound, best, state.clusters(), newick);

            if state.tree().leaf_count() < 3 {
                continue;
            }
            let (a, b) = state.tree().first_cherry().unwrap();
            let cut    = |symbol: usize| {
                let mut next = state.clone();
                next.cut_leaf(symbol);
                next
            };
            match state.relation(a, b).unwrap() {
                Relation::Siblings => {
                    let mut keep = state.clone();
                    keep.contract(a, b, symbols.contract(a, b));
                    let mut split = cut(a);
                    split.cut_leaf(b);
                    states.push(keep);
                    states.push(split);
                },
                Relation::Separate => {
                    states.push(cut(a));
                    states.push(cut(b));
                },
                Relation::Pendants(fragment, pendants) => {
                    let mut merged = state.clone();
                    for &pendant in &pendants {
                        merged.cut_node(fragment, pendant);
                    }
                    merged.contract(a, b, symbols.contract(a, b));
                    states.push(cut(a));
                    states.push(cut(b));
                    states.push(merged);
                },
            }
        }
    }
}

/// Every forest found partitions the taxa into blocks that agree and, unless computing the rSPR
/// distance, form an acyclic forest
#[test]
fn forests_are_valid() {
    for (seed, n) in instances().take(12) {
        let (newick, problem) = random_problem(seed, n);
        for &mode in &[Mode::HybridNumber, Mode::RsprDistance] {
            let (candidates, _) = ForestSearch::new(&problem, mode).run().unwrap();
            let (_, forests) = candidates.into_min().unwrap();
            for forest in forests {
                assert!(forest.is_partition_of(&problem.taxa().all()), "{}", newick);
                let blocks = forest.clusters();
                assert!(is_agreement_forest(&problem, &blocks), "{}", newick);
                if mode.requires_acyclicity() {
                    assert!(is_acyclic(&problem, &blocks), "{}", newick);
                }
                assert!(forest.root_fragment().unwrap().taxa().contains(problem.root_taxon()));
            }
        }
    }
}

/// One thread or several, the minimum size and the set of minimum forests are the same
#[test]
fn pool_size_independence() {
    for (seed, n) in instances().take(8) {
        let (newick, problem) = random_problem(seed, n);
        let run = |threads| {
            let config = SearchConfig {
                num_threads: threads,
                all_forests: true,
                ..SearchConfig::default()
            };
            let outcome = ParallelSizeSearch::new(&problem, config).run(&NoProgress).unwrap();
            let partitions = outcome.forests().iter()
                .map(|forest| forest.partition())
                .collect::<BTreeSet<_>>();
            (outcome.distance(), partitions)
        };
        assert_eq!(run(1), run(4), "{}", newick);
    }
}

/// Every network built from a minimum forest displays both input trees
#[test]
fn networks_display_both_trees() {
    for (seed, n) in instances().take(12) {
        let (newick, problem) = random_problem(seed, n);
        let config = SearchConfig { num_threads: 2, mode: Mode::Network, ..SearchConfig::default() };
        let outcome = ParallelSizeSearch::new(&problem, config).run(&NoProgress).unwrap();
        let (tree1, tree2) = input_trees(&problem);
        match outcome {
            Outcome::Exact { size, networks, forests } => {
                assert_eq!(networks.len(), forests.len());
                for network in &networks {
                    assert!(network.displays(&tree1), "first tree not displayed for {}", newick);
                    assert!(network.displays(&tree2), "second tree not displayed for {}", newick);
                    assert!(network.reticulation_count() <= size - 1);
                }
            },
            other => panic!("expected an exact result, got {:?}", other),
        }
    }
}
