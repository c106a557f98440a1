//! This module implements the application logic of `maaf`, that is, the code that pulls together
//! the preprocessing, the parallel forest search and the network construction in order to compute
//! the final result.

use crate::app::Config;
use crate::error::Result;
use crate::forest::Mode;
use crate::parallel::{LogProgress, Outcome, ParallelSizeSearch};
use crate::preprocess::{self, Reduction, ReplacementInfo};
use crate::problem::Problem;
use crate::tree::{Taxa, Tree};
use std::sync::Arc;
use tracing::info;

/// The result of a run, with everything needed to print it over the input taxa
#[derive(Clone, Debug)]
pub struct Report {

    /// What was computed
    pub mode: Mode,

    /// The taxa the search ran on, placeholders and outgroup included
    pub taxa: Arc<Taxa>,

    /// How to expand placeholders
    pub replacements: ReplacementInfo,

    /// The search result
    pub outcome: Outcome,
}

impl Report {

    /// The text of a taxon, with placeholders expanded to their subtrees
    pub fn leaf_label(&self, taxon: usize) -> String {
        self.replacements.expand(self.taxa.label(taxon))
    }
}

/// Compute the distance, forests and networks of two trees as configured
pub fn compute(cfg: &Config, taxa: Taxa, trees: Vec<Tree>) -> Result<Report> {
    let reduction = if cfg.use_reduction {
        preprocess::reduce_common_subtrees(taxa, trees)?
    } else {
        preprocess::validate(&taxa, &trees)?;
        let replacements = ReplacementInfo::identity(Arc::new(taxa.clone()));
        Reduction { taxa, trees, replacements }
    };
    if !reduction.replacements.is_empty() {
        info!("Reduced the input to {} taxa", reduction.taxa.len() - 1);
    }

    let problem = Problem::new(reduction.taxa, reduction.trees)?;
    let outcome = ParallelSizeSearch::new(&problem, cfg.search_config()).run(&LogProgress)?;
    Ok(Report {
        mode:         cfg.mode,
        taxa:         problem.taxa().clone(),
        replacements: reduction.replacements,
        outcome,
    })
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::newick;
    use crate::tree::TreeBuilder;

    /// Parse two trees
    fn input(newick: &str) -> (Taxa, Vec<Tree>) {
        let mut builder = TreeBuilder::new();
        newick::parse_forest(&mut builder, newick).unwrap();
        builder.finish()
    }

    /// A configuration for tests
    fn config(use_reduction: bool, mode: Mode) -> Config {
        let mut cfg = Config::from_args(vec!["maaf", "unused.nwk"]);
        cfg.use_reduction = use_reduction;
        cfg.mode          = mode;
        cfg.num_threads   = 2;
        cfg
    }

    /// Subtree reduction does not change the distance
    #[test]
    fn reduction() {
        let newick = "((((a,b),(x,y)),c),d);\n(((a,b),(c,(x,y))),d);\n";
        for &mode in &[Mode::HybridNumber, Mode::RsprDistance] {
            let (taxa, trees) = input(newick);
            let reduced = compute(&config(true, mode), taxa, trees).unwrap();
            let (taxa, trees) = input(newick);
            let plain = compute(&config(false, mode), taxa, trees).unwrap();
            assert_eq!(reduced.outcome.distance(), Some(1));
            assert_eq!(plain.outcome.distance(), Some(1));
            assert!(!reduced.replacements.is_empty());
            assert!(reduced.taxa.len() < plain.taxa.len());
        }
    }

    /// Placeholders are printed as the subtrees they stand for
    #[test]
    fn leaf_labels() {
        let (taxa, trees) = input("((((a,b),(x,y)),c),d);\n(((a,b),(c,(x,y))),d);\n");
        let report = compute(&config(true, Mode::HybridNumber), taxa, trees).unwrap();
        let labels = (0..report.taxa.len()).map(|t| report.leaf_label(t)).collect::<Vec<_>>();
        assert!(labels.contains(&"(a,b)".to_string()));
        assert!(labels.contains(&"(x,y)".to_string()));
        assert!(labels.contains(&"c".to_string()));
    }

    /// Invalid input is rejected
    #[test]
    fn invalid() {
        let (taxa, trees) = input("((a,b),c);\n((a,b),d);\n");
        assert!(compute(&config(false, Mode::HybridNumber), taxa, trees).is_err());
    }
}
