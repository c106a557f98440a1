//! A validated pair of input trees, both extended with the outgroup taxon `rho` above their roots.
//! The outgroup makes the fragment above every cut well-defined: the fragment containing `rho` is
//! the root fragment of every agreement forest.

use crate::error::Result;
use crate::newick;
use crate::preprocess;
use crate::tree::{Taxa, Tree, TreeBuilder};
use std::sync::Arc;

/// The two trees to be compared, over a shared taxon ordering
#[derive(Clone, Debug)]
pub struct Problem {

    /// The taxon ordering, including the outgroup
    taxa: Arc<Taxa>,

    /// The first tree, with the outgroup attached
    tree1: Tree,

    /// The second tree, with the outgroup attached
    tree2: Tree,
}

impl Problem {

    /// Validate a pair of trees produced by a `TreeBuilder` and attach the outgroup to both
    pub fn new(taxa: Taxa, trees: Vec<Tree>) -> Result<Self> {
        preprocess::validate(&taxa, &trees)?;
        let root_taxon = taxa.root_taxon();
        let tree1      = trees[0].with_outgroup(root_taxon);
        let tree2      = trees[1].with_outgroup(root_taxon);
        Ok(Problem { taxa: Arc::new(taxa), tree1, tree2 })
    }

    /// Parse a problem from a two-line Newick string
    pub fn from_newick(newick: &str) -> Result<Self> {
        let mut builder = TreeBuilder::new();
        newick::parse_forest(&mut builder, newick)?;
        let (taxa, trees) = builder.finish();
        Problem::new(taxa, trees)
    }

    /// The taxon ordering
    pub fn taxa(&self) -> &Arc<Taxa> {
        &self.taxa
    }

    /// The first tree
    pub fn tree1(&self) -> &Tree {
        &self.tree1
    }

    /// The second tree
    pub fn tree2(&self) -> &Tree {
        &self.tree2
    }

    /// The ID of the outgroup taxon
    pub fn root_taxon(&self) -> usize {
        self.taxa.root_taxon()
    }

    /// The number of taxa, including the outgroup
    pub fn taxon_count(&self) -> usize {
        self.taxa.len()
    }
}
