//! Input validation and the common pendant subtree reduction.
//!
//! A subtree that appears identically in both input trees never needs to be cut, so it can be
//! replaced by a single placeholder leaf before the search starts.  The placeholder's label is the
//! Newick text of the subtree it stands for; since Newick labels cannot contain parentheses or
//! commas, placeholder labels never collide with input labels.  `ReplacementInfo` maps each
//! placeholder back to its subtree so that forests and networks can be printed over the original
//! taxa.

use crate::cluster::Cluster;
use crate::error::{Error, Result};
use crate::newick;
use crate::tree::{Node, Taxa, Tree, TreeBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Check that the input consists of two trees over the same set of at least two taxa
pub fn validate(taxa: &Taxa, trees: &[Tree]) -> Result<()> {
    if trees.len() != 2 {
        return Err(Error::TreeCount(trees.len()));
    }
    let (taxa1, taxa2) = (trees[0].taxa(), trees[1].taxa());
    if taxa1 != taxa2 {
        let mut diff = taxa1.union(&taxa2);
        diff.difference_with(&taxa1.intersection(&taxa2));
        let labels = diff.taxa().map(|t| taxa.label(t)).collect::<Vec<_>>();
        return Err(Error::TaxaMismatch(labels.join(", ")));
    }
    if taxa1.len() < 2 {
        return Err(Error::TooFewTaxa(taxa1.len()));
    }
    Ok(())
}

/// The mapping from placeholder taxa back to the subtrees they replaced
#[derive(Clone, Debug)]
pub struct ReplacementInfo {

    /// The taxa of the unreduced input
    original: Arc<Taxa>,

    /// The replaced subtrees over the original taxa, indexed by placeholder label
    subtrees: HashMap<String, Tree>,
}

impl ReplacementInfo {

    /// Replacement info that replaces nothing
    pub fn identity(original: Arc<Taxa>) -> Self {
        ReplacementInfo { original, subtrees: HashMap::new() }
    }

    /// The number of placeholders
    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    /// Were any subtrees replaced?
    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    /// The Newick text of a leaf with the given label, expanding placeholders
    pub fn expand(&self, label: &str) -> String {
        match self.subtrees.get(label) {
            Some(subtree) => newick::format_tree(subtree, |t| self.original.label(t).to_string())
                .map(|text| text.trim_end_matches(';').to_string())
                .unwrap_or_else(|| label.to_string()),
            None => label.to_string(),
        }
    }
}

/// The result of reducing a pair of trees
#[derive(Clone, Debug)]
pub struct Reduction {

    /// The taxa of the reduced trees, placeholders included
    pub taxa: Taxa,

    /// The reduced trees
    pub trees: Vec<Tree>,

    /// How to expand placeholders
    pub replacements: ReplacementInfo,
}

/// Replace every maximal subtree with at least two leaves that is identical in both trees by a
/// placeholder leaf.  Identical trees are left alone.
pub fn reduce_common_subtrees(taxa: Taxa, trees: Vec<Tree>) -> Result<Reduction> {
    validate(&taxa, &trees)?;
    let original = Arc::new(taxa);
    let common   = common_nodes(&trees[0], &trees[1]);

    let maximal = match trees[0].root() {
        Some(root) if !common.contains(&root) => trees[0].nodes()
            .filter(|&v| !trees[0].is_leaf(v) && common.contains(&v))
            .filter(|&v| trees[0].parent(v).map_or(false, |p| !common.contains(&p)))
            .collect::<Vec<Node>>(),
        _ => vec![],
    };

    if maximal.is_empty() {
        let replacements = ReplacementInfo::identity(original.clone());
        let taxa         = (*original).clone();
        return Ok(Reduction { taxa, trees, replacements });
    }

    let mut placeholders = HashMap::new();
    let mut subtrees     = HashMap::new();
    for &v in &maximal {
        let label = newick::format_subtree(&trees[0], v, |t| original.label(t).to_string())
            .unwrap_or_default();
        placeholders.insert(trees[0].cluster(v), label.clone());
        subtrees.insert(label, trees[0].copy_subtree(v));
    }
    debug!("Replacing {} common subtrees by placeholder leaves", maximal.len());

    let mut builder = TreeBuilder::new();
    for tree in &trees {
        builder.new_tree();
        if let Some(root) = tree.root() {
            let root = rebuild(&mut builder, tree, root, &original, &placeholders)?;
            builder.finish_tree(root);
        }
    }
    let (taxa, trees) = builder.finish();
    let replacements  = ReplacementInfo { original, subtrees };
    Ok(Reduction { taxa, trees, replacements })
}

/// The nodes of `tree1` whose subtrees appear identically in `tree2`
fn common_nodes(tree1: &Tree, tree2: &Tree) -> HashSet<Node> {
    let clusters2 = tree2.clusters().into_iter().collect::<HashSet<Cluster>>();
    let mut common = HashSet::new();
    for v in tree1.post_order() {
        let children_common = match tree1.children(v) {
            Some((l, r)) => common.contains(&l) && common.contains(&r),
            None         => true,
        };
        if children_common && clusters2.contains(&tree1.cluster(v)) {
            common.insert(v);
        }
    }
    common
}

/// Copy the subtree below `node` into the builder, replacing common subtrees by placeholders
fn rebuild(
    builder:      &mut TreeBuilder,
    tree:         &Tree,
    node:         Node,
    taxa:         &Taxa,
    placeholders: &HashMap<Cluster, String>,
) -> Result<Node> {
    if let Some(label) = placeholders.get(&tree.cluster(node)) {
        return Ok(builder.new_leaf(label.clone())?);
    }
    match tree.children(node) {
        Some((l, r)) => {
            let l = rebuild(builder, tree, l, taxa, placeholders)?;
            let r = rebuild(builder, tree, r, taxa, placeholders)?;
            Ok(builder.new_node(vec![l, r])?)
        },
        None => {
            let label = taxa.label(tree.label(node).unwrap_or_default()).to_string();
            Ok(builder.new_leaf(label)?)
        },
    }
}
