//! Rooted binary phylogenetic trees.  Leaves carry `usize` labels, which are taxon IDs for input
//! trees and symbol IDs for the reduced trees manipulated by the forest search.  Every node has a
//! cluster, the set of taxa below it.  Leaves store their cluster explicitly, so a leaf may stand
//! for a whole set of taxa; clusters of internal nodes are derived and cached until the next
//! change of the tree's topology.

use crate::cluster::Cluster;
use slab::Slab;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// The label reserved for the outgroup taxon added above the root of both input trees
pub const ROOT_TAXON_LABEL: &str = "rho";

/// The type used to represent tree nodes
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Node(usize);

impl Node {
    /// Access the ID of this node
    pub fn id(&self) -> usize {
        self.0
    }
}

/// The information stored for each node
#[derive(Clone, Debug)]
struct NodeData {

    /// Parent
    parent: Option<Node>,

    /// The two children of an internal node
    children: Option<(Node, Node)>,

    /// The label of a leaf
    label: Option<usize>,

    /// The cluster of a leaf
    leaf_cluster: Option<Cluster>,
}

/// Lazily computed clusters of all nodes
#[derive(Clone, Debug)]
struct ClusterCache {

    /// Set whenever the topology changes
    dirty: bool,

    /// Clusters indexed by node ID
    clusters: Vec<Option<Cluster>>,
}

/// A rooted binary tree
#[derive(Clone, Debug)]
pub struct Tree {

    /// The nodes of the tree
    nodes: Slab<NodeData>,

    /// The root of the tree, `None` for the empty tree
    root: Option<Node>,

    /// Map from leaf labels to leaves
    leaves: BTreeMap<usize, Node>,

    /// The width of the clusters of this tree
    width: usize,

    /// The cluster cache
    clusters: RefCell<ClusterCache>,
}

impl Tree {

    //----------------------------------------------------------------------------------------------
    // Construction
    //----------------------------------------------------------------------------------------------

    /// Create an empty tree whose clusters have the given width
    pub fn new(width: usize) -> Self {
        Tree {
            nodes:    Slab::new(),
            root:     None,
            leaves:   BTreeMap::new(),
            width,
            clusters: RefCell::new(ClusterCache { dirty: true, clusters: vec![] }),
        }
    }

    /// Add a leaf whose cluster is the singleton set of its label
    pub fn add_leaf(&mut self, label: usize) -> Node {
        let cluster = Cluster::singleton(self.width, label);
        self.add_leaf_with_cluster(label, cluster)
    }

    /// Add a leaf that stands for the given cluster
    pub fn add_leaf_with_cluster(&mut self, label: usize, cluster: Cluster) -> Node {
        let node = Node(self.nodes.insert(NodeData {
            parent:       None,
            children:     None,
            label:        Some(label),
            leaf_cluster: Some(cluster),
        }));
        self.leaves.insert(label, node);
        self.invalidate();
        node
    }

    /// Add an internal node with the given two children
    pub fn add_internal(&mut self, left: Node, right: Node) -> Node {
        let node = Node(self.nodes.insert(NodeData {
            parent:       None,
            children:     Some((left, right)),
            label:        None,
            leaf_cluster: None,
        }));
        self.nodes[left.0].parent  = Some(node);
        self.nodes[right.0].parent = Some(node);
        self.invalidate();
        node
    }

    /// Make the given node the root of the tree
    pub fn set_root(&mut self, root: Node) {
        self.root = Some(root);
        self.invalidate();
    }

    /// A copy of this tree with an extra leaf `label` attached as the sibling of the root
    pub fn with_outgroup(&self, label: usize) -> Tree {
        let mut tree = self.clone();
        let leaf     = tree.add_leaf(label);
        let root     = match tree.root {
            Some(root) => tree.add_internal(root, leaf),
            None       => leaf,
        };
        tree.set_root(root);
        tree
    }

    /// Copy the subtree rooted in `node` into a new tree
    pub fn copy_subtree(&self, node: Node) -> Tree {
        let mut tree = Tree::new(self.width);
        let root     = self.copy_into(node, &mut tree);
        tree.set_root(root);
        tree
    }

    /// Copy the subtree rooted in `node` into `target` and return the root of the copy.  The copy
    /// is not attached to any node of `target`.
    pub fn copy_into(&self, node: Node, target: &mut Tree) -> Node {
        let mut copies = HashMap::new();
        for u in self.post_order_from(node) {
            let copy = match self.nodes[u.0].children {
                Some((l, r)) => target.add_internal(copies[&l], copies[&r]),
                None         => {
                    let data = &self.nodes[u.0];
                    let cluster = data.leaf_cluster.clone()
                        .unwrap_or_else(|| Cluster::empty(self.width));
                    target.add_leaf_with_cluster(data.label.unwrap_or_default(), cluster)
                },
            };
            copies.insert(u, copy);
        }
        copies[&node]
    }

    /// Rebuild the tree with leaf labels mapped through `relabel`.  Leaf clusters become the
    /// singletons of the new labels over `width` taxa.
    pub fn relabel<F: Fn(usize) -> usize>(&self, width: usize, relabel: F) -> Tree {
        let mut tree = Tree::new(width);
        if let Some(root) = self.root {
            let mut copies = HashMap::new();
            for u in self.post_order_from(root) {
                let copy = match (self.nodes[u.0].children, self.nodes[u.0].label) {
                    (Some((l, r)), _)   => tree.add_internal(copies[&l], copies[&r]),
                    (None, Some(label)) => tree.add_leaf(relabel(label)),
                    (None, None)        => continue,
                };
                copies.insert(u, copy);
            }
            tree.set_root(copies[&root]);
        }
        tree
    }

    /// The restriction of this tree to the leaves whose clusters lie inside `keep`, with
    /// unary nodes suppressed.  Returns the empty tree if no leaf is kept.
    pub fn restrict(&self, keep: &Cluster) -> Tree {
        let mut tree = Tree::new(self.width);
        if let Some(root) = self.root {
            let mut copies: HashMap<Node, Option<Node>> = HashMap::new();
            for u in self.post_order_from(root) {
                let copy = match self.nodes[u.0].children {
                    Some((l, r)) => match (copies[&l], copies[&r]) {
                        (Some(l), Some(r)) => Some(tree.add_internal(l, r)),
                        (Some(c), None) | (None, Some(c)) => Some(c),
                        (None, None) => None,
                    },
                    None => {
                        let data = &self.nodes[u.0];
                        match (data.label, &data.leaf_cluster) {
                            (Some(label), Some(cluster)) if cluster.is_subset(keep) =>
                                Some(tree.add_leaf_with_cluster(label, cluster.clone())),
                            _ => None,
                        }
                    },
                };
                copies.insert(u, copy);
            }
            if let Some(root) = copies[&root] {
                tree.set_root(root);
            }
        }
        tree
    }

    //----------------------------------------------------------------------------------------------
    // Navigation
    //----------------------------------------------------------------------------------------------

    /// The width of the clusters of this tree
    pub fn width(&self) -> usize {
        self.width
    }

    /// The root node of this tree
    pub fn root(&self) -> Option<Node> {
        self.root
    }

    /// Is this the empty tree?
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The number of nodes in this tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The number of leaves in this tree
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// The number of edges in this tree
    pub fn edge_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Iterator over all nodes, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.iter().map(|(id, _)| Node(id))
    }

    /// Iterator over the leaves in increasing order of their labels
    pub fn leaves(&self) -> impl Iterator<Item = Node> + '_ {
        self.leaves.values().cloned()
    }

    /// Iterator over the leaf labels in increasing order
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.leaves.keys().cloned()
    }

    /// The leaf with the given label
    pub fn leaf(&self, label: usize) -> Option<Node> {
        self.leaves.get(&label).cloned()
    }

    /// The parent of a node
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.nodes[node.0].parent
    }

    /// The children of a node, `None` for a leaf
    pub fn children(&self, node: Node) -> Option<(Node, Node)> {
        self.nodes[node.0].children
    }

    /// Is the node a leaf?
    pub fn is_leaf(&self, node: Node) -> bool {
        self.nodes[node.0].children.is_none()
    }

    /// The label of a leaf
    pub fn label(&self, node: Node) -> Option<usize> {
        self.nodes[node.0].label
    }

    /// The other child of a node's parent
    pub fn sibling(&self, node: Node) -> Option<Node> {
        let (l, r) = self.children(self.parent(node)?)?;
        if l == node { Some(r) } else { Some(l) }
    }

    /// Is `ancestor` an ancestor of `node` or `node` itself?
    pub fn is_ancestor(&self, ancestor: Node, node: Node) -> bool {
        let mut current = Some(node);
        while let Some(u) = current {
            if u == ancestor {
                return true;
            }
            current = self.parent(u);
        }
        false
    }

    /// The lowest common ancestor of two nodes
    pub fn lca(&self, u: Node, v: Node) -> Option<Node> {
        let mut ancestors = HashSet::new();
        let mut current   = Some(u);
        while let Some(x) = current {
            ancestors.insert(x);
            current = self.parent(x);
        }
        let mut current = Some(v);
        while let Some(x) = current {
            if ancestors.contains(&x) {
                return Some(x);
            }
            current = self.parent(x);
        }
        None
    }

    /// All nodes in post-order (left child first)
    pub fn post_order(&self) -> Vec<Node> {
        match self.root {
            Some(root) => self.post_order_from(root),
            None       => vec![],
        }
    }

    /// The nodes of the subtree rooted in `node` in post-order
    pub fn post_order_from(&self, node: Node) -> Vec<Node> {
        let mut order = vec![];
        let mut stack = vec![(node, false)];
        while let Some((u, expanded)) = stack.pop() {
            if expanded {
                order.push(u);
            } else {
                stack.push((u, true));
                if let Some((l, r)) = self.children(u) {
                    stack.push((r, false));
                    stack.push((l, false));
                }
            }
        }
        order
    }

    /// The pairs of leaf labels that form cherries, each pair ordered, in post-order
    pub fn cherries(&self) -> Vec<(usize, usize)> {
        self.post_order().into_iter().filter_map(|u| self.cherry_at(u)).collect()
    }

    /// The first cherry in post-order
    pub fn first_cherry(&self) -> Option<(usize, usize)> {
        self.post_order().into_iter().find_map(|u| self.cherry_at(u))
    }

    /// The ordered pair of leaf labels below `node` if both its children are leaves
    fn cherry_at(&self, node: Node) -> Option<(usize, usize)> {
        let (l, r) = self.children(node)?;
        let (l, r) = (self.label(l)?, self.label(r)?);
        Some(if l < r { (l, r) } else { (r, l) })
    }

    //----------------------------------------------------------------------------------------------
    // Clusters
    //----------------------------------------------------------------------------------------------

    /// The cluster of a node
    pub fn cluster(&self, node: Node) -> Cluster {
        self.refresh_clusters();
        self.clusters.borrow().clusters[node.0].clone()
            .unwrap_or_else(|| Cluster::empty(self.width))
    }

    /// The set of taxa of the whole tree
    pub fn taxa(&self) -> Cluster {
        match self.root {
            Some(root) => self.cluster(root),
            None       => Cluster::empty(self.width),
        }
    }

    /// The clusters of all nodes, in post-order
    pub fn clusters(&self) -> Vec<Cluster> {
        self.post_order().into_iter().map(|u| self.cluster(u)).collect()
    }

    /// The smallest node whose cluster is a superset of `query`.  Clusters strictly nest along
    /// root paths, so the first match in post-order is the answer.
    pub fn find_lca(&self, query: &Cluster) -> Option<Node> {
        if query.is_empty() {
            return None;
        }
        self.refresh_clusters();
        let cache = self.clusters.borrow();
        self.post_order().into_iter().find(|u| match &cache.clusters[u.0] {
            Some(cluster) => query.is_subset(cluster),
            None          => false,
        })
    }

    /// Recompute all clusters if the topology changed since the last computation
    fn refresh_clusters(&self) {
        let mut cache = self.clusters.borrow_mut();
        if !cache.dirty {
            return;
        }
        let mut clusters = vec![None; self.nodes.capacity()];
        for u in self.post_order() {
            let cluster = match self.nodes[u.0].children {
                Some((l, r)) => {
                    let left: &Option<Cluster> = &clusters[l.0];
                    let mut cluster = left.clone().unwrap_or_else(|| Cluster::empty(self.width));
                    if let Some(right) = &clusters[r.0] {
                        cluster.union_with(right);
                    }
                    cluster
                },
                None => self.nodes[u.0].leaf_cluster.clone()
                    .unwrap_or_else(|| Cluster::empty(self.width)),
            };
            clusters[u.0] = Some(cluster);
        }
        cache.clusters = clusters;
        cache.dirty    = false;
    }

    /// Mark the cluster cache as stale
    fn invalidate(&self) {
        self.clusters.borrow_mut().dirty = true;
    }

    //----------------------------------------------------------------------------------------------
    // Destructive updates
    //----------------------------------------------------------------------------------------------

    /// Remove the subtree rooted in `node` from this tree and return it as a tree of its own.  The
    /// parent of `node` is suppressed, so the tree remains binary.
    pub fn prune_subtree(&mut self, node: Node) -> Tree {
        if let Some(parent) = self.parent(node) {
            if let Some(sibling) = self.sibling(node) {
                let grandparent = self.parent(parent);
                self.nodes[sibling.0].parent = grandparent;
                match grandparent {
                    Some(g) => self.replace_child(g, parent, sibling),
                    None    => self.root = Some(sibling),
                }
            }
            self.nodes.remove(parent.0);
        } else {
            self.root = None;
        }

        let mut fragment = Tree::new(self.width);
        let mut copies   = HashMap::new();
        for u in self.post_order_from(node) {
            let data = self.nodes.remove(u.0);
            let copy = match (data.children, data.label) {
                (Some((l, r)), _) => fragment.add_internal(copies[&l], copies[&r]),
                (None, label)     => {
                    let label = label.unwrap_or_default();
                    self.leaves.remove(&label);
                    let cluster = data.leaf_cluster.unwrap_or_else(|| Cluster::empty(self.width));
                    fragment.add_leaf_with_cluster(label, cluster)
                },
            };
            copies.insert(u, copy);
        }
        fragment.set_root(copies[&node]);
        self.invalidate();
        fragment
    }

    /// Remove the leaf with the given label, suppressing its parent.  Returns `false` if there
    /// is no such leaf.
    pub fn remove_leaf(&mut self, label: usize) -> bool {
        match self.leaf(label) {
            Some(leaf) => {
                self.prune_subtree(leaf);
                true
            },
            None => false,
        }
    }

    /// Replace the cherry formed by the leaves labelled `a` and `b` with a single leaf labelled
    /// `label` whose cluster is the union of theirs.  Returns the new leaf, or `None` if `a` and
    /// `b` are not siblings.
    pub fn contract_sibling_pair(&mut self, a: usize, b: usize, label: usize) -> Option<Node> {
        let (u, v) = (self.leaf(a)?, self.leaf(b)?);
        let parent = self.parent(u)?;
        if self.parent(v) != Some(parent) || u == v {
            return None;
        }
        let mut cluster = self.nodes[u.0].leaf_cluster.clone()?;
        if let Some(other) = &self.nodes[v.0].leaf_cluster {
            cluster.union_with(other);
        }
        self.nodes.remove(u.0);
        self.nodes.remove(v.0);
        self.leaves.remove(&a);
        self.leaves.remove(&b);
        {
            let data          = &mut self.nodes[parent.0];
            data.children     = None;
            data.label        = Some(label);
            data.leaf_cluster = Some(cluster);
        }
        self.leaves.insert(label, parent);
        self.invalidate();
        Some(parent)
    }

    /// Replace `old` with `new` in the child list of `parent`
    fn replace_child(&mut self, parent: Node, old: Node, new: Node) {
        if let Some((l, r)) = self.nodes[parent.0].children {
            self.nodes[parent.0].children = Some(if l == old { (new, r) } else { (l, new) });
        }
    }
}

/// The errors raised while building trees
#[derive(Debug, Error, Eq, PartialEq)]
pub enum BuildError {

    /// A node with more than two children
    #[error("node with {0} children, only binary trees are supported")]
    NotBinary(usize),

    /// A node without children
    #[error("empty subtree")]
    Empty,

    /// The same label used twice in a tree
    #[error("duplicate leaf label `{0}'")]
    DuplicateLabel(String),

    /// A leaf without a label
    #[error("unlabelled leaf")]
    UnlabelledLeaf,

    /// Use of the reserved outgroup label
    #[error("leaf label `{0}' is reserved")]
    ReservedLabel(String),
}

/// A fixed, lexicographically sorted ordering of the taxa of one problem.  The reserved outgroup
/// taxon always comes last.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Taxa {

    /// The taxon labels, indexed by taxon ID
    labels: Vec<String>,

    /// Map from labels back to taxon IDs
    ids: HashMap<String, usize>,
}

impl Taxa {

    /// Create a taxon ordering from a collection of labels
    pub fn new<I, S>(labels: I) -> Self
    where I: IntoIterator<Item = S>,
          S: Into<String>
    {
        let mut labels = labels.into_iter()
            .map(|label| label.into())
            .filter(|label| label != ROOT_TAXON_LABEL)
            .collect::<Vec<String>>();
        labels.sort();
        labels.dedup();
        labels.push(ROOT_TAXON_LABEL.to_string());
        let ids = labels.iter().enumerate().map(|(i, label)| (label.clone(), i)).collect();
        Taxa { labels, ids }
    }

    /// The number of taxa, including the outgroup
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// A taxon ordering always contains the outgroup
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The label of a taxon
    pub fn label(&self, taxon: usize) -> &str {
        &self.labels[taxon]
    }

    /// The ID of the taxon with the given label
    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).cloned()
    }

    /// The ID of the outgroup taxon
    pub fn root_taxon(&self) -> usize {
        self.labels.len() - 1
    }

    /// All labels, in taxon order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The cluster of all taxa, including the outgroup
    pub fn all(&self) -> Cluster {
        Cluster::from_taxa(self.len(), 0..self.len())
    }
}

/// Builder to construct a collection of trees over a shared set of taxa.  Labels are interned
/// while parsing; `finish()` sorts them into a `Taxa` ordering and relabels the trees.
pub struct TreeBuilder {

    /// The labels seen so far, in order of first appearance
    labels: Vec<String>,

    /// Map from label to its position in `labels`
    label_ids: HashMap<String, usize>,

    /// The labels used in the current tree
    current_labels: HashSet<usize>,

    /// The tree under construction
    current_tree: Tree,

    /// The trees built so far
    trees: Vec<Tree>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {

    /// Create a new builder
    pub fn new() -> Self {
        TreeBuilder {
            labels:         vec![],
            label_ids:      HashMap::new(),
            current_labels: HashSet::new(),
            current_tree:   Tree::new(0),
            trees:          vec![],
        }
    }

    /// Start a new tree
    pub fn new_tree(&mut self) {
        self.current_tree = Tree::new(0);
        self.current_labels.clear();
    }

    /// Create a new leaf in the current tree
    pub fn new_leaf(&mut self, label: String) -> Result<Node, BuildError> {
        if label.is_empty() {
            return Err(BuildError::UnlabelledLeaf);
        }
        if label == ROOT_TAXON_LABEL {
            return Err(BuildError::ReservedLabel(label));
        }
        let id = match self.label_ids.get(&label) {
            Some(&id) => id,
            None      => {
                let id = self.labels.len();
                self.labels.push(label.clone());
                self.label_ids.insert(label.clone(), id);
                id
            },
        };
        if !self.current_labels.insert(id) {
            return Err(BuildError::DuplicateLabel(label));
        }
        Ok(self.current_tree.add_leaf_with_cluster(id, Cluster::empty(0)))
    }

    /// Create an internal node with the given children.  A single child is returned unchanged,
    /// which suppresses unary nodes.
    pub fn new_node(&mut self, children: Vec<Node>) -> Result<Node, BuildError> {
        match children.as_slice() {
            []          => Err(BuildError::Empty),
            [child]     => Ok(*child),
            [left, right] => Ok(self.current_tree.add_internal(*left, *right)),
            _           => Err(BuildError::NotBinary(children.len())),
        }
    }

    /// Finish the current tree, with the given root
    pub fn finish_tree(&mut self, root: Node) {
        let mut tree = std::mem::replace(&mut self.current_tree, Tree::new(0));
        tree.set_root(root);
        self.trees.push(tree);
    }

    /// The number of trees built so far
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Sort the labels into a taxon ordering and return the trees relabelled by taxon ID
    pub fn finish(self) -> (Taxa, Vec<Tree>) {
        let taxa  = Taxa::new(self.labels.iter().cloned());
        let ids   = self.labels.iter()
            .map(|label| taxa.id(label).unwrap_or_else(|| taxa.root_taxon()))
            .collect::<Vec<usize>>();
        let width = taxa.len();
        let trees = self.trees.iter().map(|tree| tree.relabel(width, |id| ids[id])).collect();
        (taxa, trees)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Build the tree (((0,1),2),3) over 5 taxa
    fn caterpillar() -> Tree {
        let mut tree = Tree::new(5);
        let a  = tree.add_leaf(0);
        let b  = tree.add_leaf(1);
        let c  = tree.add_leaf(2);
        let d  = tree.add_leaf(3);
        let ab = tree.add_internal(a, b);
        let abc = tree.add_internal(ab, c);
        let root = tree.add_internal(abc, d);
        tree.set_root(root);
        tree
    }

    /// Clusters are computed bottom-up
    #[test]
    fn clusters() {
        let tree = caterpillar();
        let root = tree.root().unwrap();
        assert_eq!(tree.cluster(root), Cluster::from_taxa(5, vec![0, 1, 2, 3]));
        let a = tree.leaf(0).unwrap();
        assert_eq!(tree.cluster(tree.parent(a).unwrap()), Cluster::from_taxa(5, vec![0, 1]));
        assert_eq!(tree.clusters().len(), 7);
    }

    /// The LCA query returns the smallest enclosing node
    #[test]
    fn find_lca() {
        let tree = caterpillar();
        let lca  = tree.find_lca(&Cluster::from_taxa(5, vec![0, 2])).unwrap();
        assert_eq!(tree.cluster(lca), Cluster::from_taxa(5, vec![0, 1, 2]));
        let leaf = tree.find_lca(&Cluster::singleton(5, 1)).unwrap();
        assert_eq!(tree.label(leaf), Some(1));
        assert!(tree.find_lca(&Cluster::singleton(5, 4)).is_none());
        let (a, c) = (tree.leaf(0).unwrap(), tree.leaf(2).unwrap());
        assert_eq!(tree.lca(a, c), Some(lca));
    }

    /// Pruning a subtree suppresses its parent and invalidates the clusters
    #[test]
    fn prune_subtree() {
        let mut tree = caterpillar();
        let root = tree.root().unwrap();
        assert_eq!(tree.cluster(root).len(), 4);
        let b = tree.leaf(1).unwrap();
        let ab = tree.parent(b).unwrap();
        let fragment = tree.prune_subtree(ab);
        assert_eq!(fragment.leaf_count(), 2);
        assert_eq!(fragment.taxa(), Cluster::from_taxa(5, vec![0, 1]));
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.taxa(), Cluster::from_taxa(5, vec![2, 3]));
        assert_eq!(tree.cherries(), vec![(2, 3)]);
        assert!(tree.remove_leaf(3));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root(), tree.leaf(2));
        assert!(tree.remove_leaf(2));
        assert!(tree.is_empty());
    }

    /// Contracting a cherry turns its parent into a leaf standing for both taxa
    #[test]
    fn contract_sibling_pair() {
        let mut tree = caterpillar();
        assert_eq!(tree.cherries(), vec![(0, 1)]);
        assert!(tree.contract_sibling_pair(0, 2, 7).is_none());
        let leaf = tree.contract_sibling_pair(0, 1, 7).unwrap();
        assert_eq!(tree.label(leaf), Some(7));
        assert_eq!(tree.cluster(leaf), Cluster::from_taxa(5, vec![0, 1]));
        assert_eq!(tree.cherries(), vec![(2, 7)]);
        assert_eq!(tree.leaf_count(), 3);
    }

    /// Restriction suppresses unary nodes
    #[test]
    fn restrict() {
        let tree       = caterpillar();
        let restricted = tree.restrict(&Cluster::from_taxa(5, vec![0, 2, 3]));
        assert_eq!(restricted.leaf_count(), 3);
        assert_eq!(restricted.node_count(), 5);
        assert_eq!(restricted.cherries(), vec![(0, 2)]);
        let augmented = tree.with_outgroup(4);
        assert_eq!(augmented.taxa().len(), 5);
        assert_eq!(augmented.sibling(augmented.leaf(4).unwrap()), tree.root());
    }

    /// The builder sorts labels and rejects non-binary nodes and duplicates
    #[test]
    fn builder() {
        let mut builder = TreeBuilder::new();
        builder.new_tree();
        let c = builder.new_leaf("c".to_string()).unwrap();
        let a = builder.new_leaf("a".to_string()).unwrap();
        assert_eq!(builder.new_leaf("a".to_string()), Err(BuildError::DuplicateLabel("a".to_string())));
        let b = builder.new_leaf("b".to_string()).unwrap();
        assert_eq!(builder.new_node(vec![c, a, b]), Err(BuildError::NotBinary(3)));
        let ca = builder.new_node(vec![c, a]).unwrap();
        let root = builder.new_node(vec![ca, b]).unwrap();
        builder.finish_tree(root);
        let (taxa, trees) = builder.finish();
        assert_eq!(taxa.labels(), &["a", "b", "c", "rho"]);
        assert_eq!(taxa.root_taxon(), 3);
        assert_eq!(trees[0].cherries(), vec![(0, 2)]);
    }
}
