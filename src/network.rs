//! Hybridization networks built from acyclic agreement forests.
//!
//! A `Network` is a rooted DAG whose leaves are labelled with taxa.  Every edge records which of
//! the two input trees it belongs to, so that the embedding of each tree in the network is known
//! while the network is assembled.  Edges into reticulations are reticulate edges; all other edges
//! are tree edges.
//!
//! `NetworkBuilder` starts from the root fragment of an ordered forest and adds the remaining
//! fragments from the outermost to the innermost one.  For each fragment and each input tree, it
//! finds the cluster the fragment is the sibling of in that tree (restricted to the taxa placed so
//! far), splits the edge above the deepest network node with that cluster in the tree's view, and
//! hangs a new reticulation below both split points.  The fragment itself is grafted below the
//! reticulation.

use crate::cluster::Cluster;
use crate::forest::Forest;
use crate::tree::{Node, Tree};
use slab::Slab;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A network node
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NetNode(usize);

/// A network edge
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Edge(usize);

/// The kinds of edges
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeKind {

    /// An edge that counts towards the length of a path
    Tree,

    /// An edge into a reticulation
    Reticulate,
}

impl EdgeKind {

    /// Tree edges have weight 1, reticulate edges weight 0
    pub fn weight(&self) -> usize {
        match self {
            EdgeKind::Tree       => 1,
            EdgeKind::Reticulate => 0,
        }
    }
}

/// The set of input trees an edge belongs to, as a bit mask
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Views(u8);

impl Views {

    /// Both input trees
    pub const BOTH: Views = Views(0b11);

    /// Only the given input tree (0 or 1)
    pub fn of(view: usize) -> Self {
        Views(1 << view)
    }

    /// Does the set contain the given tree?
    pub fn contains(self, view: usize) -> bool {
        self.0 & (1 << view) != 0
    }

    /// The trees in either set
    pub fn union(self, other: Views) -> Self {
        Views(self.0 | other.0)
    }

    /// The trees in both sets
    pub fn intersection(self, other: Views) -> Self {
        Views(self.0 & other.0)
    }
}

/// The information stored for each node
#[derive(Clone, Debug)]
struct NodeData {

    /// The taxon of a leaf
    label: Option<usize>,

    /// In-edges
    parents: Vec<Edge>,

    /// Out-edges
    children: Vec<Edge>,
}

/// The information stored for each edge
#[derive(Clone, Copy, Debug)]
struct EdgeData {
    source: NetNode,
    target: NetNode,
    kind:   EdgeKind,
    views:  Views,
}

/// A rooted phylogenetic network
#[derive(Clone, Debug)]
pub struct Network {

    /// The nodes
    nodes: Slab<NodeData>,

    /// The edges
    edges: Slab<EdgeData>,

    /// The root
    root: Option<NetNode>,

    /// The number of taxa
    width: usize,
}

impl Network {

    /// An empty network over `width` taxa
    pub fn new(width: usize) -> Self {
        Network { nodes: Slab::new(), edges: Slab::new(), root: None, width }
    }

    /// The root of the network
    pub fn root(&self) -> Option<NetNode> {
        self.root
    }

    /// The number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The total weight of all edges
    pub fn weight(&self) -> usize {
        self.edges.iter().map(|(_, edge)| edge.kind.weight()).sum()
    }

    /// The taxon of a leaf
    pub fn label(&self, node: NetNode) -> Option<usize> {
        self.nodes[node.0].label
    }

    /// The children of a node, in the order their edges were added
    pub fn children(&self, node: NetNode) -> Vec<NetNode> {
        self.nodes[node.0].children.iter().map(|e| self.edges[e.0].target).collect()
    }

    /// The parents of a node
    pub fn parents(&self, node: NetNode) -> Vec<NetNode> {
        self.nodes[node.0].parents.iter().map(|e| self.edges[e.0].source).collect()
    }

    /// The kind of the edge from `source` to `target`
    pub fn edge_kind(&self, source: NetNode, target: NetNode) -> Option<EdgeKind> {
        self.nodes[source.0].children.iter()
            .map(|e| &self.edges[e.0])
            .find(|edge| edge.target == target)
            .map(|edge| edge.kind)
    }

    /// Does the node have more than one parent?
    pub fn is_reticulation(&self, node: NetNode) -> bool {
        self.nodes[node.0].parents.len() > 1
    }

    /// All reticulations, in order of their IDs
    pub fn reticulations(&self) -> Vec<NetNode> {
        self.nodes.iter()
            .filter(|(_, data)| data.parents.len() > 1)
            .map(|(id, _)| NetNode(id))
            .collect()
    }

    /// The number of reticulations
    pub fn reticulation_count(&self) -> usize {
        self.reticulations().len()
    }

    /// The 1-based number of a reticulation, used to tag it in extended Newick output
    pub fn reticulation_index(&self, node: NetNode) -> Option<usize> {
        if !self.is_reticulation(node) {
            return None;
        }
        self.reticulations().iter().position(|&r| r == node).map(|i| i + 1)
    }

    /// The tree formed by the edges of one input tree (0 or 1)
    pub fn tree_view(&self, view: usize) -> Tree {
        self.extract_tree(&|edge: &EdgeData| edge.views.contains(view))
    }

    /// Is `tree` displayed by the network?  Tries every way to keep one in-edge per reticulation.
    pub fn displays(&self, tree: &Tree) -> bool {
        let target        = tree.clusters().into_iter().collect::<HashSet<Cluster>>();
        let reticulations = self.reticulations();
        if reticulations.len() >= 64 {
            return false;
        }
        (0..1u64 << reticulations.len()).any(|mask| {
            let chosen = reticulations.iter().enumerate()
                .filter_map(|(i, r)| {
                    let parents = &self.nodes[r.0].parents;
                    parents.get(((mask >> i) & 1) as usize).cloned()
                })
                .collect::<HashSet<Edge>>();
            let switched = self.extract_tree(&|edge: &EdgeData| {
                !self.is_reticulation(edge.target)
                    || self.nodes[edge.target.0].parents.iter().any(|e| {
                        chosen.contains(e) && self.edges[e.0].source == edge.source
                    })
            });
            switched.clusters().into_iter().collect::<HashSet<Cluster>>() == target
        })
    }

    /// The tree formed by the edges accepted by `keep`, with unary nodes suppressed
    fn extract_tree(&self, keep: &dyn Fn(&EdgeData) -> bool) -> Tree {
        let mut tree = Tree::new(self.width);
        if let Some(root) = self.root {
            if let Some(root) = self.extract(root, keep, &mut tree) {
                tree.set_root(root);
            }
        }
        tree
    }

    /// Copy the part of the tree below `node` into `tree`
    fn extract(&self, node: NetNode, keep: &dyn Fn(&EdgeData) -> bool, tree: &mut Tree)
        -> Option<Node> {
        let children = self.nodes[node.0].children.iter()
            .map(|e| &self.edges[e.0])
            .filter(|edge| keep(*edge))
            .filter_map(|edge| self.extract(edge.target, keep, tree))
            .collect::<Vec<Node>>();
        let mut children = children.into_iter();
        match children.next() {
            None        => self.label(node).map(|label| tree.add_leaf(label)),
            Some(first) => Some(children.fold(first, |left, right| tree.add_internal(left, right))),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Construction
    //----------------------------------------------------------------------------------------------

    /// Add a node
    fn add_node(&mut self, label: Option<usize>) -> NetNode {
        NetNode(self.nodes.insert(NodeData { label, parents: vec![], children: vec![] }))
    }

    /// Add an edge
    fn add_edge(&mut self, source: NetNode, target: NetNode, kind: EdgeKind, views: Views) -> Edge {
        let edge = Edge(self.edges.insert(EdgeData { source, target, kind, views }));
        self.nodes[source.0].children.push(edge);
        self.nodes[target.0].parents.push(edge);
        edge
    }

    /// Remove an edge and return its data
    fn remove_edge(&mut self, edge: Edge) -> EdgeData {
        let data = self.edges.remove(edge.0);
        self.nodes[data.source.0].children.retain(|&e| e != edge);
        self.nodes[data.target.0].parents.retain(|&e| e != edge);
        data
    }

    /// Remove a node together with all its edges
    fn remove_node(&mut self, node: NetNode) {
        let edges = self.nodes[node.0].parents.iter()
            .chain(self.nodes[node.0].children.iter())
            .cloned()
            .collect::<Vec<Edge>>();
        for edge in edges {
            self.remove_edge(edge);
        }
        self.nodes.remove(node.0);
        if self.root == Some(node) {
            self.root = None;
        }
    }

    /// Subdivide an edge `u -> v` into `u -> s -> v`.  The upper half is a tree edge; the lower
    /// half keeps the kind of the original edge.  Both keep its views.  Returns `s`.
    fn split_edge(&mut self, edge: Edge) -> NetNode {
        let data  = self.remove_edge(edge);
        let split = self.add_node(None);
        self.add_edge(data.source, split, EdgeKind::Tree, data.views);
        self.add_edge(split, data.target, data.kind, data.views);
        split
    }

    /// The in-edge of a node that belongs to the given view
    fn view_parent_edge(&self, node: NetNode, view: usize) -> Option<Edge> {
        self.nodes[node.0].parents.iter()
            .cloned()
            .find(|e| self.edges[e.0].views.contains(view))
    }

    /// Clean up after removing leaves: drop unlabelled nodes without children, merge parallel
    /// edges, suppress nodes with one parent and one child, and remove a unary root.
    fn normalize(&mut self) {
        loop {
            let mut changed = false;
            let ids = self.nodes.iter().map(|(id, _)| id).collect::<Vec<usize>>();
            for id in ids {
                if !self.nodes.contains(id) {
                    continue;
                }
                let node = NetNode(id);
                let (ins, outs) = (self.nodes[id].parents.len(), self.nodes[id].children.len());
                if outs == 0 && self.nodes[id].label.is_none() {
                    self.remove_node(node);
                    changed = true;
                } else if self.merge_parallel_edges(node) {
                    changed = true;
                } else if ins == 1 && outs == 1 {
                    let upper = self.remove_edge(self.nodes[id].parents[0]);
                    let lower = self.remove_edge(self.nodes[id].children[0]);
                    let views = upper.views.intersection(lower.views);
                    self.add_edge(upper.source, lower.target, lower.kind, views);
                    self.nodes.remove(id);
                    changed = true;
                }
            }
            if let Some(root) = self.root {
                let data = &self.nodes[root.0];
                if data.parents.is_empty() && data.children.len() == 1 && data.label.is_none() {
                    let child = self.edges[data.children[0].0].target;
                    self.remove_node(root);
                    self.root = Some(child);
                    changed = true;
                }
            }
            if !changed {
                return;
            }
        }
    }

    /// Replace two edges between the same pair of nodes, out of `node`, by a single tree edge
    fn merge_parallel_edges(&mut self, node: NetNode) -> bool {
        let children = self.nodes[node.0].children.clone();
        let parallel = (0..children.len())
            .flat_map(|i| (i + 1..children.len()).map(move |j| (i, j)))
            .map(|(i, j)| (children[i], children[j]))
            .find(|(e, f)| self.edges[e.0].target == self.edges[f.0].target);
        match parallel {
            Some((e, f)) => {
                let first  = self.remove_edge(e);
                let second = self.remove_edge(f);
                let views  = first.views.union(second.views);
                self.add_edge(node, first.target, EdgeKind::Tree, views);
                true
            },
            None => false,
        }
    }
}

/// The state of assembling a network from a forest
pub struct NetworkBuilder<'a> {

    /// The two input trees, with the outgroup
    trees: [&'a Tree; 2],

    /// The outgroup taxon
    root_taxon: usize,

    /// The network built so far
    network: Network,

    /// The virtual node above the root fragment
    top: NetNode,

    /// The cluster of every node in each input tree's view, maintained incrementally
    clusters: [HashMap<NetNode, Cluster>; 2],

    /// The taxa placed so far
    placed: Cluster,
}

impl<'a> NetworkBuilder<'a> {

    /// Build a network from an acyclic forest ordered innermost fragment first, root fragment last
    pub fn build(forest: &Forest, tree1: &'a Tree, tree2: &'a Tree, root_taxon: usize) -> Network {
        let mut builder = NetworkBuilder::new(tree1, tree2, root_taxon);
        let fragments   = forest.fragments();
        if let Some((root, rest)) = fragments.split_last() {
            builder.add_root_fragment(root);
            for fragment in rest.iter().rev() {
                builder.add_fragment(fragment);
            }
        }
        builder.finish()
    }

    /// Create a builder with an empty network
    fn new(tree1: &'a Tree, tree2: &'a Tree, root_taxon: usize) -> Self {
        let width       = tree1.width();
        let mut network = Network::new(width);
        let top         = network.add_node(None);
        network.root    = Some(top);
        NetworkBuilder {
            trees:    [tree1, tree2],
            root_taxon,
            network,
            top,
            clusters: [HashMap::new(), HashMap::new()],
            placed:   Cluster::empty(width),
        }
    }

    /// Place the root fragment below the top node
    fn add_root_fragment(&mut self, fragment: &Tree) {
        if let Some(root) = fragment.root() {
            let copy = self.graft(fragment, root);
            self.network.add_edge(self.top, copy, EdgeKind::Tree, Views::BOTH);
            let taxa = fragment.taxa();
            for view in 0..2 {
                self.clusters[view].insert(self.top, taxa.clone());
            }
            self.placed = taxa;
        }
    }

    /// Attach a fragment below a new reticulation
    fn add_fragment(&mut self, fragment: &Tree) {
        let root = match fragment.root() {
            Some(root) => root,
            None       => return,
        };
        let taxa = fragment.taxa();

        let mut splits = [self.top; 2];
        for (view, split) in splits.iter_mut().enumerate() {
            let edge = match self.attachment_edge(view, &taxa) {
                Some(edge) => edge,
                None       => {
                    warn!("No attachment point for fragment {} in tree {}, attaching it at the top",
                          taxa, view + 1);
                    self.network.nodes[self.top.0].children[0]
                },
            };
            let below = self.network.edges[edge.0].target;
            *split    = self.network.split_edge(edge);
            for clusters in self.clusters.iter_mut() {
                let cluster = clusters.get(&below).cloned()
                    .unwrap_or_else(|| Cluster::empty(taxa.width()));
                clusters.insert(*split, cluster);
            }
        }

        let reticulation = self.network.add_node(None);
        for (view, &split) in splits.iter().enumerate() {
            self.network.add_edge(split, reticulation, EdgeKind::Reticulate, Views::of(view));
        }
        let copy = self.graft(fragment, root);
        self.network.add_edge(reticulation, copy, EdgeKind::Tree, Views::BOTH);

        for view in 0..2 {
            self.clusters[view].insert(reticulation, taxa.clone());
            let mut node = reticulation;
            while let Some(edge) = self.network.view_parent_edge(node, view) {
                node = self.network.edges[edge.0].source;
                self.clusters[view].entry(node)
                    .or_insert_with(|| Cluster::empty(taxa.width()))
                    .union_with(&taxa);
            }
        }
        self.placed.union_with(&taxa);
    }

    /// The edge of the given view to split for attaching a fragment with the given taxa
    fn attachment_edge(&self, view: usize, taxa: &Cluster) -> Option<Edge> {
        let target = self.sibling_cluster(view, taxa)?;
        let candidates = self.clusters[view].iter()
            .filter(|(_, cluster)| **cluster == target)
            .map(|(&node, _)| node)
            .filter(|&node| self.network.view_parent_edge(node, view).is_some())
            .collect::<HashSet<NetNode>>();
        let deepest = candidates.iter().cloned().find(|&node| {
            self.network.nodes[node.0].children.iter()
                .map(|e| &self.network.edges[e.0])
                .filter(|edge| edge.views.contains(view))
                .all(|edge| !candidates.contains(&edge.target))
        })?;
        self.network.view_parent_edge(deepest, view)
    }

    /// The cluster of the sibling of `taxa` in the given input tree, restricted to the placed taxa
    fn sibling_cluster(&self, view: usize, taxa: &Cluster) -> Option<Cluster> {
        let tree     = self.trees[view];
        let mut node = tree.find_lca(taxa)?;
        loop {
            let cluster = tree.cluster(tree.sibling(node)?).intersection(&self.placed);
            if !cluster.is_empty() {
                return Some(cluster);
            }
            node = tree.parent(node)?;
        }
    }

    /// Copy the subtree of a fragment into the network and return the copy's root
    fn graft(&mut self, fragment: &Tree, node: Node) -> NetNode {
        let mut copies = HashMap::new();
        for u in fragment.post_order_from(node) {
            let copy = self.network.add_node(fragment.label(u));
            if let Some((l, r)) = fragment.children(u) {
                self.network.add_edge(copy, copies[&l], EdgeKind::Tree, Views::BOTH);
                self.network.add_edge(copy, copies[&r], EdgeKind::Tree, Views::BOTH);
            }
            let cluster = fragment.cluster(u);
            for clusters in self.clusters.iter_mut() {
                clusters.insert(copy, cluster.clone());
            }
            copies.insert(u, copy);
        }
        copies[&node]
    }

    /// Remove the outgroup and tidy up the network
    fn finish(mut self) -> Network {
        let outgroup = self.network.nodes.iter()
            .find(|(_, data)| data.label == Some(self.root_taxon))
            .map(|(id, _)| NetNode(id));
        if let Some(outgroup) = outgroup {
            self.network.remove_node(outgroup);
        }
        self.network.normalize();
        debug!("Built network with {} nodes and {} reticulations",
               self.network.node_count(), self.network.reticulation_count());
        self.network
    }
}
