//! The organization graph.
//!
//! An organization is a rooted directed acyclic hierarchy: leaves are
//! datasets, interior nodes are topics whose vectors summarize their
//! descendants. The graph owns its nodes and edges in a stable arena
//! ([`StableDiGraph`]), so node ids survive removals and a deep copy is a
//! structural clone that preserves ids, edges, vectors, and the leaf
//! list.
//!
//! A node's *level* is the length of the shortest directed path from the
//! root (root = 0), cached by [`OrgGraph::regen_levels`] and read by the
//! optimization loop's per-level queues.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::dijkstra;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::config::OrgConfig;
use crate::vec32;

/// Identifier of a node within one organization.
pub type NodeId = NodeIndex;

/// A node record: a dataset leaf or a merged topic.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Unit embedding vector (all zeros when degenerate).
    pub(crate) vector: Vec<f32>,
    /// Dataset ids covered by this node's descendants (own id for a leaf).
    pub(crate) datasets: BTreeSet<String>,
    /// The dataset id; present iff this node is a leaf.
    pub(crate) dataset: Option<String>,
    /// Human-readable label, assigned by the labeler.
    pub(crate) label: String,
    /// Cached reachability score, recomputed on demand.
    pub(crate) reachability: f64,
    /// Set when at least one child is a leaf.
    pub(crate) has_leaf_children: bool,
}

impl NodeData {
    fn dataset_node(dataset_id: &str, vector: Vec<f32>) -> Self {
        Self {
            vector,
            datasets: BTreeSet::from([dataset_id.to_string()]),
            dataset: Some(dataset_id.to_string()),
            label: dataset_id.to_string(),
            reachability: 0.0,
            has_leaf_children: false,
        }
    }

    fn merged_node(vector: Vec<f32>, datasets: BTreeSet<String>) -> Self {
        Self {
            vector,
            datasets,
            dataset: None,
            label: String::new(),
            reachability: 0.0,
            has_leaf_children: false,
        }
    }

    /// The node's embedding vector.
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// The dataset ids this node covers.
    pub fn datasets(&self) -> &BTreeSet<String> {
        &self.datasets
    }

    /// The dataset id, if this node is a leaf.
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// The assigned label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The cached reachability score.
    pub fn reachability(&self) -> f64 {
        self.reachability
    }

    /// Whether the labeler marked this node as having leaf children.
    pub fn has_leaf_children(&self) -> bool {
        self.has_leaf_children
    }
}

/// Adjacency summary of one node, for serving to a frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    /// The node's id.
    pub id: i64,
    /// Ids of the node's parents.
    pub parent_ids: Vec<i64>,
    /// Ids of the node's children.
    pub child_ids: Vec<i64>,
}

/// A navigation organization over a set of datasets.
#[derive(Debug, Clone)]
pub struct OrgGraph {
    pub(crate) graph: StableDiGraph<NodeData, ()>,
    pub(crate) config: OrgConfig,
    pub(crate) root: Option<NodeId>,
    pub(crate) leaves: Vec<NodeId>,
    levels: HashMap<NodeId, usize>,
}

impl OrgGraph {
    /// Creates an empty organization.
    pub fn new(config: OrgConfig) -> Self {
        Self {
            graph: StableDiGraph::new(),
            config,
            root: None,
            leaves: Vec::new(),
            levels: HashMap::new(),
        }
    }

    /// The designated root, if the graph is non-empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The ordered leaf list.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// The configuration this organization was built with.
    pub fn config(&self) -> &OrgConfig {
        &self.config
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether `n` is currently in the graph.
    pub fn contains(&self, n: NodeId) -> bool {
        self.graph.contains_node(n)
    }

    /// All node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.node_indices().collect();
        ids.sort_unstable();
        ids
    }

    /// The record of node `n`.
    pub fn node(&self, n: NodeId) -> Option<&NodeData> {
        self.graph.node_weight(n)
    }

    pub(crate) fn node_mut(&mut self, n: NodeId) -> Option<&mut NodeData> {
        self.graph.node_weight_mut(n)
    }

    /// The embedding vector of a node known to be present.
    pub(crate) fn vector_of(&self, n: NodeId) -> &[f32] {
        &self.graph[n].vector
    }

    /// Adds a leaf node for a dataset.
    pub(crate) fn add_dataset_node(&mut self, dataset_id: &str, vector: Vec<f32>) -> NodeId {
        let n = self.graph.add_node(NodeData::dataset_node(dataset_id, vector));
        self.leaves.push(n);
        n
    }

    /// Adds a merged topic node over `a` and `b` with edges to both.
    ///
    /// The merged vector is the normalized mean of the two child vectors;
    /// the dataset set is the union of the children's sets.
    pub(crate) fn add_merged_node(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let mut vector = vec![0.0f32; self.graph[a].vector.len()];
        // Children of one graph share a dimension, so these cannot fail.
        let _ = vec32::add(&mut vector, &self.graph[a].vector);
        let _ = vec32::add(&mut vector, &self.graph[b].vector);
        vec32::scale(&mut vector, 0.5);
        vec32::normalize(&mut vector);

        let mut datasets = self.graph[a].datasets.clone();
        datasets.extend(self.graph[b].datasets.iter().cloned());

        let p = self.graph.add_node(NodeData::merged_node(vector, datasets));
        self.graph.add_edge(p, a, ());
        self.graph.add_edge(p, b, ());
        p
    }

    /// Children (out-neighbors) of `n`, ascending by id.
    pub fn children(&self, n: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(n, Direction::Outgoing)
            .collect();
        out.sort_unstable();
        out
    }

    /// Parents (in-neighbors) of `n`, ascending by id.
    pub fn parents(&self, n: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(n, Direction::Incoming)
            .collect();
        out.sort_unstable();
        out
    }

    /// Whether `n` has no children.
    pub fn is_leaf(&self, n: NodeId) -> bool {
        self.graph
            .neighbors_directed(n, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Children of `n`'s parents, excluding `n` itself, ascending by id.
    pub fn siblings(&self, n: NodeId) -> Vec<NodeId> {
        let mut out = BTreeSet::new();
        for p in self.parents(n) {
            for c in self.children(p) {
                if c != n {
                    out.insert(c);
                }
            }
        }
        out.into_iter().collect()
    }

    /// Adds the edge `from -> to` unless `from` is a leaf, the edge
    /// already exists, or the endpoints coincide. Returns whether an edge
    /// was added.
    pub(crate) fn add_structural_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || self.is_leaf(from) || self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    /// Contracts `n` out of the hierarchy.
    ///
    /// Every (parent, child) pair of `n` gets a direct edge if one is not
    /// already present, then `n` and its incident edges are removed.
    /// Reachability from the root to `n`'s former descendants is
    /// preserved.
    pub fn eliminate_node(&mut self, n: NodeId) {
        if !self.contains(n) {
            return;
        }
        let parents = self.parents(n);
        let children = self.children(n);
        for &p in &parents {
            for &c in &children {
                self.add_structural_edge(p, c);
            }
        }
        self.graph.remove_node(n);
        self.leaves.retain(|&l| l != n);
    }

    /// Recomputes every interior node's vector as the normalized sum of
    /// its children's vectors. Leaf vectors are fixed.
    pub fn update_vectors_from_root(&mut self) {
        let Some(root) = self.root else { return };
        if !self.contains(root) {
            return;
        }
        let mut done = HashSet::new();
        self.update_vector(root, &mut done);
    }

    fn update_vector(&mut self, s: NodeId, done: &mut HashSet<NodeId>) -> Vec<f32> {
        let children = self.children(s);
        if children.is_empty() || done.contains(&s) {
            return self.graph[s].vector.clone();
        }
        let mut total = vec![0.0f32; self.graph[s].vector.len()];
        for c in children {
            let v = if self.is_leaf(c) {
                self.graph[c].vector.clone()
            } else {
                self.update_vector(c, done)
            };
            let _ = vec32::add(&mut total, &v);
        }
        vec32::normalize(&mut total);
        self.graph[s].vector = total.clone();
        done.insert(s);
        total
    }

    /// Recomputes the level cache: shortest-path distance from the root
    /// over unit edge weights.
    pub fn regen_levels(&mut self) {
        let Some(root) = self.root else {
            self.levels.clear();
            return;
        };
        if !self.contains(root) {
            return;
        }
        self.levels = dijkstra(&self.graph, root, None, |_| 1usize);
    }

    /// The cached level of `n`, if it is reachable from the root.
    pub fn level(&self, n: NodeId) -> Option<usize> {
        self.levels.get(&n).copied()
    }

    /// Assigns the root's label (the organization's display name).
    pub fn set_root_label(&mut self, name: impl Into<String>) {
        if let Some(root) = self.root {
            if let Some(data) = self.node_mut(root) {
                data.label = name.into();
            }
        }
    }

    /// Adjacency summary of `n` for a frontend.
    pub fn node_view(&self, n: NodeId) -> Option<NodeView> {
        if !self.contains(n) {
            return None;
        }
        Some(NodeView {
            id: ann_id(n),
            parent_ids: self.parents(n).into_iter().map(ann_id).collect(),
            child_ids: self.children(n).into_iter().map(ann_id).collect(),
        })
    }
}

/// The external (index-facing) id of a node.
pub(crate) fn ann_id(n: NodeId) -> i64 {
    n.index() as i64
}

/// The node behind an external id.
pub(crate) fn from_ann_id(id: i64) -> NodeId {
    NodeIndex::new(id as usize)
}
