//! Effectiveness optimization.
//!
//! The initial binary tree is reshaped by two local edit operators:
//!
//! - **delete-parent**: contract a node's least-reachable parent (and the
//!   node's non-leaf siblings) out of the hierarchy, splicing the node
//!   under its grandparents;
//! - **add-parent**: give the node an extra parent, the most-reachable
//!   candidate one level up.
//!
//! Candidates are evaluated on deep copies and accepted only when
//! organization effectiveness strictly improves. Nodes are visited level
//! by level in ascending reachability order, least-reachable first. A
//! rolling window over recent effectiveness values decides termination;
//! the same window's node ids feed a hung-node detector that keeps the
//! loop from oscillating on a single node.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::graph::{NodeId, OrgGraph};

/// A queued node with its reachability at queue-build time.
///
/// Ordered so that a max-heap pops the *least* reachable entry first;
/// ties break toward the smaller id.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReachEntry {
    pub(crate) reachability: f64,
    pub(crate) node: NodeId,
}

impl PartialEq for ReachEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReachEntry {}

impl PartialOrd for ReachEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReachEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .reachability
            .total_cmp(&self.reachability)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Per-level queues: bucket `b` holds the nodes at level `b + 1`. The
/// root (level 0) is never queued.
pub(crate) type LevelQueues = Vec<BinaryHeap<ReachEntry>>;

/// Rolling window over recent iterations: effectiveness values for the
/// termination test, node ids for the hung-node detector.
#[derive(Debug, Clone)]
pub(crate) struct TerminationMonitor {
    window: Vec<f64>,
    node_window: Vec<usize>,
    cursor: usize,
    pub(crate) iterations: usize,
}

impl TerminationMonitor {
    pub(crate) fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window: vec![0.0; window],
            node_window: vec![0; window],
            cursor: 0,
            iterations: 0,
        }
    }

    /// Records one operation: the resulting effectiveness and the id of
    /// the operated node.
    pub(crate) fn update(&mut self, effectiveness: f64, node: usize) {
        self.window[self.cursor] = effectiveness;
        self.node_window[self.cursor] = node;
        self.cursor = (self.cursor + 1) % self.window.len();
        self.iterations += 1;
    }

    /// Mean of the effectiveness window (unfilled slots count as 0).
    pub(crate) fn mean(&self) -> f64 {
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Whether the loop keeps coming back to `node`: the truncating
    /// integer mean of the node-id window equals it.
    pub(crate) fn is_hung(&self, node: usize) -> bool {
        self.node_window.iter().sum::<usize>() / self.node_window.len() == node
    }
}

impl OrgGraph {
    /// Rebuilds the per-level queues, recomputing each queued node's
    /// reachability. Levels come from the cached root-distance table.
    pub(crate) fn build_level_queues(&mut self) -> LevelQueues {
        let mut queues: LevelQueues = Vec::new();
        for n in self.node_ids() {
            if Some(n) == self.root {
                continue;
            }
            let Some(level) = self.level(n) else { continue };
            if level == 0 {
                continue;
            }
            let bucket = level - 1;
            if queues.len() <= bucket {
                queues.resize_with(bucket + 1, BinaryHeap::new);
            }
            let reachability = self.reachability(n);
            queues[bucket].push(ReachEntry {
                reachability,
                node: n,
            });
        }
        queues
    }

    /// Removes the least-reachable parent of `s` from the hierarchy.
    ///
    /// Every non-leaf sibling of `s` is contracted out first, then the
    /// parent itself, splicing `s` under its former grandparents. A node
    /// without parents (or no longer in the graph) is left alone.
    pub fn delete_parent(&mut self, s: NodeId) {
        if !self.contains(s) {
            return;
        }
        let mut doomed: Option<(NodeId, f64)> = None;
        for p in self.parents(s) {
            let r = self.reachability(p);
            if doomed.map_or(true, |(_, best)| r < best) {
                doomed = Some((p, r));
            }
        }
        let Some((doomed, _)) = doomed else { return };

        for sibling in self.siblings(s) {
            if self.contains(sibling) && !self.is_leaf(sibling) {
                self.eliminate_node(sibling);
            }
        }
        self.eliminate_node(doomed);
        self.update_vectors_from_root();
    }

    /// Adds the most-reachable candidate in `queue` (one level above `s`)
    /// as an extra parent of `s`. Leaf candidates and existing edges are
    /// skipped. Drains the queue.
    pub(crate) fn add_parent(&mut self, s: NodeId, queue: &mut BinaryHeap<ReachEntry>) {
        if !self.contains(s) {
            return;
        }
        let mut best = None;
        while let Some(entry) = queue.pop() {
            best = Some(entry.node);
        }
        let Some(best) = best else { return };
        if self.contains(best) {
            self.add_structural_edge(best, s);
        }
        self.update_vectors_from_root();
    }

    /// Tries both operators on deep copies and returns the better
    /// candidate; ties go to the delete copy. `bucket` is `s`'s queue
    /// bucket (level − 1); add-parent only applies when a level above
    /// with at least two candidates exists.
    pub(crate) fn choose_apply(&self, s: NodeId, bucket: usize) -> OrgGraph {
        let mut op_add = self.clone();
        let mut add_queues = op_add.build_level_queues();
        if bucket >= 1 && add_queues.get(bucket - 1).is_some_and(|q| q.len() >= 2) {
            let mut queue = std::mem::take(&mut add_queues[bucket - 1]);
            op_add.add_parent(s, &mut queue);
        }

        let mut op_del = self.clone();
        op_del.delete_parent(s);

        if op_add.effectiveness() > op_del.effectiveness() {
            op_add
        } else {
            op_del
        }
    }

    /// Keeps `candidate` only if it strictly improves effectiveness.
    /// Returns the retained graph and its effectiveness.
    pub fn accept(self, candidate: OrgGraph) -> (OrgGraph, f64) {
        let candidate_eff = candidate.effectiveness();
        let current_eff = self.effectiveness();
        if candidate_eff > current_eff {
            (candidate, candidate_eff)
        } else {
            (self, current_eff)
        }
    }

    fn should_terminate(&self, monitor: &TerminationMonitor, p: f64) -> bool {
        let mean = monitor.mean();
        if mean == 0.0 {
            // Warm-up: the window has not seen real values yet.
            return false;
        }
        let pct_change = (p - mean) / mean;
        debug!(
            iterations = monitor.iterations,
            window_mean = mean,
            effectiveness = p,
            pct_change,
            "termination check"
        );
        pct_change < self.config.termination_threshold
            || monitor.iterations > self.config.max_iters
    }

    /// Pops the next node to operate on: entries no longer in the graph
    /// are dropped, and a hung node yields its turn to the next-worst
    /// candidate (the hung entry goes back into the queue).
    fn next_operable(
        &self,
        queue: &mut BinaryHeap<ReachEntry>,
        monitor: &TerminationMonitor,
    ) -> Option<NodeId> {
        while let Some(entry) = queue.pop() {
            if !self.contains(entry.node) {
                continue;
            }
            if monitor.is_hung(entry.node.index()) {
                let Some(next) = queue.pop() else {
                    return Some(entry.node);
                };
                queue.push(entry);
                if self.contains(next.node) {
                    return Some(next.node);
                }
                continue;
            }
            return Some(entry.node);
        }
        None
    }

    /// Runs the optimization schedule: two delete-only warm-up sweeps,
    /// then level-wise add-or-delete until the windowed termination test
    /// fires, the iteration cap is hit, or a full pass finds nothing to
    /// operate on.
    pub fn organize(mut self) -> OrgGraph {
        let mut monitor = TerminationMonitor::new(self.config.termination_window);
        let mut queues = self.build_level_queues();
        let mut p = self.effectiveness();

        for pass in 0..2 {
            for bucket in 0..queues.len() {
                while let Some(entry) = queues[bucket].pop() {
                    if !self.contains(entry.node) {
                        continue;
                    }
                    let mut candidate = self.clone();
                    candidate.delete_parent(entry.node);
                    let (kept, eff) = self.accept(candidate);
                    self = kept;
                    p = eff;
                }
            }
            trace!(pass, effectiveness = p, "warm-up deletion sweep done");
            queues = self.build_level_queues();
        }

        let mut operated = true;
        while operated && !self.should_terminate(&monitor, p) {
            operated = false;
            p = self.effectiveness();
            'levels: for bucket in 0..queues.len() {
                while let Some(s) = self.next_operable(&mut queues[bucket], &monitor) {
                    let candidate = self.choose_apply(s, bucket);
                    let (kept, eff) = self.accept(candidate);
                    self = kept;
                    p = eff;
                    monitor.update(self.effectiveness(), s.index());
                    operated = true;
                    if monitor.iterations > self.config.max_iters {
                        break 'levels;
                    }
                }
                queues = self.build_level_queues();
                if self.should_terminate(&monitor, p) {
                    break;
                }
            }
            self.regen_levels();
            queues = self.build_level_queues();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrgConfig;

    fn unit(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; 4];
        v[axis] = 1.0;
        v
    }

    /// root -> (p1 -> (a, b), c)
    fn two_level_graph() -> (OrgGraph, NodeId) {
        let mut g = OrgGraph::new(OrgConfig::default().with_gamma(20.0));
        let a = g.add_dataset_node("a", unit(0));
        let b = g.add_dataset_node("b", unit(1));
        let c = g.add_dataset_node("c", unit(2));
        let p1 = g.add_merged_node(a, b);
        let root = g.add_merged_node(p1, c);
        g.root = Some(root);
        g.regen_levels();
        let _ = (a, b, c);
        (g, p1)
    }

    #[test]
    fn test_monitor_terminates_on_flat_window() {
        let mut g = OrgGraph::new(
            OrgConfig::default()
                .with_termination_window(3)
                .with_termination_threshold(1e-3),
        );
        let x = g.add_dataset_node("x", unit(0));
        g.root = Some(x);
        g.regen_levels();

        let mut monitor = TerminationMonitor::new(3);
        // Three iterations within 0.1% of each other fill the window.
        monitor.update(0.5000, 7);
        monitor.update(0.5001, 7);
        monitor.update(0.5002, 7);
        assert!(g.should_terminate(&monitor, 0.5002));
    }

    #[test]
    fn test_monitor_does_not_terminate_during_warm_up() {
        let (g, _) = two_level_graph();
        let monitor = TerminationMonitor::new(5);
        assert!(!g.should_terminate(&monitor, 0.9));
    }

    #[test]
    fn test_monitor_terminates_past_iteration_cap() {
        let (g, _) = two_level_graph();
        let mut monitor = TerminationMonitor::new(2);
        // Keep the relative improvement huge so only the cap can fire.
        for i in 0..=g.config().max_iters {
            monitor.update(1e-12, i);
        }
        monitor.update(1e-12, 0);
        assert!(monitor.iterations > g.config().max_iters);
        assert!(g.should_terminate(&monitor, 1.0e6));
    }

    #[test]
    fn test_hung_node_detection() {
        let mut monitor = TerminationMonitor::new(4);
        for _ in 0..4 {
            monitor.update(0.5, 9);
        }
        assert!(monitor.is_hung(9));
        assert!(!monitor.is_hung(8));
    }

    #[test]
    fn test_accept_is_monotonic() {
        let (g, p1) = two_level_graph();
        let before = g.effectiveness();

        // A deliberately bad candidate: contract the good cluster node.
        let mut worse = g.clone();
        worse.eliminate_node(p1);
        worse.update_vectors_from_root();

        let (kept, eff) = g.accept(worse);
        assert!(eff >= before);
        assert!(kept.contains(p1), "worse candidate was accepted");
    }

    #[test]
    fn test_delete_parent_without_parents_is_noop() {
        let (mut g, _) = two_level_graph();
        let root = g.root().unwrap();
        let before = g.node_count();
        g.delete_parent(root);
        assert_eq!(g.node_count(), before);
    }

    #[test]
    fn test_add_parent_skips_existing_edge_and_leaves() {
        let (mut g, p1) = two_level_graph();
        let root = g.root().unwrap();
        let mut queue = BinaryHeap::new();
        queue.push(ReachEntry {
            reachability: 1.0,
            node: root,
        });
        let edges_before: usize = g
            .node_ids()
            .iter()
            .map(|&n| g.children(n).len())
            .sum();
        // root -> p1 already exists; nothing to add.
        g.add_parent(p1, &mut queue);
        let edges_after: usize = g
            .node_ids()
            .iter()
            .map(|&n| g.children(n).len())
            .sum();
        assert_eq!(edges_before, edges_after);
    }

    #[test]
    fn test_organize_handles_trivial_graphs() {
        // Empty graph.
        let g = OrgGraph::new(OrgConfig::default());
        let g = g.organize();
        assert_eq!(g.node_count(), 0);

        // Single leaf.
        let mut g = OrgGraph::new(OrgConfig::default());
        let x = g.add_dataset_node("x", unit(0));
        g.root = Some(x);
        g.regen_levels();
        let g = g.organize();
        assert_eq!(g.effectiveness(), 1.0);
    }

    #[test]
    fn test_level_queues_skip_root_and_order_ascending() {
        let (mut g, p1) = two_level_graph();
        let root = g.root().unwrap();
        let mut queues = g.build_level_queues();

        assert_eq!(queues.len(), 2);
        for queue in &mut queues {
            let mut last = f64::NEG_INFINITY;
            while let Some(entry) = queue.pop() {
                assert_ne!(entry.node, root);
                assert!(entry.reachability >= last);
                last = entry.reachability;
            }
        }
        let _ = p1;
    }
}
