//! The probabilistic navigation model.
//!
//! A user navigating an organization starts at the root and walks down,
//! choosing among a node's children by softmax over cosine similarity to
//! the query vector. The exponent coefficient is `gamma / n` for a node
//! with n children, so wide nodes spread their probability mass thinner —
//! the branching penalty.
//!
//! From the transition model follow, in order: the probability of
//! *reaching* a state given a query, a node's *reachability* averaged
//! over the leaf ensemble, and the *organization effectiveness* — the
//! probability, averaged over leaves, that a query placed exactly at a
//! leaf leads back to that leaf.
//!
//! All probabilities are computed in `f64`; exponents are bounded because
//! cosine lies in [-1, 1] and the coefficient is at most gamma.

use crate::graph::{NodeId, OrgGraph};

/// Cosine similarity of two unit vectors (their dot product).
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>() as f64
}

impl OrgGraph {
    /// The probability of navigating from `s` to its child `c` given
    /// query `x`.
    pub fn transition_probability(&self, c: NodeId, s: NodeId, x: &[f32]) -> f64 {
        let children = self.children(s);
        let coef = self.config.gamma / children.len() as f64;
        let mut divisor = 0.0;
        for child in &children {
            divisor += (coef * cosine(&self.graph[*child].vector, x)).exp();
        }
        (coef * cosine(&self.graph[c].vector, x)).exp() / divisor
    }

    /// The probability of reaching `s` from the root given query `x`.
    ///
    /// Defined as 1 for the root and as the parent-weighted sum
    /// `sum_p P(s | p, x) * P(p | x)` otherwise. A node with no path from
    /// the root has probability 0.
    pub fn query_probability(&self, s: NodeId, x: &[f32]) -> f64 {
        if Some(s) == self.root {
            return 1.0;
        }
        let mut out = 0.0;
        for p in self.parents(s) {
            let transition = self.transition_probability(s, p, x);
            let parent_prob = if Some(p) == self.root {
                1.0
            } else {
                self.query_probability(p, x)
            };
            out += transition * parent_prob;
        }
        out
    }

    /// The reachability of `s`: its query probability averaged over the
    /// leaf ensemble. The result is cached on the node record.
    pub fn reachability(&mut self, s: NodeId) -> f64 {
        let leaves = self.leaves.clone();
        if leaves.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0;
        for t in &leaves {
            let x = self.graph[*t].vector.clone();
            sum += self.query_probability(s, &x);
        }
        let out = sum / leaves.len() as f64;
        if let Some(data) = self.node_mut(s) {
            data.reachability = out;
        }
        out
    }

    /// The organization effectiveness: the probability, averaged over
    /// leaves, that a query at a leaf reaches that leaf.
    pub fn effectiveness(&self) -> f64 {
        if self.leaves.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0;
        for t in &self.leaves {
            sum += self.query_probability(*t, &self.graph[*t].vector);
        }
        sum / self.leaves.len() as f64
    }
}
