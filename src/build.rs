//! Initial organization construction.
//!
//! The initial organization is a binary tree created bottom-up: index all
//! dataset embeddings, repeatedly pop the most similar pair off a
//! similarity heap, and join the pair under a fresh merged node. Each
//! merge removes two entries from the index and inserts one, so the loop
//! terminates even when embeddings are duplicated. The last merged node
//! becomes the root.
//!
//! The heap holds `(node, nearest neighbor)` pairs that can go stale as
//! nodes are merged away: a stale query side is discarded, a stale
//! neighbor side triggers a re-query against the current index.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::info;

use crate::config::OrgConfig;
use crate::error::{Error, Result};
use crate::graph::{ann_id, from_ann_id, NodeId, OrgGraph};
use crate::index::{DenseIndex, FlatIndex};
use crate::label::CategoryIndex;
use crate::store::{MetadataStore, WordEmbedding};
use crate::vec32::EMBEDDING_DIM;

/// A candidate merge: a node and its nearest neighbor, keyed on cosine.
///
/// Ordered max-first by cosine; ties break toward the smaller pair of
/// ids, so the merge schedule is deterministic for a given input and
/// index.
#[derive(Debug, Clone, Copy)]
struct SimilarityPair {
    a: NodeId,
    b: NodeId,
    cosine: f32,
}

impl PartialEq for SimilarityPair {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimilarityPair {}

impl PartialOrd for SimilarityPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimilarityPair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cosine
            .total_cmp(&other.cosine)
            .then_with(|| other.a.cmp(&self.a))
            .then_with(|| other.b.cmp(&self.b))
    }
}

/// Builds the complete navigation organization for the given datasets:
/// initial binary tree, effectiveness optimization, then labeling.
pub fn build_organization(
    store: &impl MetadataStore,
    ft: &impl WordEmbedding,
    config: &OrgConfig,
    dataset_ids: &[String],
) -> Result<OrgGraph> {
    let g = build_initial_org(store, config, dataset_ids)?;
    info!(datasets = dataset_ids.len(), nodes = g.node_count(), "built initial organization");

    let mut g = g.organize();
    info!(effectiveness = g.effectiveness(), "optimized organization");

    let categories = CategoryIndex::build(store, ft)?;
    g.label_nodes(store, &categories)?;
    Ok(g)
}

/// Builds the initial organization: a binary tree whose leaves are the
/// datasets and whose interior nodes join the most similar pairs.
pub fn build_initial_org(
    store: &impl MetadataStore,
    config: &OrgConfig,
    dataset_ids: &[String],
) -> Result<OrgGraph> {
    let mut g = OrgGraph::new(config.clone());

    for id in dataset_ids {
        let vector = store.metadata_vector(id)?;
        if vector.len() != EMBEDDING_DIM {
            return Err(Error::DimensionMismatch {
                expected: EMBEDDING_DIM,
                found: vector.len(),
            });
        }
        g.add_dataset_node(id, vector);
    }

    match g.leaves().len() {
        0 => return Ok(g),
        1 => {
            g.root = Some(g.leaves()[0]);
            g.regen_levels();
            return Ok(g);
        }
        _ => {}
    }

    // The index is owned here and dropped before return.
    let mut index = FlatIndex::new(EMBEDDING_DIM);
    for &n in g.leaves() {
        index.add(ann_id(n), g.vector_of(n))?;
    }

    let mut heap = BinaryHeap::new();
    for &n in g.leaves() {
        if let Some((nn, cosine)) = nearest(&index, &g, n)? {
            heap.push(SimilarityPair { a: n, b: nn, cosine });
        }
    }

    // Nodes already joined under a parent.
    let mut merged: HashSet<NodeId> = HashSet::new();

    while let Some(pair) = heap.pop() {
        if merged.contains(&pair.a) {
            continue;
        }
        if merged.contains(&pair.b) {
            // The recorded neighbor is gone; find a fresh one.
            if let Some((nn, cosine)) = nearest(&index, &g, pair.a)? {
                heap.push(SimilarityPair { a: pair.a, b: nn, cosine });
            }
            continue;
        }

        index.remove(&[ann_id(pair.a), ann_id(pair.b)])?;
        let p = g.add_merged_node(pair.a, pair.b);
        merged.insert(pair.a);
        merged.insert(pair.b);

        if index.ntotal() == 0 {
            g.root = Some(p);
            break;
        }
        if let Some((nn, cosine)) = nearest(&index, &g, p)? {
            heap.push(SimilarityPair { a: p, b: nn, cosine });
        }
        index.add(ann_id(p), g.vector_of(p))?;
    }

    g.regen_levels();
    Ok(g)
}

/// Queries the index for `n`'s nearest neighbor other than `n` itself.
fn nearest(
    index: &FlatIndex,
    g: &OrgGraph,
    n: NodeId,
) -> Result<Option<(NodeId, f32)>> {
    Ok(index
        .nearest_neighbor(ann_id(n), g.vector_of(n))?
        .map(|(id, sim)| (from_ann_id(id), sim)))
}
