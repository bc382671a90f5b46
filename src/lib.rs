//! # atlas
//!
//! Navigation organizations for dataset discovery: directed acyclic topic
//! hierarchies over embedding vectors.
//!
//! Given a set of candidate datasets with metadata embeddings, `atlas`
//! builds a browsable hierarchy whose leaves are the datasets and whose
//! interior nodes are abstract topics summarizing their descendants:
//!
//! 1. [`build_initial_org`] joins the most similar pairs of nodes
//!    bottom-up into a binary tree (agglomerative merge over a vector
//!    index);
//! 2. [`OrgGraph::organize`] reshapes the tree with local add-parent /
//!    delete-parent edits, maximizing the probability that softmax
//!    navigation from the root recovers each dataset from its own
//!    embedding;
//! 3. [`OrgGraph::label_nodes`] names every topic from a category index
//!    and every leaf from its dataset's display name;
//! 4. [`OrgGraph::marshal_dot`] serializes the result for rendering.
//!
//! [`build_organization`] runs all four steps.
//!
//! Dataset metadata and word embeddings come from the caller through the
//! [`store::MetadataStore`] and [`store::WordEmbedding`] traits; the
//! vector index behind the builder is the [`index::DenseIndex`] facade.

pub mod build;
pub mod config;
mod dot;
pub mod error;
pub mod graph;
pub mod index;
pub mod label;
mod model;
mod organize;
pub mod store;
pub mod vec32;


pub use build::{build_initial_org, build_organization};
pub use config::OrgConfig;
pub use error::{Error, Result};
pub use graph::{NodeData, NodeId, NodeView, OrgGraph};
pub use index::{DenseIndex, FlatIndex, SearchResult, NO_RESULT};
pub use label::{text_vector, CategoryIndex};
pub use store::{MemoryEmbeddings, MemoryStore, MetadataStore, WordEmbedding};
pub use vec32::EMBEDDING_DIM;
