//! External collaborator seams.
//!
//! The core does not ingest datasets or own persistent state. It consumes
//! two lookups: a metadata store holding per-dataset embedding vectors,
//! display names, and category strings, and a word-embedding table used to
//! derive topic vectors for labeling. Both are traits so callers can back
//! them with a relational store and a fastText table; [`MemoryStore`] and
//! [`MemoryEmbeddings`] back them with hash maps for tests and demos.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::vec32;

/// Source of per-dataset metadata.
pub trait MetadataStore {
    /// Returns the metadata embedding vector of a dataset.
    fn metadata_vector(&self, dataset_id: &str) -> Result<Vec<f32>>;

    /// Returns the human-readable name of a dataset.
    fn dataset_name(&self, dataset_id: &str) -> Result<String>;

    /// Returns the category strings of all datasets, one comma-separated
    /// string per dataset, exactly as persisted.
    fn categories(&self) -> Result<Vec<String>>;
}

/// Word-to-vector lookup.
pub trait WordEmbedding {
    /// Returns the embedding of `word`, or `None` if the word has no
    /// embedding.
    fn embedding(&self, word: &str) -> Result<Option<Vec<f32>>>;
}

/// In-memory [`MetadataStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    vectors: HashMap<String, Vec<f32>>,
    names: HashMap<String, String>,
    categories: Vec<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a dataset with its embedding and display name.
    pub fn insert(
        &mut self,
        dataset_id: impl Into<String>,
        name: impl Into<String>,
        vector: Vec<f32>,
    ) {
        let id = dataset_id.into();
        self.names.insert(id.clone(), name.into());
        self.vectors.insert(id, vector);
    }

    /// Inserts a dataset whose embedding is stored as big-endian bytes.
    pub fn insert_encoded(
        &mut self,
        dataset_id: impl Into<String>,
        name: impl Into<String>,
        emb: &[u8],
    ) -> Result<()> {
        self.insert(dataset_id, name, vec32::from_bytes(emb)?);
        Ok(())
    }

    /// Adds a comma-separated category string.
    pub fn add_categories(&mut self, categories: impl Into<String>) {
        self.categories.push(categories.into());
    }
}

impl MetadataStore for MemoryStore {
    fn metadata_vector(&self, dataset_id: &str) -> Result<Vec<f32>> {
        self.vectors
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                dataset_id: dataset_id.to_string(),
            })
    }

    fn dataset_name(&self, dataset_id: &str) -> Result<String> {
        self.names
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                dataset_id: dataset_id.to_string(),
            })
    }

    fn categories(&self) -> Result<Vec<String>> {
        Ok(self.categories.clone())
    }
}

/// In-memory [`WordEmbedding`].
#[derive(Debug, Clone, Default)]
pub struct MemoryEmbeddings {
    words: HashMap<String, Vec<f32>>,
}

impl MemoryEmbeddings {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a word vector.
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f32>) {
        self.words.insert(word.into(), vector);
    }
}

impl WordEmbedding for MemoryEmbeddings {
    fn embedding(&self, word: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.words.get(word).cloned())
    }
}
