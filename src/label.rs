//! Topic labeling.
//!
//! Interior nodes get human-readable names from a category index: an
//! inner-product index over the embedding vectors of every category
//! string seen in the metadata store. A category's vector is the
//! normalized sum of its words' embeddings, with stop words removed.
//!
//! Labeling walks the hierarchy top-down from the root. Each interior
//! node takes the nearest category whose name is not already used, so
//! sibling topics stay distinguishable; when all candidates are taken the
//! top one is reused. Leaves are labeled with their dataset's display
//! name.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::graph::{NodeId, OrgGraph};
use crate::index::{DenseIndex, FlatIndex, NO_RESULT};
use crate::store::{MetadataStore, WordEmbedding};
use crate::vec32::{self, EMBEDDING_DIM};

/// Candidate categories fetched per interior node.
const LABEL_CANDIDATES: usize = 20;

/// Lucene stop words, checked against lowercased words.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.iter().any(|s| *s == lower)
}

/// Creates an embedding vector for the given texts by summing and
/// normalizing the word vectors, skipping stop words and words without an
/// embedding.
///
/// Returns a zero vector and [`Error::NoEmbedding`] when no word has an
/// embedding.
pub fn text_vector(ft: &impl WordEmbedding, texts: &[&str]) -> Result<Vec<f32>> {
    let mut vec = vec![0.0f32; EMBEDDING_DIM];
    let mut found = false;

    for text in texts {
        for word in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
            if word.is_empty() || is_stopword(word) {
                continue;
            }
            let Some(mut emb) = ft.embedding(word)? else {
                continue;
            };
            found = true;
            vec32::normalize(&mut emb);
            vec32::add(&mut vec, &emb)?;
        }
    }
    vec32::normalize(&mut vec);

    if !found {
        return Err(Error::NoEmbedding);
    }
    Ok(vec)
}

/// An index over category embedding vectors.
///
/// Built once per store; read-only afterwards, so it may be cached across
/// builds.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    index: FlatIndex,
    // Maps index id to category name.
    names: Vec<String>,
}

impl CategoryIndex {
    /// Builds the index from every category string in the store.
    ///
    /// Category fields are comma-separated; categories with no embedded
    /// word, or whose summed vector has zero norm, are skipped.
    pub fn build(store: &impl MetadataStore, ft: &impl WordEmbedding) -> Result<Self> {
        let mut categories: Vec<String> = store
            .categories()?
            .iter()
            .flat_map(|row| row.split(','))
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();
        categories.sort_unstable();
        categories.dedup();

        let mut index = FlatIndex::new(EMBEDDING_DIM);
        let mut names = Vec::new();

        for category in categories {
            let vec = match text_vector(ft, &[category.as_str()]) {
                Ok(vec) => vec,
                Err(Error::NoEmbedding) => continue,
                Err(e) => return Err(e),
            };
            if vec32::norm(&vec) == 0.0 {
                continue;
            }
            index.add(names.len() as i64, &vec)?;
            names.push(category);
        }

        Ok(Self { index, names })
    }

    /// Number of indexed categories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no categories.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the names and cosine similarities of the up to `k`
    /// categories nearest to `vec`, sorted by similarity.
    pub fn query(&self, vec: &[f32], k: usize) -> Result<(Vec<String>, Vec<f32>)> {
        let res = self.index.search(vec, k)?;
        let mut names = Vec::new();
        let mut similarities = Vec::new();
        for (id, sim) in res.ids.iter().zip(&res.similarities) {
            if *id == NO_RESULT {
                break;
            }
            names.push(self.names[*id as usize].clone());
            similarities.push(*sim);
        }
        Ok((names, similarities))
    }
}

impl OrgGraph {
    /// Labels every node, top-down from the root.
    ///
    /// Interior nodes take their nearest not-yet-used category name;
    /// leaves take their dataset's display name, and their parents are
    /// marked as having leaf children.
    pub fn label_nodes(
        &mut self,
        store: &impl MetadataStore,
        categories: &CategoryIndex,
    ) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        let mut used: HashSet<String> = HashSet::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        self.label_node(root, store, categories, &mut used, &mut visited)
    }

    fn label_node(
        &mut self,
        n: NodeId,
        store: &impl MetadataStore,
        categories: &CategoryIndex,
        used: &mut HashSet<String>,
        visited: &mut HashSet<NodeId>,
    ) -> Result<()> {
        if !visited.insert(n) {
            return Ok(());
        }

        if self.is_leaf(n) {
            self.label_leaf(n, store)?;
            return Ok(());
        }

        let (names, _) = categories.query(self.vector_of(n), LABEL_CANDIDATES)?;
        if let Some(label) = pick_label(&names, used) {
            used.insert(label.to_lowercase());
            if let Some(data) = self.node_mut(n) {
                data.label = label;
            }
        }

        for c in self.children(n) {
            if self.is_leaf(c) {
                if visited.insert(c) {
                    self.label_leaf(c, store)?;
                }
            } else {
                self.label_node(c, store, categories, used, visited)?;
            }
        }
        Ok(())
    }

    fn label_leaf(&mut self, n: NodeId, store: &impl MetadataStore) -> Result<()> {
        let Some(dataset_id) = self.node(n).and_then(|d| d.dataset()).map(String::from) else {
            return Ok(());
        };
        let name = store.dataset_name(&dataset_id)?;
        if let Some(data) = self.node_mut(n) {
            data.label = name;
        }
        for p in self.parents(n) {
            if let Some(data) = self.node_mut(p) {
                data.has_leaf_children = true;
            }
        }
        Ok(())
    }
}

/// First candidate whose lowercased name is unused; the top candidate
/// when all are taken.
fn pick_label(names: &[String], used: &HashSet<String>) -> Option<String> {
    names
        .iter()
        .find(|name| !used.contains(&name.to_lowercase()))
        .or_else(|| names.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEmbeddings;

    fn unit(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn test_text_vector_skips_stopwords() {
        let mut ft = MemoryEmbeddings::new();
        ft.insert("the", unit(0));
        ft.insert("weather", unit(1));

        let vec = text_vector(&ft, &["the weather"]).unwrap();
        // Only "weather" contributes: "the" is a stop word.
        assert!((vec[1] - 1.0).abs() < 1e-6);
        assert_eq!(vec[0], 0.0);
    }

    #[test]
    fn test_text_vector_averages_words() {
        let mut ft = MemoryEmbeddings::new();
        ft.insert("city", unit(0));
        ft.insert("budget", unit(1));

        let vec = text_vector(&ft, &["city budget"]).unwrap();
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((vec[0] - expected).abs() < 1e-6);
        assert!((vec[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_text_vector_without_embeddings() {
        let ft = MemoryEmbeddings::new();
        assert_eq!(text_vector(&ft, &["unknown words"]), Err(Error::NoEmbedding));
    }

    #[test]
    fn test_category_index_skips_unembeddable() {
        let mut store = crate::store::MemoryStore::new();
        store.add_categories("transport,unknowable");
        let mut ft = MemoryEmbeddings::new();
        ft.insert("transport", unit(2));

        let idx = CategoryIndex::build(&store, &ft).unwrap();
        assert_eq!(idx.len(), 1);

        let (names, sims) = idx.query(&unit(2), 5).unwrap();
        assert_eq!(names, vec!["transport".to_string()]);
        assert!((sims[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pick_label_prefers_unused() {
        let names = vec!["Alpha".to_string(), "Beta".to_string()];
        let mut used = HashSet::new();
        used.insert("alpha".to_string());
        assert_eq!(pick_label(&names, &used), Some("Beta".to_string()));

        used.insert("beta".to_string());
        // Everything taken: fall back to the top candidate.
        assert_eq!(pick_label(&names, &used), Some("Alpha".to_string()));
    }
}
