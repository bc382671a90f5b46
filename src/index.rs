//! Vector index facade.
//!
//! The organization builder needs a nearest-neighbor primitive over
//! embedding vectors with three operations: associate an external id with
//! a vector, remove ids, and search by inner product. [`DenseIndex`] is
//! that contract; [`FlatIndex`] is the shipped backend, an exact
//! inner-product scan behind an id map. An approximate backend (HNSW or
//! similar) slots in behind the trait without touching the builder.
//!
//! Search results follow the usual convention: ids in descending
//! similarity order, padded to `k` with the sentinel id `-1` when the
//! index holds fewer vectors.

use crate::error::{Error, Result};

/// Sentinel id marking "no further result" in a search.
pub const NO_RESULT: i64 = -1;

/// Top-k result of a single query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Inner products, descending. Padding entries hold `f32::NEG_INFINITY`.
    pub similarities: Vec<f32>,
    /// Matching ids, descending by similarity. Padded with [`NO_RESULT`].
    pub ids: Vec<i64>,
}

/// An inner-product index over fixed-dimension vectors with external ids.
///
/// Implementations report backend failures (allocation, search) as
/// [`Error::IndexFailure`]; the build in progress is then discarded.
pub trait DenseIndex {
    /// Associates `id` with `vector`.
    fn add(&mut self, id: i64, vector: &[f32]) -> Result<()>;

    /// Removes the given ids. Ids not present are ignored.
    fn remove(&mut self, ids: &[i64]) -> Result<()>;

    /// Returns the top `k` entries by inner product with `query`.
    fn search(&self, query: &[f32], k: usize) -> Result<SearchResult>;

    /// Number of indexed vectors.
    fn ntotal(&self) -> usize;

    /// Returns the nearest neighbor of an indexed vector, excluding the
    /// vector itself.
    ///
    /// Requests k = 2 and skips the first result only if its id equals
    /// `id`: two datasets may share an identical embedding, and then the
    /// duplicate is the legitimate answer. Returns `None` when the index
    /// holds no other vector.
    fn nearest_neighbor(&self, id: i64, vector: &[f32]) -> Result<Option<(i64, f32)>> {
        let res = self.search(vector, 2)?;
        let (best, sim) = if res.ids[0] == id {
            (res.ids[1], res.similarities[1])
        } else {
            (res.ids[0], res.similarities[0])
        };
        if best == NO_RESULT {
            return Ok(None);
        }
        Ok(Some((best, sim)))
    }
}

/// Exact inner-product index: a brute-force scan over an id-keyed table.
///
/// Matches the observable behavior of an id-mapped flat index. Ties on
/// similarity break toward the smaller id, so searches are deterministic
/// for a given set of insertions.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    entries: Vec<(i64, Vec<f32>)>,
}

impl FlatIndex {
    /// Creates an empty index over `dim`-dimensional vectors.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }
}

impl DenseIndex for FlatIndex {
    fn add(&mut self, id: i64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: vector.len(),
            });
        }
        self.entries.push((id, vector.to_vec()));
        Ok(())
    }

    fn remove(&mut self, ids: &[i64]) -> Result<()> {
        self.entries.retain(|(id, _)| !ids.contains(id));
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<SearchResult> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: query.len(),
            });
        }
        let mut scored: Vec<(f32, i64)> = self
            .entries
            .iter()
            .map(|(id, v)| {
                let sim: f32 = query.iter().zip(v).map(|(x, y)| x * y).sum();
                (sim, *id)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        let mut similarities: Vec<f32> = scored.iter().map(|(s, _)| *s).collect();
        let mut ids: Vec<i64> = scored.iter().map(|(_, id)| *id).collect();
        similarities.resize(k, f32::NEG_INFINITY);
        ids.resize(k, NO_RESULT);

        Ok(SearchResult { similarities, ids })
    }

    fn ntotal(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn test_search_orders_by_inner_product() {
        let mut idx = FlatIndex::new(3);
        idx.add(10, &unit(3, 0)).unwrap();
        idx.add(11, &unit(3, 1)).unwrap();
        idx.add(12, &[0.9, 0.1, 0.0]).unwrap();

        let res = idx.search(&unit(3, 0), 3).unwrap();
        assert_eq!(res.ids, vec![10, 12, 11]);
        assert!(res.similarities[0] >= res.similarities[1]);
    }

    #[test]
    fn test_search_pads_with_sentinel() {
        let mut idx = FlatIndex::new(2);
        idx.add(1, &[1.0, 0.0]).unwrap();

        let res = idx.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(res.ids, vec![1, NO_RESULT, NO_RESULT, NO_RESULT]);
    }

    #[test]
    fn test_remove() {
        let mut idx = FlatIndex::new(2);
        idx.add(1, &[1.0, 0.0]).unwrap();
        idx.add(2, &[0.0, 1.0]).unwrap();
        idx.remove(&[1]).unwrap();
        assert_eq!(idx.ntotal(), 1);

        let res = idx.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(res.ids, vec![2]);
    }

    #[test]
    fn test_nearest_neighbor_skips_self() {
        let mut idx = FlatIndex::new(2);
        idx.add(1, &[1.0, 0.0]).unwrap();
        idx.add(2, &[0.0, 1.0]).unwrap();

        let (id, _) = idx.nearest_neighbor(1, &[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_nearest_neighbor_keeps_duplicate_embedding() {
        let mut idx = FlatIndex::new(2);
        idx.add(1, &[1.0, 0.0]).unwrap();
        idx.add(2, &[1.0, 0.0]).unwrap();

        // The duplicate, not the query itself, is the nearest neighbor.
        let (id, sim) = idx.nearest_neighbor(1, &[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(id, 2);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_neighbor_alone_in_index() {
        let mut idx = FlatIndex::new(2);
        idx.add(1, &[1.0, 0.0]).unwrap();
        assert!(idx.nearest_neighbor(1, &[1.0, 0.0]).unwrap().is_none());
    }

    #[test]
    fn test_dimension_checked() {
        let mut idx = FlatIndex::new(3);
        assert!(idx.add(1, &[1.0]).is_err());
        assert!(idx.search(&[1.0], 1).is_err());
    }
}
