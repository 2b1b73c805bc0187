//! The shared operation set every index strategy exposes, and the
//! tagged-union facade that dispatches across them.

use crate::error::Result;
use crate::flat::Flat;
use crate::hnsw::Hnsw;
use crate::ivf::Ivf;

/// Result of a `search` call: two row-major `n x k` buffers.
///
/// This is the Rust-native analogue of the spec's `(D, I)` matrix
/// pair — kept as flat buffers rather than `Vec<Vec<_>>` so the memory
/// layout matches what a binding layer would hand back to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Row-major `n x k` distances, ascending per row.
    pub distances: Vec<f32>,
    /// Row-major `n x k` vector ids, `-1` for padding slots.
    pub ids: Vec<i64>,
    /// Number of query rows.
    pub n: usize,
    /// Number of neighbors requested per row.
    pub k: usize,
}

impl SearchResult {
    fn sentinel(n: usize, k: usize) -> Self {
        Self {
            distances: vec![-1.0; n * k],
            ids: vec![-1; n * k],
            n,
            k,
        }
    }

    /// Returns the `(distance, id)` pair for query row `i`, result `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> (f32, i64) {
        (self.distances[i * self.k + j], self.ids[i * self.k + j])
    }
}

/// The operation set shared by every index strategy: dimension,
/// running count, optional training, insertion, and search.
pub trait Index {
    /// Vector dimension this index was constructed with.
    fn dim(&self) -> usize;

    /// Number of vectors successfully added so far.
    fn len(&self) -> usize;

    /// Whether the index currently holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trains the index on a sample of `n` vectors (`x` flattened row-major).
    ///
    /// A no-op for indexes that don't require training (`Flat`, `Hnsw`).
    fn train(&mut self, x: &[f32], n: usize) -> Result<()>;

    /// Appends `n` vectors (`x` flattened row-major).
    fn add(&mut self, x: &[f32], n: usize) -> Result<()>;

    /// Finds the `k` nearest neighbors (by squared L2) for each of `n` query rows.
    fn search(&self, x: &[f32], n: usize, k: usize) -> Result<SearchResult>;
}

/// A vector index, one of the three strategies this crate implements.
///
/// This is the crate's public facade: a tagged union over `Flat`,
/// `Ivf`, and `Hnsw` so callers can hold one concrete type without
/// reaching for a trait object, while each variant's own inherent
/// methods (e.g. `Flat::reset`, `Ivf::set_nprobe`, `Hnsw::set_ef`)
/// remain reachable by matching on the variant.
#[derive(Debug)]
pub enum VectorIndex {
    /// Exhaustive flat scan.
    Flat(Flat),
    /// Inverted-file coarse-quantized index.
    Ivf(Ivf),
    /// Hierarchical navigable small-world graph index.
    Hnsw(Hnsw),
}

impl Index for VectorIndex {
    fn dim(&self) -> usize {
        match self {
            Self::Flat(i) => i.dim(),
            Self::Ivf(i) => i.dim(),
            Self::Hnsw(i) => i.dim(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Flat(i) => i.len(),
            Self::Ivf(i) => i.len(),
            Self::Hnsw(i) => i.len(),
        }
    }

    fn train(&mut self, x: &[f32], n: usize) -> Result<()> {
        match self {
            Self::Flat(i) => i.train(x, n),
            Self::Ivf(i) => i.train(x, n),
            Self::Hnsw(i) => i.train(x, n),
        }
    }

    fn add(&mut self, x: &[f32], n: usize) -> Result<()> {
        match self {
            Self::Flat(i) => i.add(x, n),
            Self::Ivf(i) => i.add(x, n),
            Self::Hnsw(i) => i.add(x, n),
        }
    }

    fn search(&self, x: &[f32], n: usize, k: usize) -> Result<SearchResult> {
        match self {
            Self::Flat(i) => i.search(x, n, k),
            Self::Ivf(i) => i.search(x, n, k),
            Self::Hnsw(i) => i.search(x, n, k),
        }
    }
}

pub(crate) fn check_shape(expected_d: usize, n: usize, x: &[f32]) -> Result<()> {
    use crate::error::Error;

    let expected_len = n.checked_mul(expected_d).unwrap_or(usize::MAX);
    if x.len() != expected_len {
        let actual = if n == 0 { 0 } else { x.len() / n };
        tracing::warn!(expected_d, actual, n, "dimension mismatch rejected at index boundary");
        return Err(Error::DimensionMismatch {
            expected: expected_d,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn sentinel_result(n: usize, k: usize) -> SearchResult {
    SearchResult::sentinel(n, k)
}
