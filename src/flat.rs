//! Exhaustive flat index: brute-force search over a dense vector buffer.

use crate::distance::pairwise_l2;
use crate::error::Result;
use crate::index::{check_shape, sentinel_result, Index, SearchResult};
use crate::topk::find_top_k;

/// Exhaustive (brute-force) vector index.
///
/// Appends vectors into one contiguous row-major buffer; `search`
/// computes the full pairwise distance matrix against every stored
/// vector and selects the top-k. No training step.
#[derive(Debug, Clone)]
pub struct Flat {
    d: usize,
    data: Vec<f32>,
}

impl Flat {
    /// Creates an empty flat index over `d`-dimensional vectors.
    #[must_use]
    pub fn new(d: usize) -> Self {
        Self {
            d,
            data: Vec::new(),
        }
    }

    /// Running vector count.
    #[must_use]
    pub fn ntotal(&self) -> usize {
        self.data.len() / self.d.max(1)
    }

    /// Clears all stored vectors, resetting `ntotal` to zero.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Direct read access to the row-major backing buffer (mostly useful
    /// so `Ivf` can reuse `Flat` as its quantizer without copying out).
    #[must_use]
    pub(crate) fn data(&self) -> &[f32] {
        &self.data
    }
}

impl Index for Flat {
    fn dim(&self) -> usize {
        self.d
    }

    fn len(&self) -> usize {
        self.ntotal()
    }

    fn train(&mut self, _x: &[f32], _n: usize) -> Result<()> {
        Ok(())
    }

    fn add(&mut self, x: &[f32], n: usize) -> Result<()> {
        check_shape(self.d, n, x)?;
        self.data.extend_from_slice(x);
        tracing::debug!(added = n, ntotal = self.ntotal(), "flat: appended vectors");
        Ok(())
    }

    fn search(&self, x: &[f32], n: usize, k: usize) -> Result<SearchResult> {
        check_shape(self.d, n, x)?;

        let ntotal = self.ntotal();
        if ntotal == 0 {
            // Spec §9 resolves the "garbage in, garbage out" open question
            // in favor of padding, for consistency with IVF/HNSW.
            return Ok(sentinel_result(n, k));
        }

        let mut dist = vec![0.0_f32; n * ntotal];
        pairwise_l2(self.d, x, n, &self.data, ntotal, &mut dist);

        let mut out_idx = vec![0_i64; n * k];
        let mut out_dist = vec![0.0_f32; n * k];
        find_top_k(k, n, ntotal, &dist, &mut out_idx, &mut out_dist);

        Ok(SearchResult {
            distances: out_dist,
            ids: out_idx,
            n,
            k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_dataset_matches_spec_scenario() {
        let mut idx = Flat::new(2);
        idx.add(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0], 4).unwrap();

        let res = idx.search(&[0.1, 0.1], 1, 2).unwrap();
        let (d0, id0) = res.get(0, 0);
        let (d1, id1) = res.get(0, 1);
        assert!((d0 - 0.02).abs() < 1e-6);
        assert_eq!(id0, 0);
        assert!((d1 - 0.82).abs() < 1e-5);
        assert_eq!(id1, 1); // tie between ids 1 and 2 resolves to smaller id
    }

    #[test]
    fn k_greater_than_ntotal_pads_with_sentinels() {
        let mut idx = Flat::new(2);
        idx.add(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0], 4).unwrap();

        let res = idx.search(&[0.1, 0.1], 1, 6).unwrap();
        for j in 0..4 {
            assert_ne!(res.get(0, j).1, -1);
        }
        for j in 4..6 {
            assert_eq!(res.get(0, j), (-1.0, -1));
        }
    }

    #[test]
    fn search_on_empty_index_returns_sentinels() {
        let idx = Flat::new(3);
        let res = idx.search(&[1.0, 2.0, 3.0], 1, 3).unwrap();
        assert!(res.ids.iter().all(|&id| id == -1));
        assert!(res.distances.iter().all(|&d| d == -1.0));
    }

    #[test]
    fn reset_clears_ntotal() {
        let mut idx = Flat::new(2);
        idx.add(&[0.0, 0.0], 1).unwrap();
        assert_eq!(idx.ntotal(), 1);
        idx.reset();
        assert_eq!(idx.ntotal(), 0);
    }

    #[test]
    fn top1_equals_global_argmin() {
        let mut idx = Flat::new(3);
        let pts = [
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
            0.9, 2.1, 2.9, //
            -1.0, -1.0, -1.0,
        ];
        idx.add(&pts, 4).unwrap();

        let q = [1.0_f32, 2.0, 3.0];
        let res = idx.search(&q, 1, 1).unwrap();
        let (dist, id) = res.get(0, 0);

        let mut best = (f32::MAX, -1_i64);
        for i in 0..4 {
            let row = &pts[i * 3..(i + 1) * 3];
            let d = crate::distance::l2_sq(&q, row);
            if d < best.0 {
                best = (d, i as i64);
            }
        }
        assert_eq!(id, best.1);
        assert!((dist - best.0).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut idx = Flat::new(3);
        let err = idx.add(&[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, crate::error::Error::DimensionMismatch { .. }));
    }
}
