//! Inverted-file (IVF) index: k-means coarse quantization over cells,
//! each holding an inverted list of raw vector bodies and global ids.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::distance::pairwise_l2;
use crate::error::Result;
use crate::flat::Flat;
use crate::index::{check_shape, sentinel_result, Index, SearchResult};
use crate::topk::find_top_k;

const KMEANS_ITERATIONS: usize = 10;

/// Inverted-file index: training partitions the space into `nlist`
/// Voronoi cells via Lloyd's k-means; `search` probes the `nprobe`
/// nearest cells and does an exact scan within the candidate pool.
pub struct Ivf {
    d: usize,
    nlist: usize,
    nprobe: usize,
    trained: bool,
    /// Coarse quantizer: a `Flat` index over the `nlist` centroids.
    /// Owned exclusively by this `Ivf` and refilled at the end of training.
    quantizer: Flat,
    /// Per-cell inverted lists: raw vector bodies, row-major, `d` floats each.
    codes: Vec<Vec<f32>>,
    /// Per-cell inverted lists: parallel global ids.
    ids: Vec<Vec<i64>>,
    ntotal: usize,
    rng: StdRng,
}

impl std::fmt::Debug for Ivf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ivf")
            .field("d", &self.d)
            .field("nlist", &self.nlist)
            .field("nprobe", &self.nprobe)
            .field("trained", &self.trained)
            .field("ntotal", &self.ntotal)
            .finish_non_exhaustive()
    }
}

impl Ivf {
    /// Creates an untrained IVF index over `d`-dimensional vectors with `nlist` cells.
    /// `nprobe` defaults to 1.
    #[must_use]
    pub fn new(d: usize, nlist: usize) -> Self {
        Self::with_rng(d, nlist, StdRng::from_entropy())
    }

    /// Like [`Ivf::new`], but seeded for reproducible centroid selection
    /// across repeated trainings on the same input (spec §9's RNG note).
    #[must_use]
    pub fn with_seed(d: usize, nlist: usize, seed: u64) -> Self {
        Self::with_rng(d, nlist, StdRng::seed_from_u64(seed))
    }

    fn with_rng(d: usize, nlist: usize, rng: StdRng) -> Self {
        Self {
            d,
            nlist,
            nprobe: 1,
            trained: false,
            quantizer: Flat::new(d),
            codes: vec![Vec::new(); nlist],
            ids: vec![Vec::new(); nlist],
            ntotal: 0,
            rng,
        }
    }

    /// Sets the number of cells probed per query.
    pub fn set_nprobe(&mut self, nprobe: usize) {
        self.nprobe = nprobe;
    }

    /// Whether `train` has completed successfully.
    ///
    /// Resolves spec §9's open question: the original leaves `is_trained`
    /// private with no accessor, so a caller whose `train(n < nlist)` call
    /// silently no-ops has no way to tell. This exposes that state.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    fn ntotal(&self) -> usize {
        self.ntotal
    }
}

impl Index for Ivf {
    fn dim(&self) -> usize {
        self.d
    }

    fn len(&self) -> usize {
        self.ntotal()
    }

    fn train(&mut self, x: &[f32], n: usize) -> Result<()> {
        check_shape(self.d, n, x)?;

        if n < self.nlist {
            tracing::warn!(n, nlist = self.nlist, "IVF: training set smaller than nlist, skipping");
            return Ok(());
        }

        let d = self.d;
        let nlist = self.nlist;

        // Seed centroids: uniform shuffle of training-point indices, take the first nlist.
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut self.rng);

        let mut centroids = vec![0.0_f32; nlist * d];
        for (i, &p) in perm.iter().take(nlist).enumerate() {
            centroids[i * d..(i + 1) * d].copy_from_slice(&x[p * d..(p + 1) * d]);
        }

        for iter in 0..KMEANS_ITERATIONS {
            self.quantizer.reset();
            self.quantizer.add(&centroids, nlist)?;

            let assign = self.quantizer.search(x, n, 1)?;

            let mut new_centroids = vec![0.0_f32; nlist * d];
            let mut counts = vec![0_u32; nlist];

            for i in 0..n {
                let (_dist, cell) = assign.get(i, 0);
                if cell < 0 {
                    continue;
                }
                let cell = cell as usize;
                counts[cell] += 1;
                for j in 0..d {
                    new_centroids[cell * d + j] += x[i * d + j];
                }
            }

            for c in 0..nlist {
                if counts[c] > 0 {
                    for j in 0..d {
                        new_centroids[c * d + j] /= counts[c] as f32;
                    }
                } else {
                    // Retain the prior iteration's centroid for empty cells.
                    new_centroids[c * d..(c + 1) * d].copy_from_slice(&centroids[c * d..(c + 1) * d]);
                }
            }

            centroids = new_centroids;
            tracing::trace!(iter, "IVF: k-means iteration complete");
        }

        self.quantizer.reset();
        self.quantizer.add(&centroids, nlist)?;
        self.trained = true;
        tracing::debug!(nlist, n, "IVF: training complete");
        Ok(())
    }

    fn add(&mut self, x: &[f32], n: usize) -> Result<()> {
        check_shape(self.d, n, x)?;

        if !self.trained {
            tracing::warn!("IVF: add called before train, ignoring");
            return Ok(());
        }

        let assign = self.quantizer.search(x, n, 1)?;

        for i in 0..n {
            let (_dist, cell) = assign.get(i, 0);
            if cell < 0 {
                continue;
            }
            let cell = cell as usize;
            let global_id = (self.ntotal + i) as i64;
            self.ids[cell].push(global_id);
            self.codes[cell].extend_from_slice(&x[i * self.d..(i + 1) * self.d]);
        }

        self.ntotal += n;
        Ok(())
    }

    fn search(&self, x: &[f32], n: usize, k: usize) -> Result<SearchResult> {
        check_shape(self.d, n, x)?;

        if !self.trained {
            return Ok(sentinel_result(n, k));
        }

        let coarse = self.quantizer.search(x, n, self.nprobe)?;

        let mut out_dist = vec![0.0_f32; n * k];
        let mut out_idx = vec![-1_i64; n * k];

        for i in 0..n {
            let query = &x[i * self.d..(i + 1) * self.d];

            let mut cand_vecs: Vec<f32> = Vec::new();
            let mut cand_ids: Vec<i64> = Vec::new();
            for p in 0..self.nprobe {
                let (_cd, cell) = coarse.get(i, p);
                if cell < 0 || cell as usize >= self.nlist {
                    continue;
                }
                let cell = cell as usize;
                cand_vecs.extend_from_slice(&self.codes[cell]);
                cand_ids.extend_from_slice(&self.ids[cell]);
            }

            let n_cand = cand_ids.len();
            if n_cand == 0 {
                for j in 0..k {
                    out_dist[i * k + j] = -1.0;
                    out_idx[i * k + j] = -1;
                }
                continue;
            }

            let mut cand_dist = vec![0.0_f32; n_cand];
            pairwise_l2(self.d, query, 1, &cand_vecs, n_cand, &mut cand_dist);

            let mut local_idx = vec![0_i64; k];
            let mut local_dist = vec![0.0_f32; k];
            find_top_k(k, 1, n_cand, &cand_dist, &mut local_idx, &mut local_dist);

            for j in 0..k {
                if local_idx[j] < 0 {
                    out_dist[i * k + j] = -1.0;
                    out_idx[i * k + j] = -1;
                } else {
                    out_dist[i * k + j] = local_dist[j];
                    out_idx[i * k + j] = cand_ids[local_idx[j] as usize];
                }
            }
        }

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

    fn synthetic(n: usize, d: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        use rand::Rng;
        (0..n * d).map(|_| rng.gen_range(-1.0_f32..1.0)).collect()
    }

    #[test]
    fn untrained_add_leaves_ntotal_zero() {
        let mut idx = Ivf::new(4, 4);
        idx.add(&[0.0; 16], 4).unwrap();
        assert_eq!(idx.len(), 0);
        assert!(!idx.is_trained());
    }

    #[test]
    fn training_below_nlist_is_a_noop() {
        let mut idx = Ivf::new(4, 10);
        let x = synthetic(5, 4, 1);
        idx.train(&x, 5).unwrap();
        assert!(!idx.is_trained());
    }

    #[test]
    fn full_probe_matches_flat_exactly() {
        let d = 4;
        let nlist = 4;
        let x = synthetic(100, d, 42);

        let mut ivf = Ivf::with_seed(d, nlist, 42);
        ivf.train(&x, 100).unwrap();
        ivf.set_nprobe(nlist);
        ivf.add(&x, 100).unwrap();

        let mut flat = Flat::new(d);
        flat.add(&x, 100).unwrap();

        let q = synthetic(5, d, 7);
        let k = 10;
        let ivf_res = ivf.search(&q, 5, k).unwrap();
        let flat_res = flat.search(&q, 5, k).unwrap();

        assert_eq!(ivf_res.ids, flat_res.ids);
        for (a, b) in ivf_res.distances.iter().zip(flat_res.distances.iter()) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn training_is_idempotent_for_a_fixed_seed() {
        let d = 4;
        let nlist = 4;
        let x = synthetic(100, d, 42);

        let mut a = Ivf::with_seed(d, nlist, 99);
        a.train(&x, 100).unwrap();
        let mut b = Ivf::with_seed(d, nlist, 99);
        b.train(&x, 100).unwrap();

        assert_eq!(a.quantizer.data(), b.quantizer.data());
    }

    #[test]
    fn search_before_train_returns_sentinels() {
        let idx = Ivf::new(4, 4);
        let res = idx.search(&[0.0; 4], 1, 3).unwrap();
        assert!(res.ids.iter().all(|&i| i == -1));
    }
}
