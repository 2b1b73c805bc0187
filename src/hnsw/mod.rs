//! Hierarchical navigable small-world (HNSW) graph index.
//!
//! A layered proximity graph: every node lives at layer 0, and a
//! geometrically-decaying fraction also lives at higher layers. Search
//! descends greedily through the upper layers to find a good entry
//! point, then runs an ef-bounded best-first beam search on layer 0.
//! Insertion runs the same beam search at `efConstruction` at every
//! layer the new node touches, wiring bidirectional edges and pruning
//! any neighbor whose degree grows past its cap.

mod node;
mod ordered_float;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

use crate::distance::l2_sq;
use crate::error::Result;
use crate::index::{check_shape, sentinel_result, Index, SearchResult};
use node::{NodeId, NodeRecord};
use ordered_float::OrderedFloat;

/// Default target degree per node per layer.
pub const DEFAULT_M: usize = 16;
/// Default build-time beam width.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;
/// Default query-time beam width.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Hierarchical navigable small-world graph index.
///
/// Owns its own vector store (unlike `Ivf`, which composes a `Flat`):
/// the graph structure is wired directly against node ids into that
/// store, so there is no separate quantizer to own.
pub struct Hnsw {
    d: usize,
    m: usize,
    m_max0: usize,
    ef_construction: usize,
    ef_search: usize,
    level_mult: f64,
    data: Vec<f32>,
    nodes: Vec<NodeRecord>,
    enter_point: Option<NodeId>,
    max_level: Option<usize>,
    rng: StdRng,
}

impl std::fmt::Debug for Hnsw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hnsw")
            .field("d", &self.d)
            .field("m", &self.m)
            .field("ef_construction", &self.ef_construction)
            .field("ef_search", &self.ef_search)
            .field("ntotal", &self.nodes.len())
            .field("enter_point", &self.enter_point)
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl Hnsw {
    /// Creates an empty HNSW index with default `M`/`efConstruction`/`efSearch`.
    #[must_use]
    pub fn new(d: usize) -> Self {
        Self::with_params(d, DEFAULT_M, DEFAULT_EF_CONSTRUCTION)
    }

    /// Creates an empty HNSW index with explicit `M` and `efConstruction`.
    /// `efSearch` starts at [`DEFAULT_EF_SEARCH`]; use [`Hnsw::set_ef`] to change it.
    #[must_use]
    pub fn with_params(d: usize, m: usize, ef_construction: usize) -> Self {
        Self::with_rng(d, m, ef_construction, StdRng::from_entropy())
    }

    /// Like [`Hnsw::with_params`], but seeded for reproducible layer
    /// assignment and graph structure across repeated builds of the
    /// same input (spec §9's RNG note).
    #[must_use]
    pub fn with_seed(d: usize, m: usize, ef_construction: usize, seed: u64) -> Self {
        Self::with_rng(d, m, ef_construction, StdRng::seed_from_u64(seed))
    }

    fn with_rng(d: usize, m: usize, ef_construction: usize, rng: StdRng) -> Self {
        Self {
            d,
            m,
            m_max0: m * 2,
            ef_construction,
            ef_search: DEFAULT_EF_SEARCH,
            level_mult: 1.0 / (m as f64).ln(),
            data: Vec::new(),
            nodes: Vec::new(),
            enter_point: None,
            max_level: None,
            rng,
        }
    }

    /// Sets the query-time beam width (`efSearch`).
    pub fn set_ef(&mut self, ef_search: usize) {
        self.ef_search = ef_search;
    }

    /// Running vector count.
    #[must_use]
    pub fn ntotal(&self) -> usize {
        self.nodes.len()
    }

    /// The node currently designated as the top-level entry point, if any.
    #[must_use]
    pub fn enter_point(&self) -> Option<usize> {
        self.enter_point
    }

    /// The highest layer any node occupies, if the index is non-empty.
    #[must_use]
    pub fn max_level(&self) -> Option<usize> {
        self.max_level
    }

    fn vector(&self, id: NodeId) -> &[f32] {
        &self.data[id * self.d..(id + 1) * self.d]
    }

    /// Draws this node's top layer: `floor(-ln(u) * level_mult)` for `u ~ Uniform(0,1]`.
    ///
    /// `rng.gen::<f64>()` samples `[0, 1)`; `1.0 - u` flips that to `(0, 1]`
    /// so `ln(u)` never sees zero.
    fn random_level(&mut self) -> usize {
        let u: f64 = 1.0 - self.rng.gen::<f64>();
        (-u.ln() * self.level_mult).floor() as usize
    }

    /// Greedy descent: from `start`, for each layer from `from_layer` down
    /// to `to_layer_exclusive + 1`, repeatedly hops to a strictly closer
    /// neighbor until none improves. Returns the terminal node and its
    /// distance to `q`.
    fn greedy(&self, q: &[f32], start: NodeId, from_layer: usize, to_layer_exclusive: usize) -> (NodeId, f32) {
        let mut cur = start;
        let mut cur_dist = l2_sq(q, self.vector(cur));

        let mut layer = from_layer;
        while layer > to_layer_exclusive {
            loop {
                let mut improved = false;
                for &nb in self.nodes[cur].neighbors(layer) {
                    let d = l2_sq(q, self.vector(nb));
                    if d < cur_dist {
                        cur_dist = d;
                        cur = nb;
                        improved = true;
                    }
                }
                if !improved {
                    break;
                }
            }
            layer -= 1;
        }

        (cur, cur_dist)
    }

    /// Best-first beam search on a single layer, seeded at `entry`.
    ///
    /// Maintains a min-heap frontier `candidates` and a max-heap result
    /// set `results` bounded to `ef` entries, expanding the closest
    /// unvisited frontier candidate until it can no longer improve the
    /// worst kept result. Returns an unordered `(distance, id)` set;
    /// callers sort as needed.
    fn search_layer(&self, q: &[f32], entry: NodeId, ef: usize, layer: usize) -> Vec<(f32, NodeId)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        visited.insert(entry);

        let entry_dist = l2_sq(q, self.vector(entry));
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();
        candidates.push(Reverse((OrderedFloat(entry_dist), entry)));
        results.push((OrderedFloat(entry_dist), entry));

        while let Some(Reverse((OrderedFloat(c_dist), c))) = candidates.pop() {
            let worst = results.peek().map_or(f32::MAX, |&(d, _)| d.0);
            if c_dist > worst && results.len() == ef {
                break;
            }

            for &nb in self.nodes[c].neighbors(layer) {
                if visited.insert(nb) {
                    let d_v = l2_sq(q, self.vector(nb));
                    let worst = results.peek().map_or(f32::MAX, |&(d, _)| d.0);

                    if results.len() < ef || d_v < worst {
                        candidates.push(Reverse((OrderedFloat(d_v), nb)));
                        results.push((OrderedFloat(d_v), nb));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        results.into_iter().map(|(d, id)| (d.0, id)).collect()
    }

    /// Sorts a beam-search result set ascending by `(distance, id)`,
    /// the stable tie-break spec §4.5 requires for reproducible tests.
    fn sort_by_distance(w: &mut [(f32, NodeId)]) {
        w.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    }

    /// Inserts one `d`-dimensional vector, assigning it the next node id.
    fn insert_one(&mut self, v: &[f32]) {
        let id = self.nodes.len();
        self.data.extend_from_slice(v);

        let level = self.random_level();
        self.nodes.push(NodeRecord::new(level));

        let Some(enter_point) = self.enter_point else {
            self.enter_point = Some(id);
            self.max_level = Some(level);
            return;
        };
        let max_level = self.max_level.expect("enter_point implies max_level is set");

        let (mut cur, _) = self.greedy(v, enter_point, max_level, level);

        for l in (0..=level.min(max_level)).rev() {
            let mut w = self.search_layer(v, cur, self.ef_construction, l);
            Self::sort_by_distance(&mut w);
            debug_assert!(
                !w.is_empty(),
                "search_layer always seeds its result with the entry point"
            );

            let cap = if l == 0 { self.m_max0 } else { self.m };
            let connect_count = w.len().min(cap);

            for &(_, nb) in &w[..connect_count] {
                self.nodes[id].push_neighbor(l, nb);
                self.nodes[nb].push_neighbor(l, id);
            }
            for &(_, nb) in &w[..connect_count] {
                if self.nodes[nb].neighbors(l).len() > cap {
                    self.shrink(nb, l, cap);
                }
            }

            cur = w[0].1;
        }

        if level > max_level {
            self.max_level = Some(level);
            self.enter_point = Some(id);
        }
    }

    /// Shrinks `node`'s neighbor list at `layer` to its `cap` closest
    /// members by exact L2, recomputed from stored vectors. One-sided:
    /// the evicted neighbor's own list is left untouched, so symmetry
    /// can break after this point (spec §4.5, accepted).
    fn shrink(&mut self, node: NodeId, layer: usize, cap: usize) {
        let anchor = self.vector(node).to_vec();
        let mut scored: Vec<(f32, NodeId)> = self.nodes[node]
            .neighbors(layer)
            .iter()
            .map(|&nb| (l2_sq(&anchor, self.vector(nb)), nb))
            .collect();
        Self::sort_by_distance(&mut scored);
        scored.truncate(cap);
        self.nodes[node].set_neighbors(layer, scored.into_iter().map(|(_, nb)| nb).collect());
    }
}

impl Index for Hnsw {
    fn dim(&self) -> usize {
        self.d
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn train(&mut self, _x: &[f32], _n: usize) -> Result<()> {
        Ok(())
    }

    fn add(&mut self, x: &[f32], n: usize) -> Result<()> {
        check_shape(self.d, n, x)?;
        for i in 0..n {
            self.insert_one(&x[i * self.d..(i + 1) * self.d]);
        }
        tracing::debug!(added = n, ntotal = self.nodes.len(), "hnsw: inserted vectors");
        Ok(())
    }

    fn search(&self, x: &[f32], n: usize, k: usize) -> Result<SearchResult> {
        check_shape(self.d, n, x)?;

        if self.nodes.is_empty() {
            return Ok(sentinel_result(n, k));
        }

        let enter_point = self.enter_point.expect("non-empty index has an entry point");
        let max_level = self.max_level.expect("non-empty index has a max level");

        let mut out_dist = vec![-1.0_f32; n * k];
        let mut out_idx = vec![-1_i64; n * k];

        for i in 0..n {
            let q = &x[i * self.d..(i + 1) * self.d];
            let (cur, _) = self.greedy(q, enter_point, max_level, 0);
            let mut w = self.search_layer(q, cur, self.ef_search, 0);
            Self::sort_by_distance(&mut w);

            let filled = w.len().min(k);
            for j in 0..filled {
                out_dist[i * k + j] = w[j].0;
                out_idx[i * k + j] = w[j].1 as i64;
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
        use rand::Rng as _;
        (0..n * d).map(|_| rng.gen_range(-1.0_f32..1.0)).collect()
    }

    #[test]
    fn empty_index_returns_sentinels() {
        let idx = Hnsw::new(4);
        let res = idx.search(&[0.0; 4], 1, 3).unwrap();
        assert!(res.ids.iter().all(|&id| id == -1));
        assert!(res.distances.iter().all(|&d| d == -1.0));
    }

    #[test]
    fn entry_point_is_valid_after_every_insert() {
        let mut idx = Hnsw::with_seed(4, 16, 50, 7);
        let x = synthetic(200, 4, 7);
        for i in 0..200 {
            idx.add(&x[i * 4..(i + 1) * 4], 1).unwrap();
            let ep = idx.enter_point().expect("non-empty after insert");
            assert!(ep < idx.ntotal());
            assert_eq!(idx.nodes[ep].top_layer(), idx.max_level().unwrap());
        }
    }

    #[test]
    fn inserted_edges_never_reference_a_nonexistent_id() {
        let mut idx = Hnsw::with_seed(4, 16, 50, 11);
        let x = synthetic(300, 4, 11);
        idx.add(&x, 300).unwrap();

        for node in &idx.nodes {
            for layer in 0..=node.top_layer() {
                for &nb in node.neighbors(layer) {
                    assert!(nb < idx.nodes.len());
                }
            }
        }
    }

    #[test]
    fn sanity_search_returns_valid_ids_and_matches_flat_top1_mostly() {
        let d = 8;
        let mut hnsw = Hnsw::with_seed(d, 16, 200, 42);
        let x = synthetic(1000, d, 42);
        hnsw.add(&x, 1000).unwrap();
        hnsw.set_ef(64);

        let mut flat = crate::flat::Flat::new(d);
        flat.add(&x, 1000).unwrap();

        let queries = synthetic(100, d, 99);
        let mut matches = 0;
        for i in 0..100 {
            let q = &queries[i * d..(i + 1) * d];
            let hres = hnsw.search(q, 1, 10).unwrap();
            for j in 0..10 {
                let (_, id) = hres.get(0, j);
                assert!(id >= 0 && (id as usize) < 1000);
            }
            let fres = flat.search(q, 1, 1).unwrap();
            if hres.get(0, 0).1 == fres.get(0, 0).1 {
                matches += 1;
            }
        }
        assert!(matches >= 95, "top-1 agreement with flat was only {matches}/100");
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut idx = Hnsw::new(3);
        let err = idx.add(&[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, crate::error::Error::DimensionMismatch { .. }));
    }
}
