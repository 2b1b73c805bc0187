//! `annidx`: an in-memory vector similarity search core.
//!
//! Indexes fixed-dimension `f32` vectors and answers k-nearest-neighbor
//! queries under squared Euclidean (L2) distance, via three
//! interchangeable strategies exposed behind the [`Index`] trait and
//! the [`VectorIndex`] facade:
//!
//! - [`Flat`]: exhaustive brute-force scan. Exact, no training.
//! - [`Ivf`]: k-means coarse quantization plus probed inverted lists.
//!   Approximate, trained, tunable via `nprobe`.
//! - [`Hnsw`]: a layered navigable small-world graph. Approximate,
//!   untrained, tunable via `efSearch`.
//!
//! No persistence, no per-vector deletion, no metric other than L2,
//! no concurrent write path, no automatic eviction — see `SPEC_FULL.md`
//! for the full contract this crate implements.

pub mod distance;
pub mod error;
pub mod flat;
pub mod hnsw;
pub mod index;
pub mod ivf;
pub mod topk;

pub use distance::is_accelerator_enabled;
pub use error::{Error, Result};
pub use flat::Flat;
pub use hnsw::Hnsw;
pub use index::{Index, SearchResult, VectorIndex};
pub use ivf::Ivf;
