//! Error types for `annidx`.
//!
//! Mirrors the small error taxonomy a vector-search binding layer needs
//! at its boundary: shape/dimension checks, and the IVF-specific
//! not-trained condition.

use thiserror::Error;

/// Result type alias for `annidx` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `annidx` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Caller supplied `x` with a column count that does not match the index's dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was constructed with.
        expected: usize,
        /// Column count actually observed.
        actual: usize,
    },

    /// Caller's input was not a well-formed 2D matrix.
    ///
    /// This crate's own API takes an already-flattened `&[f32]` plus an
    /// explicit row count, so a Rust call site can't produce a
    /// non-2D shape the way a foreign-language binding over a numpy
    /// array can. The variant is kept so a binding layer built on top
    /// of this crate (out of scope here) has somewhere to report that
    /// failure using the same error type.
    #[error("shape error: {0}")]
    Shape(String),

    /// `Ivf::search` was called before a successful `train`.
    ///
    /// Per spec this is not fatal: `search` still returns a full result
    /// of sentinel `(-1.0, -1)` entries rather than erroring. This variant
    /// exists for callers that want to distinguish "not trained" from
    /// "trained but nothing matched".
    #[error("IVF index has not been trained")]
    NotTrained,
}
