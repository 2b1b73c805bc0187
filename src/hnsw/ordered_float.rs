//! Total-ordering wrapper for `f32`, so distances can live in a `BinaryHeap`.

use std::cmp::Ordering;

/// Wraps an `f32` to give it `Ord` via [`f32::total_cmp`], so
/// `(distance, id)` pairs can be pushed into a `BinaryHeap` without the
/// heap panicking on the unordered `PartialOrd` of floats.
#[derive(Debug, Clone, Copy)]
pub(super) struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
