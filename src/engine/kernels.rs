// Computation Kernels
// Direct in-place manipulation of vector sub-ranges
use std::fmt::Debug;
use std::ops::{Add, Mul};

/// Element types the multiplier can operate on.
pub trait Element:
    Copy + Send + Sync + Mul<Output = Self> + Add<Output = Self> + PartialEq + Debug
{
}

impl<T> Element for T where
    T: Copy + Send + Sync + Mul<Output = T> + Add<Output = T> + PartialEq + Debug
{
}

/// Worker body: `accumulator[i] = accumulator[i] * multiplier[i]` over one
/// partition, in increasing index order.
///
/// Both slices are the same partition of their vectors, so they always have
/// the same length.
#[inline]
pub fn multiply_slice<T: Element>(accumulator: &mut [T], multiplier: &[T]) {
    debug_assert_eq!(accumulator.len(), multiplier.len());

    // Friendly to auto-vectorization for primitive element types
    for (acc, &factor) in accumulator.iter_mut().zip(multiplier) {
        *acc = *acc * factor;
    }
}

/// Adds `value` to every element, sequentially.
pub fn add_scalar_in_place<T: Element>(vector: &mut [T], value: T) {
    for elem in vector.iter_mut() {
        *elem = *elem + value;
    }
}
