use static_assertions::const_assert;

use crate::error::AllocError;

/// Number of size classes, one per power of two representable in `usize`.
///
/// Class `i` holds blocks of exactly `1 << i` elements, so the classes
/// cover every request from 1 up to `1 << (CLASS_COUNT - 1)` elements.
pub const CLASS_COUNT: usize = usize::BITS as usize;

/// Largest element count any class can hold.
pub const MAX_REQUEST: usize = 1 << (CLASS_COUNT - 1);

const_assert!(CLASS_COUNT == std::mem::size_of::<usize>() * 8);

/// Maps a requested element count to its size class.
///
/// The mapping rounds *up*: the class returned is the smallest one whose
/// capacity is >= `n`, so `class_of(8) == 3` and `class_of(9) == 4`. A
/// request is never satisfied by a block smaller than itself.
///
/// `n == 0` has no class and is a caller error. Counts above
/// [`MAX_REQUEST`] fail with [`AllocError::CapacityExceeded`].
pub fn class_of(n: usize) -> Result<usize, AllocError> {
    debug_assert!(n > 0, "a request for zero elements has no size class");

    if n <= 1 {
        return Ok(0);
    }

    // ceil(log2(n)) for n > 1
    let class = CLASS_COUNT - (n - 1).leading_zeros() as usize;

    if class >= CLASS_COUNT {
        return Err(AllocError::CapacityExceeded { requested: n });
    }

    Ok(class)
}

/// Capacity, in elements, of the blocks in class `class`.
pub fn capacity_of(class: usize) -> usize {
    debug_assert!(class < CLASS_COUNT, "no such size class: {}", class);
    1 << class
}
