use thiserror::Error;

/// Failures of the allocate path.
///
/// `deallocate` never fails: a mismatched size there is a caller contract
/// violation, not a reportable error (see the crate docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The requested element count maps beyond the largest size class.
    #[error("requested count {requested} exceeds the largest size class")]
    CapacityExceeded { requested: usize },

    /// The underlying system allocator could not provide a new block.
    #[error("system allocator failed to provide {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// A fixed-capacity arena ran out of space.
    #[error("arena exhausted: requested {requested} elements, {remaining} remaining")]
    ArenaExhausted { requested: usize, remaining: usize },
}
