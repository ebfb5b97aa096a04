//! Fast, single-threaded element allocators for container workloads.
//!
//! The core type is [`BlockPool`], a segregated size-class pool: every
//! request is mapped to a power-of-two size class, each class recycles
//! whole blocks through its own LIFO free list, and nothing goes back
//! to the system allocator before the pool is dropped. The simpler
//! siblings [`FixedArena`] and [`ChainedArena`] bump through reserved
//! storage without any recycling, and [`SystemAlloc`] is the
//! passthrough baseline. All four implement the same
//! [`RawAllocator`] contract.
//!
//! None of the types are shareable across threads; use one instance
//! per thread or serialize access externally.

mod alloc;
mod block;
mod chained_arena;
mod error;
mod fixed_arena;
mod pool;
mod size_class;

pub use {
    alloc::{RawAllocator, SystemAlloc},
    block::live_block_count,
    chained_arena::ChainedArena,
    error::AllocError,
    fixed_arena::{FixedArena, DEFAULT_ARENA_CAPACITY},
    pool::BlockPool,
    size_class::{capacity_of, class_of, CLASS_COUNT, MAX_REQUEST},
};
