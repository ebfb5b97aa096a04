use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use crate::alloc::RawAllocator;
use crate::block::{uninit_slots, Slot};
use crate::error::AllocError;
use crate::fixed_arena::DEFAULT_ARENA_CAPACITY;

/// A chained-growth bump arena.
///
/// Like [`FixedArena`] it only advances an offset and never reclaims,
/// but instead of failing when a block fills up it moves on to the next
/// pre-reserved block, or chains a new one onto the list. Requests
/// larger than the block size get a dedicated block rounded up to a
/// block-size multiple.
///
/// [`FixedArena`]: crate::FixedArena
pub struct ChainedArena<T> {
    blocks: RefCell<Vec<Box<[Slot<T>]>>>,
    current: Cell<usize>,
    offset: Cell<usize>,
    initial_blocks: usize,
    block_elems: usize,
}

impl<T> ChainedArena<T> {
    /// Two pre-reserved blocks of [`DEFAULT_ARENA_CAPACITY`] elements.
    ///
    /// [`DEFAULT_ARENA_CAPACITY`]: crate::DEFAULT_ARENA_CAPACITY
    pub fn new() -> ChainedArena<T> {
        ChainedArena::with_config(2, DEFAULT_ARENA_CAPACITY)
    }

    /// Constructs an arena of `initial_blocks` pre-reserved blocks of
    /// `block_elems` elements each.
    pub fn with_config(initial_blocks: usize, block_elems: usize) -> ChainedArena<T> {
        assert!(initial_blocks > 0, "an arena needs at least one block");
        assert!(block_elems > 0, "blocks cannot be empty");

        let blocks = (0..initial_blocks)
            .map(|_| uninit_slots(block_elems))
            .collect();

        ChainedArena {
            blocks: RefCell::new(blocks),
            current: Cell::new(0),
            offset: Cell::new(0),
            initial_blocks,
            block_elems,
        }
    }

    /// Number of blocks currently chained, pre-reserved ones included.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        debug_assert!(n > 0, "a request for zero elements is undefined");

        let mut blocks = self.blocks.borrow_mut();
        let mut current = self.current.get();
        let mut offset = self.offset.get();

        if offset + n > blocks[current].len() {
            if n <= self.block_elems && current + 1 < blocks.len() {
                // A pre-reserved block is still untouched, bump into it.
                current += 1;
            } else {
                // Chain a new block. Oversize requests get a dedicated
                // block rounded up to a multiple of the block size.
                let len = ((n + self.block_elems - 1) / self.block_elems) * self.block_elems;
                log::trace!("chaining block: elements={}", len);
                blocks.push(uninit_slots(len));
                current = blocks.len() - 1;
            }
            offset = 0;
        }

        let ptr = blocks[current].as_ptr() as *mut T;

        self.current.set(current);
        self.offset.set(offset + n);

        // In bounds: offset + n <= block len.
        Ok(unsafe { NonNull::new_unchecked(ptr.add(offset)) })
    }

    /// No-op: freed spans are not recycled, the arena only grows.
    ///
    /// ## Safety
    ///
    /// Same contract as [`RawAllocator::deallocate`].
    pub unsafe fn deallocate(&self, _ptr: NonNull<T>, _n: usize) {}
}

impl<T> RawAllocator<T> for ChainedArena<T> {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        ChainedArena::allocate(self, n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        ChainedArena::deallocate(self, ptr, n)
    }
}

/// Cloning produces a fresh arena with the same configuration, not a
/// copy of the source's blocks.
impl<T> Clone for ChainedArena<T> {
    fn clone(&self) -> ChainedArena<T> {
        ChainedArena::with_config(self.initial_blocks, self.block_elems)
    }
}

impl<T> Default for ChainedArena<T> {
    fn default() -> ChainedArena<T> {
        ChainedArena::new()
    }
}

impl<T> std::fmt::Debug for ChainedArena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ChainedArena")
            .field("blocks", &self.blocks.borrow().len())
            .field("block_elems", &self.block_elems)
            .field("current", &self.current.get())
            .field("offset", &self.offset.get())
            .finish()
    }
}
