use std::cell::Cell;
use std::ptr::NonNull;

use crate::alloc::RawAllocator;
use crate::block::{uninit_slots, Slot};
use crate::error::AllocError;

/// Default arena capacity, in elements.
pub const DEFAULT_ARENA_CAPACITY: usize = 4096 * 1024;

/// A fixed-size linear bump arena.
///
/// The whole arena is reserved up front; `allocate` only advances an
/// offset through it and `deallocate` is a no-op. Nothing is ever
/// reclaimed before the arena itself is dropped, and once the offset
/// reaches the end every further allocation fails with
/// [`AllocError::ArenaExhausted`].
///
/// ## Example
///
/// ```
/// use block_pool::FixedArena;
///
/// let arena = FixedArena::<u32>::with_capacity(128);
/// let a = arena.allocate(100).unwrap();
/// assert!(arena.allocate(100).is_err());
/// # let _ = a;
/// ```
pub struct FixedArena<T> {
    slots: Box<[Slot<T>]>,
    used: Cell<usize>,
    #[cfg(debug_assertions)]
    outstanding: Cell<usize>,
}

impl<T> FixedArena<T> {
    /// Constructs an arena of [`DEFAULT_ARENA_CAPACITY`] elements.
    pub fn new() -> FixedArena<T> {
        FixedArena::with_capacity(DEFAULT_ARENA_CAPACITY)
    }

    /// Constructs an arena holding exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> FixedArena<T> {
        FixedArena {
            slots: uninit_slots(capacity),
            used: Cell::new(0),
            #[cfg(debug_assertions)]
            outstanding: Cell::new(0),
        }
    }

    /// Total capacity of the arena, in elements.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Elements handed out so far. Never decreases.
    pub fn used(&self) -> usize {
        self.used.get()
    }

    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        debug_assert!(n > 0, "a request for zero elements is undefined");

        let used = self.used.get();
        let remaining = self.slots.len() - used;

        if n > remaining {
            return Err(AllocError::ArenaExhausted { requested: n, remaining });
        }

        self.used.set(used + n);

        #[cfg(debug_assertions)]
        self.outstanding.set(self.outstanding.get() + n);

        let ptr = self.slots.as_ptr() as *mut T;
        // In bounds: used + n <= len.
        Ok(unsafe { NonNull::new_unchecked(ptr.add(used)) })
    }

    /// No-op: a bump arena reclaims nothing before teardown.
    ///
    /// ## Safety
    ///
    /// Same contract as [`RawAllocator::deallocate`], kept so the arena
    /// stays a drop-in for the recycling pool.
    pub unsafe fn deallocate(&self, _ptr: NonNull<T>, _n: usize) {
        #[cfg(debug_assertions)]
        self.outstanding.set(self.outstanding.get().saturating_sub(_n));
    }
}

impl<T> RawAllocator<T> for FixedArena<T> {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        FixedArena::allocate(self, n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        FixedArena::deallocate(self, ptr, n)
    }
}

/// Cloning produces a fresh, empty arena of the same capacity.
impl<T> Clone for FixedArena<T> {
    fn clone(&self) -> FixedArena<T> {
        FixedArena::with_capacity(self.slots.len())
    }
}

impl<T> Default for FixedArena<T> {
    fn default() -> FixedArena<T> {
        FixedArena::new()
    }
}

/// Identity: equal only when backed by the same storage.
impl<T> PartialEq for FixedArena<T> {
    fn eq(&self, other: &FixedArena<T>) -> bool {
        std::ptr::eq(self.slots.as_ptr(), other.slots.as_ptr())
    }
}

impl<T> std::fmt::Debug for FixedArena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FixedArena")
            .field("capacity", &self.slots.len())
            .field("used", &self.used.get())
            .finish()
    }
}

#[cfg(debug_assertions)]
impl<T> Drop for FixedArena<T> {
    fn drop(&mut self) {
        if self.outstanding.get() != 0 {
            log::warn!(
                "arena teardown with {} element(s) still checked out",
                self.outstanding.get()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FixedArena;
    use crate::error::AllocError;

    #[test]
    fn bumps_through_the_arena() {
        let arena = FixedArena::<u64>::with_capacity(16);

        let a = arena.allocate(4).unwrap();
        let b = arena.allocate(4).unwrap();

        assert_eq!(unsafe { a.as_ptr().add(4) }, b.as_ptr());
        assert_eq!(arena.used(), 8);

        unsafe {
            arena.deallocate(a, 4);
            arena.deallocate(b, 4);
        }
        // Deallocation reclaims nothing.
        assert_eq!(arena.used(), 8);
    }

    #[test]
    fn exhaustion_is_reported() {
        let arena = FixedArena::<u8>::with_capacity(8);

        let _a = arena.allocate(6).unwrap();
        assert_eq!(
            arena.allocate(3),
            Err(AllocError::ArenaExhausted { requested: 3, remaining: 2 })
        );

        // The failed request did not consume anything.
        let _b = arena.allocate(2).unwrap();
        assert_eq!(arena.used(), 8);
    }

    #[test]
    fn clones_are_fresh() {
        let arena = FixedArena::<u32>::with_capacity(8);
        let _ = arena.allocate(8).unwrap();

        let copy = arena.clone();
        assert_eq!(copy.capacity(), 8);
        assert_eq!(copy.used(), 0);
        assert!(arena != copy);

        let p = copy.allocate(8).unwrap();
        unsafe { copy.deallocate(p, 8) };
    }
}
