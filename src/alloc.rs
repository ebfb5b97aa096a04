use std::alloc::{alloc, dealloc, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::AllocError;

/// The allocate/deallocate contract shared by every strategy in this
/// crate, the shape containers consume.
///
/// `allocate(n)` hands out raw, uninitialized storage for at least `n`
/// contiguous elements; `deallocate` takes it back. Nothing is
/// constructed or dropped by either side, that is the container's job.
pub trait RawAllocator<T> {
    /// Allocates storage for at least `n` contiguous elements of `T`.
    ///
    /// `n` must be positive.
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError>;

    /// Returns storage previously obtained from [`allocate`].
    ///
    /// ## Safety
    ///
    /// `ptr` must come from a call to `allocate` on this same instance,
    /// `n` must be the exact count passed to that call, and the storage
    /// must not be used afterwards. None of this is verifiable here:
    /// the block carries no header, the caller is the only source of
    /// truth for its size.
    ///
    /// [`allocate`]: RawAllocator::allocate
    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize);
}

// Containers usually borrow their allocator rather than own it.
impl<'a, T, A: RawAllocator<T>> RawAllocator<T> for &'a A {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        (**self).allocate(n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        (**self).deallocate(ptr, n)
    }
}

/// Passthrough to the system allocator.
///
/// Stateless baseline for benches and tests: every call goes straight
/// to `std::alloc`, nothing is recycled.
pub struct SystemAlloc<T> {
    _marker: PhantomData<T>,
}

impl<T> SystemAlloc<T> {
    pub fn new() -> SystemAlloc<T> {
        SystemAlloc { _marker: PhantomData }
    }
}

impl<T> Default for SystemAlloc<T> {
    fn default() -> SystemAlloc<T> {
        SystemAlloc::new()
    }
}

impl<T> Clone for SystemAlloc<T> {
    fn clone(&self) -> SystemAlloc<T> {
        SystemAlloc::new()
    }
}

// All instances are interchangeable, there is no underlying storage to
// compare.
impl<T> PartialEq for SystemAlloc<T> {
    fn eq(&self, _: &SystemAlloc<T>) -> bool {
        true
    }
}

impl<T> Eq for SystemAlloc<T> {}

impl<T> std::fmt::Debug for SystemAlloc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("SystemAlloc")
    }
}

impl<T> RawAllocator<T> for SystemAlloc<T> {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        debug_assert!(n > 0, "a request for zero elements is undefined");

        let layout = Layout::array::<T>(n)
            .map_err(|_| AllocError::CapacityExceeded { requested: n })?;

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        let ptr = unsafe { alloc(layout) as *mut T };

        NonNull::new(ptr).ok_or(AllocError::OutOfMemory { bytes: layout.size() })
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let layout = match Layout::array::<T>(n) {
            Ok(layout) => layout,
            // allocate() accepted the same n.
            Err(_) => unreachable!(),
        };

        if layout.size() == 0 {
            return;
        }

        dealloc(ptr.as_ptr() as *mut u8, layout);
    }
}
