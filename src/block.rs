use std::alloc::{alloc, dealloc, Layout};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

use crate::error::AllocError;
use crate::size_class::capacity_of;

/// One element's worth of uninitialized, interior-mutable storage.
pub(crate) type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Reserves `len` contiguous uninitialized slots. Backing storage for
/// the bump arenas; goes through the global allocator's infallible path.
pub(crate) fn uninit_slots<T>(len: usize) -> Box<[Slot<T>]> {
    let mut slots = Vec::with_capacity(len);
    // MaybeUninit slots need no initialization.
    unsafe { slots.set_len(len) };
    slots.into_boxed_slice()
}

// Number of blocks currently backed by the system allocator, across the
// whole process. Touched on block creation/release only, next to the
// system allocator call.
static LIVE_BLOCKS: AtomicUsize = AtomicUsize::new(0);

/// Number of raw blocks currently backed by the system allocator,
/// across every pool in the process.
///
/// Instrumentation for leak and teardown tests; not part of the
/// allocation contract.
pub fn live_block_count() -> usize {
    LIVE_BLOCKS.load(Relaxed)
}

fn layout_of<T>(class: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(capacity_of(class))
        .map_err(|_| AllocError::CapacityExceeded { requested: capacity_of(class) })
}

/// Allocates one raw, uninitialized block of `capacity_of(class)` elements.
///
/// All-or-nothing: on failure nothing was allocated and the error
/// propagates to the caller of `allocate`.
pub(crate) fn create<T>(class: usize) -> Result<NonNull<T>, AllocError> {
    let layout = layout_of::<T>(class)?;

    // Zero-sized element types never touch the system allocator.
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }

    log::trace!(
        "new block: class={} capacity={} bytes={}",
        class,
        capacity_of(class),
        layout.size()
    );

    let ptr = unsafe { alloc(layout) as *mut T };

    match NonNull::new(ptr) {
        Some(ptr) => {
            LIVE_BLOCKS.fetch_add(1, Relaxed);
            Ok(ptr)
        }
        None => Err(AllocError::OutOfMemory { bytes: layout.size() }),
    }
}

/// Returns a block created by [`create`] to the system allocator.
///
/// `class` must be the class the block was created with.
pub(crate) fn release<T>(ptr: NonNull<T>, class: usize) {
    let layout = match layout_of::<T>(class) {
        Ok(layout) => layout,
        // The same layout was already computed at creation.
        Err(_) => unreachable!(),
    };

    if layout.size() == 0 {
        return;
    }

    unsafe {
        dealloc(ptr.as_ptr() as *mut u8, layout);
    }
    LIVE_BLOCKS.fetch_sub(1, Relaxed);
}
