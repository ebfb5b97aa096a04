use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

#[cfg(debug_assertions)]
use std::collections::HashMap;

use crate::alloc::RawAllocator;
use crate::block;
use crate::error::AllocError;
use crate::size_class::{capacity_of, class_of, CLASS_COUNT};

/// One LIFO stack of idle blocks per size class.
///
/// The stacks hold plain pointers instead of threading an intrusive list
/// through the blocks themselves: caller-visible memory stays free of
/// in-band metadata and reuse order is trivial to observe.
struct ClassTable<T> {
    idle: [Vec<NonNull<T>>; CLASS_COUNT],
    #[cfg(debug_assertions)]
    ledger: HashMap<usize, usize>,
}

impl<T> ClassTable<T> {
    fn new() -> ClassTable<T> {
        ClassTable {
            idle: [(); CLASS_COUNT].map(|_| Vec::new()),
            #[cfg(debug_assertions)]
            ledger: HashMap::new(),
        }
    }

    // Debug-build side table recording the class of every checked-out
    // block. The release path carries none of this: the caller-supplied
    // count on deallocate is trusted, as the contract says.

    #[cfg(debug_assertions)]
    fn note_checked_out(&mut self, ptr: NonNull<T>, class: usize) {
        if std::mem::size_of::<T>() != 0 {
            self.ledger.insert(ptr.as_ptr() as usize, class);
        }
    }

    #[cfg(not(debug_assertions))]
    fn note_checked_out(&mut self, _ptr: NonNull<T>, _class: usize) {}

    #[cfg(debug_assertions)]
    fn note_returned(&mut self, ptr: NonNull<T>, class: usize) {
        if std::mem::size_of::<T>() == 0 {
            return;
        }
        match self.ledger.remove(&(ptr.as_ptr() as usize)) {
            Some(expected) => debug_assert!(
                expected == class,
                "deallocate: block was allocated in class {} but returned to class {}",
                expected,
                class
            ),
            None => debug_assert!(
                false,
                "deallocate: pointer {:p} is not checked out from this pool",
                ptr.as_ptr()
            ),
        }
    }

    #[cfg(not(debug_assertions))]
    fn note_returned(&mut self, _ptr: NonNull<T>, _class: usize) {}
}

impl<T> Drop for ClassTable<T> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            if !self.ledger.is_empty() {
                log::warn!(
                    "pool teardown with {} block(s) still checked out",
                    self.ledger.len()
                );
            }
        }

        for (class, stack) in self.idle.iter_mut().enumerate() {
            for ptr in stack.drain(..) {
                block::release(ptr, class);
            }
        }
    }
}

/// A segregated size-class block pool.
///
/// Every request is classified by its power-of-two size class (rounding
/// up, so `allocate(9)` is serviced by a 16-element block) and each class
/// recycles its blocks through its own LIFO free stack. A miss on a class
/// creates exactly one new block from the system allocator; freed blocks
/// are never coalesced, split, or returned to the system before the pool
/// itself is dropped.
///
/// The pool is single-threaded by construction (`!Send + !Sync`). Its
/// free-list table sits behind one level of heap indirection, so moving
/// the pool object never invalidates blocks already handed out.
///
/// ## Example
///
/// ```
/// use block_pool::BlockPool;
///
/// let pool = BlockPool::<u64>::new();
///
/// let ptr = pool.allocate(9).unwrap();
/// unsafe { pool.deallocate(ptr, 9) };
///
/// // The most recently freed block of a class is reused first.
/// let again = pool.allocate(9).unwrap();
/// assert_eq!(again, ptr);
/// # unsafe { pool.deallocate(again, 9) };
/// ```
pub struct BlockPool<T> {
    table: Rc<RefCell<ClassTable<T>>>,
}

impl<T> BlockPool<T> {
    /// Constructs a pool with every size class empty.
    ///
    /// Nothing is allocated until the first miss.
    pub fn new() -> BlockPool<T> {
        BlockPool {
            table: Rc::new(RefCell::new(ClassTable::new())),
        }
    }

    /// Allocates storage for at least `n` contiguous elements of `T`.
    ///
    /// The returned block holds exactly `capacity_of(class_of(n))`
    /// elements and is uninitialized. `n` must be positive; counts above
    /// [`MAX_REQUEST`] fail with [`AllocError::CapacityExceeded`], and a
    /// failed block creation surfaces as [`AllocError::OutOfMemory`]
    /// leaving the pool untouched.
    ///
    /// [`MAX_REQUEST`]: crate::MAX_REQUEST
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        let class = class_of(n)?;
        let mut table = self.table.borrow_mut();

        let ptr = match table.idle[class].pop() {
            Some(ptr) => ptr,
            // Miss: one new block, straight into service. Never a batch.
            None => block::create(class)?,
        };

        table.note_checked_out(ptr, class);
        Ok(ptr)
    }

    /// Returns a block to its class, making it the next one handed out
    /// for that class.
    ///
    /// Never touches the system allocator and never fails.
    ///
    /// ## Safety
    ///
    /// `ptr` must have been returned by [`allocate`] on this pool with
    /// this exact `n`, and must not be used afterwards. The block carries
    /// no header recording its class, so none of this can be checked here
    /// (debug builds keep a side table and assert on mismatches).
    ///
    /// [`allocate`]: BlockPool::allocate
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let class = match class_of(n) {
            Ok(class) => class,
            Err(_) => {
                // allocate() accepted this same n once; anything else is
                // a contract violation. Leak the block rather than file
                // it under a wrong class.
                debug_assert!(false, "deallocate with a count no allocate accepted: {}", n);
                return;
            }
        };

        let mut table = self.table.borrow_mut();
        table.note_returned(ptr, class);
        table.idle[class].push(ptr);
    }

    /// Number of idle blocks across all classes.
    pub fn idle_blocks(&self) -> usize {
        self.table.borrow().idle.iter().map(Vec::len).sum()
    }

    /// Number of idle blocks in one class.
    pub fn idle_in_class(&self, class: usize) -> usize {
        self.table.borrow().idle[class].len()
    }

    /// Bytes held idle by the pool, summed over all classes.
    pub fn idle_bytes(&self) -> usize {
        self.table
            .borrow()
            .idle
            .iter()
            .enumerate()
            .map(|(class, stack)| stack.len() * capacity_of(class) * std::mem::size_of::<T>())
            .sum()
    }
}

impl<T> RawAllocator<T> for BlockPool<T> {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        BlockPool::allocate(self, n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        BlockPool::deallocate(self, ptr, n)
    }
}

/// Cloning a pool produces a new, independent, initially empty pool.
///
/// Container copy construction only needs "an equivalent allocator", not
/// the same arena, so the idle blocks are deliberately not cloned and two
/// clones never share memory.
impl<T> Clone for BlockPool<T> {
    fn clone(&self) -> BlockPool<T> {
        BlockPool::new()
    }
}

impl<T> Default for BlockPool<T> {
    fn default() -> BlockPool<T> {
        BlockPool::new()
    }
}

/// Identity, not structural equality: two pools are equal only when they
/// share the same underlying free-list table. A clone therefore never
/// compares equal to its source.
impl<T> PartialEq for BlockPool<T> {
    fn eq(&self, other: &BlockPool<T>) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
    }
}

impl<T> Eq for BlockPool<T> {}

impl<T> std::fmt::Debug for BlockPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        struct Class {
            class: usize,
            capacity: usize,
            idle: usize,
        }

        impl std::fmt::Debug for Class {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(
                    f,
                    "Class {{ class: {} capacity: {} idle: {} }}",
                    self.class, self.capacity, self.idle
                )
            }
        }

        let table = self.table.borrow();

        let classes: Vec<Class> = table
            .idle
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(class, stack)| Class {
                class,
                capacity: capacity_of(class),
                idle: stack.len(),
            })
            .collect();

        f.debug_struct("BlockPool")
            .field("idle_blocks", &classes.iter().map(|c| c.idle).sum::<usize>())
            .field("classes", &classes)
            .finish()
    }
}
