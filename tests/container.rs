//! Exercises the allocators through a growable container, the way a
//! sequence container drives allocate/deallocate during push-back
//! growth: allocate a larger run, move the elements over, return the
//! old run with the exact count it was allocated with.

use std::ptr::NonNull;

use block_pool::{BlockPool, ChainedArena, FixedArena, RawAllocator, SystemAlloc};

struct RawVec<T, A: RawAllocator<T>> {
    alloc: A,
    ptr: NonNull<T>,
    cap: usize,
    len: usize,
}

impl<T, A: RawAllocator<T>> RawVec<T, A> {
    fn new(alloc: A) -> RawVec<T, A> {
        RawVec {
            alloc,
            ptr: NonNull::dangling(),
            cap: 0,
            len: 0,
        }
    }

    fn push(&mut self, value: T) {
        if self.len == self.cap {
            self.grow();
        }
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    fn grow(&mut self) {
        let new_cap = (self.cap * 2).max(1);
        let new_ptr = self.alloc.allocate(new_cap).unwrap();

        if self.cap > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
                self.alloc.deallocate(self.ptr, self.cap);
            }
        }

        self.ptr = new_ptr;
        self.cap = new_cap;
    }

    fn get(&self, index: usize) -> &T {
        assert!(index < self.len);
        unsafe { &*self.ptr.as_ptr().add(index) }
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl<T, A: RawAllocator<T>> Drop for RawVec<T, A> {
    fn drop(&mut self) {
        unsafe {
            for i in 0..self.len {
                std::ptr::drop_in_place(self.ptr.as_ptr().add(i));
            }
            if self.cap > 0 {
                self.alloc.deallocate(self.ptr, self.cap);
            }
        }
    }
}

fn round_trip_100<A: RawAllocator<String>>(alloc: A) {
    let mut vec = RawVec::new(alloc);

    for i in 0..100 {
        vec.push(format!("value-{}", i));
    }

    assert_eq!(vec.len(), 100);
    for i in 0..100 {
        assert_eq!(vec.get(i), &format!("value-{}", i));
    }
}

#[test]
fn pool_container_round_trip() {
    round_trip_100(BlockPool::new());
}

#[test]
fn fixed_arena_container_round_trip() {
    // Growth from 1 to 128 touches 255 elements in total.
    round_trip_100(FixedArena::with_capacity(256));
}

#[test]
fn chained_arena_container_round_trip() {
    round_trip_100(ChainedArena::with_config(2, 64));
}

#[test]
fn system_alloc_container_round_trip() {
    round_trip_100(SystemAlloc::new());
}

#[test]
fn pool_recycles_container_growth_blocks() {
    let pool = BlockPool::<String>::new();

    round_trip_100(&pool);

    // Growth to 100 elements went through capacities 1..=128, one block
    // per class; all of them are idle again once the container is gone.
    assert_eq!(pool.idle_blocks(), 8);
    for class in 0..8 {
        assert_eq!(pool.idle_in_class(class), 1);
    }

    // A second container of the same shape is served entirely from the
    // free lists: no new blocks appear.
    round_trip_100(&pool);
    assert_eq!(pool.idle_blocks(), 8);
}
