//! # Pool Allocator
//!
//! Growable, slot-stable storage for objects that are frequently created and
//! destroyed by index.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::{Index, IndexMut};

/// Default number of cells appended per growth step.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// A pool allocator with stable slot indices.
///
/// Storage is a list of fixed-size chunks. When every cell is taken the pool
/// appends a new chunk; chunks already handed out are never reallocated or
/// moved, so an index returned by [`allocate`](Self::allocate) keeps resolving
/// to the same cell until it is explicitly deallocated.
///
/// Freed indices are reused lowest-first.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. The factory wraps each pool in a lock.
///
/// # Example
///
/// ```rust
/// use kiln_core::memory::PoolAllocator;
///
/// let mut pool: PoolAllocator<&str> = PoolAllocator::new(4);
///
/// let a = pool.allocate("brick");
/// let b = pool.allocate("stone");
/// pool.deallocate(a);
///
/// // Lowest free index is reused
/// assert_eq!(pool.allocate("glass"), a);
/// assert_eq!(pool[b], "stone");
/// ```
pub struct PoolAllocator<T> {
    /// Fixed-size chunks of cells, appended on growth.
    chunks: Vec<Box<[Option<T>]>>,
    /// Free indices below `high_water`, smallest first.
    free_list: BinaryHeap<Reverse<usize>>,
    /// Number of cells that have ever been handed out.
    high_water: usize,
    /// Number of allocated objects.
    allocated_count: usize,
    /// Cells per chunk.
    chunk_size: usize,
}

impl<T> PoolAllocator<T> {
    /// Creates an empty pool that grows `chunk_size` cells at a time.
    ///
    /// No memory is reserved until the first allocation.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Chunk size must be greater than zero");

        Self {
            chunks: Vec::new(),
            free_list: BinaryHeap::new(),
            high_water: 0,
            allocated_count: 0,
            chunk_size,
        }
    }

    /// Creates a pool with `chunks` chunks pre-allocated.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn with_chunks(chunk_size: usize, chunks: usize) -> Self {
        let mut pool = Self::new(chunk_size);
        for _ in 0..chunks {
            pool.grow();
        }
        pool
    }

    /// Returns the number of cells per chunk.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the total number of cells across all chunks.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_size
    }

    /// Returns the number of chunks.
    #[inline]
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the number of currently allocated objects.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Returns the number of free cells, including never-used ones.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.allocated_count
    }

    /// Returns `true` if no object is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Allocates a cell and stores the object, returning its index.
    ///
    /// Reuses the lowest freed index if there is one, otherwise takes the
    /// next never-used cell, appending a chunk when the pool is full.
    /// Out-of-memory aborts the process.
    pub fn allocate(&mut self, value: T) -> usize {
        let index = match self.free_list.pop() {
            Some(Reverse(index)) => index,
            None => {
                if self.high_water == self.capacity() {
                    self.grow();
                }
                self.high_water += 1;
                self.high_water - 1
            }
        };

        let (chunk, offset) = self.locate(index);
        let cell = &mut self.chunks[chunk][offset];
        debug_assert!(cell.is_none(), "free list handed out a live cell {index}");
        *cell = Some(value);
        self.allocated_count += 1;

        index
    }

    /// Frees an allocated object, returning it.
    ///
    /// Freeing a free or out-of-range index is a caller error: it trips a
    /// debug assertion and returns `None` in release builds.
    pub fn deallocate(&mut self, index: usize) -> Option<T> {
        let value = self.cell_mut(index).and_then(Option::take);
        debug_assert!(value.is_some(), "deallocate of free cell {index}");

        if value.is_some() {
            self.free_list.push(Reverse(index));
            self.allocated_count -= 1;
        }
        value
    }

    /// Checks if `index` currently holds an object.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Gets a reference to an allocated object.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.high_water {
            return None;
        }
        let (chunk, offset) = self.locate(index);
        self.chunks[chunk][offset].as_ref()
    }

    /// Gets a mutable reference to an allocated object.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.cell_mut(index)?.as_mut()
    }

    /// Frees every object, keeping all chunks for reuse.
    pub fn clear(&mut self) {
        for chunk in &mut self.chunks {
            for cell in chunk.iter_mut() {
                *cell = None;
            }
        }
        self.free_list.clear();
        self.high_water = 0;
        self.allocated_count = 0;
    }

    /// Iterates over all allocated objects with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .take(self.high_water)
            .enumerate()
            .filter_map(|(index, cell)| cell.as_ref().map(|v| (index, v)))
    }

    /// Iterates mutably over all allocated objects with their indices.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        let high_water = self.high_water;
        self.chunks
            .iter_mut()
            .flat_map(|chunk| chunk.iter_mut())
            .take(high_water)
            .enumerate()
            .filter_map(|(index, cell)| cell.as_mut().map(|v| (index, v)))
    }

    /// Appends one chunk of empty cells.
    fn grow(&mut self) {
        let chunk: Box<[Option<T>]> = (0..self.chunk_size).map(|_| None).collect();
        self.chunks.push(chunk);
        tracing::debug!(
            chunks = self.chunks.len(),
            capacity = self.capacity(),
            "pool grew"
        );
    }

    #[inline]
    const fn locate(&self, index: usize) -> (usize, usize) {
        (index / self.chunk_size, index % self.chunk_size)
    }

    #[inline]
    fn cell_mut(&mut self, index: usize) -> Option<&mut Option<T>> {
        if index >= self.high_water {
            return None;
        }
        let (chunk, offset) = self.locate(index);
        Some(&mut self.chunks[chunk][offset])
    }
}

impl<T> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

/// Unchecked access. The caller must already know the cell is live.
impl<T> Index<usize> for PoolAllocator<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("pool index {index} is not allocated"),
        }
    }
}

impl<T> IndexMut<usize> for PoolAllocator<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("pool index {index} is not allocated"),
        }
    }
}
