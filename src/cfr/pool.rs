//! Reusable scratch buffers for the recursive hot path.
//!
//! Traversals need a few `f32` arrays per decision node and one
//! key-to-action table per run. Pools hand these out as RAII guards that go
//! back to the free list when dropped, so every exit path returns what it
//! took and steady-state traversals do not allocate.
//!
//! - [`LocalPool`]: `RefCell` free lists, for single-threaded engines.
//! - [`SharedPool`]: the same free lists behind a `Mutex`, for engines shared
//!   by workers.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use rustc_hash::FxHashMap;

/// Scratch table from infoset key to action index.
pub type KeyIndexMap = FxHashMap<Box<[u8]>, usize>;

/// Source of recycled scratch buffers and tables.
pub trait Pool {
    /// Take a raw buffer from the free list (or allocate one).
    fn take_buffer(&self) -> Vec<f32>;

    /// Give a buffer back to the free list.
    fn give_buffer(&self, buffer: Vec<f32>);

    /// Take a raw table from the free list (or allocate one).
    fn take_map(&self) -> KeyIndexMap;

    /// Give a table back to the free list.
    fn give_map(&self, map: KeyIndexMap);

    /// Zeroed buffer of length `len`, returned to the pool when dropped.
    fn alloc(&self, len: usize) -> Scratch<'_, Self>
    where
        Self: Sized,
    {
        let mut buffer = self.take_buffer();
        buffer.clear();
        buffer.resize(len, 0.0);
        Scratch {
            pool: self,
            buffer,
        }
    }

    /// Empty table, cleared and returned to the pool when dropped.
    fn alloc_map(&self) -> ScratchMap<'_, Self>
    where
        Self: Sized,
    {
        let map = self.take_map();
        debug_assert!(map.is_empty());
        ScratchMap { pool: self, map }
    }
}

/// A pooled `[f32]` buffer.
pub struct Scratch<'a, P: Pool> {
    pool: &'a P,
    buffer: Vec<f32>,
}

impl<P: Pool> Scratch<'_, P> {
    /// Capacity of the underlying allocation.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl<P: Pool> Deref for Scratch<'_, P> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.buffer
    }
}

impl<P: Pool> DerefMut for Scratch<'_, P> {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }
}

impl<P: Pool> Drop for Scratch<'_, P> {
    fn drop(&mut self) {
        self.pool.give_buffer(std::mem::take(&mut self.buffer));
    }
}

/// A pooled [`KeyIndexMap`].
pub struct ScratchMap<'a, P: Pool> {
    pool: &'a P,
    map: KeyIndexMap,
}

impl<P: Pool> Deref for ScratchMap<'_, P> {
    type Target = KeyIndexMap;

    fn deref(&self) -> &KeyIndexMap {
        &self.map
    }
}

impl<P: Pool> DerefMut for ScratchMap<'_, P> {
    fn deref_mut(&mut self) -> &mut KeyIndexMap {
        &mut self.map
    }
}

impl<P: Pool> Drop for ScratchMap<'_, P> {
    fn drop(&mut self) {
        let mut map = std::mem::take(&mut self.map);
        map.clear();
        self.pool.give_map(map);
    }
}

/// Counters describing what a pool has handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers allocated because the free list was empty.
    pub buffers_created: usize,
    /// Buffers currently on the free list.
    pub buffers_free: usize,
    /// Tables allocated because the free list was empty.
    pub maps_created: usize,
    /// Tables currently on the free list.
    pub maps_free: usize,
}

#[derive(Debug, Default)]
struct FreeLists {
    buffers: Vec<Vec<f32>>,
    maps: Vec<KeyIndexMap>,
    buffers_created: usize,
    maps_created: usize,
}

impl FreeLists {
    fn take_buffer(&mut self) -> Vec<f32> {
        self.buffers.pop().unwrap_or_else(|| {
            self.buffers_created += 1;
            Vec::new()
        })
    }

    fn take_map(&mut self) -> KeyIndexMap {
        self.maps.pop().unwrap_or_else(|| {
            self.maps_created += 1;
            KeyIndexMap::default()
        })
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            buffers_created: self.buffers_created,
            buffers_free: self.buffers.len(),
            maps_created: self.maps_created,
            maps_free: self.maps.len(),
        }
    }
}

/// Pool for engines driven from one thread.
#[derive(Debug, Default)]
pub struct LocalPool {
    lists: RefCell<FreeLists>,
}

impl LocalPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        self.lists.borrow().stats()
    }
}

impl Pool for LocalPool {
    fn take_buffer(&self) -> Vec<f32> {
        self.lists.borrow_mut().take_buffer()
    }

    fn give_buffer(&self, buffer: Vec<f32>) {
        self.lists.borrow_mut().buffers.push(buffer);
    }

    fn take_map(&self) -> KeyIndexMap {
        self.lists.borrow_mut().take_map()
    }

    fn give_map(&self, map: KeyIndexMap) {
        self.lists.borrow_mut().maps.push(map);
    }
}

/// Pool shared by concurrent traversals.
///
/// Both free lists sit behind one lock that is held only for a push or pop.
#[derive(Debug, Default)]
pub struct SharedPool {
    lists: Mutex<FreeLists>,
}

impl SharedPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        self.lists.lock().unwrap().stats()
    }

    #[cfg(test)]
    fn free_buffer_addresses(&self) -> Vec<usize> {
        let lists = self.lists.lock().unwrap();
        lists.buffers.iter().map(|b| b.as_ptr() as usize).collect()
    }
}

impl Pool for SharedPool {
    fn take_buffer(&self) -> Vec<f32> {
        self.lists.lock().unwrap().take_buffer()
    }

    fn give_buffer(&self, buffer: Vec<f32>) {
        self.lists.lock().unwrap().buffers.push(buffer);
    }

    fn take_map(&self) -> KeyIndexMap {
        self.lists.lock().unwrap().take_map()
    }

    fn give_map(&self, map: KeyIndexMap) {
        self.lists.lock().unwrap().maps.push(map);
    }
}
