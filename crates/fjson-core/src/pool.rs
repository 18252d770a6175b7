//! Pooled growth discipline shared by variable-length deserializers
//!
//! Every deserializer that produces a variable-length result follows the
//! same protocol: rent a working buffer from a process-wide pool, grow it
//! geometrically while appending, copy exactly the produced elements into a
//! precisely sized result, and hand the working buffer back. The guards
//! return their buffers on drop, so error paths and early returns cannot
//! leak a rent.

use std::any::{Any, TypeId};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Buffers retained per shelf before extra returns are dropped
const RETAINED_PER_SHELF: usize = 8;

/// Byte buffers above this capacity are not retained
const MAX_RETAINED_BYTES: usize = 1 << 20;

/// Element buffers above this capacity (in elements) are not retained
const MAX_RETAINED_ELEMENTS: usize = 4096;

/// Initial capacity for rented element buffers
pub(crate) const INITIAL_ELEMENTS: usize = 8;

/// Process-wide pool of byte scratch buffers
#[derive(Debug, Default)]
pub struct ScratchPool {
    shelf: Mutex<Vec<Vec<u8>>>,
    outstanding: AtomicIsize,
}

impl ScratchPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Rent a cleared buffer with at least `min_capacity` bytes
    pub fn rent(&self, min_capacity: usize) -> Scratch<'_> {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        let mut buf = self.shelf.lock().pop().unwrap_or_default();
        buf.clear();
        if buf.capacity() < min_capacity {
            buf.reserve(min_capacity - buf.capacity());
        }
        Scratch { buf, pool: self }
    }

    /// Rents currently held by callers
    pub fn outstanding(&self) -> isize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Internal accounting check; a negative rent count means a buffer was
    /// returned twice
    pub fn verify(&self) -> Result<()> {
        let outstanding = self.outstanding();
        if outstanding < 0 {
            return Err(Error::invariant(format!(
                "scratch pool rent count is negative ({outstanding})"
            )));
        }
        Ok(())
    }

    fn give_back(&self, buf: Vec<u8>) {
        let previous = self.outstanding.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "scratch buffer returned twice");
        if buf.capacity() > MAX_RETAINED_BYTES {
            return;
        }
        let mut shelf = self.shelf.lock();
        if shelf.len() < RETAINED_PER_SHELF {
            shelf.push(buf);
        }
    }
}

/// RAII byte scratch rented from a [`ScratchPool`]
#[derive(Debug)]
pub struct Scratch<'a> {
    buf: Vec<u8>,
    pool: &'a ScratchPool,
}

impl Deref for Scratch<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

/// Shared global scratch pool
pub fn global_scratch() -> &'static ScratchPool {
    static GLOBAL_SCRATCH: Lazy<ScratchPool> = Lazy::new(ScratchPool::new);
    &GLOBAL_SCRATCH
}

/// Process-wide pool of element buffers for one element type
#[derive(Debug)]
pub struct ElementPool<T> {
    shelf: Mutex<Vec<Vec<T>>>,
    outstanding: AtomicIsize,
}

impl<T> Default for ElementPool<T> {
    fn default() -> Self {
        Self {
            shelf: Mutex::new(Vec::new()),
            outstanding: AtomicIsize::new(0),
        }
    }
}

impl<T> ElementPool<T> {
    /// Rent a cleared working buffer with at least `min_capacity` slots
    pub fn rent(self: &Arc<Self>, min_capacity: usize) -> PooledVec<T> {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        let mut buf = self.shelf.lock().pop().unwrap_or_default();
        buf.clear();
        if buf.capacity() < min_capacity {
            buf.reserve(min_capacity - buf.capacity());
        }
        PooledVec {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Rents currently held by callers
    pub fn outstanding(&self) -> isize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn give_back(&self, mut buf: Vec<T>) {
        let previous = self.outstanding.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "element buffer returned twice");
        buf.clear();
        if buf.capacity() > MAX_RETAINED_ELEMENTS {
            return;
        }
        let mut shelf = self.shelf.lock();
        if shelf.len() < RETAINED_PER_SHELF {
            shelf.push(buf);
        }
    }
}

/// RAII element buffer rented from an [`ElementPool`]
#[derive(Debug)]
pub struct PooledVec<T> {
    buf: Vec<T>,
    pool: Arc<ElementPool<T>>,
}

impl<T> PooledVec<T> {
    /// Move exactly the appended elements, in order, into a precisely sized
    /// vector; the working buffer goes back to the pool
    pub fn into_exact(mut self) -> Vec<T> {
        let mut exact = Vec::with_capacity(self.buf.len());
        exact.extend(self.buf.drain(..));
        exact
    }
}

impl<T> Deref for PooledVec<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buf
    }
}

impl<T> DerefMut for PooledVec<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buf
    }
}

impl<T> Drop for PooledVec<T> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

/// Registry of element pools, one per element type
static ELEMENT_POOLS: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// Pool for element buffers of type `T`
pub fn element_pool<T: Send + 'static>() -> Arc<ElementPool<T>> {
    let key = TypeId::of::<T>();
    let erased = ELEMENT_POOLS
        .entry(key)
        .or_insert_with(|| {
            tracing::trace!(
                element = std::any::type_name::<T>(),
                "element pool created"
            );
            Arc::new(ElementPool::<T>::default()) as Arc<dyn Any + Send + Sync>
        })
        .clone();
    match erased.downcast::<ElementPool<T>>() {
        Ok(pool) => pool,
        // unreachable for a TypeId-keyed entry; fall back to a fresh pool
        Err(_) => Arc::new(ElementPool::default()),
    }
}
