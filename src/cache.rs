//! Bounded, disposing LRU cache for native-backed artifacts
//!
//! Derived artifacts (rendered pages, loaded text layers, form environments)
//! are expensive to produce and own native resources; an unbounded cache
//! leaks native memory under normal viewer usage, and plain removal leaks the
//! descriptors a removed artifact owns. [`BoundedCache`] therefore couples
//! every exit path from the map (replacement, LRU eviction, removal, clear,
//! disposal) to exactly one [`Disposable::dispose`] call, and performs the
//! pair as a single step under one lock so no observer can witness a
//! half-evicted entry.

use crate::error::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

/// An artifact owning resources that must be released exactly once when the
/// artifact leaves its cache.
pub trait Disposable {
    /// Release owned resources. Called at most once by the cache; the value
    /// is dropped immediately afterwards.
    fn dispose(&mut self);
}

struct Inner<K: Hash + Eq, V: Disposable> {
    // None once the cache has been disposed; every operation checks first.
    lru: Option<LruCache<K, V>>,
}

/// Least-recently-used cache with a fixed capacity and eviction-triggered
/// disposal.
///
/// All operations are linearizable: a single mutex protects the map and the
/// recency order together, and eviction-then-dispose happens before the
/// evicted slot is reused. After [`dispose`](BoundedCache::dispose) (or
/// drop), every operation fails with [`Error::CacheDisposed`].
pub struct BoundedCache<K: Hash + Eq, V: Disposable> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K: Hash + Eq, V: Disposable> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// Capacity below 1 is a construction-time error: a zero-capacity
    /// disposing cache would dispose everything handed to it, which is never
    /// what a caller wants.
    pub fn new(capacity: usize) -> Result<Self> {
        let nonzero =
            NonZeroUsize::new(capacity).ok_or(Error::CapacityConfiguration { capacity })?;
        Ok(Self {
            inner: Mutex::new(Inner {
                lru: Some(LruCache::new(nonzero)),
            }),
            capacity,
        })
    }

    /// Look up `key` and run `f` over the cached value while holding the
    /// cache lock. A hit promotes the entry to most-recently-used. Returns
    /// `None` on miss with no side effects.
    ///
    /// The cache retains ownership of the value; `f` receives a reference
    /// precisely so callers cannot release what they did not create.
    pub fn with_get<T>(&self, key: &K, f: impl FnOnce(&V) -> T) -> Result<Option<T>> {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;
        Ok(lru.get(key).map(f))
    }

    /// Whether `key` is present, without promoting it
    pub fn contains(&self, key: &K) -> Result<bool> {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;
        Ok(lru.contains(key))
    }

    /// Insert `value` under `key`, becoming the most-recently-used entry.
    ///
    /// Replacing an existing key disposes the old value and reuses its slot.
    /// Inserting a new key at capacity first evicts and disposes the
    /// least-recently-used entry; eviction and disposal happen atomically
    /// under the cache lock.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;

        // `push` returns the replaced value for an existing key, or the
        // evicted LRU pair when a new key lands in a full cache.
        if let Some((_, mut old)) = lru.push(key, value) {
            trace!("cache at capacity or key replaced; disposing outgoing entry");
            old.dispose();
        }

        Ok(())
    }

    /// Dispose and remove the entry under `key`. Returns false if absent.
    pub fn remove(&self, key: &K) -> Result<bool> {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;

        match lru.pop(key) {
            Some(mut value) => {
                value.dispose();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dispose and remove every entry whose key matches `pred`, returning
    /// how many were removed. Used for explicit invalidation (for example,
    /// dropping cached pages covered by a parsed page range).
    pub fn remove_where(&self, mut pred: impl FnMut(&K) -> bool) -> Result<usize>
    where
        K: Clone,
    {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;

        let victims: Vec<K> = lru
            .iter()
            .filter(|(k, _)| pred(k))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &victims {
            if let Some(mut value) = lru.pop(key) {
                value.dispose();
            }
        }

        Ok(victims.len())
    }

    /// Dispose every entry, leaving the cache empty but usable
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let lru = inner.lru.as_mut().ok_or(Error::CacheDisposed)?;
        Self::drain(lru);
        Ok(())
    }

    /// Dispose every remaining entry and mark the cache permanently unusable.
    ///
    /// Idempotent. Every subsequent operation fails with
    /// [`Error::CacheDisposed`] rather than silently no-oping, because a
    /// caller still holding the cache after disposal is a wiring defect worth
    /// surfacing.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        if let Some(mut lru) = inner.lru.take() {
            debug!(entries = lru.len(), "disposing cache");
            Self::drain(&mut lru);
        }
    }

    /// Number of entries currently cached
    pub fn len(&self) -> Result<usize> {
        let inner = self.inner.lock();
        let lru = inner.lru.as_ref().ok_or(Error::CacheDisposed)?;
        Ok(lru.len())
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Configured capacity (fixed at construction)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn drain(lru: &mut LruCache<K, V>) {
        while let Some((_, mut value)) = lru.pop_lru() {
            value.dispose();
        }
    }
}

impl<K: Hash + Eq, V: Disposable> Drop for BoundedCache<K, V> {
    fn drop(&mut self) {
        self.dispose();
    }
}
