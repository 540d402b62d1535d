// Copyright 2026 MapSQL Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Transactional staging in front of shared caches
//!
//! Writes against a shared (second-level) cache are staged per session
//! and only reach the backing store at commit. Every miss is recorded so
//! its blocking reservation can be released at commit or rollback.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, SharedCache};

/// Session-side staging wrapper around one shared cache
#[derive(Debug)]
pub struct TransactionalCache {
    delegate: SharedCache,
    clear_on_commit: bool,
    pending: FxHashMap<CacheKey, CacheEntry>,
    missed: FxHashSet<CacheKey>,
}

impl TransactionalCache {
    /// Wrap a shared cache
    pub fn new(delegate: SharedCache) -> Self {
        Self {
            delegate,
            clear_on_commit: false,
            pending: FxHashMap::default(),
            missed: FxHashSet::default(),
        }
    }

    /// Read through to the backing store, recording misses. After a
    /// staged clear, backing entries are hidden until commit.
    pub fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.delegate.lock().get(key);
        if entry.is_none() {
            self.missed.insert(key.clone());
        }
        if self.clear_on_commit {
            return None;
        }
        entry
    }

    /// Stage a write; nothing reaches the backing store until commit
    pub fn put(&mut self, key: CacheKey, entry: CacheEntry) {
        self.pending.insert(key, entry);
    }

    /// Stage a full clear and drop any staged writes
    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.pending.clear();
    }

    /// Apply the staged clear and writes to the backing store, release
    /// miss reservations, and reset
    pub fn commit(&mut self) {
        let mut delegate = self.delegate.lock();
        if self.clear_on_commit {
            debug!(cache = %delegate.id(), "applying staged clear");
            delegate.clear();
        }
        for (key, entry) in self.pending.drain() {
            delegate.put(key, entry);
        }
        // Misses that never got a staged value release their reservation
        // as a committed miss marker.
        for key in self.missed.drain() {
            if delegate.get(&key).is_none() {
                delegate.put(key, CacheEntry::Null);
            }
        }
        drop(delegate);
        self.reset();
    }

    /// Discard staged state and release miss reservations with the same
    /// null markers commit writes
    pub fn rollback(&mut self) {
        let mut delegate = self.delegate.lock();
        for key in self.missed.drain() {
            delegate.put(key, CacheEntry::Null);
        }
        drop(delegate);
        self.reset();
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.pending.clear();
        self.missed.clear();
    }
}

/// One staging wrapper per distinct shared cache touched by a session
#[derive(Debug, Default)]
pub struct TransactionalCacheManager {
    caches: FxHashMap<usize, TransactionalCache>,
}

impl TransactionalCacheManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    fn wrapper(&mut self, cache: &SharedCache) -> &mut TransactionalCache {
        // Identity of the shared cache is the allocation, not the id
        // string: two configs may reuse a name.
        let identity = std::sync::Arc::as_ptr(cache) as *const () as usize;
        self.caches
            .entry(identity)
            .or_insert_with(|| TransactionalCache::new(cache.clone()))
    }

    /// Read through the wrapper for this cache
    pub fn get(&mut self, cache: &SharedCache, key: &CacheKey) -> Option<CacheEntry> {
        self.wrapper(cache).get(key)
    }

    /// Stage a write on the wrapper for this cache
    pub fn put(&mut self, cache: &SharedCache, key: CacheKey, entry: CacheEntry) {
        self.wrapper(cache).put(key, entry);
    }

    /// Stage a clear on the wrapper for this cache
    pub fn clear(&mut self, cache: &SharedCache) {
        self.wrapper(cache).clear();
    }

    /// Commit every wrapper
    pub fn commit(&mut self) {
        for wrapper in self.caches.values_mut() {
            wrapper.commit();
        }
    }

    /// Roll back every wrapper
    pub fn rollback(&mut self) {
        for wrapper in self.caches.values_mut() {
            wrapper.rollback();
        }
    }
}
