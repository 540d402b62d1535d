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

//! Unbounded map-backed cache
//!
//! The base store of every cache chain, and also the executor's local
//! (first-level) cache. Entries live until removed or cleared.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::cache::{Cache, CacheEntry, CacheKey};

/// Unbounded cache over a hash map
#[derive(Debug, Default)]
pub struct PerpetualCache {
    id: String,
    entries: FxHashMap<CacheKey, CacheEntry>,
}

impl PerpetualCache {
    /// Create an empty cache with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: FxHashMap::default(),
        }
    }
}

impl Cache for PerpetualCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key).cloned();
        trace!(cache = %self.id, hit = entry.is_some(), "cache lookup");
        entry
    }

    fn put(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        trace!(cache = %self.id, "cache cleared");
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
