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

//! FIFO eviction decorator
//!
//! Wraps another cache and keeps insertion order; when a put pushes the
//! key count past capacity, the oldest inserted key is evicted from the
//! delegate.

use std::collections::VecDeque;

use tracing::debug;

use crate::cache::{Cache, CacheEntry, CacheKey};

/// Capacity-bounding decorator with first-in-first-out eviction
#[derive(Debug)]
pub struct FifoCache {
    delegate: Box<dyn Cache>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl FifoCache {
    /// Wrap a delegate with the given capacity (at least 1)
    pub fn new(delegate: Box<dyn Cache>, capacity: usize) -> Self {
        Self {
            delegate,
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }
}

impl Cache for FifoCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.delegate.get(key)
    }

    fn put(&mut self, key: CacheKey, entry: CacheEntry) {
        self.order.push_back(key.clone());
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!(cache = %self.delegate.id(), "fifo eviction");
                self.delegate.remove(&oldest);
            }
        }
        self.delegate.put(key, entry);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.delegate.remove(key)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.delegate.clear();
    }

    fn len(&self) -> usize {
        self.delegate.len()
    }
}
