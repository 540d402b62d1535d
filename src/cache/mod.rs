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

//! Two-level result caching: identity keys, cache stores and decorators,
//! and transactional staging for shared caches

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Row;

mod fifo;
mod key;
mod perpetual;
mod transactional;

pub use fifo::FifoCache;
pub use key::CacheKey;
pub use perpetual::PerpetualCache;
pub use transactional::{TransactionalCache, TransactionalCacheManager};

/// What a cache stores under a key
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// A query for this identity is in flight (local cache only)
    Pending,
    /// Committed miss marker left when a reservation is released
    Null,
    /// Materialized result rows, shared between cache and callers
    Rows(Arc<Vec<Row>>),
}

impl CacheEntry {
    /// The rows, if this entry holds any
    pub fn rows(&self) -> Option<&Arc<Vec<Row>>> {
        match self {
            CacheEntry::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Store interface implemented by caches and decorators
pub trait Cache: fmt::Debug + Send {
    /// Identifier, for diagnostics
    fn id(&self) -> &str;

    /// Look up an entry
    fn get(&mut self, key: &CacheKey) -> Option<CacheEntry>;

    /// Insert or replace an entry
    fn put(&mut self, key: CacheKey, entry: CacheEntry);

    /// Remove an entry, returning it
    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry>;

    /// Drop all entries
    fn clear(&mut self);

    /// Number of stored entries
    fn len(&self) -> usize;

    /// Whether the cache holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A shared (second-level) cache, safe to reference from many sessions
pub type SharedCache = Arc<Mutex<dyn Cache>>;
