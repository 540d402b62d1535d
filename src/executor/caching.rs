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

//! Shared-cache decorator
//!
//! Wraps a base executor with second-level caching. Reads go through a
//! per-session transactional wrapper so staged writes become visible to
//! other sessions only at commit; commit and rollback fan out to the
//! delegate first, then to the cache manager, in the order the cache
//! consistency rules require.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, SharedCache, TransactionalCacheManager};
use crate::core::{Result, Row, Value};
use crate::executor::{Executor, RowBounds, RowConsumer};
use crate::mapping::{BoundQuery, StatementDescriptor};
use crate::session::Configuration;

/// Executor decorator adding shared (second-level) caching
pub struct CachingExecutor {
    delegate: Box<dyn Executor>,
    config: Arc<Configuration>,
    manager: TransactionalCacheManager,
}

impl CachingExecutor {
    /// Wrap a delegate executor
    pub fn new(config: Arc<Configuration>, delegate: Box<dyn Executor>) -> Self {
        Self {
            delegate,
            config,
            manager: TransactionalCacheManager::new(),
        }
    }

    fn shared_cache(&self, stmt: &StatementDescriptor) -> Option<SharedCache> {
        let name = stmt.cache_ref()?;
        self.config.shared_cache(name)
    }

    fn flush_if_required(&mut self, stmt: &StatementDescriptor, cache: &SharedCache) {
        if stmt.flush_cache_required() {
            debug!(statement = stmt.id(), "staging shared cache clear");
            self.manager.clear(cache);
        }
    }
}

impl Executor for CachingExecutor {
    fn query(
        &mut self,
        stmt: &StatementDescriptor,
        parameter: Value,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
    ) -> Result<Arc<Vec<Row>>> {
        let bound = stmt.source().bound_query(parameter, self.config.types())?;
        let key = self.create_cache_key(stmt, &bound, bounds)?;
        self.query_with(stmt, bounds, consumer, key, bound)
    }

    fn query_with(
        &mut self,
        stmt: &StatementDescriptor,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
        key: CacheKey,
        bound: BoundQuery,
    ) -> Result<Arc<Vec<Row>>> {
        if let Some(cache) = self.shared_cache(stmt) {
            self.flush_if_required(stmt, &cache);
            // Streaming results bypass the cache entirely.
            if stmt.use_cache() && consumer.is_none() {
                if let Some(CacheEntry::Rows(rows)) = self.manager.get(&cache, &key) {
                    debug!(statement = stmt.id(), "shared cache hit");
                    return Ok(rows);
                }
                let rows = self
                    .delegate
                    .query_with(stmt, bounds, None, key.clone(), bound)?;
                self.manager
                    .put(&cache, key, CacheEntry::Rows(rows.clone()));
                return Ok(rows);
            }
        }
        self.delegate.query_with(stmt, bounds, consumer, key, bound)
    }

    fn update(&mut self, stmt: &StatementDescriptor, parameter: Value) -> Result<u64> {
        if let Some(cache) = self.shared_cache(stmt) {
            self.flush_if_required(stmt, &cache);
        }
        self.delegate.update(stmt, parameter)
    }

    fn commit(&mut self, required: bool) -> Result<()> {
        // The delegate commits first; staged cache writes become visible
        // only after the transaction is durable.
        self.delegate.commit(required)?;
        self.manager.commit();
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> Result<()> {
        let result = self.delegate.rollback(required);
        if required {
            self.manager.rollback();
        }
        result
    }

    fn close(&mut self, force_rollback: bool) {
        if force_rollback {
            self.manager.rollback();
        } else {
            self.manager.commit();
        }
        self.delegate.close(force_rollback);
    }

    fn is_closed(&self) -> bool {
        self.delegate.is_closed()
    }

    fn clear_local_cache(&mut self) {
        self.delegate.clear_local_cache();
    }

    fn create_cache_key(
        &self,
        stmt: &StatementDescriptor,
        bound: &BoundQuery,
        bounds: RowBounds,
    ) -> Result<CacheKey> {
        self.delegate.create_cache_key(stmt, bound, bounds)
    }
}
