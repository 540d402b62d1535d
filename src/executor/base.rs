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

//! Base executor
//!
//! Owns the transaction and the session-local (first-level) cache and
//! runs the core query/update pipeline. Nested queries issued by a
//! materializer run on the same executor at `query_depth > 0`; the local
//! cache is never flushed mid-stack, and an in-flight identity is marked
//! `Pending` so re-entry on the same identity fails instead of recursing
//! forever.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::cache::{Cache, CacheEntry, CacheKey, PerpetualCache};
use crate::core::{Error, Result, Row, Value};
use crate::executor::backend::Transaction;
use crate::executor::{Executor, RowBounds, RowConsumer};
use crate::mapping::{BoundQuery, StatementDescriptor};
use crate::session::{Configuration, LocalCacheScope};

/// Base statement executor over one transaction
pub struct StatementExecutor {
    config: Arc<Configuration>,
    transaction: Box<dyn Transaction>,
    local_cache: PerpetualCache,
    query_depth: usize,
    closed: bool,
}

impl StatementExecutor {
    /// Create an executor bound to a transaction
    pub fn new(config: Arc<Configuration>, transaction: Box<dyn Transaction>) -> Self {
        Self {
            config,
            transaction,
            local_cache: PerpetualCache::new("local"),
            query_depth: 0,
            closed: false,
        }
    }

    fn run_query(
        &mut self,
        stmt: &StatementDescriptor,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
        key: CacheKey,
        bound: BoundQuery,
    ) -> Result<Arc<Vec<Row>>> {
        let streaming = consumer.is_some();
        if !streaming {
            match self.local_cache.get(&key) {
                Some(CacheEntry::Rows(rows)) => {
                    trace!(statement = stmt.id(), "local cache hit");
                    return Ok(rows);
                }
                Some(CacheEntry::Pending) => {
                    return Err(Error::CircularQuery(stmt.id().to_string()));
                }
                _ => {}
            }
        }

        // Reserve the identity while the database round trip is in
        // flight, then replace or release the reservation.
        self.local_cache.put(key.clone(), CacheEntry::Pending);
        let result = self.query_database(stmt, bounds, consumer, &bound);
        self.local_cache.remove(&key);

        let rows = result?;
        if !streaming {
            self.local_cache.put(key, CacheEntry::Rows(rows.clone()));
        }
        Ok(rows)
    }

    fn query_database(
        &mut self,
        stmt: &StatementDescriptor,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
        bound: &BoundQuery,
    ) -> Result<Arc<Vec<Row>>> {
        let config = self.config.clone();
        let args = bound.arguments()?;
        let source = self
            .transaction
            .connection()?
            .execute_query(bound.sql(), &args)?;
        let rows = config.materializer().materialize(
            source,
            stmt.result_type(),
            bounds,
            consumer,
            config.types(),
            self,
        )?;
        Ok(Arc::new(rows))
    }
}

impl Executor for StatementExecutor {
    fn query(
        &mut self,
        stmt: &StatementDescriptor,
        parameter: Value,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
    ) -> Result<Arc<Vec<Row>>> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
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
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        // A flush-required statement clears local results, but never in
        // the middle of a nested stack.
        if self.query_depth == 0 && stmt.flush_cache_required() {
            self.local_cache.clear();
        }

        self.query_depth += 1;
        let result = self.run_query(stmt, bounds, consumer, key, bound);
        self.query_depth -= 1;

        if self.query_depth == 0
            && self.config.local_cache_scope() == LocalCacheScope::Statement
        {
            self.local_cache.clear();
        }
        result
    }

    fn update(&mut self, stmt: &StatementDescriptor, parameter: Value) -> Result<u64> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        // Any write may invalidate previously cached results.
        self.local_cache.clear();
        let bound = stmt.source().bound_query(parameter, self.config.types())?;
        let args = bound.arguments()?;
        self.transaction
            .connection()?
            .execute_update(bound.sql(), &args)
    }

    fn commit(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        self.local_cache.clear();
        if required {
            self.transaction.commit()?;
        }
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.local_cache.clear();
        if required {
            self.transaction.rollback()?;
        }
        Ok(())
    }

    fn close(&mut self, force_rollback: bool) {
        if let Err(e) = self.rollback(force_rollback) {
            warn!(error = %e, "rollback during close failed");
        }
        if let Err(e) = self.transaction.close() {
            warn!(error = %e, "transaction close failed");
        }
        self.local_cache.clear();
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn clear_local_cache(&mut self) {
        if !self.closed {
            self.local_cache.clear();
        }
    }

    fn create_cache_key(
        &self,
        stmt: &StatementDescriptor,
        bound: &BoundQuery,
        bounds: RowBounds,
    ) -> Result<CacheKey> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        let mut key = CacheKey::new();
        key.update(Value::text(stmt.id()));
        key.update(Value::Integer(bounds.offset as i64));
        key.update(Value::Integer(bounds.limit as i64));
        key.update(Value::text(bound.sql()));
        for mapping in bound.mappings() {
            key.update(bound.resolve_argument(mapping));
        }
        key.update(Value::text(self.config.environment_id()));
        Ok(key)
    }
}
