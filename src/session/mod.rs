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

//! Configuration and sessions
//!
//! `Configuration` is the immutable registry a deployment builds once:
//! statements, shared caches, type converters, the materializer, and the
//! cache policy knobs. Each unit of work opens a `Session` over its own
//! transaction; the session assembles the executor chain and tracks
//! whether a write made the transaction dirty.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::cache::{FifoCache, PerpetualCache, SharedCache};
use crate::core::{Error, Result, Row, TypeConverter, TypeRegistry, TypeSpec, Value};
use crate::executor::{
    CachingExecutor, DefaultMaterializer, Executor, ResultMaterializer, RowBounds, RowConsumer,
    StatementExecutor, Transaction,
};
use crate::mapping::{StatementBuilder, StatementDescriptor};

/// How long results live in the session-local cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalCacheScope {
    /// Results live until a write, a flush, or commit/rollback
    #[default]
    Session,
    /// Results live only within one outermost query call
    Statement,
}

/// Immutable registry of statements, caches, types and policy
pub struct Configuration {
    environment_id: CompactString,
    cache_enabled: bool,
    local_cache_scope: LocalCacheScope,
    statements: FxHashMap<CompactString, Arc<StatementDescriptor>>,
    caches: FxHashMap<CompactString, SharedCache>,
    types: TypeRegistry,
    materializer: Arc<dyn ResultMaterializer>,
}

impl Configuration {
    /// Start building a configuration for the given environment
    pub fn builder(environment_id: impl Into<CompactString>) -> ConfigurationBuilder {
        ConfigurationBuilder {
            environment_id: environment_id.into(),
            cache_enabled: true,
            local_cache_scope: LocalCacheScope::default(),
            statements: Vec::new(),
            caches: Vec::new(),
            types: TypeRegistry::standard(),
            materializer: Arc::new(DefaultMaterializer),
        }
    }

    /// Environment id folded into every cache identity
    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    /// Whether shared (second-level) caching is enabled
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Session-local cache scope
    pub fn local_cache_scope(&self) -> LocalCacheScope {
        self.local_cache_scope
    }

    /// The type converter registry
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The result materializer
    pub fn materializer(&self) -> Arc<dyn ResultMaterializer> {
        self.materializer.clone()
    }

    /// Look up a statement by id
    pub fn statement(&self, id: &str) -> Result<Arc<StatementDescriptor>> {
        self.statements
            .get(id)
            .cloned()
            .ok_or_else(|| Error::StatementNotFound(id.to_string()))
    }

    /// Look up a shared cache by name
    pub fn shared_cache(&self, name: &str) -> Option<SharedCache> {
        self.caches.get(name).cloned()
    }

    /// Open a session over a transaction. When shared caching is enabled
    /// the base executor is wrapped with the caching decorator.
    pub fn open_session(self: &Arc<Self>, transaction: Box<dyn Transaction>) -> Session {
        let base = StatementExecutor::new(self.clone(), transaction);
        let executor: Box<dyn Executor> = if self.cache_enabled {
            Box::new(CachingExecutor::new(self.clone(), Box::new(base)))
        } else {
            Box::new(base)
        };
        Session {
            config: self.clone(),
            executor,
            dirty: false,
        }
    }

    /// Drop all entries from every shared cache
    pub fn shutdown(&self) {
        for cache in self.caches.values() {
            cache.lock().clear();
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("environment_id", &self.environment_id)
            .field("cache_enabled", &self.cache_enabled)
            .field("local_cache_scope", &self.local_cache_scope)
            .field("statements", &self.statements.len())
            .field("caches", &self.caches.len())
            .finish()
    }
}

/// Builder for `Configuration`
pub struct ConfigurationBuilder {
    environment_id: CompactString,
    cache_enabled: bool,
    local_cache_scope: LocalCacheScope,
    statements: Vec<StatementBuilder>,
    caches: Vec<(CompactString, usize)>,
    types: TypeRegistry,
    materializer: Arc<dyn ResultMaterializer>,
}

impl ConfigurationBuilder {
    /// Disable or enable shared caching (enabled by default)
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Set the session-local cache scope
    pub fn local_cache_scope(mut self, scope: LocalCacheScope) -> Self {
        self.local_cache_scope = scope;
        self
    }

    /// Register a statement
    pub fn statement(mut self, builder: StatementBuilder) -> Self {
        self.statements.push(builder);
        self
    }

    /// Declare a named shared cache with FIFO eviction at `capacity`
    pub fn shared_cache(mut self, name: impl Into<CompactString>, capacity: usize) -> Self {
        self.caches.push((name.into(), capacity));
        self
    }

    /// Register (or replace) a type converter
    pub fn type_converter(mut self, spec: TypeSpec, converter: Arc<dyn TypeConverter>) -> Self {
        self.types.register(spec, converter);
        self
    }

    /// Replace the result materializer
    pub fn materializer(mut self, materializer: Arc<dyn ResultMaterializer>) -> Self {
        self.materializer = materializer;
        self
    }

    /// Build the immutable configuration
    pub fn build(self) -> Result<Arc<Configuration>> {
        let mut caches = FxHashMap::default();
        for (name, capacity) in self.caches {
            let store = PerpetualCache::new(name.to_string());
            let bounded = FifoCache::new(Box::new(store), capacity);
            caches.insert(name, Arc::new(Mutex::new(bounded)) as SharedCache);
        }

        let mut statements = FxHashMap::default();
        for builder in self.statements {
            let stmt = builder.build(&self.types)?;
            statements.insert(CompactString::from(stmt.id()), Arc::new(stmt));
        }

        Ok(Arc::new(Configuration {
            environment_id: self.environment_id,
            cache_enabled: self.cache_enabled,
            local_cache_scope: self.local_cache_scope,
            statements,
            caches,
            types: self.types,
            materializer: self.materializer,
        }))
    }
}

/// One unit of work: the caller surface over an executor chain
pub struct Session {
    config: Arc<Configuration>,
    executor: Box<dyn Executor>,
    dirty: bool,
}

impl Session {
    /// Run a query and return all rows
    pub fn select_list(&mut self, id: &str, parameter: Value) -> Result<Arc<Vec<Row>>> {
        self.select_list_bounded(id, parameter, RowBounds::DEFAULT)
    }

    /// Run a query with a pagination window
    pub fn select_list_bounded(
        &mut self,
        id: &str,
        parameter: Value,
        bounds: RowBounds,
    ) -> Result<Arc<Vec<Row>>> {
        let stmt = self.config.statement(id)?;
        self.executor.query(&stmt, parameter, bounds, None)
    }

    /// Run a query expected to match at most one row
    pub fn select_one(&mut self, id: &str, parameter: Value) -> Result<Option<Row>> {
        let rows = self.select_list(id, parameter)?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.first().cloned()),
            n => Err(Error::TooManyResults(n)),
        }
    }

    /// Run a query feeding each row to a consumer; the result bypasses
    /// all caches
    pub fn select_each(
        &mut self,
        id: &str,
        parameter: Value,
        bounds: RowBounds,
        consumer: &mut dyn RowConsumer,
    ) -> Result<()> {
        let stmt = self.config.statement(id)?;
        self.executor.query(&stmt, parameter, bounds, Some(consumer))?;
        Ok(())
    }

    /// Run a write, returning the affected row count
    pub fn update(&mut self, id: &str, parameter: Value) -> Result<u64> {
        let stmt = self.config.statement(id)?;
        self.dirty = true;
        self.executor.update(&stmt, parameter)
    }

    /// Run an insert (delegates to [`Session::update`])
    pub fn insert(&mut self, id: &str, parameter: Value) -> Result<u64> {
        self.update(id, parameter)
    }

    /// Run a delete (delegates to [`Session::update`])
    pub fn delete(&mut self, id: &str, parameter: Value) -> Result<u64> {
        self.update(id, parameter)
    }

    /// Commit; the transaction commits only if a write happened
    pub fn commit(&mut self) -> Result<()> {
        self.executor.commit(self.dirty)?;
        self.dirty = false;
        Ok(())
    }

    /// Roll back; the transaction rolls back only if a write happened
    pub fn rollback(&mut self) -> Result<()> {
        self.executor.rollback(self.dirty)?;
        self.dirty = false;
        Ok(())
    }

    /// Close the session. Uncommitted writes are rolled back.
    pub fn close(&mut self) {
        self.executor.close(self.dirty);
        self.dirty = false;
    }

    /// Drop all session-local cached results
    pub fn clear_local_cache(&mut self) {
        self.executor.clear_local_cache();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("environment_id", &self.config.environment_id())
            .field("dirty", &self.dirty)
            .field("closed", &self.executor.is_closed())
            .finish()
    }
}
