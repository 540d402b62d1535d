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

//! The statement execution pipeline
//!
//! `Executor` is the session-facing pipeline surface. The base
//! `StatementExecutor` owns the transaction and the session-local
//! (first-level) cache; `CachingExecutor` decorates it with shared
//! (second-level) caching. An executor is single-threaded and tied to
//! one transaction for its lifetime.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::core::{Result, Row, Value};
use crate::mapping::{BoundQuery, StatementDescriptor};

mod backend;
mod base;
mod caching;

pub use backend::{
    Connection, DefaultMaterializer, ResultMaterializer, RowSource, Transaction,
};
pub use base::StatementExecutor;
pub use caching::CachingExecutor;

/// Pagination window applied during materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    /// Rows to skip
    pub offset: u64,
    /// Maximum rows to keep
    pub limit: u64,
}

impl RowBounds {
    /// No pagination
    pub const DEFAULT: RowBounds = RowBounds {
        offset: 0,
        limit: u64::MAX,
    };

    /// Bounds with an explicit window
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Streaming row sink. When a consumer is supplied, rows are fed to it
/// one by one and the result bypasses every cache layer.
pub trait RowConsumer {
    /// Receive one materialized row
    fn consume(&mut self, row: Row) -> Result<()>;
}

/// Statement execution surface
pub trait Executor {
    /// Compose, bind and run a query
    fn query(
        &mut self,
        stmt: &StatementDescriptor,
        parameter: Value,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
    ) -> Result<Arc<Vec<Row>>>;

    /// Run a query whose bound form and cache identity are already built
    fn query_with(
        &mut self,
        stmt: &StatementDescriptor,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
        key: CacheKey,
        bound: BoundQuery,
    ) -> Result<Arc<Vec<Row>>>;

    /// Compose, bind and run a write, returning the affected row count
    fn update(&mut self, stmt: &StatementDescriptor, parameter: Value) -> Result<u64>;

    /// Commit the unit of work; the transaction commits only if `required`
    fn commit(&mut self, required: bool) -> Result<()>;

    /// Roll back the unit of work; the transaction rolls back only if
    /// `required`
    fn rollback(&mut self, required: bool) -> Result<()>;

    /// Release the executor. Never fails; underlying errors are logged
    /// and swallowed, and the executor is closed regardless.
    fn close(&mut self, force_rollback: bool);

    /// Whether the executor has been closed
    fn is_closed(&self) -> bool;

    /// Drop all session-local cached results
    fn clear_local_cache(&mut self);

    /// Build the cache identity of one execution: statement id, bounds,
    /// final SQL, every bound argument, environment id
    fn create_cache_key(
        &self,
        stmt: &StatementDescriptor,
        bound: &BoundQuery,
        bounds: RowBounds,
    ) -> Result<CacheKey>;
}
