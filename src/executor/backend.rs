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

//! External collaborator contracts
//!
//! The pipeline consumes these interfaces and never implements them
//! (except `DefaultMaterializer`): the transaction and connection belong
//! to the embedding application or driver. Backend failures propagate
//! unchanged and are never retried.

use std::sync::Arc;

use crate::core::{Result, Row, TypeRegistry, TypeSpec, Value};
use crate::executor::{Executor, RowBounds, RowConsumer};

/// One unit of work against the database
pub trait Transaction: Send {
    /// The connection this transaction runs on
    fn connection(&mut self) -> Result<&mut dyn Connection>;

    /// Commit the underlying transaction
    fn commit(&mut self) -> Result<()>;

    /// Roll back the underlying transaction
    fn rollback(&mut self) -> Result<()>;

    /// Release the underlying resources
    fn close(&mut self) -> Result<()>;
}

/// Statement execution against a live connection
pub trait Connection {
    /// Run a query with positional arguments, yielding a row source
    fn execute_query(&mut self, sql: &str, args: &[Value]) -> Result<Box<dyn RowSource>>;

    /// Run a write with positional arguments, yielding the affected count
    fn execute_update(&mut self, sql: &str, args: &[Value]) -> Result<u64>;
}

/// Pull-based raw result rows
pub trait RowSource {
    /// Column names of the result set
    fn columns(&self) -> &[String];

    /// Next raw row, or `None` when exhausted
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Turns a raw row source into materialized rows.
///
/// The executor handle lets a materializer resolve nested statements
/// while the outer query is still in flight.
pub trait ResultMaterializer: Send + Sync {
    /// Drain the source, applying bounds and per-column conversion
    fn materialize(
        &self,
        source: Box<dyn RowSource>,
        result_type: TypeSpec,
        bounds: RowBounds,
        consumer: Option<&mut dyn RowConsumer>,
        types: &TypeRegistry,
        executor: &mut dyn Executor,
    ) -> Result<Vec<Row>>;
}

/// Materializer applying pagination, column conversion and consumer
/// feeding, with no nested-statement resolution
#[derive(Debug, Default)]
pub struct DefaultMaterializer;

impl ResultMaterializer for DefaultMaterializer {
    fn materialize(
        &self,
        mut source: Box<dyn RowSource>,
        result_type: TypeSpec,
        bounds: RowBounds,
        mut consumer: Option<&mut dyn RowConsumer>,
        types: &TypeRegistry,
        _executor: &mut dyn Executor,
    ) -> Result<Vec<Row>> {
        let columns = Arc::new(source.columns().to_vec());
        let converter = types.converter(result_type);

        let mut skipped = 0u64;
        let mut kept = 0u64;
        let mut rows = Vec::new();
        while let Some(raw) = source.next_row()? {
            if skipped < bounds.offset {
                skipped += 1;
                continue;
            }
            if kept >= bounds.limit {
                break;
            }
            kept += 1;

            let values = raw
                .into_iter()
                .map(|v| converter.from_db(v))
                .collect::<Result<Vec<_>>>()?;
            let row = Row::new(columns.clone(), values);
            match consumer.as_deref_mut() {
                Some(sink) => sink.consume(row)?,
                None => rows.push(row),
            }
        }
        Ok(rows)
    }
}
