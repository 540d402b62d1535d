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

//! Mock backend shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use mapsql::executor::{Connection, RowSource, Transaction};
use mapsql::{Result, Row, RowConsumer, Value};

/// Record of every backend call made through one transaction
#[derive(Debug, Default)]
pub struct CallLog {
    pub queries: Vec<(String, Vec<Value>)>,
    pub updates: Vec<(String, Vec<Value>)>,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
}

pub type SharedLog = Arc<Mutex<CallLog>>;

pub struct MockConnection {
    log: SharedLog,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    update_count: u64,
}

impl Connection for MockConnection {
    fn execute_query(&mut self, sql: &str, args: &[Value]) -> Result<Box<dyn RowSource>> {
        self.log.lock().queries.push((sql.to_string(), args.to_vec()));
        Ok(Box::new(MockRowSource {
            columns: self.columns.clone(),
            rows: self.rows.clone().into_iter(),
        }))
    }

    fn execute_update(&mut self, sql: &str, args: &[Value]) -> Result<u64> {
        self.log.lock().updates.push((sql.to_string(), args.to_vec()));
        Ok(self.update_count)
    }
}

pub struct MockRowSource {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl RowSource for MockRowSource {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }
}

pub struct MockTransaction {
    log: SharedLog,
    connection: MockConnection,
}

impl Transaction for MockTransaction {
    fn connection(&mut self) -> Result<&mut dyn Connection> {
        Ok(&mut self.connection)
    }

    fn commit(&mut self) -> Result<()> {
        self.log.lock().commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.log.lock().rollbacks += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.lock().closes += 1;
        Ok(())
    }
}

/// A transaction whose every query returns the given rows
pub fn transaction(
    columns: &[&str],
    rows: Vec<Vec<Value>>,
) -> (Box<dyn Transaction>, SharedLog) {
    let log: SharedLog = Arc::new(Mutex::new(CallLog::default()));
    let tx = MockTransaction {
        log: log.clone(),
        connection: MockConnection {
            log: log.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            update_count: 1,
        },
    };
    (Box::new(tx), log)
}

/// Two-column user fixture rows
pub fn user_rows() -> Vec<Vec<Value>> {
    vec![
        vec![Value::Integer(1), Value::text("Alice")],
        vec![Value::Integer(2), Value::text("Bob")],
    ]
}

pub fn user_transaction() -> (Box<dyn Transaction>, SharedLog) {
    transaction(&["id", "name"], user_rows())
}

/// Consumer collecting rows into a vector
#[derive(Debug, Default)]
pub struct CollectingConsumer {
    pub rows: Vec<Row>,
}

impl RowConsumer for CollectingConsumer {
    fn consume(&mut self, row: Row) -> Result<()> {
        self.rows.push(row);
        Ok(())
    }
}
