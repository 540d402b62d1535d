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

//! # MapSQL - Dynamic SQL statement execution engine
//!
//! MapSQL composes SQL statements from conditional fragment trees, binds
//! named parameters to positional markers, and runs the result through a
//! two-level caching pipeline over a caller-supplied connection. It owns
//! the statement lifecycle; the database driver stays outside.
//!
//! ## Key Features
//!
//! - **Dynamic composition** - Conditional fragments, `WHERE`/`SET`
//!   presets, and sandboxed test expressions compiled once per statement
//! - **Two placeholder families** - `#{...}` binds safely through `?`
//!   markers; `${...}` substitutes text, guarded by an injection filter
//! - **Deterministic cache identity** - Statement id, bounds, final SQL,
//!   every argument, and environment fold into one comparable key
//! - **Two-level caching** - A session-local cache plus optional shared
//!   caches with transactional staging and FIFO eviction
//! - **Pluggable backend** - Transactions, connections, and row
//!   materialization are traits the embedding application implements
//!
//! ## Quick Start
//!
//! ```ignore
//! use mapsql::{CommandKind, Configuration, SqlNode, StatementDescriptor, Value};
//!
//! let config = Configuration::builder("production")
//!     .statement(StatementDescriptor::builder(
//!         "user.selectByName",
//!         CommandKind::Select,
//!         SqlNode::mixed(vec![
//!             SqlNode::static_text("SELECT * FROM users"),
//!             SqlNode::where_clause(
//!                 SqlNode::cond("name != null", SqlNode::static_text("AND name = #{name}"))?,
//!             ),
//!         ]),
//!     ))
//!     .build()?;
//!
//! let mut session = config.open_session(transaction);
//! let rows = session.select_list("user.selectByName", mapsql::value_map! { "name" => "Alice" })?;
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Value`], [`Row`], [`Error`], converters)
//! - [`scripting`] - Fragment trees, expressions, token scanning
//! - [`mapping`] - Placeholder binding and statement descriptors
//! - [`cache`] - Cache identity and the two-level cache hierarchy
//! - [`executor`] - The execution pipeline and backend contracts
//! - [`session`] - Configuration registry and the session surface

pub mod cache;
pub mod core;
pub mod executor;
pub mod mapping;
pub mod scripting;
pub mod session;

pub use crate::core::{Error, Result, Row, TypeConverter, TypeRegistry, TypeSpec, Value};
pub use cache::{Cache, CacheEntry, CacheKey, SharedCache};
pub use executor::{
    Connection, Executor, ResultMaterializer, RowBounds, RowConsumer, RowSource, Transaction,
};
pub use mapping::{BoundQuery, CommandKind, StatementBuilder, StatementDescriptor};
pub use scripting::SqlNode;
pub use session::{Configuration, ConfigurationBuilder, LocalCacheScope, Session};
