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

//! Bound queries
//!
//! The output of composition plus binding: executable SQL with `?`
//! markers, the ordered parameter mappings, the original parameter, and
//! any bindings added during composition.

use rustc_hash::FxHashMap;

use crate::core::{Result, Value};
use crate::mapping::parameter::ParameterMapping;

/// Composed and bound SQL, ready for a connection
#[derive(Debug, Clone)]
pub struct BoundQuery {
    sql: String,
    mappings: Vec<ParameterMapping>,
    parameter: Value,
    additional: FxHashMap<String, Value>,
}

impl BoundQuery {
    /// Assemble a bound query
    pub fn new(
        sql: String,
        mappings: Vec<ParameterMapping>,
        parameter: Value,
        additional: FxHashMap<String, Value>,
    ) -> Self {
        Self {
            sql,
            mappings,
            parameter,
            additional,
        }
    }

    /// Executable SQL with positional `?` markers
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameter mappings in marker order
    pub fn mappings(&self) -> &[ParameterMapping] {
        &self.mappings
    }

    /// The statement parameter
    pub fn parameter(&self) -> &Value {
        &self.parameter
    }

    /// Whether a composition binding exists under this name
    pub fn has_additional(&self, name: &str) -> bool {
        self.additional.contains_key(name)
    }

    /// Look up a composition binding
    pub fn additional(&self, name: &str) -> Option<&Value> {
        self.additional.get(name)
    }

    /// Add a binding after the fact
    pub fn set_additional(&mut self, name: impl Into<String>, value: Value) {
        self.additional.insert(name.into(), value);
    }

    /// Resolve one mapping's argument, unconverted. Composition bindings
    /// shadow parameter properties; a missing property binds NULL.
    pub fn resolve_argument(&self, mapping: &ParameterMapping) -> Value {
        if let Some(bound) = self.additional.get(mapping.property()) {
            return bound.clone();
        }
        self.parameter
            .get_path(mapping.property())
            .unwrap_or(Value::Null)
    }

    /// All arguments in marker order, converted for the connection
    pub fn arguments(&self) -> Result<Vec<Value>> {
        self.mappings
            .iter()
            .map(|m| m.converter().to_db(&self.resolve_argument(m)))
            .collect()
    }
}
