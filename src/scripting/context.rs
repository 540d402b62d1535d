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

//! Per-composition binding context
//!
//! A fresh `ComposeContext` is created for every dynamic composition. It
//! carries the statement parameter (always reachable under the reserved
//! name `_parameter`), any bindings added during composition, and the SQL
//! text accumulated so far.

use rustc_hash::FxHashMap;

use crate::core::Value;
use crate::scripting::expr::BindingLookup;

/// Reserved binding name for the statement parameter
pub const PARAMETER_BINDING: &str = "_parameter";

/// Mutable state threaded through one dynamic composition
#[derive(Debug)]
pub struct ComposeContext {
    bindings: FxHashMap<String, Value>,
    buffer: String,
}

impl ComposeContext {
    /// Create a context for one composition over the given parameter
    pub fn new(parameter: Value) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(PARAMETER_BINDING.to_string(), parameter);
        Self {
            bindings,
            buffer: String::new(),
        }
    }

    /// The statement parameter
    pub fn parameter(&self) -> &Value {
        self.bindings
            .get(PARAMETER_BINDING)
            .unwrap_or(&Value::Null)
    }

    /// Add (or replace) a named binding
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Append a composed fragment. A single trailing space keeps adjacent
    /// fragments from running together; the final text is trimmed.
    pub fn append_sql(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        self.buffer.push(' ');
    }

    /// The composed SQL accumulated so far, trimmed
    pub fn sql(&self) -> &str {
        self.buffer.trim()
    }

    /// Swap the accumulation buffer, isolating nested composition
    pub(crate) fn swap_buffer(&mut self, other: &mut String) {
        std::mem::swap(&mut self.buffer, other);
    }

    /// Consume the context, yielding the bindings added during composition
    /// (the reserved parameter binding excluded)
    pub fn into_additional_bindings(mut self) -> FxHashMap<String, Value> {
        self.bindings.remove(PARAMETER_BINDING);
        self.bindings
    }
}

impl BindingLookup for ComposeContext {
    fn resolve(&self, name: &str) -> Option<Value> {
        if let Some(bound) = self.bindings.get(name) {
            return Some(bound.clone());
        }
        self.parameter().get_path(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_map;

    #[test]
    fn test_parameter_binding() {
        let ctx = ComposeContext::new(value_map! { "id" => 7 });
        assert_eq!(ctx.resolve("id"), Some(Value::Integer(7)));
        assert_eq!(
            ctx.resolve(PARAMETER_BINDING),
            Some(value_map! { "id" => 7 })
        );
        assert_eq!(ctx.resolve("missing"), None);
    }

    #[test]
    fn test_explicit_bindings_shadow_parameter() {
        let mut ctx = ComposeContext::new(value_map! { "id" => 7 });
        ctx.bind("id", Value::Integer(9));
        assert_eq!(ctx.resolve("id"), Some(Value::Integer(9)));
    }

    #[test]
    fn test_append_and_trim() {
        let mut ctx = ComposeContext::new(Value::Null);
        ctx.append_sql("SELECT *");
        ctx.append_sql("FROM users");
        assert_eq!(ctx.sql(), "SELECT * FROM users");
    }

    #[test]
    fn test_additional_bindings_exclude_parameter() {
        let mut ctx = ComposeContext::new(Value::Integer(1));
        ctx.bind("limit", Value::Integer(10));
        let additional = ctx.into_additional_bindings();
        assert_eq!(additional.len(), 1);
        assert_eq!(additional.get("limit"), Some(&Value::Integer(10)));
    }
}
