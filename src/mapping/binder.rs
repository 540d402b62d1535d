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

//! `#{...}` placeholder rewriting
//!
//! The binder runs after composition: every `#{...}` token in the composed
//! text becomes a positional `?` marker and one `ParameterMapping`, in
//! left-to-right order.

use rustc_hash::FxHashMap;

use crate::core::{Result, TypeRegistry, TypeSpec, Value};
use crate::mapping::parameter::ParameterMapping;
use crate::scripting::parse_tokens;

/// Placeholder token delimiters (`#{...}`)
pub const BIND_OPEN: &str = "#{";
/// Placeholder token close delimiter
pub const BIND_CLOSE: &str = "}";

/// Rewrite `#{...}` tokens to `?` markers, collecting a mapping per token
pub fn bind_placeholders(
    sql: &str,
    parameter_type: TypeSpec,
    bindings: &FxHashMap<String, Value>,
    types: &TypeRegistry,
) -> Result<(String, Vec<ParameterMapping>)> {
    let mut mappings = Vec::new();
    let rewritten = parse_tokens(sql, BIND_OPEN, BIND_CLOSE, |body| {
        mappings.push(ParameterMapping::parse(
            body,
            parameter_type,
            bindings,
            types,
        )?);
        Ok("?".to_string())
    })?;
    Ok((rewritten, mappings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_order() {
        let types = TypeRegistry::standard();
        let (sql, mappings) = bind_placeholders(
            "UPDATE t SET a = #{a}, b = #{b, type=int} WHERE id = #{id}",
            TypeSpec::Unknown,
            &FxHashMap::default(),
            &types,
        )
        .unwrap();

        assert_eq!(sql, "UPDATE t SET a = ?, b = ? WHERE id = ?");
        let properties: Vec<_> = mappings.iter().map(ParameterMapping::property).collect();
        assert_eq!(properties, vec!["a", "b", "id"]);
        assert_eq!(mappings[1].value_type(), TypeSpec::Integer);
    }

    #[test]
    fn test_no_placeholders() {
        let types = TypeRegistry::standard();
        let (sql, mappings) =
            bind_placeholders("SELECT 1", TypeSpec::Unknown, &FxHashMap::default(), &types)
                .unwrap();
        assert_eq!(sql, "SELECT 1");
        assert!(mappings.is_empty());
    }

    #[test]
    fn test_unclosed_placeholder() {
        let types = TypeRegistry::standard();
        let err = bind_placeholders(
            "SELECT #{id",
            TypeSpec::Unknown,
            &FxHashMap::default(),
            &types,
        )
        .unwrap_err();
        assert!(matches!(err, crate::core::Error::UnclosedToken { .. }));
    }
}
