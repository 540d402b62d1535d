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

//! Placeholder parameter mappings
//!
//! Each `#{...}` placeholder becomes one `ParameterMapping`: the property
//! path to pull the argument from, the declared type, and the converter
//! resolved for that type. Mappings are ordered left to right, exactly as
//! the `?` markers appear in the rewritten SQL.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{Error, Result, TypeConverter, TypeRegistry, TypeSpec, Value};

/// One `#{...}` placeholder, resolved
#[derive(Clone)]
pub struct ParameterMapping {
    property: String,
    value_type: TypeSpec,
    converter: Arc<dyn TypeConverter>,
}

impl ParameterMapping {
    /// Parse a placeholder body (`property` or `property,type=int`).
    ///
    /// Type resolution, in order: an explicit `type=` attribute; the
    /// runtime type of a composition binding with the same name; the
    /// statement's declared parameter type when a converter is registered
    /// for it; otherwise unknown (passthrough).
    pub fn parse(
        body: &str,
        parameter_type: TypeSpec,
        bindings: &FxHashMap<String, Value>,
        types: &TypeRegistry,
    ) -> Result<ParameterMapping> {
        let mut parts = body.split(',');
        let property = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::MalformedPlaceholder(body.to_string()))?
            .to_string();

        let mut declared = None;
        for attr in parts {
            let (key, raw) = attr
                .split_once('=')
                .ok_or_else(|| Error::MalformedPlaceholder(body.to_string()))?;
            match key.trim() {
                "type" => {
                    declared = Some(
                        TypeSpec::parse(raw)
                            .ok_or_else(|| Error::MalformedPlaceholder(body.to_string()))?,
                    );
                }
                _ => return Err(Error::MalformedPlaceholder(body.to_string())),
            }
        }

        let value_type = declared.unwrap_or_else(|| {
            if let Some(bound) = bindings.get(&property) {
                bound.type_spec()
            } else if types.has_converter(parameter_type) {
                parameter_type
            } else {
                TypeSpec::Unknown
            }
        });

        Ok(ParameterMapping {
            converter: types.converter(value_type),
            property,
            value_type,
        })
    }

    /// Property path this placeholder pulls its argument from
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Resolved declared type
    pub fn value_type(&self) -> TypeSpec {
        self.value_type
    }

    /// Converter applied at the binding edge
    pub fn converter(&self) -> &Arc<dyn TypeConverter> {
        &self.converter
    }
}

impl fmt::Debug for ParameterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterMapping")
            .field("property", &self.property)
            .field("value_type", &self.value_type)
            .finish()
    }
}

impl PartialEq for ParameterMapping {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property && self.value_type == other.value_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let types = TypeRegistry::standard();
        let m =
            ParameterMapping::parse("name", TypeSpec::Unknown, &FxHashMap::default(), &types)
                .unwrap();
        assert_eq!(m.property(), "name");
        assert_eq!(m.value_type(), TypeSpec::Unknown);
    }

    #[test]
    fn test_parse_typed_attribute() {
        let types = TypeRegistry::standard();
        let m = ParameterMapping::parse(
            "age, type=int",
            TypeSpec::Unknown,
            &FxHashMap::default(),
            &types,
        )
        .unwrap();
        assert_eq!(m.property(), "age");
        assert_eq!(m.value_type(), TypeSpec::Integer);
    }

    #[test]
    fn test_binding_type_wins_over_declared_parameter_type() {
        let types = TypeRegistry::standard();
        let mut bindings = FxHashMap::default();
        bindings.insert("id".to_string(), Value::text("7"));
        let m = ParameterMapping::parse("id", TypeSpec::Integer, &bindings, &types).unwrap();
        assert_eq!(m.value_type(), TypeSpec::Text);
    }

    #[test]
    fn test_declared_parameter_type_for_scalar_parameters() {
        let types = TypeRegistry::standard();
        let m = ParameterMapping::parse("id", TypeSpec::Integer, &FxHashMap::default(), &types)
            .unwrap();
        assert_eq!(m.value_type(), TypeSpec::Integer);
    }

    #[test]
    fn test_binding_type_used_when_parameter_untyped() {
        let types = TypeRegistry::standard();
        let mut bindings = FxHashMap::default();
        bindings.insert("limit".to_string(), Value::Integer(10));
        let m = ParameterMapping::parse("limit", TypeSpec::Unknown, &bindings, &types).unwrap();
        assert_eq!(m.value_type(), TypeSpec::Integer);
    }

    #[test]
    fn test_malformed_bodies() {
        let types = TypeRegistry::standard();
        let bindings = FxHashMap::default();
        for body in ["", "  ", "name, type=widget", "name, nonsense", "name, ="] {
            let err = ParameterMapping::parse(body, TypeSpec::Unknown, &bindings, &types)
                .unwrap_err();
            assert!(matches!(err, Error::MalformedPlaceholder(_)), "{body:?}");
        }
    }
}
