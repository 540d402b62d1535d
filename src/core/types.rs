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

//! Declared types and value converters
//!
//! A `TypeSpec` is the declared type of a statement parameter, a
//! placeholder, or a result. The `TypeRegistry` resolves the converter
//! used to coerce values at the binding boundary (writes) and the
//! materialization boundary (reads).

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{Error, Result, Value};

/// Declared value type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeSpec {
    /// No declared type; values pass through unconverted
    #[default]
    Unknown,
    /// Boolean
    Boolean,
    /// 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Text
    Text,
    /// UTC timestamp
    Timestamp,
}

impl TypeSpec {
    /// Parse a declared-type attribute (`#{age,type=int}`)
    pub fn parse(text: &str) -> Option<TypeSpec> {
        match text.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(TypeSpec::Boolean),
            "int" | "integer" | "long" => Some(TypeSpec::Integer),
            "float" | "double" => Some(TypeSpec::Float),
            "string" | "text" => Some(TypeSpec::Text),
            "timestamp" | "datetime" => Some(TypeSpec::Timestamp),
            "object" | "unknown" => Some(TypeSpec::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeSpec::Unknown => "Unknown",
            TypeSpec::Boolean => "Boolean",
            TypeSpec::Integer => "Integer",
            TypeSpec::Float => "Float",
            TypeSpec::Text => "Text",
            TypeSpec::Timestamp => "Timestamp",
        };
        write!(f, "{name}")
    }
}

/// Converts values at the binding (write) and materialization (read) edges
pub trait TypeConverter: Send + Sync {
    /// Coerce a parameter value into the form handed to the connection
    fn to_db(&self, value: &Value) -> Result<Value>;

    /// Coerce a raw column value into the declared result form
    fn from_db(&self, value: Value) -> Result<Value>;
}

/// Registry of converters keyed by declared type
pub struct TypeRegistry {
    converters: FxHashMap<TypeSpec, Arc<dyn TypeConverter>>,
    passthrough: Arc<dyn TypeConverter>,
}

impl TypeRegistry {
    /// Registry with the standard scalar converters installed
    pub fn standard() -> Self {
        let mut converters: FxHashMap<TypeSpec, Arc<dyn TypeConverter>> = FxHashMap::default();
        converters.insert(TypeSpec::Boolean, Arc::new(ScalarConverter(TypeSpec::Boolean)));
        converters.insert(TypeSpec::Integer, Arc::new(ScalarConverter(TypeSpec::Integer)));
        converters.insert(TypeSpec::Float, Arc::new(ScalarConverter(TypeSpec::Float)));
        converters.insert(TypeSpec::Text, Arc::new(ScalarConverter(TypeSpec::Text)));
        converters.insert(TypeSpec::Timestamp, Arc::new(ScalarConverter(TypeSpec::Timestamp)));
        Self {
            converters,
            passthrough: Arc::new(Passthrough),
        }
    }

    /// Register (or replace) a converter for a declared type
    pub fn register(&mut self, spec: TypeSpec, converter: Arc<dyn TypeConverter>) {
        self.converters.insert(spec, converter);
    }

    /// Whether a converter is registered for the given declared type
    pub fn has_converter(&self, spec: TypeSpec) -> bool {
        self.converters.contains_key(&spec)
    }

    /// Resolve the converter for a declared type (passthrough for Unknown)
    pub fn converter(&self, spec: TypeSpec) -> Arc<dyn TypeConverter> {
        self.converters
            .get(&spec)
            .cloned()
            .unwrap_or_else(|| self.passthrough.clone())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Converter that hands values through unchanged
struct Passthrough;

impl TypeConverter for Passthrough {
    fn to_db(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        Ok(value)
    }
}

/// Converter for one scalar declared type. Nulls pass through; values of
/// the declared type pass through; a few lossless coercions are accepted;
/// everything else is a conversion error.
struct ScalarConverter(TypeSpec);

impl ScalarConverter {
    fn coerce(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if value.type_spec() == self.0 {
            return Ok(value.clone());
        }
        match (self.0, value) {
            (TypeSpec::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
            (TypeSpec::Text, v) => Ok(Value::text(v.to_string())),
            _ => Err(Error::type_conversion(
                value.type_spec().to_string(),
                self.0.to_string(),
            )),
        }
    }
}

impl TypeConverter for ScalarConverter {
    fn to_db(&self, value: &Value) -> Result<Value> {
        self.coerce(value)
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        self.coerce(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_spec_parse() {
        assert_eq!(TypeSpec::parse("int"), Some(TypeSpec::Integer));
        assert_eq!(TypeSpec::parse("INTEGER"), Some(TypeSpec::Integer));
        assert_eq!(TypeSpec::parse(" string "), Some(TypeSpec::Text));
        assert_eq!(TypeSpec::parse("datetime"), Some(TypeSpec::Timestamp));
        assert_eq!(TypeSpec::parse("widget"), None);
    }

    #[test]
    fn test_registry_has_converter() {
        let registry = TypeRegistry::standard();
        assert!(registry.has_converter(TypeSpec::Integer));
        assert!(registry.has_converter(TypeSpec::Text));
        assert!(!registry.has_converter(TypeSpec::Unknown));
    }

    #[test]
    fn test_scalar_conversion() {
        let registry = TypeRegistry::standard();
        let int_conv = registry.converter(TypeSpec::Integer);

        assert_eq!(int_conv.to_db(&Value::Integer(5)).unwrap(), Value::Integer(5));
        assert_eq!(int_conv.to_db(&Value::Null).unwrap(), Value::Null);
        assert!(int_conv.to_db(&Value::text("x")).is_err());

        let float_conv = registry.converter(TypeSpec::Float);
        assert_eq!(float_conv.to_db(&Value::Integer(2)).unwrap(), Value::Float(2.0));

        let text_conv = registry.converter(TypeSpec::Text);
        assert_eq!(text_conv.to_db(&Value::Integer(7)).unwrap(), Value::text("7"));
    }

    #[test]
    fn test_passthrough_for_unknown() {
        let registry = TypeRegistry::standard();
        let conv = registry.converter(TypeSpec::Unknown);
        let v = Value::array(vec![Value::Integer(1)]);
        assert_eq!(conv.to_db(&v).unwrap(), v);
    }
}
