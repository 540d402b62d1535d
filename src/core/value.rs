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

//! Runtime parameter and result values
//!
//! `Value` is the single dynamic value type flowing through the pipeline:
//! caller parameters, composition bindings, bound arguments and result
//! columns are all `Value`s. Structured parameters ("beans") are `Map`
//! values; property paths like `user.tags[0]` traverse them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHasher;

use crate::core::types::TypeSpec;

/// Dynamic value used for parameters, bindings and result columns
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL NULL / absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Text value (shared, immutable)
    Text(Arc<str>),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Ordered sequence of values
    Array(Arc<Vec<Value>>),
    /// Named fields (structured parameter object)
    Map(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Create a text value
    pub fn text(s: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(s.as_ref()))
    }

    /// Create an array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::new(values))
    }

    /// Create a map value
    pub fn map(fields: BTreeMap<String, Value>) -> Self {
        Value::Map(Arc::new(fields))
    }

    /// Check whether this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The runtime type tag of this value
    pub fn type_spec(&self) -> TypeSpec {
        match self {
            Value::Null => TypeSpec::Unknown,
            Value::Boolean(_) => TypeSpec::Boolean,
            Value::Integer(_) => TypeSpec::Integer,
            Value::Float(_) => TypeSpec::Float,
            Value::Text(_) => TypeSpec::Text,
            Value::Timestamp(_) => TypeSpec::Timestamp,
            Value::Array(_) | Value::Map(_) => TypeSpec::Unknown,
        }
    }

    /// Resolve a dotted/indexed property path against this value.
    ///
    /// `user.tags[0]` resolves field `user`, then field `tags`, then
    /// element 0. Returns `None` when any step is missing; a missing
    /// property is not an error at this level.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let mut current = self.clone();
        for segment in PathSegments::new(path) {
            current = match (segment, &current) {
                (PathSegment::Field(name), Value::Map(fields)) => fields.get(name)?.clone(),
                (PathSegment::Index(i), Value::Array(items)) => items.get(i)?.clone(),
                _ => return None,
            };
        }
        Some(current)
    }

    /// Deterministic scalar hash used by the cache identity fold.
    ///
    /// Stable across runs (FxHasher carries no random seed). Arrays and
    /// maps hash their elements in order; the identity builder folds
    /// arrays element-by-element before this is ever called on one.
    pub fn identity_hash(&self) -> i64 {
        let mut hasher = FxHasher::default();
        self.fold_hash(&mut hasher);
        hasher.finish() as i64
    }

    fn fold_hash(&self, hasher: &mut FxHasher) {
        match self {
            Value::Null => hasher.write_u8(0),
            Value::Boolean(b) => {
                hasher.write_u8(1);
                hasher.write_u8(u8::from(*b));
            }
            Value::Integer(i) => {
                hasher.write_u8(2);
                hasher.write_i64(*i);
            }
            Value::Float(f) => {
                hasher.write_u8(3);
                hasher.write_u64(f.to_bits());
            }
            Value::Text(s) => {
                hasher.write_u8(4);
                hasher.write(s.as_bytes());
            }
            Value::Timestamp(ts) => {
                hasher.write_u8(5);
                hasher.write_i64(ts.timestamp());
                hasher.write_u32(ts.timestamp_subsec_nanos());
            }
            Value::Array(items) => {
                hasher.write_u8(6);
                hasher.write_usize(items.len());
                for item in items.iter() {
                    item.fold_hash(hasher);
                }
            }
            Value::Map(fields) => {
                hasher.write_u8(7);
                hasher.write_usize(fields.len());
                for (name, value) in fields.iter() {
                    hasher.write(name.as_bytes());
                    value.fold_hash(hasher);
                }
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64).to_bits() == b.to_bits()
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Numeric ordering where both sides are numbers, lexicographic for
    /// text, chronological for timestamps. `None` for incomparable pairs.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v.as_str()))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Build a `Value::Map` parameter object from field/value pairs
///
/// ```ignore
/// let param = value_map! { "name" => "Alice", "age" => 30i64 };
/// ```
#[macro_export]
macro_rules! value_map {
    () => {
        $crate::Value::map(std::collections::BTreeMap::new())
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut fields = std::collections::BTreeMap::new();
        $(
            fields.insert($name.to_string(), $crate::Value::from($value));
        )+
        $crate::Value::map(fields)
    }};
}

enum PathSegment<'a> {
    Field(&'a str),
    Index(usize),
    Malformed,
}

/// Iterator over `a.b[0].c` style path segments
struct PathSegments<'a> {
    rest: &'a str,
}

impl<'a> PathSegments<'a> {
    fn new(path: &'a str) -> Self {
        Self { rest: path }
    }
}

impl<'a> Iterator for PathSegments<'a> {
    type Item = PathSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        if let Some(stripped) = self.rest.strip_prefix('[') {
            // An unterminated bracket or non-numeric index poisons the
            // whole path rather than stopping at the parent value.
            let Some(end) = stripped.find(']') else {
                self.rest = "";
                return Some(PathSegment::Malformed);
            };
            let Ok(index) = stripped[..end].trim().parse::<usize>() else {
                self.rest = "";
                return Some(PathSegment::Malformed);
            };
            self.rest = stripped[end + 1..].strip_prefix('.').unwrap_or(&stripped[end + 1..]);
            return Some(PathSegment::Index(index));
        }
        let end = self
            .rest
            .find(|c| c == '.' || c == '[')
            .unwrap_or(self.rest.len());
        let (field, rest) = self.rest.split_at(end);
        self.rest = rest.strip_prefix('.').unwrap_or(rest);
        Some(PathSegment::Field(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from("hello"), Value::text("hello"));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
        assert_eq!(Value::from(Some(1i64)), Value::Integer(1));
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::Float(2.5));
    }

    #[test]
    fn test_get_path() {
        let param = value_map! {
            "name" => "Alice",
            "tags" => Value::array(vec![Value::text("a"), Value::text("b")]),
            "address" => value_map! { "city" => "Berlin" },
        };

        assert_eq!(param.get_path("name"), Some(Value::text("Alice")));
        assert_eq!(param.get_path("tags[1]"), Some(Value::text("b")));
        assert_eq!(param.get_path("address.city"), Some(Value::text("Berlin")));
        assert_eq!(param.get_path("missing"), None);
        assert_eq!(param.get_path("tags[9]"), None);
        assert_eq!(param.get_path("name.deeper"), None);
        // Malformed index segments fail the whole path.
        assert_eq!(param.get_path("tags[x]"), None);
        assert_eq!(param.get_path("tags[1"), None);
    }

    #[test]
    fn test_identity_hash_deterministic() {
        let a = value_map! { "id" => 7i64, "name" => "x" };
        let b = value_map! { "id" => 7i64, "name" => "x" };
        assert_eq!(a.identity_hash(), b.identity_hash());

        let c = value_map! { "id" => 8i64, "name" => "x" };
        assert_ne!(a.identity_hash(), c.identity_hash());
    }

    #[test]
    fn test_identity_hash_discriminates_types() {
        // 1i64 and true must not collide through naive casting
        assert_ne!(
            Value::Integer(1).identity_hash(),
            Value::Boolean(true).identity_hash()
        );
        assert_ne!(Value::Null.identity_hash(), Value::Integer(0).identity_hash());
    }

    #[test]
    fn test_partial_cmp() {
        use std::cmp::Ordering;
        assert_eq!(
            Value::Integer(1).partial_cmp_value(&Value::Float(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::text("b").partial_cmp_value(&Value::text("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Integer(1).partial_cmp_value(&Value::text("a")), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::array(vec![Value::Integer(1), Value::Integer(2)]).to_string(), "[1, 2]");
    }
}
