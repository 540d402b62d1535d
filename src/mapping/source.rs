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

//! Query sources
//!
//! A statement's fragment tree collapses to one of two shapes when the
//! statement is built. Trees with no dynamic nodes compose and bind once,
//! up front; the per-call cost is a clone of the finished text. Trees with
//! any dynamic node keep the tree and recompose on every call.

use rustc_hash::FxHashMap;

use crate::core::{Result, TypeRegistry, TypeSpec, Value};
use crate::mapping::binder::bind_placeholders;
use crate::mapping::bound::BoundQuery;
use crate::scripting::{ComposeContext, SqlNode};

/// How a statement turns a parameter into executable SQL
#[derive(Debug, Clone)]
pub enum QuerySource {
    /// Static tree, composed and bound at build time
    Raw {
        sql: String,
        mappings: Vec<crate::mapping::parameter::ParameterMapping>,
    },
    /// Dynamic tree, recomposed per call
    Dynamic {
        root: SqlNode,
        parameter_type: TypeSpec,
    },
}

impl QuerySource {
    /// Collapse a fragment tree into a source
    pub fn build(root: SqlNode, parameter_type: TypeSpec, types: &TypeRegistry) -> Result<Self> {
        if root.is_dynamic() {
            return Ok(QuerySource::Dynamic {
                root,
                parameter_type,
            });
        }
        // Static composition cannot consult the parameter, so a null
        // placeholder parameter is fine here.
        let mut ctx = ComposeContext::new(Value::Null);
        root.apply(&mut ctx)?;
        let (sql, mappings) =
            bind_placeholders(ctx.sql(), parameter_type, &FxHashMap::default(), types)?;
        Ok(QuerySource::Raw { sql, mappings })
    }

    /// Whether this source recomposes per call
    pub fn is_dynamic(&self) -> bool {
        matches!(self, QuerySource::Dynamic { .. })
    }

    /// Produce the bound query for one call
    pub fn bound_query(&self, parameter: Value, types: &TypeRegistry) -> Result<BoundQuery> {
        match self {
            QuerySource::Raw { sql, mappings } => Ok(BoundQuery::new(
                sql.clone(),
                mappings.clone(),
                parameter,
                FxHashMap::default(),
            )),
            QuerySource::Dynamic {
                root,
                parameter_type,
            } => {
                let mut ctx = ComposeContext::new(parameter.clone());
                root.apply(&mut ctx)?;
                let composed = ctx.sql().to_string();
                let additional = ctx.into_additional_bindings();
                let (sql, mappings) =
                    bind_placeholders(&composed, *parameter_type, &additional, types)?;
                Ok(BoundQuery::new(sql, mappings, parameter, additional))
            }
        }
    }
}
