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

//! Statement descriptors
//!
//! A `StatementDescriptor` is the immutable definition of one mapped
//! statement: id, command kind, query source, declared types, and its
//! cache behavior flags.

use compact_str::CompactString;

use crate::core::{Result, TypeRegistry, TypeSpec};
use crate::mapping::source::QuerySource;
use crate::scripting::SqlNode;

/// SQL command kind of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Kind not declared; treated as a write for cache purposes
    Unknown,
}

impl CommandKind {
    /// Whether this kind reads rather than writes
    pub fn is_select(self) -> bool {
        self == CommandKind::Select
    }
}

/// Immutable definition of one mapped statement
#[derive(Debug)]
pub struct StatementDescriptor {
    id: CompactString,
    kind: CommandKind,
    source: QuerySource,
    parameter_type: TypeSpec,
    result_type: TypeSpec,
    cache_ref: Option<CompactString>,
    flush_cache_required: bool,
    use_cache: bool,
}

impl StatementDescriptor {
    /// Start building a statement from its fragment tree
    pub fn builder(
        id: impl Into<CompactString>,
        kind: CommandKind,
        root: SqlNode,
    ) -> StatementBuilder {
        StatementBuilder {
            id: id.into(),
            kind,
            root,
            parameter_type: TypeSpec::Unknown,
            result_type: TypeSpec::Unknown,
            cache_ref: None,
            flush_cache_required: None,
            use_cache: None,
        }
    }

    /// Statement id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Command kind
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Query source
    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// Declared parameter type
    pub fn parameter_type(&self) -> TypeSpec {
        self.parameter_type
    }

    /// Declared result column type
    pub fn result_type(&self) -> TypeSpec {
        self.result_type
    }

    /// Name of the shared cache this statement participates in, if any
    pub fn cache_ref(&self) -> Option<&str> {
        self.cache_ref.as_deref()
    }

    /// Whether executing this statement invalidates caches first
    pub fn flush_cache_required(&self) -> bool {
        self.flush_cache_required
    }

    /// Whether this statement's results may be served from a shared cache
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }
}

/// Builder for `StatementDescriptor`
#[derive(Debug)]
pub struct StatementBuilder {
    id: CompactString,
    kind: CommandKind,
    root: SqlNode,
    parameter_type: TypeSpec,
    result_type: TypeSpec,
    cache_ref: Option<CompactString>,
    flush_cache_required: Option<bool>,
    use_cache: Option<bool>,
}

impl StatementBuilder {
    /// Declared parameter type
    pub fn parameter_type(mut self, spec: TypeSpec) -> Self {
        self.parameter_type = spec;
        self
    }

    /// Declared result column type
    pub fn result_type(mut self, spec: TypeSpec) -> Self {
        self.result_type = spec;
        self
    }

    /// Attach the statement to a named shared cache
    pub fn cache_ref(mut self, name: impl Into<CompactString>) -> Self {
        self.cache_ref = Some(name.into());
        self
    }

    /// Override the flush-cache flag (defaults to true for writes)
    pub fn flush_cache(mut self, required: bool) -> Self {
        self.flush_cache_required = Some(required);
        self
    }

    /// Override the use-cache flag (defaults to true for selects)
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = Some(enabled);
        self
    }

    /// Collapse the fragment tree and produce the descriptor
    pub fn build(self, types: &TypeRegistry) -> Result<StatementDescriptor> {
        let is_select = self.kind.is_select();
        Ok(StatementDescriptor {
            source: QuerySource::build(self.root, self.parameter_type, types)?,
            id: self.id,
            kind: self.kind,
            parameter_type: self.parameter_type,
            result_type: self.result_type,
            cache_ref: self.cache_ref,
            flush_cache_required: self.flush_cache_required.unwrap_or(!is_select),
            use_cache: self.use_cache.unwrap_or(is_select),
        })
    }
}
