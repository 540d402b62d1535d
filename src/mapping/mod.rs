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

//! Statement mapping: placeholders, binding, bound queries and
//! statement descriptors

mod binder;
mod bound;
mod parameter;
mod source;
mod statement;

pub use binder::{bind_placeholders, BIND_CLOSE, BIND_OPEN};
pub use bound::BoundQuery;
pub use parameter::ParameterMapping;
pub use source::QuerySource;
pub use statement::{CommandKind, StatementBuilder, StatementDescriptor};
