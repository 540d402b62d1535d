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

//! Dynamic SQL composition: token scanning, condition expressions,
//! composition context and fragment trees

mod context;
mod expr;
mod node;
mod token;

pub use context::{ComposeContext, PARAMETER_BINDING};
pub use expr::{BindingLookup, Expr};
pub use node::{SqlNode, TextSegment};
pub use token::{contains_token, parse_tokens};
