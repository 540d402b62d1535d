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

//! Composite cache identity
//!
//! A `CacheKey` folds the components that determine whether two query
//! executions would return identical results: statement id, row bounds,
//! final SQL text, every bound argument, and the environment id. The
//! running hash and checksum make inequality cheap; equality always
//! falls back to comparing the full component history, so hash collisions
//! can never alias two different queries.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::Value;

const MULTIPLIER: i64 = 37;
const SEED_HASH: i64 = 17;

// Hash contribution of a null component. Distinct from any real value's
// hash path so `[null]` and `[]` produce different keys.
const NULL_COMPONENT_HASH: i64 = 1;

/// Composite identity of one query execution
#[derive(Debug, Clone)]
pub struct CacheKey {
    hash: i64,
    checksum: i64,
    count: usize,
    updates: Vec<Value>,
}

impl CacheKey {
    /// An empty key; fold components with [`CacheKey::update`]
    pub fn new() -> Self {
        Self {
            hash: SEED_HASH,
            checksum: 0,
            count: 0,
            updates: Vec::new(),
        }
    }

    /// Fold one component into the identity.
    ///
    /// Arrays fold element by element, so an array component and the
    /// same elements folded individually produce the same identity.
    pub fn update(&mut self, value: Value) {
        if let Value::Array(items) = &value {
            for item in items.iter() {
                self.update(item.clone());
            }
            return;
        }
        let base = if value.is_null() {
            NULL_COMPONENT_HASH
        } else {
            value.identity_hash()
        };
        self.count += 1;
        self.checksum = self.checksum.wrapping_add(base);
        let scaled = base.wrapping_mul(self.count as i64);
        self.hash = MULTIPLIER.wrapping_mul(self.hash).wrapping_add(scaled);
        self.updates.push(value);
    }

    /// Number of folded components (array elements counted individually)
    pub fn component_count(&self) -> usize {
        self.count
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Cheap rejections first; the component history decides.
        self.hash == other.hash
            && self.checksum == other.checksum
            && self.count == other.count
            && self.updates == other.updates
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.hash);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.checksum)?;
        for update in &self.updates {
            write!(f, ":{update}")?;
        }
        Ok(())
    }
}
