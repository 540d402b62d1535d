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

//! Error types for MapSQL
//!
//! One crate-wide error enum covering composition-time failures (which are
//! always fatal), pipeline lifecycle violations, and propagated backend
//! failures.

use thiserror::Error;

/// Result type alias for MapSQL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for MapSQL operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Pipeline lifecycle errors
    // =========================================================================
    /// Any call on a closed executor fails fast
    #[error("executor is closed")]
    ExecutorClosed,

    /// Statement id not present in the configuration
    #[error("statement '{0}' not found")]
    StatementNotFound(String),

    /// A nested query re-entered on the same cache identity while it was in flight
    #[error("circular query detected for statement '{0}'")]
    CircularQuery(String),

    /// A single-row lookup matched more than one row
    #[error("expected at most one result, got {0}")]
    TooManyResults(usize),

    // =========================================================================
    // Composition errors (fatal, never produce partial SQL)
    // =========================================================================
    /// A `#{...}` or `${...}` token was opened but never closed
    #[error("unclosed token starting at offset {offset} in '{text}'")]
    UnclosedToken { text: String, offset: usize },

    /// A `#{...}` token body could not be parsed
    #[error("malformed placeholder '{0}'")]
    MalformedPlaceholder(String),

    /// A test or substitution expression failed to parse
    #[error("cannot parse expression '{expression}': {message}")]
    ExpressionParse { expression: String, message: String },

    /// A `${...}` substitution evaluated to null
    #[error("substitution expression '{0}' evaluated to null")]
    NullSubstitution(String),

    /// A substituted value was rejected by the injection-safety filter
    #[error("value '{value}' rejected by injection filter '{pattern}'")]
    InjectionRejected { value: String, pattern: String },

    // =========================================================================
    // Value errors
    // =========================================================================
    /// Type conversion error
    #[error("type conversion error: cannot convert {from} to {to}")]
    TypeConversion { from: String, to: String },

    /// Division by zero in an expression
    #[error("division by zero in expression")]
    DivisionByZero,

    /// Two values could not be compared
    #[error("cannot compare {left} with {right}")]
    IncomparableValues { left: String, right: String },

    // =========================================================================
    // Transaction errors
    // =========================================================================
    /// Transaction has been closed
    #[error("transaction already closed")]
    TransactionClosed,

    // =========================================================================
    // External collaborator errors (propagated unchanged, never retried)
    // =========================================================================
    /// Failure reported by the connection/statement/result backend
    #[error("backend error: {0}")]
    Backend(String),

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new ExpressionParse error
    pub fn expression_parse(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ExpressionParse {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create a new TypeConversion error
    pub fn type_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::TypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a composition-time (template/expression) error
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::UnclosedToken { .. }
                | Error::MalformedPlaceholder(_)
                | Error::ExpressionParse { .. }
                | Error::NullSubstitution(_)
                | Error::InjectionRejected { .. }
        )
    }

    /// Check if this is a lifecycle violation (programmer error)
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            Error::ExecutorClosed | Error::TransactionClosed | Error::CircularQuery(_)
        )
    }
}
