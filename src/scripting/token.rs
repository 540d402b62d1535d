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

//! Generic delimiter-token scanning
//!
//! Both placeholder families (`#{...}` for bind parameters, `${...}` for
//! text substitution) are scanned with the same routine: find each
//! `open...close` token left to right, hand the body to a handler, splice
//! the handler's replacement into the output. A backslash before the open
//! delimiter escapes it.

use crate::core::{Error, Result};

/// Replace every `open...close` token in `text` with the handler's output.
///
/// The handler receives the raw token body (delimiters stripped). An open
/// delimiter with no matching close is a fatal composition error.
pub fn parse_tokens(
    text: &str,
    open: &str,
    close: &str,
    mut handler: impl FnMut(&str) -> Result<String>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut offset = 0usize;

    while let Some(start) = rest.find(open) {
        // A backslash immediately before the delimiter escapes it.
        if start > 0 && rest.as_bytes()[start - 1] == b'\\' {
            out.push_str(&rest[..start - 1]);
            out.push_str(open);
            rest = &rest[start + open.len()..];
            offset += start + open.len();
            continue;
        }
        out.push_str(&rest[..start]);
        let body_start = start + open.len();
        let Some(end) = rest[body_start..].find(close) else {
            return Err(Error::UnclosedToken {
                text: text.to_string(),
                offset: offset + start,
            });
        };
        let body = &rest[body_start..body_start + end];
        out.push_str(&handler(body)?);
        rest = &rest[body_start + end + close.len()..];
        offset += body_start + end + close.len();
    }
    out.push_str(rest);
    Ok(out)
}

/// Whether `text` contains at least one unescaped `open...close` token
pub fn contains_token(text: &str, open: &str, close: &str) -> bool {
    let mut found = false;
    // The scan itself cannot fail other than on an unclosed token, in
    // which case the later real parse reports the error.
    let _ = parse_tokens(text, open, close, |_| {
        found = true;
        Ok(String::new())
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(body: &str) -> Result<String> {
        Ok(body.to_uppercase())
    }

    #[test]
    fn test_parse_basic() {
        let out = parse_tokens("SELECT #{id}, #{name} FROM t", "#{", "}", upper).unwrap();
        assert_eq!(out, "SELECT ID, NAME FROM t");
    }

    #[test]
    fn test_parse_no_tokens() {
        let out = parse_tokens("SELECT 1", "#{", "}", upper).unwrap();
        assert_eq!(out, "SELECT 1");
    }

    #[test]
    fn test_parse_escaped() {
        let out = parse_tokens(r"SELECT \#{literal}, #{id}", "#{", "}", upper).unwrap();
        assert_eq!(out, "SELECT #{literal}, ID");
    }

    #[test]
    fn test_unclosed_token() {
        let err = parse_tokens("SELECT #{id FROM t", "#{", "}", upper).unwrap_err();
        assert!(matches!(err, Error::UnclosedToken { offset: 7, .. }));
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("WHERE x = ${col}", "${", "}"));
        assert!(!contains_token("WHERE x = #{col}", "${", "}"));
        assert!(!contains_token(r"WHERE x = \${col}", "${", "}"));
    }
}
