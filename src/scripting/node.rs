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

//! Dynamic fragment trees
//!
//! A statement's SQL is a tree of fragment nodes. Applying the tree to a
//! `ComposeContext` walks it top-down, appending the text of every
//! fragment whose conditions hold. `${...}` substitution happens here,
//! during composition; `#{...}` placeholders are left untouched for the
//! binder to rewrite afterwards.

use regex::Regex;

use crate::core::{Error, Result, Value};
use crate::scripting::context::ComposeContext;
use crate::scripting::expr::Expr;
use crate::scripting::token::parse_tokens;

/// Substitution token delimiters (`${...}`)
pub const SUBST_OPEN: &str = "${";
/// Substitution token close delimiter
pub const SUBST_CLOSE: &str = "}";

/// One node of a dynamic fragment tree
#[derive(Debug, Clone)]
pub enum SqlNode {
    /// Literal text with no substitution tokens
    Static(String),
    /// Text scanned for `${...}` substitution tokens; re-rendered per
    /// call when any token is present
    Text {
        segments: Vec<TextSegment>,
        injection_filter: Option<Regex>,
    },
    /// Contents included only when the test expression is true
    If { test: Expr, contents: Box<SqlNode> },
    /// Contents wrapped with a prefix/suffix, with leading/trailing
    /// keyword overrides stripped, all applied only when the contents
    /// produced text
    Trim {
        contents: Box<SqlNode>,
        prefix: String,
        suffix: String,
        prefix_overrides: Vec<String>,
        suffix_overrides: Vec<String>,
    },
    /// Sequence of child nodes
    Mixed(Vec<SqlNode>),
}

/// One piece of a substitution-bearing text node
#[derive(Debug, Clone)]
pub enum TextSegment {
    /// Literal text between tokens
    Literal(String),
    /// A `${...}` token: the raw body plus its compiled expression
    Subst { source: String, expr: Expr },
}

// Sentinel spliced in for each token so literals can be recovered from
// the scanner's output. SQL text never contains NUL.
const SUBST_MARK: char = '\u{0}';

impl SqlNode {
    /// Literal text node
    pub fn static_text(sql: impl Into<String>) -> SqlNode {
        SqlNode::Static(sql.into())
    }

    /// Text node with `${...}` tokens compiled, optionally guarded by an
    /// injection filter every substituted value must fully match
    pub fn text(raw: &str, injection_filter: Option<&str>) -> Result<SqlNode> {
        let mut substs = Vec::new();
        let marked = parse_tokens(raw, SUBST_OPEN, SUBST_CLOSE, |body| {
            substs.push(TextSegment::Subst {
                source: body.to_string(),
                expr: Expr::compile(body)?,
            });
            Ok(SUBST_MARK.to_string())
        })?;

        let mut segments = Vec::new();
        let mut substs = substs.into_iter();
        for (i, literal) in marked.split(SUBST_MARK).enumerate() {
            if i > 0 {
                if let Some(subst) = substs.next() {
                    segments.push(subst);
                }
            }
            if !literal.is_empty() {
                segments.push(TextSegment::Literal(literal.to_string()));
            }
        }

        let injection_filter = match injection_filter {
            Some(pattern) => Some(
                Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|e| Error::expression_parse(pattern, e.to_string()))?,
            ),
            None => None,
        };
        Ok(SqlNode::Text {
            segments,
            injection_filter,
        })
    }

    /// Conditional node; the test is compiled once
    pub fn cond(test: &str, contents: SqlNode) -> Result<SqlNode> {
        Ok(SqlNode::If {
            test: Expr::compile(test)?,
            contents: Box::new(contents),
        })
    }

    /// Trim node with explicit prefix/suffix and override lists
    pub fn trim(
        contents: SqlNode,
        prefix: &str,
        prefix_overrides: &[&str],
        suffix: &str,
        suffix_overrides: &[&str],
    ) -> SqlNode {
        SqlNode::Trim {
            contents: Box::new(contents),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            prefix_overrides: prefix_overrides.iter().map(|s| s.to_string()).collect(),
            suffix_overrides: suffix_overrides.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Sequence node
    pub fn mixed(children: Vec<SqlNode>) -> SqlNode {
        SqlNode::Mixed(children)
    }

    /// `WHERE` preset: prefixes the contents with `WHERE` and strips a
    /// leading `AND `/`OR ` left over from an excluded first condition
    pub fn where_clause(contents: SqlNode) -> SqlNode {
        SqlNode::trim(contents, "WHERE", &["AND ", "OR "], "", &[])
    }

    /// `SET` preset: prefixes the contents with `SET` and strips a
    /// trailing comma left over from an excluded last assignment
    pub fn set_clause(contents: SqlNode) -> SqlNode {
        SqlNode::trim(contents, "SET", &[], "", &[","])
    }

    /// Whether composition can differ between calls. Static-only trees
    /// compose once; anything else recomposes per call. A text node
    /// without any `${...}` token is static.
    pub fn is_dynamic(&self) -> bool {
        match self {
            SqlNode::Static(_) => false,
            SqlNode::Text { segments, .. } => segments
                .iter()
                .any(|segment| matches!(segment, TextSegment::Subst { .. })),
            SqlNode::If { .. } => true,
            SqlNode::Trim { contents, .. } => contents.is_dynamic(),
            SqlNode::Mixed(children) => children.iter().any(SqlNode::is_dynamic),
        }
    }

    /// Apply this node to the context, appending composed text. Returns
    /// whether the node contributed.
    pub fn apply(&self, ctx: &mut ComposeContext) -> Result<bool> {
        match self {
            SqlNode::Static(sql) => {
                ctx.append_sql(sql);
                Ok(true)
            }
            SqlNode::Text {
                segments,
                injection_filter,
            } => {
                let mut rendered = String::new();
                for segment in segments {
                    match segment {
                        TextSegment::Literal(text) => rendered.push_str(text),
                        TextSegment::Subst { source, expr } => {
                            let value = expr.eval(ctx)?;
                            if value == Value::Null {
                                return Err(Error::NullSubstitution(source.clone()));
                            }
                            let text = value.to_string();
                            if let Some(filter) = injection_filter {
                                if !filter.is_match(&text) {
                                    return Err(Error::InjectionRejected {
                                        value: text,
                                        pattern: filter.as_str().to_string(),
                                    });
                                }
                            }
                            rendered.push_str(&text);
                        }
                    }
                }
                ctx.append_sql(&rendered);
                Ok(true)
            }
            SqlNode::If { test, contents } => {
                if test.eval_bool(ctx)? {
                    contents.apply(ctx)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            SqlNode::Trim {
                contents,
                prefix,
                suffix,
                prefix_overrides,
                suffix_overrides,
            } => {
                // Compose the contents into an isolated buffer so the
                // overrides see only this node's text.
                let mut outer = String::new();
                ctx.swap_buffer(&mut outer);
                let applied = contents.apply(ctx);
                let mut inner = outer;
                ctx.swap_buffer(&mut inner);
                applied?;

                let trimmed = apply_trim(
                    inner.trim(),
                    prefix,
                    suffix,
                    prefix_overrides,
                    suffix_overrides,
                );
                if trimmed.is_empty() {
                    return Ok(false);
                }
                ctx.append_sql(&trimmed);
                Ok(true)
            }
            SqlNode::Mixed(children) => {
                let mut any = false;
                for child in children {
                    any |= child.apply(ctx)?;
                }
                Ok(any)
            }
        }
    }
}

fn apply_trim(
    text: &str,
    prefix: &str,
    suffix: &str,
    prefix_overrides: &[String],
    suffix_overrides: &[String],
) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut body = text;
    // Overrides match case-insensitively; only the first hit is removed.
    // Overrides are ASCII, so byte comparison cannot split a character.
    for over in prefix_overrides {
        if body.len() >= over.len()
            && body.as_bytes()[..over.len()].eq_ignore_ascii_case(over.as_bytes())
        {
            body = body[over.len()..].trim_start();
            break;
        }
    }
    for over in suffix_overrides {
        if body.len() >= over.len()
            && body.as_bytes()[body.len() - over.len()..].eq_ignore_ascii_case(over.as_bytes())
        {
            body = body[..body.len() - over.len()].trim_end();
            break;
        }
    }
    if body.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(prefix.len() + body.len() + suffix.len() + 2);
    if !prefix.is_empty() {
        out.push_str(prefix);
        out.push(' ');
    }
    out.push_str(body);
    if !suffix.is_empty() {
        out.push(' ');
        out.push_str(suffix);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_map;

    fn compose(node: &SqlNode, parameter: Value) -> Result<String> {
        let mut ctx = ComposeContext::new(parameter);
        node.apply(&mut ctx)?;
        Ok(ctx.sql().to_string())
    }

    #[test]
    fn test_static_and_mixed() {
        let node = SqlNode::mixed(vec![
            SqlNode::static_text("SELECT *"),
            SqlNode::static_text("FROM users"),
        ]);
        assert!(!node.is_dynamic());
        assert_eq!(
            compose(&node, Value::Null).unwrap(),
            "SELECT * FROM users"
        );
    }

    #[test]
    fn test_if_inclusion() {
        let node = SqlNode::mixed(vec![
            SqlNode::static_text("SELECT * FROM users"),
            SqlNode::cond(
                "name != null",
                SqlNode::static_text("WHERE name = #{name}"),
            )
            .unwrap(),
        ]);
        assert!(node.is_dynamic());

        let with = compose(&node, value_map! { "name" => "Alice" }).unwrap();
        assert_eq!(with, "SELECT * FROM users WHERE name = #{name}");

        let without = compose(&node, value_map! { "age" => 3 }).unwrap();
        assert_eq!(without, "SELECT * FROM users");
    }

    #[test]
    fn test_substitution() {
        let node = SqlNode::text("ORDER BY ${column}", None).unwrap();
        assert!(node.is_dynamic());
        let sql = compose(&node, value_map! { "column" => "created_at" }).unwrap();
        assert_eq!(sql, "ORDER BY created_at");
    }

    #[test]
    fn test_token_free_text_is_static() {
        let node = SqlNode::text("ORDER BY id", None).unwrap();
        assert!(!node.is_dynamic());
        assert_eq!(compose(&node, Value::Null).unwrap(), "ORDER BY id");
    }

    #[test]
    fn test_null_substitution_fails() {
        let node = SqlNode::text("ORDER BY ${column}", None).unwrap();
        let err = compose(&node, value_map! { "other" => 1 }).unwrap_err();
        assert_eq!(err, Error::NullSubstitution("column".to_string()));
    }

    #[test]
    fn test_injection_filter() {
        let node = SqlNode::text("ORDER BY ${column}", Some(r"[a-z_]+")).unwrap();
        assert_eq!(
            compose(&node, value_map! { "column" => "name" }).unwrap(),
            "ORDER BY name"
        );

        let err = compose(&node, value_map! { "column" => "name; DROP TABLE" }).unwrap_err();
        assert!(matches!(err, Error::InjectionRejected { .. }));
    }

    #[test]
    fn test_where_strips_leading_and() {
        let node = SqlNode::mixed(vec![
            SqlNode::static_text("SELECT * FROM users"),
            SqlNode::where_clause(SqlNode::mixed(vec![
                SqlNode::cond("id != null", SqlNode::static_text("AND id = #{id}")).unwrap(),
                SqlNode::cond("name != null", SqlNode::static_text("AND name = #{name}"))
                    .unwrap(),
            ])),
        ]);

        let both = compose(&node, value_map! { "id" => 1, "name" => "x" }).unwrap();
        assert_eq!(
            both,
            "SELECT * FROM users WHERE id = #{id} AND name = #{name}"
        );

        let second_only = compose(&node, value_map! { "name" => "x" }).unwrap();
        assert_eq!(second_only, "SELECT * FROM users WHERE name = #{name}");

        let none = compose(&node, Value::Null).unwrap();
        assert_eq!(none, "SELECT * FROM users");
    }

    #[test]
    fn test_set_strips_trailing_comma() {
        let node = SqlNode::mixed(vec![
            SqlNode::static_text("UPDATE users"),
            SqlNode::set_clause(SqlNode::mixed(vec![
                SqlNode::cond("name != null", SqlNode::static_text("name = #{name},"))
                    .unwrap(),
                SqlNode::cond("age != null", SqlNode::static_text("age = #{age},")).unwrap(),
            ])),
            SqlNode::static_text("WHERE id = #{id}"),
        ]);

        let sql = compose(&node, value_map! { "name" => "x", "id" => 1 }).unwrap();
        assert_eq!(sql, "UPDATE users SET name = #{name} WHERE id = #{id}");
    }

    #[test]
    fn test_trim_custom_overrides() {
        let inner = SqlNode::static_text("OR a = 1 OR b = 2");
        let node = SqlNode::trim(inner, "(", &["AND ", "OR "], ")", &[]);
        assert_eq!(compose(&node, Value::Null).unwrap(), "( a = 1 OR b = 2 )");
    }

    #[test]
    fn test_empty_trim_contributes_nothing() {
        let node = SqlNode::where_clause(
            SqlNode::cond("id != null", SqlNode::static_text("AND id = #{id}")).unwrap(),
        );
        assert_eq!(compose(&node, Value::Null).unwrap(), "");
    }
}
