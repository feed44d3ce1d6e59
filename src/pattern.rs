//! Path patterns with named parameters.
//!
//! A pattern is literal text interleaved with `:name` parameters. A parameter
//! may carry a regular-expression constraint in parentheses (`:id(\d+)`);
//! without one it matches a single path segment. Patterns are compiled into a
//! start-anchored regex so that a state with children can consume a prefix of
//! the address and leave the rest to its nested routes.

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::types::Params;

/// Default expression for an unconstrained parameter.
const SEGMENT: &str = "[^/]+";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param {
        name: String,
        constraint: Option<String>,
    },
}

/// A compiled path pattern.
#[derive(Clone, Debug)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    params: Vec<String>,
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern such as `/users/:id` or `/files/:name([a-z]+)`.
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| RouterError::InvalidPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = source.chars().collect();
        let mut segments = Vec::new();
        let mut params: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let starts_param = c == ':' && chars.get(i + 1).is_some_and(|n| is_name_char(*n));
            if !starts_param {
                literal.push(c);
                i += 1;
                continue;
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            i += 1;
            let mut name = String::new();
            while i < chars.len() && is_name_char(chars[i]) {
                name.push(chars[i]);
                i += 1;
            }

            let mut constraint = None;
            if chars.get(i) == Some(&'(') {
                let (expr, next) =
                    read_group(&chars, i).ok_or_else(|| invalid("unbalanced parameter constraint"))?;
                if expr.is_empty() {
                    return Err(invalid("empty parameter constraint"));
                }
                constraint = Some(expr);
                i = next;
            }

            if params.contains(&name) {
                return Err(invalid(&format!("duplicate parameter \"{}\"", name)));
            }
            params.push(name.clone());
            segments.push(Segment::Param { name, constraint });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut expr = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => expr.push_str(&regex::escape(text)),
                Segment::Param { name, constraint } => {
                    let body = constraint.as_deref().unwrap_or(SEGMENT);
                    expr.push_str(&format!("(?P<{}>(?:{}))", name, body));
                }
            }
        }

        let regex = Regex::new(&expr).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            segments,
            params,
            regex,
        })
    }

    /// The pattern text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared parameter names, in pattern order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Match the pattern against the start of `text`.
    pub fn captures(&self, text: &str) -> Option<Params> {
        let caps = self.regex.captures(text)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// Rebuild the literal path from parameter values.
    ///
    /// Returns `None` if a declared parameter is missing.
    pub fn to_path(&self, params: &Params) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { name, .. } => path.push_str(params.get(name)?),
            }
        }
        Some(path)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read a parenthesized group starting at `open`, honouring nesting and
/// backslash escapes. Returns the inner text and the index after `)`.
fn read_group(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut inner = String::new();
    let mut i = open;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                inner.push(c);
                let escaped = *chars.get(i + 1)?;
                inner.push(escaped);
                i += 2;
                continue;
            }
            '(' => {
                depth += 1;
                if depth > 1 {
                    inner.push(c);
                }
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((inner, i + 1));
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("/settings").unwrap();
        assert!(pattern.params().is_empty());
        assert_eq!(pattern.captures("/settings"), Some(Params::new()));
        assert_eq!(pattern.captures("/settings/profile"), Some(Params::new()));
        assert_eq!(pattern.captures("/other"), None);
        assert_eq!(pattern.to_path(&Params::new()).as_deref(), Some("/settings"));
    }

    #[test]
    fn test_named_parameters() {
        let pattern = PathPattern::parse("/users/:id/posts/:post_id").unwrap();
        assert_eq!(pattern.params(), ["id", "post_id"]);

        let caps = pattern.captures("/users/42/posts/7").unwrap();
        assert_eq!(caps, params(&[("id", "42"), ("post_id", "7")]));
        assert_eq!(pattern.to_path(&caps).as_deref(), Some("/users/42/posts/7"));
    }

    #[test]
    fn test_parameter_stops_at_segment() {
        let pattern = PathPattern::parse("/users/:id").unwrap();
        let caps = pattern.captures("/users/42/settings").unwrap();
        assert_eq!(caps, params(&[("id", "42")]));
    }

    #[test]
    fn test_constrained_parameter() {
        let pattern = PathPattern::parse(r"/users/:id(\d+)").unwrap();
        assert_eq!(pattern.captures("/users/42"), Some(params(&[("id", "42")])));
        assert_eq!(pattern.captures("/users/abc"), None);
    }

    #[test]
    fn test_constraint_with_alternation_and_groups() {
        let pattern = PathPattern::parse("/:kind(post|page)/:slug((?:[a-z]|-)+)").unwrap();
        assert_eq!(
            pattern.captures("/page/hello-world"),
            Some(params(&[("kind", "page"), ("slug", "hello-world")]))
        );
        assert_eq!(pattern.captures("/user/x"), None);
    }

    #[test]
    fn test_escaped_paren_in_constraint() {
        let pattern = PathPattern::parse(r"/v/:x(a\)b)").unwrap();
        assert_eq!(pattern.captures("/v/a)b"), Some(params(&[("x", "a)b")])));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = PathPattern::parse("/a.b+c").unwrap();
        assert!(pattern.captures("/a.b+c").is_some());
        assert!(pattern.captures("/axbbc").is_none());
    }

    #[test]
    fn test_colon_without_name_is_literal() {
        let pattern = PathPattern::parse("/time/:/x").unwrap();
        assert!(pattern.params().is_empty());
        assert!(pattern.captures("/time/:/x").is_some());
    }

    #[test]
    fn test_to_path_missing_param() {
        let pattern = PathPattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.to_path(&Params::new()), None);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            PathPattern::parse("/users/:id(\\d+"),
            Err(RouterError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/:id()"),
            Err(RouterError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/:id/:id"),
            Err(RouterError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/:id([)"),
            Err(RouterError::InvalidPattern { .. })
        ));
    }
}
