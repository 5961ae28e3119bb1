//! # Property Filters
//!
//! LDAP-style filter expressions (RFC 1960 subset) evaluated against event
//! properties.
//!
//! ```text
//! (&(P>=5)(name=alpha*))
//! (|(state=STARTED)(!(retries<=3)))
//! (host=*)
//! ```
//!
//! ## Matching Rules
//!
//! - Numbers compare numerically when the literal parses as a number
//! - Booleans only support equality
//! - Strings compare lexicographically; `~=` ignores case and whitespace
//! - Arrays match when any element matches
//! - A missing property never matches
//! - Strict `>` and `<` are accepted in addition to the RFC operators

use crate::error::FilterError;
use crate::events::{Event, EVENT_TOPIC_PROPERTY};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a simple filter item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Equal,
    /// `~=`
    Approx,
    /// `>=`
    GreaterEq,
    /// `<=`
    LessEq,
    /// `>` (extension; not part of RFC 1960)
    Greater,
    /// `<` (extension; not part of RFC 1960)
    Less,
}

impl CompareOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Approx => "~=",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::Less => "<",
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        attr: String,
        op: CompareOp,
        value: String,
    },
    Present(String),
    Substring {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let filter = parser.filter()?;
        parser.skip_ws();
        if parser.pos < parser.chars.len() {
            return Err(FilterError::TrailingInput { pos: parser.pos });
        }
        Ok(filter)
    }

    /// Evaluate the filter against an event's properties.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::And(items) => items.iter().all(|f| f.matches(event)),
            Self::Or(items) => items.iter().any(|f| f.matches(event)),
            Self::Not(inner) => !inner.matches(event),
            Self::Present(attr) => lookup(event, attr).is_some(),
            Self::Compare { attr, op, value } => {
                lookup(event, attr).is_some_and(|v| compare_value(&v, *op, value))
            }
            Self::Substring {
                attr,
                initial,
                any,
                last,
            } => lookup(event, attr).is_some_and(|v| {
                substring_value(&v, initial.as_deref(), any, last.as_deref())
            }),
        }
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(items) | Self::Or(items) => {
                f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
                for item in items {
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Not(inner) => write!(f, "(!{inner})"),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::Compare { attr, op, value } => {
                write!(f, "({attr}{}{})", op.as_str(), escape(value))
            }
            Self::Substring {
                attr,
                initial,
                any,
                last,
            } => {
                write!(f, "({attr}=")?;
                if let Some(initial) = initial {
                    f.write_str(&escape(initial))?;
                }
                f.write_str("*")?;
                for part in any {
                    write!(f, "{}*", escape(part))?;
                }
                if let Some(last) = last {
                    f.write_str(&escape(last))?;
                }
                f.write_str(")")
            }
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), FilterError> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(FilterError::Unexpected {
                pos: self.pos,
                found,
                expected,
            }),
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn filter(&mut self) -> Result<Filter, FilterError> {
        self.skip_ws();
        self.expect('(', "'('")?;
        self.skip_ws();
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                Filter::And(self.filter_list()?)
            }
            Some('|') => {
                self.pos += 1;
                Filter::Or(self.filter_list()?)
            }
            Some('!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(FilterError::UnexpectedEnd),
        };
        self.skip_ws();
        self.expect(')', "')'")?;
        Ok(filter)
    }

    fn filter_list(&mut self) -> Result<Vec<Filter>, FilterError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('(') => items.push(self.filter()?),
                Some(found) if items.is_empty() => {
                    return Err(FilterError::Unexpected {
                        pos: self.pos,
                        found,
                        expected: "'('",
                    })
                }
                Some(_) => return Ok(items),
                None => return Err(FilterError::UnexpectedEnd),
            }
        }
    }

    fn item(&mut self) -> Result<Filter, FilterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attr: String = self.chars[start..self.pos].iter().collect();
        let attr = attr.trim().to_string();
        if attr.is_empty() {
            return Err(FilterError::EmptyAttribute { pos: start });
        }

        let op = match self.peek() {
            Some('=') => {
                self.pos += 1;
                CompareOp::Equal
            }
            Some('~') => {
                self.pos += 1;
                self.expect('=', "'='")?;
                CompareOp::Approx
            }
            Some(c @ ('<' | '>')) => {
                self.pos += 1;
                let inclusive = self.peek() == Some('=');
                if inclusive {
                    self.pos += 1;
                }
                match (c, inclusive) {
                    ('<', true) => CompareOp::LessEq,
                    ('<', false) => CompareOp::Less,
                    (_, true) => CompareOp::GreaterEq,
                    (_, false) => CompareOp::Greater,
                }
            }
            Some(found) => {
                return Err(FilterError::Unexpected {
                    pos: self.pos,
                    found,
                    expected: "an operator",
                })
            }
            None => return Err(FilterError::UnexpectedEnd),
        };

        let parts = self.value()?;
        if parts.len() == 1 || op != CompareOp::Equal {
            // Wildcards are literal outside '='.
            let value = parts.join("*");
            return Ok(Filter::Compare { attr, op, value });
        }

        if parts.len() == 2 && parts.iter().all(String::is_empty) {
            return Ok(Filter::Present(attr));
        }

        let mut parts = parts;
        let last = parts.pop().filter(|s| !s.is_empty());
        let mut rest = parts.into_iter();
        let initial = rest.next().filter(|s| !s.is_empty());
        let any = rest.filter(|s| !s.is_empty()).collect();
        Ok(Filter::Substring {
            attr,
            initial,
            any,
            last,
        })
    }

    /// Read a value up to the closing paren, split on unescaped `*`.
    fn value(&mut self) -> Result<Vec<String>, FilterError> {
        let mut parts = vec![String::new()];
        loop {
            match self.peek() {
                None => return Err(FilterError::UnexpectedEnd),
                Some(')') => return Ok(parts),
                Some('(') => {
                    return Err(FilterError::Unexpected {
                        pos: self.pos,
                        found: '(',
                        expected: "a value",
                    })
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or(FilterError::UnexpectedEnd)?;
                    self.pos += 1;
                    push_char(&mut parts, escaped);
                }
                Some('*') => {
                    self.pos += 1;
                    parts.push(String::new());
                }
                Some(c) => {
                    self.pos += 1;
                    push_char(&mut parts, c);
                }
            }
        }
    }
}

fn push_char(parts: &mut [String], c: char) {
    if let Some(current) = parts.last_mut() {
        current.push(c);
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

fn lookup<'a>(event: &'a Event, attr: &str) -> Option<Cow<'a, Value>> {
    if attr.eq_ignore_ascii_case(EVENT_TOPIC_PROPERTY) {
        return Some(Cow::Owned(Value::String(event.topic().to_string())));
    }
    if let Some(value) = event.property(attr) {
        return Some(Cow::Borrowed(value));
    }
    event
        .properties()
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(attr))
        .map(|(_, value)| Cow::Borrowed(value))
}

fn compare_value(value: &Value, op: CompareOp, literal: &str) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| compare_value(item, op, literal)),
        Value::Number(n) => compare_number(n, literal).is_some_and(|ord| ordering_holds(ord, op)),
        Value::Bool(b) => {
            matches!(op, CompareOp::Equal | CompareOp::Approx)
                && literal.trim().parse::<bool>().is_ok_and(|parsed| parsed == *b)
        }
        Value::String(s) => match op {
            CompareOp::Equal => s == literal,
            CompareOp::Approx => normalize(s) == normalize(literal),
            CompareOp::GreaterEq => s.as_str() >= literal,
            CompareOp::LessEq => s.as_str() <= literal,
            CompareOp::Greater => s.as_str() > literal,
            CompareOp::Less => s.as_str() < literal,
        },
        Value::Null | Value::Object(_) => false,
    }
}

fn compare_number(n: &serde_json::Number, literal: &str) -> Option<Ordering> {
    let literal = literal.trim();
    if let (Some(lhs), Ok(rhs)) = (n.as_i64(), literal.parse::<i64>()) {
        return Some(lhs.cmp(&rhs));
    }
    let rhs = literal.parse::<f64>().ok()?;
    n.as_f64()?.partial_cmp(&rhs)
}

fn ordering_holds(ord: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Equal | CompareOp::Approx => ord == Ordering::Equal,
        CompareOp::GreaterEq => ord != Ordering::Less,
        CompareOp::LessEq => ord != Ordering::Greater,
        CompareOp::Greater => ord == Ordering::Greater,
        CompareOp::Less => ord == Ordering::Less,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn substring_value(value: &Value, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| substring_value(item, initial, any, last)),
        Value::String(s) => substring_match(s, initial, any, last),
        _ => false,
    }
}

fn substring_match(s: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let mut rest = s;
    if let Some(initial) = initial {
        match rest.strip_prefix(initial) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for part in any {
        match rest.find(part.as_str()) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    match last {
        Some(last) => rest.ends_with(last),
        None => true,
    }
}
