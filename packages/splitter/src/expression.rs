//! Condition expression language
//!
//! A condition pairs a field with a short expression fragment. Two shapes are
//! accepted, each optionally prefixed with the negation token `not `:
//!
//! - **Method call**: `startswith('L')`, `.endswith("-X")`, `contains(3)`,
//!   `isdigit()`. Only the methods known to [`Operator::from_method`] exist;
//!   anything else is rejected when the condition is built. The call may be
//!   followed by `== True`, `== False`, `!= True` or `!= False`.
//! - **Comparison**: `< 12`, `>= 2.5`, `== 'EU'`, `!= None`.
//!
//! Literals: single or double quoted strings, integers, floats,
//! `True`/`False`/`None` (or `true`/`false`/`null`).
//!
//! Fragments are parsed once into an [`Expression`] and evaluated against
//! field values through a fixed dispatch on [`Operator`]; nothing is executed
//! dynamically.

use crate::config;
use crate::error::{Result, SplitterError};
use crate::types::{Operator, Value};
use std::cmp::Ordering;

/// A parsed expression fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Whether the fragment started with the negation token
    pub negated: bool,
    /// Operator applied to the field value
    pub operator: Operator,
    /// Literal right-hand side (`None` for zero-argument methods)
    pub operand: Option<Value>,
    /// Method result that counts as a match (`false` after `== False`)
    expected: bool,
    normalized: String,
}

impl Expression {
    /// Parse an expression fragment for `field`.
    ///
    /// `field` is only used for error messages.
    pub fn parse(field: &str, expression: &str) -> Result<Self> {
        let invalid = |reason: String| SplitterError::InvalidExpression {
            field: field.to_string(),
            expression: expression.to_string(),
            reason,
        };

        let trimmed = expression.trim();
        let (negated, body) = match trimmed.strip_prefix(config::NEGATION_TOKEN) {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        if body.is_empty() {
            return Err(invalid("empty expression".to_string()));
        }

        if find_unquoted(body, '(').is_some() {
            Self::parse_method_call(body, negated).map_err(invalid)
        } else {
            Self::parse_comparison(body, negated).map_err(invalid)
        }
    }

    /// Normalized fragment: method calls carry a leading dot
    /// (`.startswith('L')`), comparisons are kept as written (`< 12`).
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whether the fragment is a method call rather than a comparison.
    pub fn is_method_call(&self) -> bool {
        self.normalized.starts_with('.')
    }

    /// Evaluate the expression against a field value, negation included.
    ///
    /// Returns an error for type mismatches (e.g. `startswith` on a number,
    /// `<` between a string and a number).
    pub fn evaluate(&self, value: &Value) -> Result<bool> {
        let outcome = match self.operator {
            Operator::StartsWith => {
                let (subject, prefix) = string_pair(value, self.operand())?;
                subject.starts_with(prefix)
            }
            Operator::EndsWith => {
                let (subject, suffix) = string_pair(value, self.operand())?;
                subject.ends_with(suffix)
            }
            Operator::Contains => contains(value, self.operand())?,
            Operator::IsDigit => {
                let s = as_string(value)?;
                !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
            }
            Operator::IsAlpha => {
                let s = as_string(value)?;
                !s.is_empty() && s.chars().all(char::is_alphabetic)
            }
            Operator::IsUpper => {
                let s = as_string(value)?;
                has_cased(s) && !s.chars().any(char::is_lowercase)
            }
            Operator::IsLower => {
                let s = as_string(value)?;
                has_cased(s) && !s.chars().any(char::is_uppercase)
            }
            Operator::Equals => value.loose_eq(self.operand()),
            Operator::NotEquals => !value.loose_eq(self.operand()),
            Operator::GreaterThan => compare(value, self.operand())? == Some(Ordering::Greater),
            Operator::LessThan => compare(value, self.operand())? == Some(Ordering::Less),
            Operator::GreaterThanOrEqual => matches!(
                compare(value, self.operand())?,
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::LessThanOrEqual => matches!(
                compare(value, self.operand())?,
                Some(Ordering::Less | Ordering::Equal)
            ),
        };

        Ok((outcome == self.expected) != self.negated)
    }

    fn operand(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.operand.as_ref().unwrap_or(&NULL)
    }

    fn parse_method_call(body: &str, negated: bool) -> std::result::Result<Self, String> {
        let call = body.strip_prefix('.').unwrap_or(body);
        let (name, rest) = call
            .split_once('(')
            .ok_or_else(|| "missing '('".to_string())?;
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!("invalid method name '{}'", name));
        }

        let close = find_unquoted(rest, ')')
            .ok_or_else(|| "method call must end with ')'".to_string())?;
        let args = rest[..close].trim();
        let expected = parse_result_comparison(&rest[close + 1..])?;

        let operator =
            Operator::from_method(name).ok_or_else(|| format!("unknown method '{}'", name))?;

        let operand = match (operator.arity(), args.is_empty()) {
            (0, true) => None,
            (0, false) => return Err(format!("'{}' takes no arguments", name)),
            (_, true) => return Err(format!("'{}' requires one argument", name)),
            (_, false) => Some(parse_literal(args)?),
        };

        Ok(Self {
            negated,
            operator,
            operand,
            expected,
            normalized: format!(".{}", call),
        })
    }

    fn parse_comparison(body: &str, negated: bool) -> std::result::Result<Self, String> {
        let split = body
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
            .unwrap_or(body.len());
        let (symbol, literal) = body.split_at(split);

        if symbol.is_empty() {
            return Err("expected a method call or a comparison operator".to_string());
        }
        let operator = Operator::from_symbol(symbol)
            .ok_or_else(|| format!("unknown comparison operator '{}'", symbol))?;

        let literal = literal.trim();
        if literal.is_empty() {
            return Err(format!("'{}' requires a right-hand operand", symbol));
        }

        Ok(Self {
            negated,
            operator,
            operand: Some(parse_literal(literal)?),
            expected: true,
            normalized: body.to_string(),
        })
    }
}

/// Byte offset of the first `target` outside quoted literals.
fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == target => return Some(index),
            None => {}
        }
    }
    None
}

/// Optional `== True` / `!= False` after a method call.
///
/// Returns the method result that counts as a match.
fn parse_result_comparison(tail: &str) -> std::result::Result<bool, String> {
    let tail = tail.trim();
    if tail.is_empty() {
        return Ok(true);
    }

    let (equal, literal) = if let Some(rest) = tail.strip_prefix("==") {
        (true, rest)
    } else if let Some(rest) = tail.strip_prefix("!=") {
        (false, rest)
    } else {
        return Err(format!("unexpected '{}' after method call", tail));
    };

    match parse_literal(literal)? {
        Value::Bool(b) => Ok(b == equal),
        other => Err(format!(
            "method result can only be compared with True or False, got {}",
            other
        )),
    }
}

/// Parse a literal operand.
fn parse_literal(text: &str) -> std::result::Result<Value, String> {
    let text = text.trim();

    for quote in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(quote) {
            let inner = inner
                .strip_suffix(quote)
                .ok_or_else(|| format!("unterminated string literal {}", text))?;
            return unescape(inner, quote);
        }
    }

    match text {
        "True" | "true" => return Ok(Value::Bool(true)),
        "False" | "false" => return Ok(Value::Bool(false)),
        "None" | "null" => return Ok(Value::Null),
        _ => {}
    }

    let numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_'));
    if numeric {
        let cleaned = text.replace('_', "");
        if let Ok(i) = cleaned.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        if let Ok(f) = cleaned.parse::<f64>() {
            return Ok(Value::Float(f));
        }
    }

    Err(format!("unsupported literal {}", text))
}

fn unescape(inner: &str, quote: char) -> std::result::Result<Value, String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => return Err("dangling escape in string literal".to_string()),
            },
            c if c == quote => return Err("unescaped quote in string literal".to_string()),
            c => out.push(c),
        }
    }
    Ok(Value::String(out))
}

fn as_string(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| type_error("string", value))
}

fn string_pair<'a>(value: &'a Value, operand: &'a Value) -> Result<(&'a str, &'a str)> {
    Ok((as_string(value)?, as_string(operand)?))
}

fn has_cased(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase() || c.is_lowercase())
}

/// Membership test: substring, array element or object key.
fn contains(value: &Value, needle: &Value) -> Result<bool> {
    match value {
        Value::String(s) => Ok(s.contains(as_string(needle)?)),
        Value::Array(items) => Ok(items.iter().any(|item| item.loose_eq(needle))),
        Value::Object(obj) => Ok(obj.contains_key(as_string(needle)?)),
        other => Err(type_error("string, array or object", other)),
    }
}

/// Order two values of compatible kinds.
///
/// `Ok(None)` means the values are comparable but unordered (NaN).
fn compare(value: &Value, operand: &Value) -> Result<Option<Ordering>> {
    match (value, operand) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(value.numeric_cmp(operand))
        }
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        _ => Err(type_error(operand.type_name(), value)),
    }
}

fn type_error(expected: &str, actual: &Value) -> SplitterError {
    SplitterError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}
