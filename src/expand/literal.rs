//! Parser for literal-syntax constructor cells.
//!
//! Some upstream rows carry constructor lists rendered with a scripting
//! language's literal syntax rather than JSON:
//!
//! ```text
//! [{'constructorId': 'ferrari', 'points': 90.0, 'active': True, 'sponsor': None}]
//! ```
//!
//! This parser accepts single- or double-quoted strings, integers and
//! floats, `True`/`False`/`None` (and their JSON spellings), lists, tuples
//! (read as lists) and dicts with scalar keys. Trailing commas are allowed.

use chumsky::prelude::*;
use serde_json::{Map, Number, Value};

/// Deepest bracket nesting the parser will attempt.
pub const MAX_NESTING: usize = 64;

/// Errors from literal parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiteralError {
    #[error("literal nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid literal: {0}")]
    Syntax(String),
}

/// Parse a literal-syntax string into a JSON value.
pub fn parse_literal(source: &str) -> Result<Value, LiteralError> {
    if nesting_depth(source) > MAX_NESTING {
        return Err(LiteralError::TooDeep(MAX_NESTING));
    }

    parser()
        .then_ignore(end())
        .parse(source)
        .into_result()
        .map_err(|errs| {
            let messages: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
            LiteralError::Syntax(messages.join("; "))
        })
}

/// Create the literal parser.
pub fn parser<'src>() -> impl Parser<'src, &'src str, Value, extra::Err<Rich<'src, char>>> {
    recursive(|value| {
        let escape = just('\\').ignore_then(choice((
            just('\\'),
            just('/'),
            just('"'),
            just('\''),
            just('n').to('\n'),
            just('t').to('\t'),
            just('r').to('\r'),
            just('0').to('\0'),
        )));

        let single_quoted = none_of(['\\', '\''])
            .or(escape.clone())
            .repeated()
            .collect::<String>()
            .delimited_by(just('\''), just('\''));

        let double_quoted = none_of(['\\', '"'])
            .or(escape)
            .repeated()
            .collect::<String>()
            .delimited_by(just('"'), just('"'));

        let string = single_quoted.or(double_quoted).map(Value::String);

        let exponent = one_of(['e', 'E'])
            .then(one_of(['+', '-']).or_not())
            .then(text::digits(10));

        let number = just('-')
            .or_not()
            .then(text::digits(10))
            .then(just('.').then(text::digits(10).or_not()).or_not())
            .then(exponent.or_not())
            .to_slice()
            .try_map(|s: &str, span| {
                parse_number(s).ok_or_else(|| Rich::custom(span, format!("invalid number `{s}`")))
            });

        let keyword = text::ident().try_map(|ident: &str, span| match ident {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => Err(Rich::custom(span, format!("unexpected name `{other}`"))),
        });

        let items = value
            .clone()
            .separated_by(just(',').padded())
            .allow_trailing()
            .collect::<Vec<Value>>();

        let list = items
            .clone()
            .delimited_by(just('[').padded(), just(']').padded())
            .map(Value::Array);

        let tuple = items
            .delimited_by(just('(').padded(), just(')').padded())
            .map(Value::Array);

        let key = value.clone().try_map(|k: Value, span| {
            key_string(k).ok_or_else(|| Rich::custom(span, "dict keys must be scalars"))
        });

        let entry = key.then_ignore(just(':').padded()).then(value);

        let dict = entry
            .separated_by(just(',').padded())
            .allow_trailing()
            .collect::<Vec<(String, Value)>>()
            .delimited_by(just('{').padded(), just('}').padded())
            .map(|entries| Value::Object(entries.into_iter().collect::<Map<String, Value>>()));

        choice((dict, list, tuple, string, number, keyword)).padded()
    })
}

fn parse_number(s: &str) -> Option<Value> {
    if s.contains(['.', 'e', 'E']) {
        let f: f64 = s.parse().ok()?;
        return Number::from_f64(f).map(Value::Number);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Value::from(u));
    }
    let f: f64 = s.parse().ok()?;
    Number::from_f64(f).map(Value::Number)
}

fn key_string(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if b { "True" } else { "False" }.to_string()),
        Value::Null => Some("None".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Maximum bracket depth outside of quoted strings.
fn nesting_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in source.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' | '{' => {
                depth += 1;
                max = max.max(depth);
            }
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}
