// SPDX-License-Identifier: MIT

//! Expression parser
//!
//! Parses expressions like:
//! - `x.content == 'done'`
//! - `i < 3 and not x.metadata.finished`
//! - `(a > 1 || b contains 'x') && c != null`
//!
//! `or` binds looser than `and`, which binds looser than `not`.

use super::ast::{CompareOp, Expression, Literal};
use crate::workstation::workflow::error::WorkflowError;

type ParseResult<T> = Result<T, WorkflowError>;

/// Parse an expression string into an AST
pub fn parse(input: &str) -> ParseResult<Expression> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::invalid_expression(input, "empty expression"));
    }

    if let Some(inner) = strip_outer_parens(trimmed) {
        return parse(inner);
    }

    for keyword in [" or ", " || "] {
        if let Some(pos) = find_top_level(trimmed, keyword) {
            let left = parse(&trimmed[..pos])?;
            let right = parse(&trimmed[pos + keyword.len()..])?;
            return Ok(Expression::Or(Box::new(left), Box::new(right)));
        }
    }

    for keyword in [" and ", " && "] {
        if let Some(pos) = find_top_level(trimmed, keyword) {
            let left = parse(&trimmed[..pos])?;
            let right = parse(&trimmed[pos + keyword.len()..])?;
            return Ok(Expression::And(Box::new(left), Box::new(right)));
        }
    }

    if let Some(rest) = trimmed.strip_prefix("not ") {
        return Ok(Expression::Not(Box::new(parse(rest)?)));
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        if !rest.starts_with('=') {
            return Ok(Expression::Not(Box::new(parse(rest)?)));
        }
    }

    if let Some(expr) = parse_comparison(trimmed)? {
        return Ok(expr);
    }

    parse_operand(trimmed)
}

/// `(a and b)` -> `a and b`, but `(a) and (b)` stays as is
fn strip_outer_parens(input: &str) -> Option<&str> {
    if !input.starts_with('(') || !input.ends_with(')') {
        return None;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 && i != input.len() - 1 {
                        return None;
                    }
                }
                _ => {}
            },
        }
    }
    Some(&input[1..input.len() - 1])
}

/// Byte offset of the first `needle` outside quotes and parentheses
fn find_top_level(input: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                _ if depth == 0 && input[i..].starts_with(needle) => return Some(i),
                _ => {}
            },
        }
    }
    None
}

fn parse_comparison(input: &str) -> ParseResult<Option<Expression>> {
    // Longest operators first so `>=` is not read as `>`
    let operators = [
        ("!=", CompareOp::NotEq),
        (">=", CompareOp::Gte),
        ("<=", CompareOp::Lte),
        ("==", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        (" contains ", CompareOp::Contains),
    ];

    for (op_str, op) in operators {
        if let Some(pos) = find_top_level(input, op_str) {
            let left = input[..pos].trim();
            if !is_path(left) {
                return Err(WorkflowError::invalid_expression(
                    input,
                    format!("left side of '{}' must be a path, got '{}'", op, left),
                ));
            }
            let right = parse_literal(input[pos + op_str.len()..].trim()).ok_or_else(|| {
                WorkflowError::invalid_expression(
                    input,
                    format!("right side of '{}' must be a literal", op),
                )
            })?;
            return Ok(Some(Expression::Compare {
                left: left.to_string(),
                op,
                right,
            }));
        }
    }

    Ok(None)
}

fn parse_operand(input: &str) -> ParseResult<Expression> {
    if let Some(literal) = parse_literal(input) {
        return Ok(Expression::Literal(literal));
    }
    if is_path(input) {
        return Ok(Expression::Path(input.to_string()));
    }
    Err(WorkflowError::invalid_expression(
        input,
        "could not parse expression",
    ))
}

fn parse_literal(input: &str) -> Option<Literal> {
    match input {
        "null" | "None" => return Some(Literal::Null),
        "true" | "True" => return Some(Literal::Boolean(true)),
        "false" | "False" => return Some(Literal::Boolean(false)),
        _ => {}
    }

    if input.len() >= 2
        && ((input.starts_with('\'') && input.ends_with('\''))
            || (input.starts_with('"') && input.ends_with('"')))
    {
        return Some(Literal::String(input[1..input.len() - 1].to_string()));
    }

    input.parse::<f64>().ok().map(Literal::Number)
}

/// Dotted identifiers; segments after the first may be array indices
pub(crate) fn is_path(input: &str) -> bool {
    let mut segments = input.split('.');
    let Some(first) = segments.next() else {
        return false;
    };
    is_identifier(first)
        && segments.all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

pub(crate) fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
