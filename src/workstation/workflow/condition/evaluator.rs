// SPDX-License-Identifier: MIT

//! Expression evaluator

use super::ast::{CompareOp, Expression, Literal};
use serde_json::{Map, Value};

/// Named values an expression can read
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Map<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Resolve a dotted path; numeric segments index into arrays
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.bindings.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Evaluate an expression as a condition
pub fn evaluate(expr: &Expression, scope: &Scope) -> bool {
    truthy(&evaluate_value(expr, scope))
}

/// Evaluate an expression to a value; missing paths are null
pub fn evaluate_value(expr: &Expression, scope: &Scope) -> Value {
    match expr {
        Expression::Literal(literal) => literal_value(literal),
        Expression::Path(path) => scope.get_path(path).cloned().unwrap_or(Value::Null),
        Expression::Compare { left, op, right } => {
            Value::Bool(evaluate_compare(left, op, right, scope))
        }
        Expression::And(left, right) => {
            Value::Bool(evaluate(left, scope) && evaluate(right, scope))
        }
        Expression::Or(left, right) => Value::Bool(evaluate(left, scope) || evaluate(right, scope)),
        Expression::Not(inner) => Value::Bool(!evaluate(inner, scope)),
    }
}

/// Empty strings, empty collections, zero, null and false are falsy
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn evaluate_compare(left: &str, op: &CompareOp, right: &Literal, scope: &Scope) -> bool {
    let left_value = scope.get_path(left);

    match op {
        CompareOp::Eq => values_equal(left_value, right),
        CompareOp::NotEq => !values_equal(left_value, right),
        CompareOp::Gt => compare_numbers(left_value, right, |a, b| a > b),
        CompareOp::Gte => compare_numbers(left_value, right, |a, b| a >= b),
        CompareOp::Lt => compare_numbers(left_value, right, |a, b| a < b),
        CompareOp::Lte => compare_numbers(left_value, right, |a, b| a <= b),
        CompareOp::Contains => check_contains(left_value, right),
    }
}

fn values_equal(left: Option<&Value>, right: &Literal) -> bool {
    match (left, right) {
        (None, Literal::Null) => true,
        (None, _) => false,
        (Some(Value::Null), Literal::Null) => true,
        (Some(Value::String(s)), Literal::String(rs)) => s == rs,
        (Some(Value::Number(n)), Literal::Number(rn)) => n
            .as_f64()
            .map(|f| (f - rn).abs() < f64::EPSILON)
            .unwrap_or(false),
        (Some(Value::Bool(b)), Literal::Boolean(rb)) => b == rb,
        _ => false,
    }
}

fn compare_numbers<F>(left: Option<&Value>, right: &Literal, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (left, right) {
        (Some(Value::Number(n)), Literal::Number(rn)) => {
            n.as_f64().map(|f| cmp(f, *rn)).unwrap_or(false)
        }
        _ => false,
    }
}

fn check_contains(left: Option<&Value>, right: &Literal) -> bool {
    match (left, right) {
        (Some(Value::String(s)), Literal::String(substr)) => s.contains(substr.as_str()),
        (Some(Value::Array(arr)), Literal::String(val)) => {
            arr.iter().any(|v| v.as_str() == Some(val.as_str()))
        }
        (Some(Value::Array(arr)), Literal::Number(val)) => arr.iter().any(|v| {
            v.as_f64()
                .map(|f| (f - val).abs() < f64::EPSILON)
                .unwrap_or(false)
        }),
        (Some(Value::Array(arr)), Literal::Boolean(val)) => {
            arr.iter().any(|v| v.as_bool() == Some(*val))
        }
        (Some(Value::Object(map)), Literal::String(key)) => map.contains_key(key.as_str()),
        _ => false,
    }
}
