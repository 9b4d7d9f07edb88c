//! Operator semantics shared by the path language and JSONPath filters.
//!
//! Integer arithmetic stays integral while it fits in an `i64` and falls back
//! to floating point on overflow. Bitwise operators work on `i64`.

use crate::error::{EvalError, EvalResult};
use crate::reference::ReferenceId;
use crate::value::Value;
use std::cmp::Ordering;

/// Binary arithmetic operators other than `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Binary bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

const NUMBER: &[&str] = &["int", "float"];

/// Truthiness of a condition operand.
///
/// Booleans are themselves, `null` is false, numbers are true when non-zero,
/// and the strings `"true"`/`"false"` parse. Anything else is a type error.
pub fn truthy<R: ReferenceId>(value: &Value<R>) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(EvalError::unexpected_type(&["bool"], other.type_name())),
    }
}

/// `+`: numeric addition, or concatenation when either side is a string.
pub fn add<R: ReferenceId>(left: &Value<R>, right: &Value<R>) -> EvalResult<Value<R>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a
            .checked_add(*b)
            .map_or_else(|| Value::Float(*a as f64 + *b as f64), Value::Int)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::String(a), b) => Ok(Value::String(format!("{a}{}", b.to_template_string()?))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{b}", a.to_template_string()?))),
        (a, b) => Ok(Value::Float(number(a)? + number(b)?)),
    }
}

/// `-`, `*`, `/`, `%` and `**`.
pub fn arithmetic<R: ReferenceId>(
    op: ArithOp,
    left: &Value<R>,
    right: &Value<R>,
) -> EvalResult<Value<R>> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let exact = match op {
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => None,
            ArithOp::Mod => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Some(a.wrapping_rem(b))
            }
            ArithOp::Pow => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        };
        if let Some(result) = exact {
            return Ok(Value::Int(result));
        }
    }
    let (a, b) = (number(left)?, number(right)?);
    Ok(Value::Float(match op {
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
        ArithOp::Pow => a.powf(b),
    }))
}

/// Unary `-`.
pub fn negate<R: ReferenceId>(value: &Value<R>) -> EvalResult<Value<R>> {
    match value {
        Value::Int(i) => Ok(i
            .checked_neg()
            .map_or_else(|| Value::Float(-(*i as f64)), Value::Int)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(EvalError::unexpected_type(NUMBER, other.type_name())),
    }
}

/// Ordering of two numbers, two strings, or two times.
pub fn compare<R: ReferenceId>(left: &Value<R>, right: &Value<R>) -> EvalResult<Ordering> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (a, b) => number(a)?.partial_cmp(&number(b)?),
    };
    ordering.ok_or_else(|| EvalError::unexpected_type(NUMBER, "NaN"))
}

/// `&`, `|`, `^`, `<<` and `>>` on 64-bit integers.
pub fn bitwise<R: ReferenceId>(op: BitOp, left: &Value<R>, right: &Value<R>) -> EvalResult<Value<R>> {
    let (a, b) = (integer(left)?, integer(right)?);
    let shift = (b & 63) as u32;
    Ok(Value::Int(match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
        BitOp::Shl => a.wrapping_shl(shift),
        BitOp::Shr => a.wrapping_shr(shift),
    }))
}

/// Unary `~`.
pub fn bit_not<R: ReferenceId>(value: &Value<R>) -> EvalResult<Value<R>> {
    Ok(Value::Int(!integer(value)?))
}

fn number<R: ReferenceId>(value: &Value<R>) -> EvalResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| EvalError::unexpected_type(NUMBER, value.type_name()))
}

/// Floats truncate toward zero and saturate at the `i64` bounds.
fn integer<R: ReferenceId>(value: &Value<R>) -> EvalResult<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        other => Err(EvalError::unexpected_type(NUMBER, other.type_name())),
    }
}
