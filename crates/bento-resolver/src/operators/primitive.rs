//! Scalar operations with numeric promotion.
//!
//! The operand with the higher promotion rank decides which typed operation
//! runs:
//!
//! | Rank | Class   | Operation type |
//! |------|---------|----------------|
//! | 0    | boolean | `bool`         |
//! | 1    | byte    | `u8`           |
//! | 2    | char    | `char`         |
//! | 3    | int     | `i32`          |
//! | 4    | long    | `i64`          |
//! | 5    | double  | `f64`          |
//!
//! Operands without a rank fall back to string semantics (concatenation and
//! comparison of display text), or fault as unsupported.

use std::cmp::Ordering;

use bento_core::{BinaryOp, OperatorError, Value, ValueKind};

/// The class both operands are promoted to, when both are numeric.
pub fn promoted_kind(left: ValueKind, right: ValueKind) -> Option<ValueKind> {
    let rank = left.promotion_rank()?.max(right.promotion_rank()?);
    ValueKind::from_rank(rank)
}

pub(crate) fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> OperatorError {
    OperatorError::UnsupportedOperation {
        op: op.as_str().to_string(),
        left: left.kind().to_string(),
        right: right.kind().to_string(),
    }
}

fn compare(op: BinaryOp, ordering: Option<Ordering>) -> Option<bool> {
    let ordering = ordering?;
    Some(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return None,
    })
}

macro_rules! integer_op {
    ($name:ident, $ty:ty, $wrap:expr) => {
        fn $name(op: BinaryOp, a: $ty, b: $ty) -> Result<Option<Value>, OperatorError> {
            if op.is_comparison() {
                return Ok(compare(op, Some(a.cmp(&b))).map(Value::Bool));
            }
            let result = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b == 0 => return Err(OperatorError::DivisionByZero),
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Mod if b == 0 => return Err(OperatorError::DivisionByZero),
                BinaryOp::Mod => a.wrapping_rem(b),
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                BinaryOp::Shl => a.wrapping_shl(b as u32),
                BinaryOp::Shr => a.wrapping_shr(b as u32),
                _ => return Ok(None),
            };
            Ok(Some($wrap(result)))
        }
    };
}

integer_op!(byte_op, u8, Value::Byte);
integer_op!(int_op, i32, Value::Int);
integer_op!(long_op, i64, Value::Long);

fn bool_op(op: BinaryOp, a: bool, b: bool) -> Option<Value> {
    if op.is_comparison() {
        return compare(op, Some(a.cmp(&b))).map(Value::Bool);
    }
    match op {
        BinaryOp::BitAnd => Some(Value::Bool(a & b)),
        BinaryOp::BitOr => Some(Value::Bool(a | b)),
        BinaryOp::BitXor => Some(Value::Bool(a ^ b)),
        _ => None,
    }
}

fn char_op(op: BinaryOp, a: char, b: char) -> Option<Value> {
    if op.is_comparison() {
        return compare(op, Some(a.cmp(&b))).map(Value::Bool);
    }
    let code = match op {
        BinaryOp::Add => (a as u32).checked_add(b as u32),
        BinaryOp::Sub => (a as u32).checked_sub(b as u32),
        _ => None,
    }?;
    char::from_u32(code).map(Value::Char)
}

fn double_op(op: BinaryOp, a: f64, b: f64) -> Option<Value> {
    if op.is_comparison() {
        return compare(op, a.partial_cmp(&b)).map(Value::Bool);
    }
    match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Sub => Some(a - b),
        BinaryOp::Mul => Some(a * b),
        BinaryOp::Div => Some(a / b),
        BinaryOp::Mod => Some(a % b),
        _ => None,
    }
    .map(Value::Double)
}

fn as_char(value: &Value) -> Option<char> {
    match value {
        Value::Char(c) => Some(*c),
        other => other
            .as_i64()
            .and_then(|i| u32::try_from(i).ok())
            .and_then(char::from_u32),
    }
}

/// Apply `op` to two scalar operands.
pub fn apply_scalar(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    if let Some(kind) = promoted_kind(left.kind(), right.kind()) {
        let result = match kind {
            ValueKind::Bool => bool_op(op, left.is_true(), right.is_true()),
            ValueKind::Byte => byte_op(op, as_i64(left) as u8, as_i64(right) as u8)?,
            ValueKind::Char => match (as_char(left), as_char(right)) {
                (Some(a), Some(b)) => char_op(op, a, b),
                _ => None,
            },
            ValueKind::Int => int_op(op, as_i64(left) as i32, as_i64(right) as i32)?,
            ValueKind::Long => long_op(op, as_i64(left), as_i64(right))?,
            _ => double_op(
                op,
                left.as_f64().unwrap_or_default(),
                right.as_f64().unwrap_or_default(),
            ),
        };
        return result.ok_or_else(|| unsupported(op, left, right));
    }

    string_fallback(op, left, right).ok_or_else(|| unsupported(op, left, right))
}

fn as_i64(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

fn string_fallback(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    if left.is_empty_value() || right.is_empty_value() {
        let both = left.is_empty_value() && right.is_empty_value();
        return match op {
            BinaryOp::Eq => Some(Value::Bool(both)),
            BinaryOp::Ne => Some(Value::Bool(!both)),
            _ => None,
        };
    }
    let textual = |v: &Value| v.kind() == ValueKind::Str || v.kind().promotion_rank().is_some();
    if !textual(left) || !textual(right) {
        return None;
    }
    let (a, b) = (left.to_string(), right.to_string());
    match op {
        BinaryOp::Add => Some(Value::Str(a + &b)),
        op if op.is_comparison() => compare(op, Some(a.cmp(&b))).map(Value::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_picks_the_wider_class() {
        assert_eq!(promoted_kind(ValueKind::Int, ValueKind::Double), Some(ValueKind::Double));
        assert_eq!(promoted_kind(ValueKind::Bool, ValueKind::Byte), Some(ValueKind::Byte));
        assert_eq!(promoted_kind(ValueKind::Str, ValueKind::Int), None);
    }

    #[test]
    fn mixed_int_and_double_add() {
        assert_eq!(
            apply_scalar(BinaryOp::Add, &Value::Int(3), &Value::Double(2.5)),
            Ok(Value::Double(5.5))
        );
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(apply_scalar(BinaryOp::Div, &Value::Int(7), &Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(apply_scalar(BinaryOp::Mul, &Value::Int(3), &Value::Long(4)), Ok(Value::Long(12)));
        assert_eq!(apply_scalar(BinaryOp::Shl, &Value::Int(1), &Value::Int(4)), Ok(Value::Int(16)));
        assert_eq!(apply_scalar(BinaryOp::Add, &Value::Byte(255), &Value::Byte(1)), Ok(Value::Byte(0)));
    }

    #[test]
    fn integer_division_by_zero_faults() {
        assert_eq!(
            apply_scalar(BinaryOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(OperatorError::DivisionByZero)
        );
        assert_eq!(
            apply_scalar(BinaryOp::Mod, &Value::Long(1), &Value::Int(0)),
            Err(OperatorError::DivisionByZero)
        );
        let Ok(Value::Double(d)) = apply_scalar(BinaryOp::Div, &Value::Double(1.0), &Value::Int(0)) else {
            panic!("double division should not fault");
        };
        assert!(d.is_infinite());
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply_scalar(BinaryOp::Lt, &Value::Int(1), &Value::Double(1.5)), Ok(Value::Bool(true)));
        assert_eq!(apply_scalar(BinaryOp::Eq, &Value::Int(2), &Value::Long(2)), Ok(Value::Bool(true)));
        assert_eq!(apply_scalar(BinaryOp::Ge, &Value::Char('b'), &Value::Char('a')), Ok(Value::Bool(true)));
        assert_eq!(apply_scalar(BinaryOp::Eq, &Value::Null, &Value::Null), Ok(Value::Bool(true)));
        assert_eq!(apply_scalar(BinaryOp::Ne, &Value::Null, &Value::Int(0)), Ok(Value::Bool(true)));
    }

    #[test]
    fn strings_concatenate_and_compare() {
        assert_eq!(apply_scalar(BinaryOp::Add, &Value::str("a"), &Value::str("b")), Ok(Value::str("ab")));
        assert_eq!(apply_scalar(BinaryOp::Add, &Value::str("n"), &Value::Int(1)), Ok(Value::str("n1")));
        assert_eq!(apply_scalar(BinaryOp::Lt, &Value::str("a"), &Value::str("b")), Ok(Value::Bool(true)));
        assert!(matches!(
            apply_scalar(BinaryOp::Sub, &Value::str("a"), &Value::str("b")),
            Err(OperatorError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn booleans_support_bitwise_only() {
        assert_eq!(
            apply_scalar(BinaryOp::BitXor, &Value::Bool(true), &Value::Bool(false)),
            Ok(Value::Bool(true))
        );
        assert!(apply_scalar(BinaryOp::Add, &Value::Bool(true), &Value::Bool(true)).is_err());
    }
}
