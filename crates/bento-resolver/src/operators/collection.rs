//! Operators over sequences and mappings.
//!
//! - `Add`: concatenation, append or prepend; two fixed arrays are copied
//!   in bulk into one new array; two mappings merge with the right side
//!   winning.
//! - bitwise family: element-wise over equal-kind, equal-length sequences.
//! - `Eq`/`Ne`: pairwise element equality. Sequence equality ignores the
//!   array/list distinction; mapping equality compares lengths, then walks
//!   the first operand's keys.

use bento_core::{BinaryOp, OperatorError, Sequence, SequenceKind, Value};

use super::{binary_op, primitive::unsupported, values_equal};

fn sequence_kind_name(kind: SequenceKind) -> &'static str {
    match kind {
        SequenceKind::Array => "array",
        SequenceKind::List => "list",
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Seq(seq) => sequence_kind_name(seq.kind),
        Value::Map(_) => "mapping",
        _ => "scalar",
    }
}

/// Apply `op` where at least one operand is a collection.
pub fn apply_collection(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Eq => Ok(Value::Bool(collections_equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!collections_equal(left, right))),
        op if op.is_bitwise() => element_wise(op, left, right),
        op => Err(unsupported(op, left, right)),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    match (left, right) {
        (Value::Seq(a), Value::Seq(b)) => {
            let mut items = Vec::with_capacity(a.len() + b.len());
            items.extend_from_slice(&a.items);
            items.extend_from_slice(&b.items);
            let kind = if a.kind == SequenceKind::Array && b.kind == SequenceKind::Array {
                SequenceKind::Array
            } else {
                SequenceKind::List
            };
            Ok(Value::Seq(Sequence { kind, items }))
        }
        (Value::Seq(a), scalar) if !scalar.is_collection() => {
            let mut items = a.items.clone();
            items.push(scalar.clone());
            Ok(Value::Seq(Sequence::list(items)))
        }
        (scalar, Value::Seq(b)) if !scalar.is_collection() => {
            let mut items = Vec::with_capacity(b.len() + 1);
            items.push(scalar.clone());
            items.extend_from_slice(&b.items);
            Ok(Value::Seq(Sequence::list(items)))
        }
        (Value::Map(a), Value::Map(b)) => {
            let mut merged = a.clone();
            merged.extend(b.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(Value::Map(merged))
        }
        _ => Err(unsupported(BinaryOp::Add, left, right)),
    }
}

fn element_wise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (Value::Seq(a), Value::Seq(b)) = (left, right) else {
        if left.is_collection() && right.is_collection() {
            return Err(OperatorError::KindMismatch {
                op: op.as_str().to_string(),
                left: shape_name(left).to_string(),
                right: shape_name(right).to_string(),
            });
        }
        return Err(unsupported(op, left, right));
    };
    if a.kind != b.kind {
        return Err(OperatorError::KindMismatch {
            op: op.as_str().to_string(),
            left: sequence_kind_name(a.kind).to_string(),
            right: sequence_kind_name(b.kind).to_string(),
        });
    }
    if a.len() != b.len() {
        return Err(OperatorError::LengthMismatch {
            op: op.as_str().to_string(),
            left: a.len(),
            right: b.len(),
        });
    }
    let items = a
        .items
        .iter()
        .zip(&b.items)
        .map(|(x, y)| binary_op(op, x, y))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Seq(Sequence { kind: a.kind, items }))
}

/// Collection equality: same shape, same length, pairwise equal elements.
pub fn collections_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Seq(a), Value::Seq(b)) => {
            a.len() == b.len() && a.items.iter().zip(&b.items).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => false,
    }
}
