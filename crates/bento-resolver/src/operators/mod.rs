//! Operator Engine: binary operations over values.
//!
//! Scalars are promoted by rank (see [`primitive`]); collections follow the
//! shape rules in [`collection`]. Logical operators short-circuit: their
//! right operand is a [`DeferredOperand`] forced only when needed.

mod collection;
mod deferred;
mod primitive;

pub use collection::{apply_collection, collections_equal};
pub use deferred::DeferredOperand;
pub use primitive::{apply_scalar, promoted_kind};

use bento_core::{BinaryOp, OperatorError, ResolveResult, Value};

use crate::{Context, Resolver};

/// Apply `op` to two resolved operands.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (left, right) = (unwrap_host(left), unwrap_host(right));
    match op {
        BinaryOp::And => Ok(Value::Bool(left.is_true() && right.is_true())),
        BinaryOp::Or => Ok(Value::Bool(left.is_true() || right.is_true())),
        _ if left.is_collection() || right.is_collection() => apply_collection(op, left, right),
        _ => apply_scalar(op, left, right),
    }
}

/// Equality as the `Eq` operator sees it; unsupported comparisons are unequal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    matches!(binary_op(BinaryOp::Eq, left, right), Ok(Value::Bool(true)))
}

/// Evaluate `left op right`, forcing `right` only when the result needs it.
pub fn evaluate(
    resolver: &Resolver<'_>,
    op: BinaryOp,
    left: Value,
    right: &DeferredOperand<'_>,
    ctx: &mut Context,
) -> ResolveResult<Value> {
    match op {
        BinaryOp::And if !left.is_true() => Ok(Value::Bool(false)),
        BinaryOp::Or if left.is_true() => Ok(Value::Bool(true)),
        _ => {
            let right = right.force(resolver, ctx)?;
            Ok(binary_op(op, &left, &right)?)
        }
    }
}

fn unwrap_host(value: &Value) -> &Value {
    match value {
        Value::Host(host) => unwrap_host(&host.value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::{Construction, HostObject};
    use bento_registry::DefinitionGraph;

    #[test]
    fn dispatches_by_shape() {
        assert_eq!(binary_op(BinaryOp::Add, &Value::Int(3), &Value::Double(2.5)), Ok(Value::Double(5.5)));
        assert_eq!(binary_op(BinaryOp::Add, &Value::str("a"), &Value::str("b")), Ok(Value::str("ab")));
        assert_eq!(
            binary_op(BinaryOp::Add, &Value::list([Value::Int(1), Value::Int(2)]), &Value::Int(3)),
            Ok(Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn host_objects_operate_on_their_value() {
        let host = Value::Host(HostObject {
            class_name: "Counter".to_string(),
            value: Box::new(Value::Int(2)),
        });
        assert_eq!(binary_op(BinaryOp::Mul, &host, &Value::Int(5)), Ok(Value::Int(10)));
    }

    #[test]
    fn logical_operators_short_circuit() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let mut ctx = Context::new();
        let failing = Construction::reference("undefined");
        let right = DeferredOperand::new(&failing, &ctx);
        assert_eq!(
            evaluate(&resolver, BinaryOp::And, Value::Bool(false), &right, &mut ctx).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            evaluate(&resolver, BinaryOp::Or, Value::Bool(true), &right, &mut ctx).unwrap(),
            Value::Bool(true)
        );
        assert!(!right.is_forced());
        assert!(evaluate(&resolver, BinaryOp::Or, Value::Bool(false), &right, &mut ctx).is_err());
    }
}
