//! Parameter Matcher: overload scoring of argument lists.
//!
//! Each candidate parameter list is scored against the supplied arguments;
//! lower is better and [`NO_MATCH`] rules a candidate out.
//!
//! ## Algorithm
//!
//! 1. More arguments than parameters is [`NO_MATCH`].
//! 2. A parameter without an argument costs [`MISSING_ARGUMENT`].
//! 3. A null or deliberately missing argument costs [`NULL_ARGUMENT`].
//! 4. Otherwise the argument's type is inferred (a reference to an enclosing
//!    parameter takes that parameter's bound type) and compared with the
//!    parameter type by [`compute_score`].
//!
//! The total is the sum over positions. See [`ranking`] for selection.

mod ranking;

pub use ranking::{ParamMatch, select_params};

use bento_core::{BinaryOp, Construction, Index, PrimitiveKind, Type};
use bento_registry::{DefinitionGraph, ParameterList, lattice};

use crate::definition::{get_type, type_of_value};
use crate::{Context, Definition, Resolver};

/// Score of a candidate that cannot accept the arguments.
pub const NO_MATCH: u32 = 1 << 30;

/// Penalty for a parameter without a corresponding argument.
pub const MISSING_ARGUMENT: u32 = 16384;

/// Penalty for matching an untyped parameter.
pub const DEFAULT_PARAMETER: u32 = 256;

/// Penalty for a null or deliberately missing argument.
pub const NULL_ARGUMENT: u32 = 128;

/// Score `args` against one parameter list.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn score(
    resolver: &Resolver<'_>,
    params: &ParameterList,
    args: &[Construction],
    ctx: &Context,
) -> u32 {
    if args.len() > params.len() {
        return NO_MATCH;
    }
    let mut total: u32 = 0;
    for (i, param) in params.params.iter().enumerate() {
        let position = match args.get(i) {
            None => MISSING_ARGUMENT,
            Some(arg) if arg.is_null_or_missing() => NULL_ARGUMENT,
            Some(arg) => {
                let arg_type = infer_arg_type(resolver, arg, ctx);
                compute_score(resolver.graph(), &param.ty, arg_type.as_ref())
            }
        };
        if position >= NO_MATCH {
            return NO_MATCH;
        }
        total = total.saturating_add(position);
    }
    total.min(NO_MATCH)
}

/// Cost of passing an argument of type `arg` to a parameter of type `param`.
pub fn compute_score(graph: &DefinitionGraph, param: &Type, arg: Option<&Type>) -> u32 {
    if arg.is_some_and(|a| param.is_identical(a)) {
        return 0;
    }
    if param.is_untyped() {
        return DEFAULT_PARAMETER;
    }
    let Some(arg) = arg else {
        return NO_MATCH;
    };

    let arg_is_collection = lattice::is_collection(graph, arg);
    if arg_is_collection && param.has_dims() {
        let base = compute_score(graph, &param.base_type(), Some(&arg.base_type()));
        return match base {
            NO_MATCH => NO_MATCH,
            0 => 0,
            worse => worse - 1,
        };
    }
    if arg_is_collection != lattice::is_collection(graph, param) {
        return 1;
    }

    match lattice::levels_below(graph, arg, param) {
        d if d < 0 => NO_MATCH,
        d => d as u32,
    }
}

/// Narrowest type an argument expression is known to produce.
pub fn infer_arg_type(resolver: &Resolver<'_>, arg: &Construction, ctx: &Context) -> Option<Type> {
    let graph = resolver.graph();
    match arg {
        Construction::Literal(value) => Some(type_of_value(value)),
        Construction::Instantiation(inst) => {
            let base = if let Some(binding) = inst
                .name
                .is_simple()
                .then(|| ctx.binding(inst.name.first()))
                .flatten()
            {
                binding.ty
            } else {
                let def = resolver.lookup_definition(&inst.name, ctx)?;
                if let Some((Index::Value(first), rest)) = inst.indexes.split_first() {
                    let element = Definition::reference(def, first.clone());
                    let ty = resolver.definition_type(&element, ctx);
                    return Some(rest.iter().fold(ty, |ty, _| ty.base_type()));
                }
                get_type(graph, &def)
            };
            Some(inst.indexes.iter().fold(base, |ty, _| ty.base_type()))
        }
        Construction::Binary { op, left, right } => {
            if op.is_comparison() || op.is_logical() {
                return Some(Type::primitive(PrimitiveKind::Boolean));
            }
            let l = infer_arg_type(resolver, left, ctx);
            let r = infer_arg_type(resolver, right, ctx);
            if *op == BinaryOp::Add {
                // string concatenation wins over numeric promotion
                for side in [&l, &r] {
                    if side.as_ref().and_then(Type::primitive_kind) == Some(PrimitiveKind::String) {
                        return side.clone();
                    }
                }
            }
            lattice::result_type(graph, l.as_ref(), r.as_ref())
        }
        Construction::Conditional {
            then, otherwise, ..
        } => {
            let a = infer_arg_type(resolver, then, ctx);
            let b = otherwise.as_deref().and_then(|o| infer_arg_type(resolver, o, ctx));
            lattice::result_type(graph, a.as_ref(), b.as_ref())
        }
        Construction::Seq(items) => {
            let element = items
                .iter()
                .map(|item| infer_arg_type(resolver, item, ctx))
                .reduce(|a, b| lattice::result_type(graph, a.as_ref(), b.as_ref()))
                .flatten()
                .unwrap_or_default();
            Some(element.sequence())
        }
        Construction::Map(_) => Some(Type::untyped().mapping()),
        Construction::Generator(_) => Some(Type::untyped().sequence()),
        _ => None,
    }
}

/// Whether `arg` can take part in a partial-application argument list for
/// `params`.
///
/// Only arguments that reference names need a match: the reference itself,
/// or some name inside the expression, must be one of the parameters.
pub fn matches_arg(arg: &Construction, params: &ParameterList) -> bool {
    if let Some(inst) = arg.as_instantiation() {
        return params.position(inst.name.first()).is_some();
    }
    let names = arg.referenced_names();
    names.is_empty() || params.params.iter().any(|p| arg.contains_name(&p.name))
}

/// The arguments of `args` that survive [`matches_arg`] against `params`.
pub fn partial_arguments(args: &[Construction], params: &ParameterList) -> Vec<Construction> {
    args.iter()
        .filter(|arg| matches_arg(arg, params))
        .cloned()
        .collect()
}
