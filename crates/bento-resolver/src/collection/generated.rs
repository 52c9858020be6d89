//! Generated collections: comprehension-like generators flattened into a
//! sequence once per scope.

use bento_core::{Construction, Generator, ResolveResult, Value};
use tracing::{trace, warn};

use crate::{Context, Resolver};

/// Run `generator` in `ctx`, stopping early once `limit` elements exist.
///
/// A generator body that is itself a generator is flattened into the
/// output. Without a limit, output is capped by the resolver's
/// `max_generated_elements`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate(
    resolver: &Resolver<'_>,
    generator: &Generator,
    limit: Option<usize>,
    ctx: &mut Context,
) -> ResolveResult<Vec<Value>> {
    let cap = resolver.options().max_generated_elements;
    let mut out = Vec::new();
    expand(resolver, generator, limit.map_or(cap, |l| l.min(cap)), &mut out, ctx)?;
    Ok(out)
}

/// Returns true once the target size is reached.
fn expand(
    resolver: &Resolver<'_>,
    generator: &Generator,
    target: usize,
    out: &mut Vec<Value>,
    ctx: &mut Context,
) -> ResolveResult<bool> {
    let source = resolver.construct(&generator.source, ctx)?;
    for (index, item) in source_items(source, target).into_iter().enumerate() {
        if out.len() >= target {
            return Ok(stop(generator, out.len(), target, resolver));
        }
        ctx.push_local(&generator.var, item, index);
        let reached = step(resolver, generator, target, out, ctx);
        ctx.pop();
        if reached? {
            return Ok(true);
        }
    }
    if out.len() >= target {
        return Ok(stop(generator, out.len(), target, resolver));
    }
    Ok(false)
}

fn step(
    resolver: &Resolver<'_>,
    generator: &Generator,
    target: usize,
    out: &mut Vec<Value>,
    ctx: &mut Context,
) -> ResolveResult<bool> {
    if let Some(filter) = &generator.filter {
        if !resolver.construct(filter, ctx)?.is_true() {
            return Ok(false);
        }
    }
    match generator.body.as_ref() {
        Construction::Generator(inner) => expand(resolver, inner, target, out, ctx),
        body => {
            out.push(resolver.construct(body, ctx)?);
            Ok(false)
        }
    }
}

fn stop(generator: &Generator, len: usize, target: usize, resolver: &Resolver<'_>) -> bool {
    if target >= resolver.options().max_generated_elements {
        warn!(var = %generator.var, len, "generated collection hit the element cap");
    } else {
        trace!(var = %generator.var, len, "generated collection reached its size");
    }
    true
}

/// Items iterated by a generator source: collection elements, or `0..n` for
/// an integral source.
fn source_items(source: Value, cap: usize) -> Vec<Value> {
    match source {
        Value::Seq(seq) => seq.items,
        Value::Map(map) => map.into_values().collect(),
        Value::Void | Value::Null => Vec::new(),
        Value::Int(_) | Value::Long(_) | Value::Byte(_) => {
            let n = source.as_i64().unwrap_or(0).max(0) as u64;
            (0..n.min(cap as u64 + 1)).map(|i| Value::Long(i as i64)).collect()
        }
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolverOptions;
    use bento_core::BinaryOp;
    use bento_registry::DefinitionGraph;

    fn squares() -> Generator {
        Generator::new(
            "i",
            Construction::int(5),
            Construction::binary(BinaryOp::Mul, Construction::reference("i"), Construction::reference("i")),
        )
    }

    #[test]
    fn generates_every_element() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let out = generate(&resolver, &squares(), None, &mut Context::new()).unwrap();
        let expected: Vec<Value> = [0i64, 1, 4, 9, 16].into_iter().map(Value::Long).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn stops_at_definite_size() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let out = generate(&resolver, &squares(), Some(2), &mut Context::new()).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn filters_skip_elements() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let evens = Generator::new("i", Construction::int(6), Construction::reference("i")).with_filter(
            Construction::binary(
                BinaryOp::Eq,
                Construction::binary(BinaryOp::Mod, Construction::reference("i"), Construction::int(2)),
                Construction::int(0),
            ),
        );
        let out = generate(&resolver, &evens, None, &mut Context::new()).unwrap();
        assert_eq!(out, vec![Value::Long(0), Value::Long(2), Value::Long(4)]);
    }

    #[test]
    fn nested_generators_flatten() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let inner = Generator::new(
            "b",
            Construction::Seq(vec![Construction::str("x"), Construction::str("y")]),
            Construction::binary(BinaryOp::Add, Construction::reference("a"), Construction::reference("b")),
        );
        let outer = Generator::new(
            "a",
            Construction::Seq(vec![Construction::str("1"), Construction::str("2")]),
            Construction::Generator(inner),
        );
        let mut ctx = Context::new();
        let out = generate(&resolver, &outer, Some(3), &mut ctx).unwrap();
        assert_eq!(out, vec![Value::str("1x"), Value::str("1y"), Value::str("2x")]);
        assert!(ctx.is_empty());
    }

    #[test]
    fn element_cap_bounds_unsized_generators() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::with_options(&graph, ResolverOptions::new().with_max_generated_elements(3));
        let out = generate(&resolver, &squares(), None, &mut Context::new()).unwrap();
        assert_eq!(out.len(), 3);
    }
}
