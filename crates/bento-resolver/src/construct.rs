//! Evaluation of constructions in a scope.

use bento_core::{Construction, Mapping, Redirection, ResolveResult, Value};

use crate::collection::generate;
use crate::operators::{self, DeferredOperand};
use crate::{Context, Resolver, catch};

impl Resolver<'_> {
    /// Evaluate `construction` in `ctx`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn construct(&self, construction: &Construction, ctx: &mut Context) -> ResolveResult<Value> {
        match construction {
            Construction::Literal(value) => Ok(value.clone()),
            Construction::Null | Construction::Missing => Ok(Value::Null),
            Construction::Instantiation(inst) => self.instantiate(inst, ctx),
            Construction::Binary { op, left, right } => {
                let left = self.construct(left, ctx)?;
                let right = DeferredOperand::new(right, ctx);
                operators::evaluate(self, *op, left, &right, ctx)
            }
            Construction::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.construct(condition, ctx)?.is_true() {
                    self.construct(then, ctx)
                } else {
                    match otherwise {
                        Some(otherwise) => self.construct(otherwise, ctx),
                        None => Ok(Value::Null),
                    }
                }
            }
            Construction::Seq(items) => {
                let items = items
                    .iter()
                    .map(|item| self.construct(item, ctx))
                    .collect::<ResolveResult<Vec<_>>>()?;
                Ok(Value::list(items))
            }
            Construction::Map(entries) => {
                let map = entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.construct(value, ctx)?)))
                    .collect::<ResolveResult<Mapping>>()?;
                Ok(Value::Map(map))
            }
            Construction::Generator(generator) => Ok(Value::list(generate(self, generator, None, ctx)?)),
            Construction::Block(items) => self.construct_block(items, ctx),
            Construction::Guarded { body, catches } => catch::recover(self, body, catches, ctx),
            Construction::Redirect { location } => Err(Redirection::redirect(location.clone()).into()),
            Construction::Super => self.construct_super(ctx),
        }
    }

    /// A block yields its single item unchanged, otherwise the text of every
    /// item that produced something.
    fn construct_block(&self, items: &[Construction], ctx: &mut Context) -> ResolveResult<Value> {
        if let [only] = items {
            return self.construct(only, ctx);
        }
        let mut out = String::new();
        for item in items {
            let value = self.construct(item, ctx)?;
            if !value.is_empty_value() {
                out.push_str(&value.to_string());
            }
        }
        Ok(Value::Str(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::{BinaryOp, Catch, DefId, Generator, Type};
    use bento_registry::{DefinitionEntry, DefinitionGraph, Parameter, ParameterList};

    fn eval(graph: &DefinitionGraph, c: &Construction) -> ResolveResult<Value> {
        Resolver::new(graph).construct(c, &mut Context::new())
    }

    #[test]
    fn literals_and_collections() {
        let graph = DefinitionGraph::new();
        assert_eq!(eval(&graph, &Construction::Null), Ok(Value::Null));
        assert_eq!(
            eval(&graph, &Construction::Seq(vec![Construction::int(1), Construction::str("b")])),
            Ok(Value::list([Value::Int(1), Value::str("b")]))
        );
        assert_eq!(
            eval(&graph, &Construction::Map(vec![("k".into(), Construction::int(1))])),
            Ok(Value::map([("k", Value::Int(1))]))
        );
    }

    #[test]
    fn conditionals_pick_a_branch() {
        let graph = DefinitionGraph::new();
        let c = Construction::Conditional {
            condition: Box::new(Construction::binary(BinaryOp::Lt, Construction::int(1), Construction::int(2))),
            then: Box::new(Construction::str("yes")),
            otherwise: Some(Box::new(Construction::reference("never"))),
        };
        assert_eq!(eval(&graph, &c), Ok(Value::str("yes")));
    }

    #[test]
    fn blocks_concatenate_output() {
        let graph = DefinitionGraph::new();
        let block = Construction::Block(vec![
            Construction::str("a"),
            Construction::Null,
            Construction::int(1),
        ]);
        assert_eq!(eval(&graph, &block), Ok(Value::str("a1")));
        assert_eq!(eval(&graph, &Construction::Block(vec![Construction::int(5)])), Ok(Value::Int(5)));
    }

    #[test]
    fn generators_build_lists() {
        let graph = DefinitionGraph::new();
        let generator = Generator::new(
            "i",
            Construction::int(3),
            Construction::binary(BinaryOp::Mul, Construction::reference("i"), Construction::int(10)),
        );
        assert_eq!(
            eval(&graph, &Construction::Generator(generator)),
            Ok(Value::list([Value::Long(0), Value::Long(10), Value::Long(20)]))
        );
    }

    #[test]
    fn explicit_redirects_fault() {
        let graph = DefinitionGraph::new();
        let err = eval(&graph, &Construction::Redirect { location: "login".into() }).unwrap_err();
        let redirection = err.into_redirection();
        assert!(redirection.is_redirect());
        assert_eq!(redirection.location, "login");
    }

    #[test]
    fn super_builds_the_supertype_with_forwarded_arguments() {
        let mut graph = DefinitionGraph::new();
        let params = ParameterList::new(vec![Parameter::untyped("name")]);
        graph
            .define(
                DefId::ROOT,
                DefinitionEntry::body(
                    "greeting",
                    Construction::binary(BinaryOp::Add, Construction::str("hello "), Construction::reference("name")),
                )
                .with_params(params.clone()),
            )
            .unwrap();
        graph
            .define(
                DefId::ROOT,
                DefinitionEntry::body(
                    "shout",
                    Construction::Block(vec![Construction::Super, Construction::str("!")]),
                )
                .with_super(Type::named("greeting"))
                .with_params(params),
            )
            .unwrap();
        let resolver = Resolver::new(&graph);
        let mut ctx = Context::new();
        assert_eq!(
            resolver.instantiate_name("shout", vec![Construction::str("bento")], &mut ctx),
            Ok(Value::str("hello bento!"))
        );
    }

    #[test]
    fn guarded_blocks_recover() {
        let graph = DefinitionGraph::new();
        let guarded = Construction::Guarded {
            body: Box::new(Construction::Redirect { location: "moved".into() }),
            catches: vec![Catch::tagged("moved", Construction::str("caught"))],
        };
        assert_eq!(eval(&graph, &guarded), Ok(Value::str("caught")));
    }
}
