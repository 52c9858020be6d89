//! Instantiations permanently paired with the scope they appeared in.

use bento_core::{DefId, Instantiation, ResolveResult, Type, Value};
use bento_registry::DefinitionGraph;

use crate::definition::get_type;
use crate::{Context, Definition, Resolver};

/// An [`Instantiation`] bound to one scope snapshot.
///
/// Each resolution runs on a fresh shared clone of the snapshot, so the
/// instance can be re-evaluated any number of times without re-deriving
/// its scope.
#[derive(Debug, Clone)]
pub struct ResolvedInstance {
    instantiation: Instantiation,
    scope: Context,
}

impl ResolvedInstance {
    pub fn new(instantiation: Instantiation, scope: &Context) -> Self {
        Self {
            instantiation,
            scope: scope.clone_scope(true),
        }
    }

    pub fn instantiation(&self) -> &Instantiation {
        &self.instantiation
    }

    pub fn scope(&self) -> &Context {
        &self.scope
    }

    pub fn resolve(&self, resolver: &Resolver<'_>) -> ResolveResult<Value> {
        let mut scope = self.scope.clone_scope(true);
        resolver.instantiate(&self.instantiation, &mut scope)
    }

    /// The definition the instantiation names in its captured scope.
    pub fn definition(&self, resolver: &Resolver<'_>) -> Option<Definition> {
        resolver.lookup_definition(&self.instantiation.name, &self.scope)
    }

    /// Type known without resolving: a bound parameter's type, or the
    /// named definition's declared type, one dimension stripped per index.
    pub fn static_type(&self, graph: &DefinitionGraph) -> Type {
        let name = &self.instantiation.name;
        let base = if let Some(binding) = name
            .is_simple()
            .then(|| self.scope.binding(name.first()))
            .flatten()
        {
            binding.ty
        } else {
            let from = self
                .scope
                .defining_definition()
                .and_then(Definition::def_id)
                .unwrap_or(DefId::ROOT);
            match graph.find_definition(name, from) {
                Some(id) => get_type(graph, &Definition::Named(id)),
                None => return Type::untyped(),
            }
        };
        self.instantiation
            .indexes
            .iter()
            .fold(base, |ty, _| ty.base_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::{Construction, PrimitiveKind};
    use bento_registry::{DefinitionEntry, Parameter, ParameterList};

    use crate::Binding;

    #[test]
    fn resolves_against_captured_scope() {
        let mut graph = DefinitionGraph::new();
        let echo = graph
            .define(
                DefId::ROOT,
                DefinitionEntry::body("echo", Construction::reference("n"))
                    .with_params(ParameterList::new(vec![Parameter::untyped("n")])),
            )
            .unwrap();
        let resolver = Resolver::new(&graph);

        let mut ctx = Context::new();
        ctx.push(
            Definition::Named(echo),
            Some(ParameterList::new(vec![Parameter::untyped("n")])),
            vec![Binding::new(Value::Int(9), Type::primitive(PrimitiveKind::Int))],
            false,
        );
        let instance = ResolvedInstance::new(Instantiation::new("n"), &ctx);
        ctx.pop();

        assert_eq!(instance.resolve(&resolver).unwrap(), Value::Int(9));
        assert_eq!(instance.resolve(&resolver).unwrap(), Value::Int(9));
        assert_eq!(instance.static_type(&graph), Type::primitive(PrimitiveKind::Int));
        assert!(ctx.is_empty());
    }

    #[test]
    fn static_type_of_definition_reference() {
        let mut graph = DefinitionGraph::new();
        let rows = graph
            .define(DefId::ROOT, DefinitionEntry::sequence("rows", vec![Construction::int(1)]))
            .unwrap();
        let whole = ResolvedInstance::new(Instantiation::new("rows"), &Context::new());
        assert!(whole.static_type(&graph).is_array());
        assert_eq!(whole.static_type(&graph).definition, Some(rows));

        let one = ResolvedInstance::new(
            Instantiation::new("rows").with_index(bento_core::Index::position(0)),
            &Context::new(),
        );
        assert!(!one.static_type(&graph).has_dims());
        assert!(ResolvedInstance::new(Instantiation::new("none"), &Context::new())
            .static_type(&graph)
            .is_untyped());
    }
}
