//! Collection elements and read normalization.
//!
//! An element is stored in whatever form it was declared in. Reading it
//! peels exactly one wrapper layer per step until a concrete value remains:
//!
//! ```text
//! Construction --> Deferred --> Value
//! Collection   -----------------^
//! ```
//!
//! Each step strictly narrows the representation, so normalization always
//! terminates.

use bento_core::{Construction, ResolveResult, Type, Value};
use bento_registry::DefinitionGraph;

use super::CollectionInstance;
use crate::definition::{get_type, type_of_value};
use crate::{Context, Definition, ResolvedInstance, Resolver};

/// One stored element of a collection.
#[derive(Debug, Clone)]
pub enum Element {
    Value(Value),
    /// A reference bound to the scope the collection was built in.
    Deferred(ResolvedInstance),
    /// Any other expression, evaluated on first read.
    Construction {
        construction: Construction,
        scope: Context,
    },
    Collection(Box<CollectionInstance>),
}

enum Peeled {
    Done(Value),
    Next(Element),
}

impl Element {
    /// Store `construction` in its cheapest unresolved form.
    pub fn from_construction(construction: &Construction, scope: &Context) -> Self {
        match construction {
            Construction::Literal(value) => Element::Value(value.clone()),
            Construction::Null => Element::Value(Value::Null),
            Construction::Instantiation(inst) => {
                Element::Deferred(ResolvedInstance::new(inst.clone(), scope))
            }
            other => Element::Construction {
                construction: other.clone(),
                scope: scope.clone_scope(true),
            },
        }
    }

    fn peel(&self, resolver: &Resolver<'_>) -> ResolveResult<Peeled> {
        Ok(match self {
            Element::Value(value) => Peeled::Done(value.clone()),
            Element::Deferred(instance) => Peeled::Next(Element::Value(instance.resolve(resolver)?)),
            Element::Construction {
                construction: Construction::Instantiation(inst),
                scope,
            } => Peeled::Next(Element::Deferred(ResolvedInstance::new(inst.clone(), scope))),
            Element::Construction {
                construction,
                scope,
            } => {
                let mut scope = scope.clone_scope(true);
                Peeled::Next(Element::Value(resolver.construct(construction, &mut scope)?))
            }
            Element::Collection(collection) => {
                Peeled::Next(Element::Value(collection.collection_object(resolver)?))
            }
        })
    }

    /// The element's own type, as far as it is known without resolving it.
    pub fn intrinsic_type(&self, graph: &DefinitionGraph) -> Type {
        match self {
            Element::Value(value) => type_of_value(value),
            Element::Deferred(instance) => instance.static_type(graph),
            Element::Construction { .. } => Type::untyped(),
            Element::Collection(collection) => get_type(graph, &Definition::Named(collection.definition())),
        }
    }
}

/// Resolve an element down to a concrete value.
pub fn normalize(resolver: &Resolver<'_>, element: &Element) -> ResolveResult<Value> {
    let mut current = match element.peel(resolver)? {
        Peeled::Done(value) => return Ok(value),
        Peeled::Next(next) => next,
    };
    loop {
        match current.peel(resolver)? {
            Peeled::Done(value) => return Ok(value),
            Peeled::Next(next) => current = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::{BinaryOp, DefId};
    use bento_registry::DefinitionEntry;

    #[test]
    fn literals_are_stored_resolved() {
        let scope = Context::new();
        assert!(matches!(
            Element::from_construction(&Construction::int(3), &scope),
            Element::Value(Value::Int(3))
        ));
        assert!(matches!(
            Element::from_construction(&Construction::reference("x"), &scope),
            Element::Deferred(_)
        ));
    }

    #[test]
    fn normalize_peels_every_layer() {
        let mut graph = DefinitionGraph::new();
        graph
            .define(DefId::ROOT, DefinitionEntry::body("seven", Construction::int(7)))
            .unwrap();
        let resolver = Resolver::new(&graph);
        let scope = Context::new();

        let deferred = Element::from_construction(&Construction::reference("seven"), &scope);
        assert_eq!(normalize(&resolver, &deferred).unwrap(), Value::Int(7));

        let expr = Construction::binary(BinaryOp::Add, Construction::reference("seven"), Construction::int(1));
        let computed = Element::from_construction(&expr, &scope);
        assert_eq!(normalize(&resolver, &computed).unwrap(), Value::Int(8));
    }

    #[test]
    fn unresolvable_elements_fault() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let element = Element::from_construction(&Construction::reference("nowhere"), &Context::new());
        let err = normalize(&resolver, &element).unwrap_err();
        assert_eq!(err.as_redirection().map(|r| r.status), Some(404));
    }
}
