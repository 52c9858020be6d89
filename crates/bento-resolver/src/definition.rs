//! Runtime definitions: the named arena entries plus the scope-bound
//! wrappers created fresh per resolution.
//!
//! The wrappers forward most operations to an inner definition. Rather than
//! a hierarchy of forwarding objects, every kind is one variant of
//! [`Definition`] and each operation is a free function matching on it.
//!
//! | Variant     | Wraps                        | Overrides                         |
//! |-------------|------------------------------|-----------------------------------|
//! | `Named`     | an arena entry               | nothing                           |
//! | `Alias`     | a target under a new name    | durability (always dynamic)       |
//! | `Bound`     | a target plus frozen scope   | the scope used to instantiate     |
//! | `Flavor`    | a target plus one param list | parameter-list lookup             |
//! | `Element`   | one collection element       | type (narrowed against the owner) |
//! | `Reference` | an index into a collection   | everything                        |
//! | `Count`     | a collection                 | yields its size                   |
//! | `Keys`      | a mapping                    | yields its sorted keys            |

use bento_core::{
    BentoError, DefId, Durability, PrimitiveKind, Redirection, ResolveResult, Type, Value, ValueKind,
};
use bento_registry::{Contents, DefinitionGraph, ParameterList, lattice};

use crate::collection::Element;
use crate::Context;

/// A definition as seen by the resolver.
#[derive(Debug, Clone)]
pub enum Definition {
    Named(DefId),
    Alias {
        target: Box<Definition>,
        name: String,
        /// Declared supertype, instantiated when the target yields nothing.
        own_super: Option<Type>,
    },
    Bound {
        target: Box<Definition>,
        scope: Box<Context>,
    },
    Flavor {
        target: Box<Definition>,
        params: ParameterList,
        /// Position of `params` among the target's parameter lists.
        index: usize,
    },
    Element {
        /// Declared type of the collection the element belongs to.
        owner_type: Type,
        element: Box<Element>,
    },
    Reference {
        collection: Box<Definition>,
        index: Value,
    },
    Count {
        collection: Box<Definition>,
    },
    Keys {
        collection: Box<Definition>,
    },
}

impl Definition {
    pub fn alias(target: Definition, name: impl Into<String>, own_super: Option<Type>) -> Self {
        Definition::Alias {
            target: Box::new(target),
            name: name.into(),
            own_super,
        }
    }

    pub fn bound(target: Definition, scope: &Context) -> Self {
        Definition::Bound {
            target: Box::new(target),
            scope: Box::new(scope.clone_scope(false)),
        }
    }

    pub fn flavor(target: Definition, params: ParameterList, index: usize) -> Self {
        Definition::Flavor {
            target: Box::new(target),
            params,
            index,
        }
    }

    pub fn reference(collection: Definition, index: Value) -> Self {
        Definition::Reference {
            collection: Box::new(collection),
            index,
        }
    }

    /// The arena handle at the bottom of any forwarding wrappers.
    pub fn def_id(&self) -> Option<DefId> {
        match self {
            Definition::Named(id) => Some(*id),
            Definition::Alias { target, .. }
            | Definition::Bound { target, .. }
            | Definition::Flavor { target, .. } => target.def_id(),
            _ => None,
        }
    }
}

/// Unwrap every forwarding layer and follow alias entries to the definition
/// that finally produces the value.
///
/// Faults with a circular redirection when more than `max_depth` layers are
/// crossed.
pub fn ultimate_definition(
    graph: &DefinitionGraph,
    def: &Definition,
    max_depth: usize,
) -> ResolveResult<Definition> {
    let mut current = def.clone();
    for _ in 0..max_depth {
        current = match current {
            Definition::Alias { target, .. }
            | Definition::Bound { target, .. }
            | Definition::Flavor { target, .. } => *target,
            Definition::Named(id) => {
                let alias_target = graph.get(id).and_then(|entry| match &entry.contents {
                    Contents::Alias(inst) => graph.find_definition(&inst.name, id),
                    _ => None,
                });
                match alias_target {
                    Some(target) => Definition::Named(target),
                    None => return Ok(Definition::Named(id)),
                }
            }
            other => return Ok(other),
        };
    }
    Err(BentoError::from(Redirection::circular(name(graph, def))))
}

pub fn name(graph: &DefinitionGraph, def: &Definition) -> String {
    match def {
        Definition::Named(id) => graph.full_name(*id),
        Definition::Alias { name, .. } => name.clone(),
        Definition::Bound { target, .. } | Definition::Flavor { target, .. } => name(graph, target),
        Definition::Element { owner_type, .. } => format!("{owner_type} element"),
        Definition::Reference { collection, index } => {
            format!("{}[{index}]", name(graph, collection))
        }
        Definition::Count { collection } => format!("{}.count", name(graph, collection)),
        Definition::Keys { collection } => format!("{}.keys", name(graph, collection)),
    }
}

/// Durability tier governing caching of this definition's results.
pub fn durability(graph: &DefinitionGraph, def: &Definition) -> Durability {
    match def {
        Definition::Named(id) => lattice::combined_modifiers(graph, *id)
            .map(|m| m.durability)
            .unwrap_or_default(),
        Definition::Bound { target, .. } | Definition::Flavor { target, .. } => {
            durability(graph, target)
        }
        Definition::Alias { .. }
        | Definition::Element { .. }
        | Definition::Reference { .. }
        | Definition::Count { .. }
        | Definition::Keys { .. } => Durability::Dynamic,
    }
}

/// Parameter lists a call to this definition is matched against.
pub fn param_lists(graph: &DefinitionGraph, def: &Definition) -> Vec<ParameterList> {
    match def {
        Definition::Named(id) => graph
            .get(*id)
            .map(|e| e.param_lists.clone())
            .unwrap_or_default(),
        Definition::Flavor { params, .. } => vec![params.clone()],
        Definition::Alias { target, .. } | Definition::Bound { target, .. } => {
            param_lists(graph, target)
        }
        _ => Vec::new(),
    }
}

/// Declared type of a definition.
pub fn get_type(graph: &DefinitionGraph, def: &Definition) -> Type {
    match def {
        Definition::Named(id) => named_type(graph, *id),
        Definition::Alias { target, .. }
        | Definition::Bound { target, .. }
        | Definition::Flavor { target, .. } => get_type(graph, target),
        Definition::Element {
            owner_type,
            element,
        } => narrow_element_type(graph, &element.intrinsic_type(graph), owner_type),
        Definition::Reference { collection, .. } => get_type(graph, collection).base_type(),
        Definition::Count { .. } => Type::primitive(PrimitiveKind::Int),
        Definition::Keys { .. } => Type::primitive(PrimitiveKind::String).sequence(),
    }
}

fn named_type(graph: &DefinitionGraph, id: DefId) -> Type {
    let Some(entry) = graph.get(id) else {
        return Type::untyped();
    };
    let mut ty = Type::bound(graph.full_name(id), id);
    ty.dims = entry.dims.clone();
    ty
}

/// The narrower of an element's own type and its collection's element type.
///
/// Incomparable types yield void; an untyped side defers to the other.
pub fn narrow_element_type(graph: &DefinitionGraph, intrinsic: &Type, owner_type: &Type) -> Type {
    let declared = owner_type.base_type();
    if declared.is_untyped() {
        return intrinsic.clone();
    }
    if intrinsic.is_untyped() {
        return declared;
    }
    if lattice::levels_below(graph, intrinsic, &declared) >= 0 {
        intrinsic.clone()
    } else if lattice::levels_below(graph, &declared, intrinsic) >= 0 {
        declared
    } else {
        Type::void()
    }
}

/// Narrowest type describing a runtime value.
pub fn type_of_value(value: &Value) -> Type {
    match value {
        Value::Void => Type::void(),
        Value::Null => Type::untyped(),
        Value::Seq(_) => Type::untyped().sequence(),
        Value::Map(_) => Type::untyped().mapping(),
        Value::Host(host) => Type::named(host.class_name.clone()),
        scalar => match scalar.kind() {
            ValueKind::Str => Type::primitive(PrimitiveKind::String),
            kind => PrimitiveKind::from_value_kind(kind)
                .map(Type::primitive)
                .unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::{Construction, Instantiation};
    use bento_registry::{DefinitionEntry, Parameter};

    fn graph() -> (DefinitionGraph, DefId, DefId) {
        let mut g = DefinitionGraph::new();
        let target = g
            .define(
                DefId::ROOT,
                DefinitionEntry::body("target", Construction::int(1))
                    .with_durability(Durability::Global)
                    .with_params(ParameterList::new(vec![Parameter::untyped("a")])),
            )
            .unwrap();
        let alias = g
            .define(
                DefId::ROOT,
                DefinitionEntry::new("nick").with_contents(Contents::Alias(Instantiation::new("target"))),
            )
            .unwrap();
        (g, target, alias)
    }

    #[test]
    fn ultimate_definition_follows_alias_entries() {
        let (g, target, alias) = graph();
        let def = Definition::alias(Definition::Named(alias), "outer", None);
        let ultimate = ultimate_definition(&g, &def, 32).unwrap();
        assert_eq!(ultimate.def_id(), Some(target));
    }

    #[test]
    fn alias_cycles_are_circular() {
        let mut g = DefinitionGraph::new();
        g.define(
            DefId::ROOT,
            DefinitionEntry::new("a").with_contents(Contents::Alias(Instantiation::new("b"))),
        )
        .unwrap();
        let b = g
            .define(
                DefId::ROOT,
                DefinitionEntry::new("b").with_contents(Contents::Alias(Instantiation::new("a"))),
            )
            .unwrap();
        let err = ultimate_definition(&g, &Definition::Named(b), 8).unwrap_err();
        assert_eq!(err.as_redirection().map(|r| r.location.as_str()), Some("circular"));
    }

    #[test]
    fn alias_wrappers_are_dynamic() {
        let (g, target, _) = graph();
        assert_eq!(durability(&g, &Definition::Named(target)), Durability::Global);
        let alias = Definition::alias(Definition::Named(target), "t", None);
        assert_eq!(durability(&g, &alias), Durability::Dynamic);
        let bound = Definition::bound(Definition::Named(target), &Context::new());
        assert_eq!(durability(&g, &bound), Durability::Global);
    }

    #[test]
    fn flavor_fixes_parameter_list() {
        let (g, target, _) = graph();
        assert_eq!(param_lists(&g, &Definition::Named(target)).len(), 1);
        let fixed = ParameterList::new(vec![]);
        let flavor = Definition::flavor(Definition::Named(target), fixed.clone(), 0);
        assert_eq!(param_lists(&g, &flavor), vec![fixed]);
    }

    #[test]
    fn synthetic_definition_types() {
        let (g, target, _) = graph();
        let count = Definition::Count {
            collection: Box::new(Definition::Named(target)),
        };
        assert_eq!(get_type(&g, &count), Type::primitive(PrimitiveKind::Int));
        assert_eq!(name(&g, &count), "target.count");
        let keys = Definition::Keys {
            collection: Box::new(Definition::Named(target)),
        };
        assert!(get_type(&g, &keys).is_array());
    }

    #[test]
    fn element_type_takes_the_narrower_side() {
        let mut g = DefinitionGraph::new();
        g.define(DefId::ROOT, DefinitionEntry::new("shape")).unwrap();
        g.define(DefId::ROOT, DefinitionEntry::new("circle").with_super(Type::named("shape")))
            .unwrap();
        g.define(DefId::ROOT, DefinitionEntry::new("label")).unwrap();

        let owner = Type::named("shape").sequence();
        let narrowed = narrow_element_type(&g, &Type::named("circle"), &owner);
        assert_eq!(narrowed.name, "circle");
        let widened = narrow_element_type(&g, &Type::named("shape"), &Type::named("circle").sequence());
        assert_eq!(widened.name, "circle");
        assert!(narrow_element_type(&g, &Type::named("label"), &owner).is_void());
        assert_eq!(narrow_element_type(&g, &Type::named("label"), &Type::untyped().sequence()).name, "label");
    }

    #[test]
    fn value_types() {
        assert_eq!(type_of_value(&Value::Int(1)), Type::primitive(PrimitiveKind::Int));
        assert_eq!(type_of_value(&Value::str("a")), Type::primitive(PrimitiveKind::String));
        assert!(type_of_value(&Value::list([Value::Int(1)])).is_array());
        assert!(type_of_value(&Value::Null).is_untyped());
    }
}
