//! Type Lattice - subtype distance and result-type rules.
//!
//! Distances are counted in supertype hops. Primitive types have no
//! supertype relation to one another; a named definition reaches a primitive
//! only through its own declared supertypes.
//!
//! ## Rules
//!
//! 1. Identical types are 0 levels apart.
//! 2. Dimensioned types compare their base types, one layer costs one level.
//! 3. Otherwise the definition named by the type is climbed breadth-first
//!    through its supertype groups until `other` is reached.
//! 4. Opaque host bindings report [`EXTERNAL_DISTANCE`], since their
//!    hierarchy cannot be inspected.

use std::collections::VecDeque;

use bento_core::{
    Access, DefId, DefinitionFlags, DimKind, Durability, PrimitiveKind, Type, Value,
};
use rustc_hash::FxHashSet;

use crate::{Contents, DefinitionGraph, ParameterList};

/// Distance reported for opaque host bindings.
pub const EXTERNAL_DISTANCE: i32 = 1024;

/// Bound on supertype climbing; validation reports deeper chains.
const MAX_CLIMB: usize = 64;

/// How many supertype levels `this` lies below `other`, or -1 if unrelated.
pub fn levels_below(graph: &DefinitionGraph, this: &Type, other: &Type) -> i32 {
    if this.is_identical(other) {
        return 0;
    }

    if this.has_dims() || other.has_dims() {
        if let (Some(a), Some(b)) = (this.dims.first(), other.dims.first()) {
            if a.kind != b.kind {
                return -1;
            }
        }
        let below = levels_below(graph, &this.base_type(), &other.base_type());
        return if below >= 0 { below + 1 } else { -1 };
    }

    let Some(start) = graph.type_definition(this) else {
        return -1;
    };
    let target = graph.type_definition(other);
    if target == Some(start) {
        return 0;
    }
    if graph.get(start).is_some_and(|e| e.is_external()) {
        return EXTERNAL_DISTANCE;
    }

    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::from([(start, 0i32)]);
    while let Some((def, hops)) = queue.pop_front() {
        if !visited.insert(def) || visited.len() > MAX_CLIMB {
            continue;
        }
        let Some(entry) = graph.get(def) else {
            continue;
        };
        for super_ty in &entry.supertypes {
            let super_def = graph.type_definition(super_ty);
            if super_ty.is_identical(other) || (super_def.is_some() && super_def == target) {
                return hops + 1;
            }
            if let Some(next) = super_def {
                queue.push_back((next, hops + 1));
            }
        }
    }
    -1
}

/// Whether `candidate` is this type or one of its subtypes.
pub fn is_type_of(graph: &DefinitionGraph, this: &Type, candidate: &Type) -> bool {
    levels_below(graph, candidate, this) >= 0
}

/// The primitive kind a type ultimately derives from, if any.
pub fn primitive_root(graph: &DefinitionGraph, ty: &Type) -> Option<PrimitiveKind> {
    if ty.has_dims() {
        return None;
    }
    if let Some(kind) = ty.primitive_kind() {
        return Some(kind);
    }
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::from([graph.type_definition(ty)?]);
    while let Some(def) = queue.pop_front() {
        if !visited.insert(def) || visited.len() > MAX_CLIMB {
            continue;
        }
        let entry = graph.get(def)?;
        if entry.is_collection() {
            return None;
        }
        for super_ty in &entry.supertypes {
            if let Some(kind) = super_ty.primitive_kind() {
                return Some(kind);
            }
            if let Some(next) = graph.type_definition(super_ty) {
                queue.push_back(next);
            }
        }
    }
    None
}

// =============================================================================
// Collection predicates
// =============================================================================

/// Collection shape of a type: explicit dimensions, then the bound
/// definition's declared shape, then (for plain aliases) its supertypes.
pub fn collection_kind(graph: &DefinitionGraph, ty: &Type) -> Option<DimKind> {
    if let Some(dim) = ty.dims.first() {
        return Some(dim.kind);
    }
    let mut visited = FxHashSet::default();
    let mut current = graph.type_definition(ty);
    while let Some(def) = current {
        if !visited.insert(def) || visited.len() > MAX_CLIMB {
            return None;
        }
        let entry = graph.get(def)?;
        if let Some(kind) = entry.collection_kind() {
            return Some(kind);
        }
        if let Contents::External(value) = &entry.contents {
            return value_collection_kind(value);
        }
        // Plain aliases and extensions of a collection inherit its shape.
        if !matches!(
            entry.contents,
            Contents::Empty | Contents::Alias(_) | Contents::Collection(_)
        ) {
            return None;
        }
        let super_ty = entry.supertypes.first()?;
        if let Some(dim) = super_ty.dims.first() {
            return Some(dim.kind);
        }
        current = graph.type_definition(super_ty);
    }
    None
}

/// Collection shape of a concrete runtime value.
pub fn value_collection_kind(value: &Value) -> Option<DimKind> {
    match value {
        Value::Seq(_) => Some(DimKind::Sequence),
        Value::Map(_) => Some(DimKind::Mapping),
        Value::Host(h) => value_collection_kind(&h.value),
        _ => None,
    }
}

pub fn is_collection(graph: &DefinitionGraph, ty: &Type) -> bool {
    collection_kind(graph, ty).is_some()
}

pub fn is_array(graph: &DefinitionGraph, ty: &Type) -> bool {
    collection_kind(graph, ty) == Some(DimKind::Sequence)
}

pub fn is_table(graph: &DefinitionGraph, ty: &Type) -> bool {
    collection_kind(graph, ty) == Some(DimKind::Mapping)
}

/// Collection check that falls back to the shape of a runtime value.
pub fn is_collection_with_value(graph: &DefinitionGraph, ty: &Type, value: Option<&Value>) -> bool {
    is_collection(graph, ty) || value.and_then(value_collection_kind).is_some()
}

// =============================================================================
// Result types
// =============================================================================

/// Result type of a binary operation over operands of type `t1` and `t2`.
///
/// Returns `None` (undefined) when either side is missing or untyped, or
/// when no rule relates the two types.
pub fn result_type(graph: &DefinitionGraph, t1: Option<&Type>, t2: Option<&Type>) -> Option<Type> {
    let (t1, t2) = (t1?, t2?);
    if t1.is_untyped() || t2.is_untyped() {
        return None;
    }

    let c1 = is_collection(graph, t1);
    let c2 = is_collection(graph, t2);
    if c1 || c2 {
        let determining = match (c1, c2) {
            (true, false) => t1,
            (false, true) => t2,
            _ => {
                if is_type_of(graph, t1, t2) {
                    t1
                } else if is_type_of(graph, t2, t1) {
                    t2
                } else {
                    return None;
                }
            }
        };
        if !determining.has_dims() {
            return Some(determining.clone());
        }
        let base = result_type(graph, Some(&t1.element_root()), Some(&t2.element_root()))
            .unwrap_or_else(|| determining.element_root());
        let dims = if t1.dims.len() >= t2.dims.len() {
            t1.dims.clone()
        } else {
            t2.dims.clone()
        };
        return Some(Type { dims, ..base });
    }

    if is_type_of(graph, t1, t2) {
        return Some(t2.clone());
    }
    if is_type_of(graph, t2, t1) {
        return Some(t1.clone());
    }

    let k1 = primitive_root(graph, t1)?;
    let k2 = primitive_root(graph, t2)?;
    let (v1, v2) = (k1.value_kind(), k2.value_kind());
    if v1 == v2 || v1.is_assignable_from(v2) {
        return Some(widest(k1, k2, t1, t2).clone());
    }
    if v2.is_assignable_from(v1) {
        return Some(t2.clone());
    }
    match (k1.numeric_rank(), k2.numeric_rank()) {
        (Some(r1), Some(r2)) => Some(if r1 >= r2 { t1.clone() } else { t2.clone() }),
        (Some(_), None) if k2.is_character() => Some(t2.clone()),
        (None, Some(_)) if k1.is_character() => Some(t1.clone()),
        _ => None,
    }
}

/// Between two kinds stored in the same value class, the higher ranked one.
fn widest<'a>(k1: PrimitiveKind, k2: PrimitiveKind, t1: &'a Type, t2: &'a Type) -> &'a Type {
    match (k1.numeric_rank(), k2.numeric_rank()) {
        (Some(r1), Some(r2)) if r2 > r1 => t2,
        _ => t1,
    }
}

// =============================================================================
// Supertype suitability and modifiers
// =============================================================================

/// Whether a type can serve as the supertype for a definition with `params`.
///
/// A type without required arguments always can; otherwise the parameter
/// list must be at least as long as the argument list, and every required
/// (named) argument must match some parameter by name.
pub fn can_be_super_for_params(ty: &Type, params: &ParameterList) -> bool {
    let mut required = ty.required_args().peekable();
    if required.peek().is_none() {
        return true;
    }
    if params.len() < ty.args.len() {
        return false;
    }
    required.all(|name| params.position(name).is_some())
}

/// Modifiers of a definition folded over its supertype group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub access: Access,
    pub durability: Durability,
    pub is_abstract: bool,
}

/// Fold access, durability and abstractness over a definition and the
/// members of its supertype group; the lowest tier governs.
///
/// A definition with a single supertype (or none) keeps its own tiers.
pub fn combined_modifiers(graph: &DefinitionGraph, def: DefId) -> Option<Modifiers> {
    let entry = graph.get(def)?;
    let own = Modifiers {
        access: entry.access,
        durability: entry.durability,
        is_abstract: entry.is_abstract(),
    };
    if entry.supertypes.len() < 2 {
        return Some(own);
    }
    let members: Vec<_> = graph
        .supertype_defs(def)
        .into_iter()
        .filter(|&m| m != def)
        .filter_map(|m| graph.get(m))
        .collect();
    if members.is_empty() {
        return Some(own);
    }
    let access = Access::lowest(members.iter().map(|m| m.access).chain([own.access]))?;
    let durability =
        Durability::lowest(members.iter().map(|m| m.durability).chain([own.durability]))?;
    let is_abstract = own.is_abstract
        && DefinitionFlags::group_is_abstract(members.iter().map(|m| m.flags));
    Some(Modifiers {
        access,
        durability,
        is_abstract,
    })
}
