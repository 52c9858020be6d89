//! Collection Resolver: lazily materialized sequences and mappings.
//!
//! A [`CollectionInstance`] binds a collection definition to the scope (and
//! therefore the arguments) it was instantiated with, and picks a backing
//! store:
//!
//! | Backing            | Built from                                       |
//! |--------------------|--------------------------------------------------|
//! | `Fixed`            | literal elements of a definite-size sequence     |
//! | `Growable`         | literal elements of a growable sequence          |
//! | `Table`            | literal entries of a mapping, or a host mapping  |
//! | `ExternalFixed`    | a host array                                     |
//! | `ExternalGrowable` | a host list                                      |
//! | `Generated`        | a generator, materialized once per scope         |
//! | `Sub`              | a definition extending another collection        |
//!
//! Elements stay unresolved until they are read.

mod backing;
mod element;
mod generated;
mod subcollection;

pub use backing::{Backing, FixedBacking, GeneratedBacking, GrowableBacking, TableBacking};
pub use element::{Element, normalize};
pub use generated::generate;
pub use subcollection::SubBacking;

use bento_core::{
    Construction, DefId, Dim, DimKind, Mapping, Redirection, ResolveResult, Sequence, SequenceKind,
    Type, Value,
};
use bento_registry::{CollectionContents, Contents, DefinitionEntry, DefinitionGraph, MAX_SUPER_DEPTH, lattice};
use tracing::warn;

use crate::definition::get_type;
use crate::{Context, Definition, Resolver};

/// A collection definition bound to one scope.
#[derive(Debug, Clone)]
pub struct CollectionInstance {
    definition: DefId,
    kind: DimKind,
    backing: Backing,
    scope: Context,
}

impl CollectionInstance {
    /// Bind `definition` to `ctx`.
    ///
    /// The definition's own frame is expected on top of `ctx`, so that
    /// elements referring to its parameters see the bound arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn new(resolver: &Resolver<'_>, definition: DefId, ctx: &mut Context) -> ResolveResult<Self> {
        let graph = resolver.graph();
        let entry = graph
            .get(definition)
            .ok_or_else(|| Redirection::not_found(definition.to_string()))?;
        let name = graph.full_name(definition);
        let declared = get_type(graph, &Definition::Named(definition));
        let kind = lattice::collection_kind(graph, &declared)
            .ok_or_else(|| Redirection::unsupported_collection(&name, "definition has no collection shape"))?;
        let scope = ctx.clone_scope(true);
        let super_id = super_collection(resolver, entry);

        let backing = match (&entry.contents, super_id) {
            (Contents::Collection(contents), Some(super_id)) => {
                let base = bind_super(resolver, super_id, ctx)?;
                Backing::Sub(Box::new(SubBacking::new(resolver, base, contents, &scope, ctx)?))
            }
            (Contents::Empty, Some(super_id)) => {
                let base = bind_super(resolver, super_id, ctx)?;
                let contents = CollectionContents::default();
                Backing::Sub(Box::new(SubBacking::new(resolver, base, &contents, &scope, ctx)?))
            }
            (Contents::Collection(contents), None) => match &contents.generator {
                Some(generator) => {
                    if kind == DimKind::Mapping {
                        return Err(Redirection::unsupported_collection(
                            &name,
                            "generators produce sequences only",
                        )
                        .into());
                    }
                    let size = declared_size(resolver, entry, ctx)?;
                    let mut generator_scope = ctx.clone_scope(true);
                    let items = generate(resolver, generator, size, &mut generator_scope)?;
                    let kind = if size.is_some() {
                        SequenceKind::Array
                    } else {
                        SequenceKind::List
                    };
                    Backing::Generated(GeneratedBacking { items, kind })
                }
                None => literal_backing(resolver, &name, entry, contents, kind, &scope, ctx)?,
            },
            (Contents::Empty, None) => Backing::from_value(&name, kind, Value::Null)?,
            (Contents::External(value), _) => Backing::from_value(&name, kind, value.clone())?,
            (Contents::Body(_) | Contents::Alias(_), _) => {
                let value = resolver.construct_plain_contents(definition, entry, ctx)?;
                Backing::from_value(&name, kind, value)?
            }
        };

        Ok(Self {
            definition,
            kind,
            backing,
            scope,
        })
    }

    pub fn definition(&self) -> DefId {
        self.definition
    }

    pub fn kind(&self) -> DimKind {
        self.kind
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// The scope the collection was bound in.
    pub fn scope(&self) -> &Context {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.backing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    /// The stored (unresolved) element at `index`.
    pub fn element(&self, index: &Value) -> Option<Element> {
        match &self.backing {
            Backing::Fixed(b) => position(index).and_then(|i| b.get(i)).cloned(),
            Backing::Growable(b) => position(index).and_then(|i| b.get(i)).cloned(),
            Backing::Table(t) => t.get(&index.as_key()).cloned(),
            Backing::ExternalFixed(s) | Backing::ExternalGrowable(s) => position(index)
                .and_then(|i| s.items.get(i))
                .cloned()
                .map(Element::Value),
            Backing::Generated(g) => position(index)
                .and_then(|i| g.items.get(i))
                .cloned()
                .map(Element::Value),
            Backing::Sub(_) => None,
        }
    }

    /// The element at `index` wrapped as a definition, typed against this
    /// collection's declared element type.
    pub fn element_definition(&self, resolver: &Resolver<'_>, index: &Value) -> ResolveResult<Option<Definition>> {
        Ok(self.stored_element(index).map(|element| Definition::Element {
            owner_type: container_type(resolver.graph(), self.definition),
            element: Box::new(element),
        }))
    }

    /// The stored element at `index`, looking through subcollection layers.
    pub fn stored_element(&self, index: &Value) -> Option<Element> {
        match &self.backing {
            Backing::Sub(sub) => sub.stored_element(index),
            _ => self.element(index),
        }
    }

    /// Read and normalize the element at `index`.
    pub fn get_element(&self, resolver: &Resolver<'_>, index: &Value) -> ResolveResult<Option<Value>> {
        match &self.backing {
            Backing::Sub(sub) => sub.get_element(resolver, index),
            _ => self.element(index).map(|e| normalize(resolver, &e)).transpose(),
        }
    }

    /// Sorted keys of a mapping; `None` for sequences.
    pub fn keys(&self) -> Option<Vec<String>> {
        match &self.backing {
            Backing::Table(t) => Some(t.keys().cloned().collect()),
            Backing::Sub(sub) => sub.keys(),
            _ => None,
        }
    }

    /// Every valid index: positions of a sequence, keys of a mapping.
    pub fn indices(&self) -> Vec<Value> {
        match self.kind {
            DimKind::Sequence => (0..self.len()).map(|i| Value::Long(i as i64)).collect(),
            DimKind::Mapping => self
                .keys()
                .unwrap_or_default()
                .into_iter()
                .map(Value::Str)
                .collect(),
        }
    }

    /// Materialize the whole collection as a native container.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collection_object(&self, resolver: &Resolver<'_>) -> ResolveResult<Value> {
        Ok(match &self.backing {
            Backing::Fixed(b) => Value::Seq(Sequence::array(normalize_all(resolver, b.iter())?)),
            Backing::Growable(b) => Value::Seq(Sequence::list(normalize_all(resolver, b.iter())?)),
            Backing::Table(t) => Value::Map(
                t.iter()
                    .map(|(k, e)| Ok((k.clone(), normalize(resolver, e)?)))
                    .collect::<ResolveResult<Mapping>>()?,
            ),
            Backing::ExternalFixed(s) | Backing::ExternalGrowable(s) => Value::Seq(s.clone()),
            Backing::Generated(g) => Value::Seq(Sequence {
                kind: g.kind,
                items: g.items.clone(),
            }),
            Backing::Sub(sub) => sub.materialize(resolver)?,
        })
    }
}

/// A collection definition seen as a container of its element type: the
/// first non-collection supertype carrying the collection's dimensions.
/// Extensions of a collection take their super collection's container type.
pub fn container_type(graph: &DefinitionGraph, definition: DefId) -> Type {
    let mut current = definition;
    for _ in 0..MAX_SUPER_DEPTH {
        let Some(entry) = graph.get(current) else {
            break;
        };
        let dims = if entry.dims.is_empty() {
            vec![Dim::sequence()]
        } else {
            entry.dims.clone()
        };
        return match entry.supertypes.first() {
            Some(super_ty) if super_ty.has_dims() => super_ty.clone(),
            Some(super_ty) if lattice::is_collection(graph, super_ty) => {
                match graph.type_definition(super_ty) {
                    Some(next) => {
                        current = next;
                        continue;
                    }
                    None => Type { dims, ..Type::untyped() },
                }
            }
            Some(super_ty) => Type { dims, ..super_ty.clone() },
            None => Type { dims, ..Type::untyped() },
        };
    }
    Type::untyped().sequence()
}

fn normalize_all<'a>(
    resolver: &Resolver<'_>,
    elements: impl Iterator<Item = &'a Element>,
) -> ResolveResult<Vec<Value>> {
    elements.map(|e| normalize(resolver, e)).collect()
}

/// Position selected by an index value.
pub(crate) fn position(index: &Value) -> Option<usize> {
    index.as_i64().and_then(|i| usize::try_from(i).ok())
}

/// Declared definite size of the outermost dimension.
fn declared_size(resolver: &Resolver<'_>, entry: &DefinitionEntry, ctx: &mut Context) -> ResolveResult<Option<usize>> {
    let Some(size) = entry.dims.first().and_then(|d| d.size.as_deref()) else {
        return Ok(None);
    };
    let value = resolver.construct(size, ctx)?;
    Ok(position(&value))
}

/// The collection definition `entry` extends, if its primary supertype is one.
fn super_collection(resolver: &Resolver<'_>, entry: &DefinitionEntry) -> Option<DefId> {
    let graph = resolver.graph();
    let super_ty = entry.supertypes.first()?;
    let super_id = graph.type_definition(super_ty)?;
    lattice::is_collection(graph, &Type::bound(graph.full_name(super_id), super_id))
        .then_some(super_id)
}

/// Bind the super collection with the arguments of the current frame.
fn bind_super(resolver: &Resolver<'_>, super_id: DefId, ctx: &mut Context) -> ResolveResult<CollectionInstance> {
    let (params, args) = ctx
        .peek()
        .map(|f| (f.params.clone(), f.args.clone()))
        .unwrap_or_default();
    ctx.push(Definition::Named(super_id), params, args, true);
    let result = CollectionInstance::new(resolver, super_id, ctx);
    ctx.pop();
    result
}

/// Element for a literal entry; references to other collection definitions
/// are bound as nested instances.
fn literal_element(resolver: &Resolver<'_>, construction: &Construction, scope: &Context) -> ResolveResult<Element> {
    if let Some(inst) = construction.as_instantiation() {
        if inst.args.is_none() && inst.indexes.is_empty() {
            if let Some(id) = resolver
                .lookup_definition(&inst.name, scope)
                .and_then(|d| d.def_id())
                .filter(|id| resolver.graph().get(*id).is_some_and(|e| e.is_collection() && !e.has_params()))
            {
                let mut nested = scope.clone_scope(true);
                nested.push(Definition::Named(id), None, Vec::new(), false);
                let instance = CollectionInstance::new(resolver, id, &mut nested)?;
                return Ok(Element::Collection(Box::new(instance)));
            }
        }
    }
    Ok(Element::from_construction(construction, scope))
}

fn literal_backing(
    resolver: &Resolver<'_>,
    name: &str,
    entry: &DefinitionEntry,
    contents: &CollectionContents,
    kind: DimKind,
    scope: &Context,
    ctx: &mut Context,
) -> ResolveResult<Backing> {
    if kind == DimKind::Mapping {
        let mut table = TableBacking::new();
        for (key, construction) in &contents.entries {
            table.insert(key.clone(), literal_element(resolver, construction, scope)?);
        }
        for (index, construction) in &contents.overrides {
            let key = resolver.resolve_index(index, ctx)?.as_key();
            table.insert(key, literal_element(resolver, construction, scope)?);
        }
        return Ok(Backing::Table(table));
    }

    let mut items = contents
        .elements
        .iter()
        .map(|c| literal_element(resolver, c, scope))
        .collect::<ResolveResult<Vec<_>>>()?;
    let size = declared_size(resolver, entry, ctx)?;
    if let Some(size) = size {
        if items.len() > size {
            return Err(Redirection::unsupported_collection(
                name,
                format!("{} elements exceed the declared size {size}", items.len()),
            )
            .into());
        }
    }
    let capacity = size.unwrap_or(items.len());
    if let Some(size) = size {
        items.resize(size, Element::Value(Value::Null));
    }
    for (index, construction) in &contents.overrides {
        let index = resolver.resolve_index(index, ctx)?;
        match position(&index) {
            Some(i) if i < capacity => items[i] = literal_element(resolver, construction, scope)?,
            _ => warn!(collection = %name, index = %index, len = capacity, "override index out of range, skipped"),
        }
    }

    Ok(match size {
        Some(size) => {
            let mut fixed = FixedBacking::new(size);
            for (i, element) in items.into_iter().enumerate() {
                fixed.set(i, element);
            }
            Backing::Fixed(fixed)
        }
        None => {
            let mut growable = GrowableBacking::new();
            for element in items {
                growable.push(element);
            }
            Backing::Growable(growable)
        }
    })
}
