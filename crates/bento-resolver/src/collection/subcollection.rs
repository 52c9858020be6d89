//! Subcollections: a collection that extends or overrides another one.
//!
//! A subcollection keeps its super collection intact and layers two kinds
//! of changes on top of it:
//!
//! - additions: positional elements appended after the super sequence, or
//!   keyed entries added to the super mapping
//! - overrides: explicitly keyed element definitions
//!
//! Precedence is always super < addition < override.

use std::collections::BTreeSet;

use bento_core::{DimKind, Redirection, ResolveResult, Sequence, Value};
use bento_registry::CollectionContents;
use tracing::warn;

use super::{CollectionInstance, Element, normalize, position};
use crate::{Context, Resolver};

#[derive(Debug, Clone)]
pub struct SubBacking {
    super_collection: CollectionInstance,
    kind: DimKind,
    additions: Vec<Element>,
    keyed_additions: Vec<(String, Element)>,
    overrides: Vec<(Value, Element)>,
}

impl SubBacking {
    /// Layer `contents` over `super_collection`, capturing elements in `scope`.
    ///
    /// Override indexes are resolved immediately in `ctx`.
    pub fn new(
        resolver: &Resolver<'_>,
        super_collection: CollectionInstance,
        contents: &CollectionContents,
        scope: &Context,
        ctx: &mut Context,
    ) -> ResolveResult<Self> {
        let kind = super_collection.kind();
        let additions = contents
            .elements
            .iter()
            .map(|c| Element::from_construction(c, scope))
            .collect();
        let keyed_additions = contents
            .entries
            .iter()
            .map(|(k, c)| (k.clone(), Element::from_construction(c, scope)))
            .collect();
        let overrides = contents
            .overrides
            .iter()
            .map(|(index, c)| Ok((resolver.resolve_index(index, ctx)?, Element::from_construction(c, scope))))
            .collect::<ResolveResult<Vec<_>>>()?;
        Ok(Self {
            super_collection,
            kind,
            additions,
            keyed_additions,
            overrides,
        })
    }

    pub fn super_collection(&self) -> &CollectionInstance {
        &self.super_collection
    }

    /// Sequence overrides past the combined length are skipped, as
    /// [`materialize`](Self::materialize) skips them.
    fn find_override(&self, index: &Value) -> Option<&Element> {
        if self.kind == DimKind::Sequence && !position(index).is_some_and(|i| i < self.len()) {
            return None;
        }
        let key = index.as_key();
        // later overrides of the same key win
        self.overrides
            .iter()
            .rev()
            .find(|(k, _)| k.as_key() == key)
            .map(|(_, e)| e)
    }

    /// The stored element at `index` through the override layers, unresolved.
    pub fn stored_element(&self, index: &Value) -> Option<Element> {
        if let Some(element) = self.find_override(index) {
            return Some(element.clone());
        }
        match self.kind {
            DimKind::Sequence => {
                let super_len = self.super_collection.len();
                match position(index) {
                    Some(i) if i >= super_len => self.additions.get(i - super_len).cloned(),
                    _ => self.super_collection.stored_element(index),
                }
            }
            DimKind::Mapping => {
                let key = index.as_key();
                match self.keyed_additions.iter().rev().find(|(k, _)| *k == key) {
                    Some((_, element)) => Some(element.clone()),
                    None => self.super_collection.stored_element(index),
                }
            }
        }
    }

    /// Read one element through the override layers.
    pub fn get_element(&self, resolver: &Resolver<'_>, index: &Value) -> ResolveResult<Option<Value>> {
        if let Some(element) = self.find_override(index) {
            return normalize(resolver, element).map(Some);
        }
        match self.kind {
            DimKind::Sequence => {
                let super_len = self.super_collection.len();
                match position(index) {
                    Some(i) if i >= super_len => self
                        .additions
                        .get(i - super_len)
                        .map(|e| normalize(resolver, e))
                        .transpose(),
                    _ => self.super_collection.get_element(resolver, index),
                }
            }
            DimKind::Mapping => {
                let key = index.as_key();
                match self.keyed_additions.iter().rev().find(|(k, _)| *k == key) {
                    Some((_, element)) => normalize(resolver, element).map(Some),
                    None => self.super_collection.get_element(resolver, index),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.kind {
            DimKind::Sequence => self.super_collection.len() + self.additions.len(),
            DimKind::Mapping => self.key_set().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_set(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self
            .super_collection
            .keys()
            .unwrap_or_default()
            .into_iter()
            .collect();
        keys.extend(self.keyed_additions.iter().map(|(k, _)| k.clone()));
        keys.extend(self.overrides.iter().map(|(k, _)| k.as_key()));
        keys
    }

    /// Sorted keys of a mapping subcollection.
    pub fn keys(&self) -> Option<Vec<String>> {
        match self.kind {
            DimKind::Mapping => Some(self.key_set().into_iter().collect()),
            DimKind::Sequence => None,
        }
    }

    /// Materialize the reconciled snapshot.
    pub fn materialize(&self, resolver: &Resolver<'_>) -> ResolveResult<Value> {
        let base = self.super_collection.collection_object(resolver)?;
        match (self.kind, base) {
            (DimKind::Sequence, Value::Seq(seq)) => {
                let mut items = seq.items;
                for addition in &self.additions {
                    items.push(normalize(resolver, addition)?);
                }
                for (index, element) in &self.overrides {
                    match position(index) {
                        Some(i) if i < items.len() => items[i] = normalize(resolver, element)?,
                        _ => warn!(
                            collection = %resolver.graph().full_name(self.super_collection.definition()),
                            index = %index,
                            len = items.len(),
                            "override index out of range, skipped"
                        ),
                    }
                }
                Ok(Value::Seq(Sequence {
                    kind: seq.kind,
                    items,
                }))
            }
            (DimKind::Mapping, Value::Map(mut map)) => {
                for (key, element) in &self.keyed_additions {
                    map.insert(key.clone(), normalize(resolver, element)?);
                }
                for (key, element) in &self.overrides {
                    map.insert(key.as_key(), normalize(resolver, element)?);
                }
                Ok(Value::Map(map))
            }
            (_, other) => Err(Redirection::unsupported_collection(
                resolver.graph().full_name(self.super_collection.definition()),
                format!("super collection produced a {} value", other.kind()),
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bento_core::{Construction, DefId, Index, Instantiation, Type};
    use bento_registry::{Contents, DefinitionEntry, DefinitionGraph};

    use super::*;

    fn extended() -> DefinitionGraph {
        let mut graph = DefinitionGraph::new();
        graph
            .define(
                DefId::ROOT,
                DefinitionEntry::sequence("base", vec![Construction::str("a"), Construction::str("b")]),
            )
            .unwrap();
        graph
            .define(
                DefId::ROOT,
                DefinitionEntry::new("ext")
                    .with_super(Type::named("base"))
                    .with_contents(Contents::Collection(
                        CollectionContents::sequence(vec![Construction::str("c")])
                            .with_override(Index::position(1), Construction::str("y"))
                            .with_override(Index::position(7), Construction::str("z")),
                    )),
            )
            .unwrap();
        graph
    }

    fn read(resolver: &Resolver<'_>, i: i64) -> ResolveResult<Value> {
        let inst = Instantiation::new("ext").with_index(Index::position(i));
        resolver.instantiate(&inst, &mut Context::new())
    }

    #[test]
    fn indexed_reads_agree_with_materialization() {
        let graph = extended();
        let resolver = Resolver::new(&graph);
        let whole = resolver.instantiate_name("ext", Vec::new(), &mut Context::new()).unwrap();
        assert_eq!(whole, Value::list([Value::str("a"), Value::str("y"), Value::str("c")]));
        assert_eq!(read(&resolver, 0).unwrap(), Value::str("a"));
        assert_eq!(read(&resolver, 1).unwrap(), Value::str("y"));
        assert_eq!(read(&resolver, 2).unwrap(), Value::str("c"));
    }

    #[test]
    fn out_of_range_overrides_are_skipped() {
        let graph = extended();
        let resolver = Resolver::new(&graph);
        assert!(read(&resolver, 7).is_err());
        assert_eq!(
            resolver.instantiate_name("ext.count", Vec::new(), &mut Context::new()).unwrap(),
            Value::Int(3)
        );
    }
}
