//! Definition entries stored in the graph.
//!
//! A [`DefinitionEntry`] is the immutable description of one named
//! definition: its tiers, supertypes, parameter lists and contents. Entries
//! are built with the `with_*` methods and then registered through
//! [`DefinitionGraph::define`](crate::DefinitionGraph::define).

use std::sync::OnceLock;

use bento_core::{
    Access, Construction, DefId, DefinitionFlags, Dim, DimKind, Durability, Generator, Index,
    Instantiation, Span, Type, Value,
};

/// One formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Declared type; [`Type::untyped`] when none was written.
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, Type::untyped())
    }
}

/// An ordered list of formal parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterList {
    pub params: Vec<Parameter>,
}

impl ParameterList {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Parameter> {
        self.params.get(i)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// Contents of a collection definition.
///
/// Sequence definitions use `elements`, mapping definitions use `entries`;
/// both may carry keyed `overrides`, which take precedence over everything
/// else when the definition extends another collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionContents {
    /// Positional elements (sequence additions).
    pub elements: Vec<Construction>,
    /// Keyed entries (mapping additions).
    pub entries: Vec<(String, Construction)>,
    /// Explicitly keyed element definitions.
    pub overrides: Vec<(Index, Construction)>,
    /// Generator producing the elements instead of a literal list.
    pub generator: Option<Generator>,
}

impl CollectionContents {
    pub fn sequence(elements: Vec<Construction>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn mapping<K: Into<String>>(entries: Vec<(K, Construction)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn generated(generator: Generator) -> Self {
        Self {
            generator: Some(generator),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, index: Index, value: Construction) -> Self {
        self.overrides.push((index, value));
        self
    }
}

/// What a definition produces when instantiated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Contents {
    /// No contents of its own; instantiation falls through to the supertypes.
    #[default]
    Empty,
    /// A body construction.
    Body(Construction),
    /// An alias of another definition.
    Alias(Instantiation),
    /// Collection elements, entries and overrides.
    Collection(CollectionContents),
    /// A bound host value.
    External(Value),
}

/// A named definition.
#[derive(Debug, Clone)]
pub struct DefinitionEntry {
    pub name: String,
    pub access: Access,
    pub durability: Durability,
    pub flags: DefinitionFlags,
    /// Supertypes in declaration order; empty when the definition has none.
    pub supertypes: Vec<Type>,
    /// Alternative parameter lists; empty for a parameterless definition.
    pub param_lists: Vec<ParameterList>,
    /// Dimension layers; non-empty for collection definitions.
    pub dims: Vec<Dim>,
    pub contents: Contents,
    /// Owning definition, set on registration. `None` only for the root.
    pub owner: Option<DefId>,
    pub span: Span,
    /// Memoized result of a static-durability collection.
    pub(crate) static_data: OnceLock<Value>,
}

impl DefinitionEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: Access::default(),
            durability: Durability::default(),
            flags: DefinitionFlags::empty(),
            supertypes: Vec::new(),
            param_lists: Vec::new(),
            dims: Vec::new(),
            contents: Contents::Empty,
            owner: None,
            span: Span::default(),
            static_data: OnceLock::new(),
        }
    }

    /// Shorthand for a definition with a body.
    pub fn body(name: impl Into<String>, body: Construction) -> Self {
        Self::new(name).with_contents(Contents::Body(body))
    }

    /// Shorthand for a sequence definition.
    pub fn sequence(name: impl Into<String>, elements: Vec<Construction>) -> Self {
        Self::new(name)
            .with_dim(Dim::sequence())
            .with_contents(Contents::Collection(CollectionContents::sequence(elements)))
    }

    /// Shorthand for a mapping definition.
    pub fn mapping<K: Into<String>>(name: impl Into<String>, entries: Vec<(K, Construction)>) -> Self {
        Self::new(name)
            .with_dim(Dim::mapping())
            .with_contents(Contents::Collection(CollectionContents::mapping(entries)))
    }

    /// Shorthand for a definition bound to a host value.
    pub fn external(name: impl Into<String>, value: Value) -> Self {
        Self::new(name)
            .with_flags(DefinitionFlags::EXTERNAL)
            .with_contents(Contents::External(value))
    }

    // === Builder Methods ===

    pub fn with_super(mut self, ty: Type) -> Self {
        self.supertypes.push(ty);
        self
    }

    pub fn with_params(mut self, params: ParameterList) -> Self {
        self.param_lists.push(params);
        self
    }

    pub fn with_dim(mut self, dim: Dim) -> Self {
        self.dims.push(dim);
        self
    }

    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_flags(mut self, flags: DefinitionFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // === Queries ===

    pub fn is_collection(&self) -> bool {
        !self.dims.is_empty()
    }

    pub fn collection_kind(&self) -> Option<DimKind> {
        self.dims.first().map(|d| d.kind)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(DefinitionFlags::EXTERNAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(DefinitionFlags::ABSTRACT)
    }

    pub fn has_params(&self) -> bool {
        !self.param_lists.is_empty()
    }

    /// The memoized static collection value, if it has been built.
    pub fn static_data(&self) -> Option<&Value> {
        self.static_data.get()
    }

    /// Store the static collection value; the first stored value wins.
    pub fn store_static_data(&self, value: Value) -> &Value {
        self.static_data.get_or_init(|| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let entry = DefinitionEntry::sequence("rows", vec![Construction::int(1)])
            .with_super(Type::named("table"))
            .with_durability(Durability::Static);
        assert!(entry.is_collection());
        assert_eq!(entry.collection_kind(), Some(DimKind::Sequence));
        assert_eq!(entry.supertypes.len(), 1);
        assert_eq!(entry.durability, Durability::Static);
    }

    #[test]
    fn static_data_first_store_wins() {
        let entry = DefinitionEntry::new("s");
        assert!(entry.static_data().is_none());
        entry.store_static_data(Value::Int(1));
        entry.store_static_data(Value::Int(2));
        assert_eq!(entry.static_data(), Some(&Value::Int(1)));
    }

    #[test]
    fn parameter_positions() {
        let params = ParameterList::new(vec![Parameter::untyped("a"), Parameter::untyped("b")]);
        assert_eq!(params.position("b"), Some(1));
        assert_eq!(params.position("c"), None);
    }

    #[test]
    fn external_entries_are_flagged() {
        assert!(DefinitionEntry::external("host", Value::Int(1)).is_external());
    }
}
