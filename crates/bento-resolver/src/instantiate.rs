//! The resolver: name lookup and instantiation of definitions.
//!
//! [`Resolver`] borrows a finished [`DefinitionGraph`] and threads an
//! explicit [`Context`] through every call. An instantiation proceeds as:
//!
//! 1. Look the name up: bound parameters and generator variables first, then
//!    definitions visible from the defining definition, then the synthetic
//!    `count` / `keys` members of collections.
//! 2. Pick a parameter list with the matcher and bind the arguments.
//! 3. Consult the durability cache, otherwise push a frame, construct the
//!    contents and pop.
//! 4. Apply any indexes. Indexes on a collection definition read one
//!    element without materializing the rest.

use bento_core::{
    Access, Arguments, Construction, DefId, Durability, Index, Instantiation, Mapping, NameRef,
    PrimitiveKind, Redirection, ResolveResult, Sequence, Type, Value,
};
use bento_registry::{Contents, DefinitionEntry, DefinitionGraph, Parameter, ParameterList, lattice};
use tracing::{debug, trace};

use crate::collection::{CollectionInstance, normalize};
use crate::context::CacheKey;
use crate::definition::{self, get_type, type_of_value};
use crate::matcher::{infer_arg_type, partial_arguments, select_params};
use crate::{Binding, Context, Definition, ResolverOptions};

/// What a name denotes in a scope.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A bound parameter or generator variable, with its type.
    Value(Value, Type),
    Definition(Definition),
}

/// Resolves instantiations against one definition graph.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'g> {
    graph: &'g DefinitionGraph,
    options: ResolverOptions,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g DefinitionGraph) -> Self {
        Self::with_options(graph, ResolverOptions::default())
    }

    pub fn with_options(graph: &'g DefinitionGraph, options: ResolverOptions) -> Self {
        Self { graph, options }
    }

    pub fn graph(&self) -> &'g DefinitionGraph {
        self.graph
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look `name` up in `ctx`. Returns `None` when nothing is visible under
    /// that name.
    pub fn lookup(&self, name: &NameRef, ctx: &Context) -> Option<Lookup> {
        if let Some(binding) = ctx.binding(name.first()) {
            let rest = name.rest();
            if rest.is_empty() {
                return Some(Lookup::Value(binding.value, binding.ty));
            }
            let value = descend_value(binding.value, rest)?;
            let ty = type_of_value(&value);
            return Some(Lookup::Value(value, ty));
        }

        let from = ctx
            .defining_definition()
            .and_then(Definition::def_id)
            .unwrap_or(DefId::ROOT);
        if let Some(id) = self.graph.find_definition(name, from) {
            return self.is_visible(id, from).then(|| Lookup::Definition(self.named(id)));
        }
        self.synthetic_member(name, from).map(Lookup::Definition)
    }

    /// The definition `name` denotes, skipping bound values.
    pub fn lookup_definition(&self, name: &NameRef, ctx: &Context) -> Option<Definition> {
        match self.lookup(name, ctx)? {
            Lookup::Definition(def) => Some(def),
            Lookup::Value(..) => None,
        }
    }

    /// The definition an instantiation denotes, bound to `ctx`.
    ///
    /// Arguments select a flavor of an overloaded definition; each index
    /// narrows to a reference into the collection. The result keeps a frozen
    /// copy of `ctx` and can be instantiated later from any scope.
    pub fn resolve_definition(
        &self,
        inst: &Instantiation,
        ctx: &mut Context,
    ) -> ResolveResult<Option<Definition>> {
        let Some(mut def) = self.lookup_definition(&inst.name, ctx) else {
            return Ok(None);
        };
        if let (Definition::Named(id), Some(args)) = (&def, &inst.args) {
            let candidates = definition::param_lists(self.graph, &def);
            if let Some(selected) = select_params(self, &candidates, &args.items, ctx) {
                def = Definition::flavor(
                    Definition::Named(*id),
                    candidates[selected.index].clone(),
                    selected.index,
                );
            }
        }
        for index in &inst.indexes {
            let index = self.resolve_index(index, ctx)?;
            def = Definition::reference(def, index);
        }
        Ok(Some(Definition::bound(def, ctx)))
    }

    /// Local definitions are visible only from inside their owner.
    fn is_visible(&self, id: DefId, from: DefId) -> bool {
        let access = lattice::combined_modifiers(self.graph, id).map_or(Access::Public, |m| m.access);
        match (access, self.graph.owner_of(id)) {
            (Access::Local, Some(owner)) => self.graph.is_within(from, owner),
            _ => true,
        }
    }

    /// Runtime definition for an arena entry; pure aliases are wrapped so they
    /// report dynamic durability and fall back to their own supertype.
    fn named(&self, id: DefId) -> Definition {
        self.named_at(id, 0)
    }

    fn named_at(&self, id: DefId, depth: usize) -> Definition {
        let Some(entry) = self.graph.get(id) else {
            return Definition::Named(id);
        };
        if depth >= self.options.max_delegation_depth {
            return Definition::Named(id);
        }
        match &entry.contents {
            Contents::Alias(inst)
                if inst.args.is_none() && inst.indexes.is_empty() && !entry.has_params() =>
            {
                match self.graph.find_definition(&inst.name, id) {
                    Some(target) if target != id => Definition::alias(
                        self.named_at(target, depth + 1),
                        self.graph.full_name(id),
                        entry.supertypes.first().cloned(),
                    ),
                    _ => Definition::Named(id),
                }
            }
            _ => Definition::Named(id),
        }
    }

    /// The definition that finally produces values for `def`, past every
    /// wrapper and alias entry.
    pub fn ultimate_definition(&self, def: &Definition) -> ResolveResult<Definition> {
        definition::ultimate_definition(self.graph, def, self.options.max_delegation_depth)
    }

    /// `coll.count` and `coll.keys` on collection definitions.
    fn synthetic_member(&self, name: &NameRef, from: DefId) -> Option<Definition> {
        let (last, prefix) = name.segments.split_last()?;
        if prefix.is_empty() || !matches!(last.as_str(), "count" | "keys") {
            return None;
        }
        let prefix = NameRef {
            segments: prefix.to_vec(),
        };
        let id = self.graph.find_definition(&prefix, from)?;
        let collection = Box::new(self.named(id));
        if !lattice::is_collection(self.graph, &get_type(self.graph, &collection)) {
            return None;
        }
        Some(match last.as_str() {
            "count" => Definition::Count { collection },
            _ => Definition::Keys { collection },
        })
    }

    // ==========================================================================
    // Instantiation
    // ==========================================================================

    /// Instantiate `inst` in `ctx`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn instantiate(&self, inst: &Instantiation, ctx: &mut Context) -> ResolveResult<Value> {
        let name = inst.name.to_string();
        match self.lookup(&inst.name, ctx) {
            None => Err(Redirection::not_found_at(name, inst.span).into()),
            Some(Lookup::Value(value, _)) => self.apply_indexes(&name, value, &inst.indexes, ctx),
            Some(Lookup::Definition(def)) => {
                if let (Some((first, rest)), Some(id)) =
                    (inst.indexes.split_first(), self.lazy_collection(&def))
                {
                    if inst.args.is_none() {
                        if let Some(value) = self.memoized(id) {
                            return self.apply_indexes(&name, value.clone(), &inst.indexes, ctx);
                        }
                    }
                    let (params, bindings) = self.select_and_bind(id, None, inst.args.as_ref(), ctx)?;
                    let instance = self.bind_collection(id, params, bindings, ctx)?;
                    let index = self.resolve_index(first, ctx)?;
                    let value = instance
                        .get_element(self, &index)?
                        .ok_or_else(|| Redirection::not_found(format!("{name}[{index}]")))?;
                    return self.apply_indexes(&name, value, rest, ctx);
                }
                let value = self.instantiate_definition(&def, inst.args.as_ref(), ctx)?;
                self.apply_indexes(&name, value, &inst.indexes, ctx)
            }
        }
    }

    /// The memoized value of a static definition, once it has been built.
    fn memoized(&self, id: DefId) -> Option<&'g Value> {
        if !self.options.cache_enabled
            || definition::durability(self.graph, &Definition::Named(id)) != Durability::Static
        {
            return None;
        }
        self.graph.get(id)?.static_data()
    }

    /// Instantiate a definition by (possibly dotted) name.
    pub fn instantiate_name(
        &self,
        name: &str,
        args: Vec<Construction>,
        ctx: &mut Context,
    ) -> ResolveResult<Value> {
        let inst = if args.is_empty() {
            Instantiation::new(name)
        } else {
            Instantiation::new(name).with_args(args)
        };
        self.instantiate(&inst, ctx)
    }

    /// Instantiate and expect a sequence. Nothing counts as an empty list.
    pub fn instantiate_sequence(&self, inst: &Instantiation, ctx: &mut Context) -> ResolveResult<Sequence> {
        match self.instantiate(inst, ctx)? {
            Value::Seq(seq) => Ok(seq),
            v if v.is_empty_value() => Ok(Sequence::default()),
            other => Err(Redirection::unsupported_collection(
                inst.name.to_string(),
                format!("expected a sequence, found a {} value", other.kind()),
            )
            .into()),
        }
    }

    /// Instantiate and expect a mapping. Nothing counts as an empty mapping.
    pub fn instantiate_mapping(&self, inst: &Instantiation, ctx: &mut Context) -> ResolveResult<Mapping> {
        match self.instantiate(inst, ctx)? {
            Value::Map(map) => Ok(map),
            v if v.is_empty_value() => Ok(Mapping::new()),
            other => Err(Redirection::unsupported_collection(
                inst.name.to_string(),
                format!("expected a mapping, found a {} value", other.kind()),
            )
            .into()),
        }
    }

    /// Instantiate any runtime definition with the given arguments.
    pub fn instantiate_definition(
        &self,
        def: &Definition,
        args: Option<&Arguments>,
        ctx: &mut Context,
    ) -> ResolveResult<Value> {
        match def {
            Definition::Named(id) => {
                let (params, bindings) = self.select_and_bind(*id, None, args, ctx)?;
                self.invoke(*id, params, bindings, false, ctx)
            }
            Definition::Alias {
                target, own_super, ..
            } => {
                let value = self.instantiate_definition(target, args, ctx)?;
                match own_super {
                    Some(super_ty) if value.is_empty_value() => self.instantiate_type(super_ty, args, ctx),
                    _ => Ok(value),
                }
            }
            Definition::Bound { target, scope } => {
                // arguments belong to the caller, the body to the frozen scope
                let evaluated = args.map(|a| self.evaluate_arguments(a, ctx)).transpose()?;
                let mut frozen = scope.clone_scope(true);
                self.instantiate_definition(target, evaluated.as_ref(), &mut frozen)
            }
            Definition::Flavor { target, params, .. } => {
                let id = target
                    .def_id()
                    .ok_or_else(|| Redirection::not_found(definition::name(self.graph, target)))?;
                let (params, bindings) = self.select_and_bind(id, Some(params), args, ctx)?;
                self.invoke(id, params, bindings, false, ctx)
            }
            Definition::Element { element, .. } => normalize(self, element),
            Definition::Reference { collection, index } => {
                match self.parameterless_collection(collection, ctx)? {
                    Some(instance) => {
                        let element = instance
                            .element_definition(self, index)?
                            .ok_or_else(|| Redirection::not_found(definition::name(self.graph, def)))?;
                        self.instantiate_definition(&element, None, ctx)
                    }
                    None => {
                        let value = self.instantiate_definition(collection, None, ctx)?;
                        index_value(&definition::name(self.graph, def), value, index)
                    }
                }
            }
            Definition::Count { collection } => {
                let size = match self.parameterless_collection(collection, ctx)? {
                    Some(instance) => instance.len(),
                    None => self.instantiate_definition(collection, None, ctx)?.count(),
                };
                Ok(Value::Int(i32::try_from(size).unwrap_or(i32::MAX)))
            }
            Definition::Keys { collection } => {
                let keys = match self.parameterless_collection(collection, ctx)? {
                    Some(instance) => instance.keys(),
                    None => match self.instantiate_definition(collection, None, ctx)? {
                        Value::Map(map) => Some(map.into_keys().collect()),
                        _ => None,
                    },
                };
                let keys = keys.ok_or_else(|| {
                    Redirection::unsupported_collection(
                        definition::name(self.graph, collection),
                        "keys of a non-mapping collection",
                    )
                })?;
                Ok(Value::list(keys.into_iter().map(Value::Str)))
            }
        }
    }

    /// Declared type of `def`. A reference into a parameterless collection
    /// is typed through its element, narrowed against the collection's
    /// element type.
    pub fn definition_type(&self, def: &Definition, ctx: &Context) -> Type {
        if let Definition::Reference { collection, index } = def {
            if let Ok(Some(ty)) = self.element_type(collection, index, ctx) {
                return ty;
            }
        }
        get_type(self.graph, def)
    }

    /// Type of the element at `index` of a parameterless collection.
    pub fn element_type(&self, collection: &Definition, index: &Value, ctx: &Context) -> ResolveResult<Option<Type>> {
        let mut scratch = ctx.clone_scope(true);
        let Some(instance) = self.parameterless_collection(collection, &mut scratch)? else {
            return Ok(None);
        };
        Ok(instance
            .element_definition(self, index)?
            .map(|element| get_type(self.graph, &element)))
    }

    /// Instantiate the definition a type names.
    fn instantiate_type(&self, ty: &Type, args: Option<&Arguments>, ctx: &mut Context) -> ResolveResult<Value> {
        match self.graph.type_definition(ty) {
            Some(id) => self.instantiate_definition(&self.named(id), args, ctx),
            None => Ok(Value::Null),
        }
    }

    /// Evaluate arguments eagerly, keeping the concurrency flag.
    fn evaluate_arguments(&self, args: &Arguments, ctx: &mut Context) -> ResolveResult<Arguments> {
        let items = args
            .items
            .iter()
            .map(|arg| match arg {
                Construction::Missing => Ok(Construction::Missing),
                arg => self.construct(arg, ctx).map(Construction::Literal),
            })
            .collect::<ResolveResult<Vec<_>>>()?;
        Ok(Arguments {
            items,
            concurrent: args.concurrent,
        })
    }

    // ==========================================================================
    // Binding
    // ==========================================================================

    /// Select a parameter list of `id` for `args` and bind the arguments.
    ///
    /// `fixed` replaces the definition's own lists, as a flavor does; a fixed
    /// list is bound as is, without scoring it against `args`.
    pub fn select_and_bind(
        &self,
        id: DefId,
        fixed: Option<&ParameterList>,
        args: Option<&Arguments>,
        ctx: &mut Context,
    ) -> ResolveResult<(Option<ParameterList>, Vec<Binding>)> {
        let entry = self.entry(id)?;
        let items = args.map_or(&[][..], |a| a.items.as_slice());
        let params = match fixed {
            Some(params) => params.clone(),
            None => {
                let candidates = entry.param_lists.as_slice();
                if candidates.is_empty() {
                    if items.is_empty() {
                        return Ok((None, Vec::new()));
                    }
                    return Err(Redirection::no_matching_params(self.graph.full_name(id)).into());
                }
                let selected = select_params(self, candidates, items, ctx)
                    .ok_or_else(|| Redirection::no_matching_params(self.graph.full_name(id)))?;
                debug!(
                    definition = %self.graph.full_name(id),
                    index = selected.index,
                    score = selected.score,
                    "selected parameter list"
                );
                candidates[selected.index].clone()
            }
        };
        let bindings = items
            .iter()
            .zip(&params.params)
            .map(|(arg, param)| self.bind_argument(arg, param, ctx))
            .collect::<ResolveResult<Vec<_>>>()?;
        Ok((Some(params), bindings))
    }

    /// Evaluate one argument and convert it to its parameter's type.
    fn bind_argument(&self, arg: &Construction, param: &Parameter, ctx: &mut Context) -> ResolveResult<Binding> {
        let value = self.construct(arg, ctx)?;
        if param.ty.is_untyped() {
            let ty = infer_arg_type(self, arg, ctx).unwrap_or_else(|| type_of_value(&value));
            return Ok(Binding::new(value, ty));
        }
        let value = param.ty.convert(value)?;
        Ok(Binding::new(value, param.ty.clone()))
    }

    // ==========================================================================
    // Invocation
    // ==========================================================================

    /// Produce the value of `id` with bound arguments, consulting the
    /// durability cache.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(
        &self,
        id: DefId,
        params: Option<ParameterList>,
        bindings: Vec<Binding>,
        is_super: bool,
        ctx: &mut Context,
    ) -> ResolveResult<Value> {
        let entry = self.entry(id)?;
        if ctx.depth() >= self.options.max_stack_depth {
            return Err(Redirection::circular(self.graph.full_name(id)).into());
        }

        let durability = if self.options.cache_enabled && !is_super {
            definition::durability(self.graph, &Definition::Named(id))
        } else {
            Durability::Dynamic
        };
        let memoize = durability == Durability::Static && bindings.is_empty();
        let key = CacheKey::new(id, &bindings);
        if memoize {
            if let Some(value) = entry.static_data() {
                trace!(definition = %entry.name, durability = durability.as_str(), "cache hit");
                return Ok(value.clone());
            }
        } else if let Some(value) = ctx.cache_get(durability, &key) {
            trace!(definition = %entry.name, durability = durability.as_str(), "cache hit");
            return Ok(value);
        }

        ctx.push(Definition::Named(id), params, bindings, is_super);
        let result = self.construct_contents(id, entry, ctx);
        ctx.pop();
        let value = self.convert_to_declared(entry, result?)?;

        if memoize {
            return Ok(entry.store_static_data(value).clone());
        }
        if durability.is_cacheable() {
            ctx.cache_put(durability, key, value.clone());
        }
        Ok(value)
    }

    /// Contents of `id`, whose frame is on top of `ctx`.
    fn construct_contents(&self, id: DefId, entry: &DefinitionEntry, ctx: &mut Context) -> ResolveResult<Value> {
        if self.builds_collection(entry) {
            let instance = CollectionInstance::new(self, id, ctx)?;
            return instance.collection_object(self);
        }
        self.construct_plain_contents(id, entry, ctx)
    }

    /// Contents that do not go through a collection backing.
    pub(crate) fn construct_plain_contents(
        &self,
        id: DefId,
        entry: &DefinitionEntry,
        ctx: &mut Context,
    ) -> ResolveResult<Value> {
        match &entry.contents {
            Contents::Empty => self.instantiate_super(id, entry, ctx),
            Contents::Body(body) => self.construct(body, ctx),
            Contents::Alias(inst) => {
                let value = self.instantiate(inst, ctx)?;
                if value.is_empty_value() && !entry.supertypes.is_empty() {
                    return self.instantiate_super(id, entry, ctx);
                }
                Ok(value)
            }
            Contents::External(value) => Ok(value.clone()),
            Contents::Collection(_) => CollectionInstance::new(self, id, ctx)?.collection_object(self),
        }
    }

    /// Whether instantiating `entry` builds a collection backing.
    fn builds_collection(&self, entry: &DefinitionEntry) -> bool {
        match &entry.contents {
            Contents::Collection(_) => true,
            Contents::Empty => {
                entry.is_collection()
                    || entry
                        .supertypes
                        .first()
                        .and_then(|ty| self.graph.type_definition(ty))
                        .is_some_and(|id| self.is_collection_definition(id))
            }
            Contents::Body(_) | Contents::Alias(_) | Contents::External(_) => false,
        }
    }

    fn is_collection_definition(&self, id: DefId) -> bool {
        lattice::is_collection(self.graph, &get_type(self.graph, &Definition::Named(id)))
    }

    /// Instantiate the primary supertype of `id` on behalf of its frame.
    ///
    /// Arguments written on the supertype are filtered against the current
    /// parameters; without any, the current frame's bindings are forwarded.
    fn instantiate_super(&self, id: DefId, entry: &DefinitionEntry, ctx: &mut Context) -> ResolveResult<Value> {
        let Some(super_ty) = entry.supertypes.first() else {
            return Ok(Value::Null);
        };
        let Some(super_id) = self.graph.type_definition(super_ty) else {
            return Ok(Value::Null);
        };
        let frame_params = ctx.peek().and_then(|f| f.params.clone());

        let (params, bindings) = if super_ty.args.is_empty() {
            if self.entry(super_id)?.has_params() {
                (frame_params, ctx.peek().map(|f| f.args.clone()).unwrap_or_default())
            } else {
                (None, Vec::new())
            }
        } else {
            let args = match &frame_params {
                Some(params) if !lattice::can_be_super_for_params(super_ty, params) => {
                    return Err(Redirection::no_matching_params(self.graph.full_name(id)).into());
                }
                Some(params) => partial_arguments(&super_ty.args, params),
                None => super_ty.args.clone(),
            };
            self.select_and_bind(super_id, None, Some(&Arguments::new(args)), ctx)?
        };
        self.invoke(super_id, params, bindings, true, ctx)
    }

    /// `super` inside a body: the supertype of the definition being built.
    pub(crate) fn construct_super(&self, ctx: &mut Context) -> ResolveResult<Value> {
        let Some(id) = ctx.defining_definition().and_then(Definition::def_id) else {
            return Ok(Value::Null);
        };
        let entry = self.entry(id)?;
        self.instantiate_super(id, entry, ctx)
    }

    /// Convert a value to the primitive type the definition derives from.
    fn convert_to_declared(&self, entry: &DefinitionEntry, value: Value) -> ResolveResult<Value> {
        let Some(super_ty) = entry.supertypes.first() else {
            return Ok(value);
        };
        let Some(kind) = lattice::primitive_root(self.graph, &super_ty.element_root()) else {
            return Ok(value);
        };
        if kind == PrimitiveKind::Void {
            return Ok(value);
        }
        let mut declared = Type::primitive(kind);
        declared.dims = if entry.dims.is_empty() {
            super_ty.dims.clone()
        } else {
            entry.dims.clone()
        };
        if declared.has_dims() != value.is_collection() {
            return Ok(value);
        }
        Ok(declared.convert(value)?)
    }

    // ==========================================================================
    // Collections and indexes
    // ==========================================================================

    /// The arena entry of a collection definition read lazily by index.
    fn lazy_collection(&self, def: &Definition) -> Option<DefId> {
        let Definition::Named(id) = def else {
            return None;
        };
        let entry = self.graph.get(*id)?;
        self.builds_collection(entry).then_some(*id)
    }

    /// Bind a collection definition with its own frame on top.
    fn bind_collection(
        &self,
        id: DefId,
        params: Option<ParameterList>,
        bindings: Vec<Binding>,
        ctx: &mut Context,
    ) -> ResolveResult<CollectionInstance> {
        if ctx.depth() >= self.options.max_stack_depth {
            return Err(Redirection::circular(self.graph.full_name(id)).into());
        }
        ctx.push(Definition::Named(id), params, bindings, false);
        let instance = CollectionInstance::new(self, id, ctx);
        ctx.pop();
        instance
    }

    fn parameterless_collection(
        &self,
        def: &Definition,
        ctx: &mut Context,
    ) -> ResolveResult<Option<CollectionInstance>> {
        match self.lazy_collection(def) {
            Some(id) if !self.entry(id)?.has_params() => {
                self.bind_collection(id, None, Vec::new(), ctx).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Resolve one index in `ctx`.
    pub fn resolve_index(&self, index: &Index, ctx: &mut Context) -> ResolveResult<Value> {
        match index {
            Index::Value(value) => Ok(value.clone()),
            Index::Deferred(construction) => self.construct(construction, ctx),
        }
    }

    /// Resolve an index list in order.
    pub fn resolve_indexes(&self, indexes: &[Index], ctx: &mut Context) -> ResolveResult<Vec<Value>> {
        indexes.iter().map(|index| self.resolve_index(index, ctx)).collect()
    }

    /// Select through `indexes` into a materialized value.
    pub fn apply_indexes(
        &self,
        name: &str,
        value: Value,
        indexes: &[Index],
        ctx: &mut Context,
    ) -> ResolveResult<Value> {
        let indexes = self.resolve_indexes(indexes, ctx)?;
        indexes
            .iter()
            .try_fold(value, |value, index| index_value(name, value, index))
    }

    fn entry(&self, id: DefId) -> ResolveResult<&'g DefinitionEntry> {
        self.graph
            .get(id)
            .ok_or_else(|| Redirection::not_found(id.to_string()).into())
    }
}

/// Select one element out of a materialized value.
fn index_value(name: &str, value: Value, index: &Value) -> ResolveResult<Value> {
    let element = match value {
        Value::Seq(seq) => crate::collection::position(index).and_then(|i| seq.items.into_iter().nth(i)),
        Value::Map(mut map) => map.remove(&index.as_key()),
        Value::Host(host) => return index_value(name, *host.value, index),
        other => {
            return Err(Redirection::unsupported_collection(
                name,
                format!("cannot index a {} value", other.kind()),
            )
            .into());
        }
    };
    element.ok_or_else(|| Redirection::not_found(format!("{name}[{index}]")).into())
}

/// Follow dotted segments into a bound value.
fn descend_value(value: Value, segments: &[String]) -> Option<Value> {
    segments.iter().try_fold(value, |value, segment| match (value, segment.as_str()) {
        (Value::Host(host), _) => descend_value(*host.value, std::slice::from_ref(segment)),
        (value, "count") if value.is_collection() => {
            Some(Value::Int(i32::try_from(value.count()).unwrap_or(i32::MAX)))
        }
        (Value::Map(map), "keys") => Some(Value::list(map.into_keys().map(Value::Str))),
        (Value::Map(mut map), key) => map.remove(key),
        _ => None,
    })
}
