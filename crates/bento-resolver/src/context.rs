//! The scope stack threaded through every resolution call.
//!
//! A [`Context`] is a stack of [`Frame`]s, one per active instantiation
//! (plus one per generator iteration). Frames are reference counted so that
//! cloning a context is a shallow copy-on-branch: a clone shares every frame
//! with its parent, and pushing onto the clone never disturbs the parent.
//!
//! ## Caches
//!
//! - in-context: keyed results of `InContext` definitions. `clone_scope(true)`
//!   shares the cache with the parent, `clone_scope(false)` copies it.
//! - global: keyed results of `Global` definitions (and `Static` ones with
//!   arguments), always shared between clones.
//!
//! Static definitions without arguments memoize on the definition itself.
//!
//! ## Markers
//!
//! [`ScopeMarker`] captures the current top of stack. A marker stays current
//! as long as the frame it captured is still on the stack at the same depth.

use std::cell::{Cell, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use bento_core::{DefId, Durability, Type, Value};
use bento_registry::ParameterList;
use rustc_hash::{FxHashMap, FxHasher};

use crate::Definition;

// ============================================================================
// Frames
// ============================================================================

/// An argument value bound to a parameter position.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: Value,
    /// Declared parameter type, or the argument's inferred type when the
    /// parameter is untyped.
    pub ty: Type,
}

impl Binding {
    pub fn new(value: Value, ty: Type) -> Self {
        Self { value, ty }
    }

    /// Binding for a parameter whose argument was not supplied.
    pub fn missing(ty: Type) -> Self {
        Self {
            value: Value::Null,
            ty,
        }
    }
}

/// A generator variable bound for one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBinding {
    pub name: String,
    pub binding: Binding,
    pub index: usize,
}

/// One entry of the scope stack.
#[derive(Debug)]
pub struct Frame {
    pub definition: Definition,
    pub params: Option<ParameterList>,
    pub args: Vec<Binding>,
    /// Pushed on behalf of a subdefinition delegating to its supertype.
    pub is_super: bool,
    /// Set on generator iteration frames.
    pub local: Option<LoopBinding>,
    serial: u64,
}

impl Frame {
    /// The binding for parameter `name`, if this frame declares it.
    pub fn param(&self, name: &str) -> Option<Binding> {
        let params = self.params.as_ref()?;
        let position = params.position(name)?;
        match self.args.get(position) {
            Some(binding) => Some(binding.clone()),
            None => params.get(position).map(|p| Binding::missing(p.ty.clone())),
        }
    }

    pub fn is_local(&self) -> bool {
        self.local.is_some()
    }
}

// ============================================================================
// Cache keys and markers
// ============================================================================

/// Key of a cached result: the definition plus a fingerprint of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub definition: DefId,
    pub args: u64,
}

impl CacheKey {
    pub fn new(definition: DefId, args: &[Binding]) -> Self {
        let mut hasher = FxHasher::default();
        args.len().hash(&mut hasher);
        for arg in args {
            arg.value.fingerprint().hash(&mut hasher);
        }
        Self {
            definition,
            args: hasher.finish(),
        }
    }
}

/// Snapshot of the top of a scope stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMarker {
    depth: usize,
    serial: u64,
}

type Cache = Rc<RefCell<FxHashMap<CacheKey, Value>>>;

// ============================================================================
// Context
// ============================================================================

/// The dynamic stack of active definition, parameter and argument bindings.
#[derive(Debug, Clone, Default)]
pub struct Context {
    frames: Vec<Rc<Frame>>,
    unpushed: Vec<Rc<Frame>>,
    in_context: Cache,
    global: Cache,
    /// Serial counter shared by every clone so frame serials stay unique.
    serials: Rc<Cell<u64>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn next_serial(&self) -> u64 {
        let serial = self.serials.get() + 1;
        self.serials.set(serial);
        serial
    }

    // ==========================================================================
    // Stack discipline
    // ==========================================================================

    pub fn push(
        &mut self,
        definition: Definition,
        params: Option<ParameterList>,
        args: Vec<Binding>,
        is_super: bool,
    ) {
        let serial = self.next_serial();
        self.frames.push(Rc::new(Frame {
            definition,
            params,
            args,
            is_super,
            local: None,
            serial,
        }));
    }

    /// Push a generator iteration frame binding `name` to `value`.
    pub fn push_local(&mut self, name: &str, value: Value, index: usize) {
        let definition = self
            .peek()
            .map(|f| f.definition.clone())
            .unwrap_or(Definition::Named(DefId::ROOT));
        let ty = crate::definition::type_of_value(&value);
        let serial = self.next_serial();
        self.frames.push(Rc::new(Frame {
            definition,
            params: None,
            args: Vec::new(),
            is_super: false,
            local: Some(LoopBinding {
                name: name.to_string(),
                binding: Binding::new(value, ty),
                index,
            }),
            serial,
        }));
    }

    pub fn pop(&mut self) -> Option<Rc<Frame>> {
        self.frames.pop()
    }

    /// Temporarily remove the top frame; [`repush`](Self::repush) restores it.
    pub fn unpush(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                self.unpushed.push(frame);
                true
            }
            None => false,
        }
    }

    pub fn repush(&mut self) -> bool {
        match self.unpushed.pop() {
            Some(frame) => {
                self.frames.push(frame);
                true
            }
            None => false,
        }
    }

    pub fn peek(&self) -> Option<&Frame> {
        self.frames.last().map(Rc::as_ref)
    }

    /// Drop frames above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Copy-on-branch clone. A shared clone also shares the in-context cache.
    pub fn clone_scope(&self, shared: bool) -> Self {
        let in_context = if shared {
            Rc::clone(&self.in_context)
        } else {
            Rc::new(RefCell::new(self.in_context.borrow().clone()))
        };
        Self {
            frames: self.frames.clone(),
            unpushed: self.unpushed.clone(),
            in_context,
            global: Rc::clone(&self.global),
            serials: Rc::clone(&self.serials),
        }
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Frames from the top of the stack down.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev().map(Rc::as_ref)
    }

    /// The frame of the definition currently being instantiated.
    pub fn defining_frame(&self) -> Option<&Frame> {
        self.frames().find(|f| !f.is_local())
    }

    pub fn defining_definition(&self) -> Option<&Definition> {
        self.defining_frame().map(|f| &f.definition)
    }

    /// Index of the innermost generator iteration.
    pub fn loop_index(&self) -> Option<usize> {
        self.frames().find_map(|f| f.local.as_ref().map(|l| l.index))
    }

    /// Walk outward for a generator variable or bound parameter named `name`.
    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.frames().find_map(|frame| match &frame.local {
            Some(local) if local.name == name => Some(local.binding.clone()),
            Some(_) => None,
            None => frame.param(name),
        })
    }

    pub fn marker(&self) -> ScopeMarker {
        ScopeMarker {
            depth: self.frames.len(),
            serial: self.frames.last().map_or(0, |f| f.serial),
        }
    }

    /// Whether the frame captured by `marker` is still on the stack.
    pub fn is_current(&self, marker: &ScopeMarker) -> bool {
        if marker.depth == 0 {
            return true;
        }
        self.frames
            .get(marker.depth - 1)
            .is_some_and(|f| f.serial == marker.serial)
    }

    // ==========================================================================
    // Caches
    // ==========================================================================

    fn cache_for(&self, durability: Durability) -> Option<&Cache> {
        match durability {
            Durability::Dynamic => None,
            Durability::InContext => Some(&self.in_context),
            Durability::Global | Durability::Static => Some(&self.global),
        }
    }

    pub fn cache_get(&self, durability: Durability, key: &CacheKey) -> Option<Value> {
        self.cache_for(durability)?.borrow().get(key).cloned()
    }

    pub fn cache_put(&self, durability: Durability, key: CacheKey, value: Value) {
        if let Some(cache) = self.cache_for(durability) {
            cache.borrow_mut().insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bento_core::PrimitiveKind;
    use bento_registry::Parameter;

    fn frame_def(i: u32) -> Definition {
        Definition::Named(DefId::new(i))
    }

    fn one_param() -> ParameterList {
        ParameterList::new(vec![Parameter::new("n", Type::primitive(PrimitiveKind::Int))])
    }

    #[test]
    fn push_pop_and_peek() {
        let mut ctx = Context::new();
        assert!(ctx.peek().is_none());
        ctx.push(frame_def(1), None, Vec::new(), false);
        ctx.push(frame_def(2), None, Vec::new(), true);
        assert_eq!(ctx.depth(), 2);
        assert!(ctx.peek().is_some_and(|f| f.is_super));
        ctx.pop();
        assert!(matches!(ctx.peek().map(|f| &f.definition), Some(Definition::Named(d)) if d.index() == 1));
    }

    #[test]
    fn unpush_then_repush_restores_frame() {
        let mut ctx = Context::new();
        ctx.push(frame_def(1), None, Vec::new(), false);
        ctx.push(frame_def(2), None, Vec::new(), false);
        assert!(ctx.unpush());
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.repush());
        assert_eq!(ctx.depth(), 2);
        assert!(!ctx.repush());
    }

    #[test]
    fn bindings_walk_outward() {
        let mut ctx = Context::new();
        ctx.push(
            frame_def(1),
            Some(one_param()),
            vec![Binding::new(Value::Int(4), Type::primitive(PrimitiveKind::Int))],
            false,
        );
        ctx.push(frame_def(2), None, Vec::new(), false);
        assert_eq!(ctx.binding("n").map(|b| b.value), Some(Value::Int(4)));
        assert!(ctx.binding("m").is_none());
    }

    #[test]
    fn missing_argument_binds_null() {
        let mut ctx = Context::new();
        ctx.push(frame_def(1), Some(one_param()), Vec::new(), false);
        assert_eq!(ctx.binding("n").map(|b| b.value), Some(Value::Null));
    }

    #[test]
    fn loop_bindings_shadow_params() {
        let mut ctx = Context::new();
        ctx.push(
            frame_def(1),
            Some(one_param()),
            vec![Binding::new(Value::Int(4), Type::primitive(PrimitiveKind::Int))],
            false,
        );
        ctx.push_local("n", Value::str("x"), 3);
        assert_eq!(ctx.binding("n").map(|b| b.value), Some(Value::str("x")));
        assert_eq!(ctx.loop_index(), Some(3));
        assert!(matches!(ctx.defining_definition(), Some(Definition::Named(d)) if d.index() == 1));
    }

    #[test]
    fn clones_are_mutually_invisible() {
        let mut ctx = Context::new();
        ctx.push(frame_def(1), None, Vec::new(), false);
        let mut branch = ctx.clone_scope(false);
        branch.push(frame_def(2), None, Vec::new(), false);
        assert_eq!(ctx.depth(), 1);
        assert_eq!(branch.depth(), 2);
    }

    #[test]
    fn in_context_cache_sharing_follows_clone_mode() {
        let ctx = Context::new();
        let key = CacheKey::new(DefId::new(1), &[]);
        let shared = ctx.clone_scope(true);
        let copied = ctx.clone_scope(false);
        shared.cache_put(Durability::InContext, key, Value::Int(1));
        assert_eq!(ctx.cache_get(Durability::InContext, &key), Some(Value::Int(1)));
        assert_eq!(copied.cache_get(Durability::InContext, &key), None);

        copied.cache_put(Durability::Global, key, Value::Int(2));
        assert_eq!(ctx.cache_get(Durability::Global, &key), Some(Value::Int(2)));
        assert_eq!(ctx.cache_get(Durability::Dynamic, &key), None);
    }

    #[test]
    fn cache_keys_separate_arguments() {
        let int = Type::primitive(PrimitiveKind::Int);
        let a = CacheKey::new(DefId::new(1), &[Binding::new(Value::Int(1), int.clone())]);
        let b = CacheKey::new(DefId::new(1), &[Binding::new(Value::Int(2), int)]);
        assert_ne!(a, b);
    }

    #[test]
    fn markers_expire_when_frame_is_popped() {
        let mut ctx = Context::new();
        ctx.push(frame_def(1), None, Vec::new(), false);
        let marker = ctx.marker();
        ctx.push(frame_def(2), None, Vec::new(), false);
        assert!(ctx.is_current(&marker));
        ctx.pop();
        ctx.pop();
        assert!(!ctx.is_current(&marker));
        ctx.push(frame_def(1), None, Vec::new(), false);
        assert!(!ctx.is_current(&marker));
    }
}
