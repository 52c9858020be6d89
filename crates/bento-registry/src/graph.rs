//! Definition Graph - arena storage for every named definition.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`DefinitionEntry`] (one per named definition, root namespace at index 0)
//! - Edges: `Owns(name)` from an owner to each child definition
//!
//! Definitions are addressed by [`DefId`] handles. Ownership is recorded
//! both as an edge and as the `owner` handle on the entry, so walking up and
//! down the tree never needs shared references.
//!
//! # Thread Safety
//!
//! `DefinitionGraph` is not synchronized. Independent load paths that
//! register definitions concurrently must serialize registration (the
//! `Site` type of the facade crate wraps the graph in a lock).

use bento_core::{DefId, NameRef, RegistrationError, Type};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::DefinitionEntry;

/// Bound on breadth-first searches through supertype groups.
const MAX_MEMBER_SEARCH: usize = 256;

/// Edge types in the definition graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefEdge {
    /// Owner contains the child. The String is the child's simple name.
    Owns(String),
}

/// The definition arena.
#[derive(Debug)]
pub struct DefinitionGraph {
    graph: DiGraph<DefinitionEntry, DefEdge>,

    /// Index: (owner, simple name) -> child.
    children: FxHashMap<(DefId, String), DefId>,
}

impl Default for DefinitionGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn node(id: DefId) -> NodeIndex {
    NodeIndex::new(id.index() as usize)
}

#[inline]
fn def_id(node: NodeIndex) -> DefId {
    DefId::new(node.index() as u32)
}

impl DefinitionGraph {
    /// Create a graph holding only the root namespace.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(DefinitionEntry::new(""));
        debug_assert_eq!(def_id(root), DefId::ROOT);
        Self {
            graph,
            children: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> DefId {
        DefId::ROOT
    }

    /// Number of definitions, including the root.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 1
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register `entry` as a child of `owner`.
    ///
    /// Supertype expressions are looked up from `owner`; parameter types and
    /// any other type written inside the definition are looked up from the
    /// new definition itself.
    pub fn define(
        &mut self,
        owner: DefId,
        mut entry: DefinitionEntry,
    ) -> Result<DefId, RegistrationError> {
        if self.get(owner).is_none() {
            return Err(RegistrationError::UnknownOwner(owner.to_string()));
        }
        if entry.name.is_empty() {
            return Err(RegistrationError::InvalidDefinition {
                name: entry.name,
                reason: "definitions must be named".to_string(),
            });
        }
        if entry.name.contains('.') {
            return Err(RegistrationError::InvalidDefinition {
                reason: "simple names cannot contain '.'".to_string(),
                name: entry.name,
            });
        }
        let key = (owner, entry.name.clone());
        if self.children.contains_key(&key) {
            return Err(RegistrationError::DuplicateDefinition {
                name: entry.name,
                owner: self.full_name(owner),
            });
        }

        entry.owner = Some(owner);
        for ty in &mut entry.supertypes {
            ty.owner.get_or_insert(owner);
        }

        let name = entry.name.clone();
        let idx = self.graph.add_node(entry);
        let id = def_id(idx);

        if let Some(entry) = self.graph.node_weight_mut(idx) {
            for list in &mut entry.param_lists {
                for param in &mut list.params {
                    param.ty.owner.get_or_insert(id);
                }
            }
        }

        self.graph.add_edge(node(owner), idx, DefEdge::Owns(name));
        self.children.insert(key, id);
        Ok(id)
    }

    // ==========================================================================
    // Access
    // ==========================================================================

    pub fn get(&self, id: DefId) -> Option<&DefinitionEntry> {
        self.graph.node_weight(node(id))
    }

    pub fn name(&self, id: DefId) -> &str {
        self.get(id).map(|e| e.name.as_str()).unwrap_or("")
    }

    pub fn owner_of(&self, id: DefId) -> Option<DefId> {
        self.get(id).and_then(|e| e.owner)
    }

    /// Dotted name from the root.
    pub fn full_name(&self, id: DefId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if c.is_root() {
                break;
            }
            parts.push(self.name(c));
            current = self.owner_of(c);
        }
        parts.reverse();
        parts.join(".")
    }

    /// Direct child by simple name.
    pub fn find_child(&self, owner: DefId, name: &str) -> Option<DefId> {
        self.children.get(&(owner, name.to_string())).copied()
    }

    /// Direct children in registration order.
    pub fn children(&self, owner: DefId) -> Vec<(String, DefId)> {
        let mut out: Vec<(String, DefId)> = self
            .graph
            .edges(node(owner))
            .map(|edge| {
                let DefEdge::Owns(name) = edge.weight();
                (name.clone(), def_id(edge.target()))
            })
            .collect();
        out.sort_by_key(|(_, id)| *id);
        out
    }

    /// Whether `ancestor` encloses `id` (or is `id`).
    pub fn is_within(&self, id: DefId, ancestor: DefId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.owner_of(c);
        }
        false
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Resolve a type expression to the definition it names.
    ///
    /// Primitive and untyped types name no definition.
    pub fn type_definition(&self, ty: &Type) -> Option<DefId> {
        if let Some(def) = ty.definition {
            return Some(def);
        }
        if ty.name.is_empty() || ty.primitive_kind().is_some() {
            return None;
        }
        self.find_definition(&NameRef::parse(&ty.name), ty.owner.unwrap_or(DefId::ROOT))
    }

    /// Resolve a possibly dotted name, walking outward from `from`.
    ///
    /// At each enclosing level the first segment is looked up among the
    /// level's members; the remaining segments descend through members.
    pub fn find_definition(&self, name: &NameRef, from: DefId) -> Option<DefId> {
        let first = name.first();
        if first.is_empty() {
            return None;
        }
        let mut level = Some(from);
        while let Some(current) = level {
            if let Some(found) = self.find_member(current, first) {
                return self.descend(found, name.rest());
            }
            level = self.owner_of(current);
        }
        None
    }

    /// Follow `segments` from `start` through members.
    pub fn descend(&self, start: DefId, segments: &[String]) -> Option<DefId> {
        let mut current = start;
        for segment in segments {
            current = self.find_member(current, segment)?;
        }
        Some(current)
    }

    /// A member of `def`: a direct child, or a child inherited from one of
    /// its supertypes (breadth-first over the supertype groups).
    pub fn find_member(&self, def: DefId, name: &str) -> Option<DefId> {
        if let Some(child) = self.find_child(def, name) {
            return Some(child);
        }
        let mut visited = FxHashSet::default();
        visited.insert(def);
        let mut queue = std::collections::VecDeque::from(self.supertype_defs(def));
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) || visited.len() > MAX_MEMBER_SEARCH {
                continue;
            }
            if let Some(child) = self.find_child(next, name) {
                return Some(child);
            }
            queue.extend(self.supertype_defs(next));
        }
        None
    }

    /// Definitions named by the supertypes of `def`, in declaration order.
    ///
    /// Supertypes that name primitives or nothing are skipped. A definition
    /// declared as its own supertype is reported like any other.
    pub fn supertype_defs(&self, def: DefId) -> Vec<DefId> {
        let Some(entry) = self.get(def) else {
            return Vec::new();
        };
        entry
            .supertypes
            .iter()
            .filter_map(|ty| self.type_definition(ty))
            .collect()
    }

    /// All definition handles except the root.
    pub fn ids(&self) -> impl Iterator<Item = DefId> + '_ {
        self.graph.node_indices().map(def_id).filter(|id| !id.is_root())
    }
}
