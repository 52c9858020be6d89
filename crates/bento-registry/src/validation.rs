//! Supertype-chain walking for circular-inheritance detection.
//!
//! Reporting circular definitions is the job of an external validation
//! pass; this module provides the walking primitives it consumes. A chain
//! that does not bottom out within [`MAX_SUPER_DEPTH`] hops is reported as
//! probably circular.

use bento_core::DefId;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::DefinitionGraph;

/// Hops walked before a supertype chain is considered probably circular.
pub const MAX_SUPER_DEPTH: usize = 10;

/// Iterator over the primary (first-supertype) chain of a definition.
///
/// Yields at most `max_depth` definitions, starting with the first
/// supertype of the starting definition.
pub struct SupertypeChain<'g> {
    graph: &'g DefinitionGraph,
    current: Option<DefId>,
    remaining: usize,
}

impl Iterator for SupertypeChain<'_> {
    type Item = DefId;

    fn next(&mut self) -> Option<DefId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.current?;
        let next = self.graph.supertype_defs(current).into_iter().next();
        self.current = next;
        self.remaining -= 1;
        next
    }
}

/// Walk the primary supertype chain of `def`.
pub fn supertype_chain(graph: &DefinitionGraph, def: DefId, max_depth: usize) -> SupertypeChain<'_> {
    SupertypeChain {
        graph,
        current: Some(def),
        remaining: max_depth,
    }
}

/// Whether any supertype path from `def` revisits `def` or fails to end
/// within `max_depth` hops.
pub fn is_probably_circular(graph: &DefinitionGraph, def: DefId, max_depth: usize) -> bool {
    fn walk(graph: &DefinitionGraph, start: DefId, at: DefId, depth: usize, max: usize) -> bool {
        let supers = graph.supertype_defs(at);
        if supers.is_empty() {
            return false;
        }
        if depth >= max {
            return true;
        }
        supers
            .into_iter()
            .any(|s| s == start || walk(graph, start, s, depth + 1, max))
    }
    walk(graph, def, def, 0, max_depth)
}

/// Every definition whose supertype chain is probably circular.
pub fn find_circular(graph: &DefinitionGraph, max_depth: usize) -> Vec<DefId> {
    let found: Vec<DefId> = graph
        .ids()
        .filter(|&id| is_probably_circular(graph, id, max_depth))
        .collect();
    for &id in &found {
        warn!(definition = %graph.full_name(id), "probably circular supertype chain");
    }
    found
}

/// Exact cycle detection over the supertype edges of the whole graph.
pub fn has_supertype_cycle(graph: &DefinitionGraph) -> bool {
    let mut supers: DiGraph<DefId, ()> = DiGraph::new();
    let mut nodes = FxHashMap::default();
    for id in graph.ids() {
        nodes.insert(id, supers.add_node(id));
    }
    for id in graph.ids() {
        for s in graph.supertype_defs(id) {
            if let (Some(&a), Some(&b)) = (nodes.get(&id), nodes.get(&s)) {
                supers.add_edge(a, b, ());
            }
        }
    }
    is_cyclic_directed(&supers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefinitionEntry;
    use bento_core::Type;

    fn linear() -> (DefinitionGraph, DefId) {
        let mut g = DefinitionGraph::new();
        g.define(DefId::ROOT, DefinitionEntry::new("a")).unwrap();
        g.define(DefId::ROOT, DefinitionEntry::new("b").with_super(Type::named("a")))
            .unwrap();
        let c = g
            .define(DefId::ROOT, DefinitionEntry::new("c").with_super(Type::named("b")))
            .unwrap();
        (g, c)
    }

    #[test]
    fn chain_walks_first_supertypes() {
        let (g, c) = linear();
        let names: Vec<_> = supertype_chain(&g, c, MAX_SUPER_DEPTH)
            .map(|d| g.name(d).to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn linear_chain_is_not_circular() {
        let (g, c) = linear();
        assert!(!is_probably_circular(&g, c, MAX_SUPER_DEPTH));
        assert!(find_circular(&g, MAX_SUPER_DEPTH).is_empty());
        assert!(!has_supertype_cycle(&g));
    }

    #[test]
    fn mutual_supertypes_are_flagged() {
        let mut g = DefinitionGraph::new();
        let x = g
            .define(DefId::ROOT, DefinitionEntry::new("x").with_super(Type::named("y")))
            .unwrap();
        let y = g
            .define(DefId::ROOT, DefinitionEntry::new("y").with_super(Type::named("x")))
            .unwrap();
        assert!(is_probably_circular(&g, x, MAX_SUPER_DEPTH));
        assert_eq!(find_circular(&g, MAX_SUPER_DEPTH), vec![x, y]);
        assert!(has_supertype_cycle(&g));
        assert_eq!(supertype_chain(&g, x, 4).count(), 4);
    }

    #[test]
    fn self_supertype_is_flagged() {
        let mut g = DefinitionGraph::new();
        let a = g
            .define(DefId::ROOT, DefinitionEntry::new("a").with_super(Type::named("a")))
            .unwrap();
        g.define(DefId::ROOT, DefinitionEntry::new("b")).unwrap();
        assert_eq!(g.supertype_defs(a), vec![a]);
        assert!(is_probably_circular(&g, a, MAX_SUPER_DEPTH));
        assert_eq!(find_circular(&g, MAX_SUPER_DEPTH), vec![a]);
        assert!(has_supertype_cycle(&g));
    }

    #[test]
    fn overly_deep_chains_are_probably_circular() {
        let mut g = DefinitionGraph::new();
        g.define(DefId::ROOT, DefinitionEntry::new("d0")).unwrap();
        let mut last = DefId::ROOT;
        for i in 1..=12 {
            last = g
                .define(
                    DefId::ROOT,
                    DefinitionEntry::new(format!("d{i}")).with_super(Type::named(format!("d{}", i - 1))),
                )
                .unwrap();
        }
        assert!(is_probably_circular(&g, last, MAX_SUPER_DEPTH));
        assert!(!has_supertype_cycle(&g));
    }
}
