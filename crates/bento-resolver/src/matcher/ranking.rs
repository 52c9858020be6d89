//! Selection of the best parameter list among overloads.

use bento_core::Construction;
use bento_registry::ParameterList;

use super::{NO_MATCH, score};
use crate::{Context, Resolver};

/// The winning candidate of an overload selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamMatch {
    /// Position of the winner among the candidates.
    pub index: usize,
    pub score: u32,
}

/// Pick the lowest-scoring parameter list.
///
/// Ties go to the candidate declared first. Returns `None` when every
/// candidate scores [`NO_MATCH`].
pub fn select_params(
    resolver: &Resolver<'_>,
    candidates: &[ParameterList],
    args: &[Construction],
    ctx: &Context,
) -> Option<ParamMatch> {
    let mut best: Option<ParamMatch> = None;
    for (index, params) in candidates.iter().enumerate() {
        let score = score(resolver, params, args, ctx);
        if score >= NO_MATCH {
            continue;
        }
        // strict comparison keeps the earliest of equal scores
        if best.is_none_or(|b| score < b.score) {
            best = Some(ParamMatch { index, score });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DEFAULT_PARAMETER;
    use bento_core::{PrimitiveKind, Type};
    use bento_registry::{DefinitionGraph, Parameter};

    fn list(types: &[Option<PrimitiveKind>]) -> ParameterList {
        ParameterList::new(
            types
                .iter()
                .enumerate()
                .map(|(i, t)| match t {
                    Some(kind) => Parameter::new(format!("p{i}"), Type::primitive(*kind)),
                    None => Parameter::untyped(format!("p{i}")),
                })
                .collect(),
        )
    }

    #[test]
    fn lowest_score_wins() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let candidates = [
            list(&[None]),
            list(&[Some(PrimitiveKind::String)]),
            list(&[Some(PrimitiveKind::Int)]),
        ];
        let m = select_params(&resolver, &candidates, &[Construction::int(7)], &Context::new());
        assert_eq!(m, Some(ParamMatch { index: 2, score: 0 }));
    }

    #[test]
    fn ties_resolve_by_declaration_order() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let candidates = [list(&[None]), list(&[None])];
        let m = select_params(&resolver, &candidates, &[Construction::int(7)], &Context::new());
        assert_eq!(
            m,
            Some(ParamMatch {
                index: 0,
                score: DEFAULT_PARAMETER
            })
        );
    }

    #[test]
    fn all_no_match_yields_none() {
        let graph = DefinitionGraph::new();
        let resolver = Resolver::new(&graph);
        let candidates = [list(&[Some(PrimitiveKind::Int)])];
        let args = [Construction::str("x")];
        assert_eq!(select_params(&resolver, &candidates, &args, &Context::new()), None);
        assert_eq!(select_params(&resolver, &[], &args, &Context::new()), None);
    }
}
