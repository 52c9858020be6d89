//! Recovery from faults inside guarded blocks.
//!
//! A fault raised by the body unwinds the scope stack back to where the
//! block was entered. Host faults are wrapped as standard-error
//! redirections, then matched against the catches: a catch tagged with the
//! redirection's location first, then a tag-less catch-all. Unmatched
//! faults propagate as their redirection.

use bento_core::{Catch, Construction, ResolveResult, Value};
use tracing::debug;

use crate::{Context, Resolver};

pub fn recover(
    resolver: &Resolver<'_>,
    body: &Construction,
    catches: &[Catch],
    ctx: &mut Context,
) -> ResolveResult<Value> {
    let depth = ctx.depth();
    let err = match resolver.construct(body, ctx) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    ctx.truncate(depth);

    let origin = err.origin();
    let redirection = err.into_redirection();
    let handler = catches
        .iter()
        .find(|c| c.location.as_deref() == Some(redirection.location.as_str()))
        .or_else(|| catches.iter().find(|c| c.location.is_none()));
    match handler {
        Some(catch) => {
            debug!(
                location = %redirection.location,
                status = redirection.status,
                origin,
                "recovered fault"
            );
            resolver.construct(&catch.handler, ctx)
        }
        None => Err(redirection.into()),
    }
}
