//! Operands forced on first use.

use std::cell::OnceCell;

use bento_core::{Construction, OperatorError, ResolveResult, Value};

use crate::context::ScopeMarker;
use crate::{Context, Resolver};

/// An operand whose construction runs only when its value is needed.
///
/// The operand is tied to the scope it was created in: forcing it once that
/// scope has been popped is a [`OperatorError::StaleOperand`] fault, even
/// when a value was already computed.
#[derive(Debug)]
pub struct DeferredOperand<'c> {
    construction: &'c Construction,
    marker: ScopeMarker,
    cached: OnceCell<Value>,
}

impl<'c> DeferredOperand<'c> {
    pub fn new(construction: &'c Construction, ctx: &Context) -> Self {
        Self {
            construction,
            marker: ctx.marker(),
            cached: OnceCell::new(),
        }
    }

    pub fn is_forced(&self) -> bool {
        self.cached.get().is_some()
    }

    pub fn force(&self, resolver: &Resolver<'_>, ctx: &mut Context) -> ResolveResult<Value> {
        if !ctx.is_current(&self.marker) {
            return Err(OperatorError::StaleOperand.into());
        }
        if let Some(value) = self.cached.get() {
            return Ok(value.clone());
        }
        let value = resolver.construct(self.construction, ctx)?;
        Ok(self.cached.get_or_init(|| value).clone())
    }
}
