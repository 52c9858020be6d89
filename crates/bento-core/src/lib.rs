//! Bento Core
//!
//! Shared building blocks for the Bento definition engine:
//!
//! - [`error`]: the [`Redirection`] fault and the other error kinds
//! - [`value`]: runtime [`Value`]s and their [`ValueKind`] classes
//! - [`types`]: [`Type`] expressions with dimension markers
//! - [`ast`]: the syntax-tree nodes the resolver recurses into
//! - [`modifiers`]: access and durability tiers
//!
//! Parsing is not part of this crate; syntax trees are built by an external
//! front end (or by hand in tests).

pub mod ast;
pub mod error;
mod ids;
pub mod modifiers;
mod primitive_kind;
mod span;
pub mod types;
pub mod value;

pub use ast::{
    Arguments, BinaryOp, Catch, Construction, Generator, Index, Instantiation, NameRef,
};
pub use error::{BentoError, OperatorError, Redirection, RegistrationError, ResolveResult};
pub use ids::DefId;
pub use modifiers::{Access, DefinitionFlags, Durability};
pub use primitive_kind::PrimitiveKind;
pub use span::Span;
pub use types::{Dim, DimKind, Type};
pub use value::{HostObject, Mapping, Sequence, SequenceKind, Value, ValueKind};
