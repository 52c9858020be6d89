//! Syntax-tree nodes the resolver recurses into.
//!
//! The tree is produced by an external front end; nodes here are plain owned
//! data. Parent links are not stored: the resolver always descends from a
//! definition's contents, so no back-edges are needed.

mod construction;
mod instantiation;
mod ops;

pub use construction::{Catch, Construction, Generator};
pub use instantiation::{Arguments, Index, Instantiation, NameRef};
pub use ops::BinaryOp;
