//! Bento Registry
//!
//! The Definition Graph and the Type Lattice built on it.
//!
//! - [`DefinitionGraph`]: arena of named definitions addressed by [`DefId`](bento_core::DefId)
//! - [`lattice`]: subtype distance, collection predicates, result types
//! - [`validation`]: supertype-chain walking for circular-inheritance checks

mod entry;
mod graph;
pub mod lattice;
pub mod validation;

pub use entry::{CollectionContents, Contents, DefinitionEntry, Parameter, ParameterList};
pub use graph::{DefEdge, DefinitionGraph};
pub use lattice::{EXTERNAL_DISTANCE, Modifiers};
pub use validation::MAX_SUPER_DEPTH;
