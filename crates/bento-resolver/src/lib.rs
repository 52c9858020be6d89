//! Bento Resolver
//!
//! Instantiates definitions of a [`DefinitionGraph`](bento_registry::DefinitionGraph):
//!
//! - [`Context`]: the scope stack threaded through every call
//! - [`Definition`]: named entries plus the scope-bound wrappers built per resolution
//! - [`matcher`]: overload scoring of argument lists
//! - [`collection`]: lazily materialized sequences and mappings
//! - [`operators`]: binary operations over values
//! - [`Resolver`]: lookup, instantiation and construction
//!
//! # Example
//!
//! ```
//! use bento_core::{Construction, DefId, Value};
//! use bento_registry::{DefinitionEntry, DefinitionGraph};
//! use bento_resolver::{Context, Resolver};
//!
//! let mut graph = DefinitionGraph::new();
//! graph.define(DefId::ROOT, DefinitionEntry::body("answer", Construction::int(42))).unwrap();
//!
//! let resolver = Resolver::new(&graph);
//! let mut ctx = Context::new();
//! let value = resolver.instantiate_name("answer", Vec::new(), &mut ctx).unwrap();
//! assert_eq!(value, Value::Int(42));
//! ```

mod catch;
pub mod collection;
mod construct;
mod context;
pub mod definition;
mod instantiate;
pub mod matcher;
pub mod operators;
mod options;
mod resolved;

pub use catch::recover;
pub use collection::{CollectionInstance, Element};
pub use context::{Binding, CacheKey, Context, Frame, LoopBinding, ScopeMarker};
pub use definition::Definition;
pub use instantiate::{Lookup, Resolver};
pub use matcher::{ParamMatch, select_params};
pub use operators::{DeferredOperand, binary_op, values_equal};
pub use options::ResolverOptions;
pub use resolved::ResolvedInstance;
