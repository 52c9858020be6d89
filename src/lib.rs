//! Bento: definition resolution for an inheritance-based template language.
//!
//! This crate gathers the workspace behind one facade:
//!
//! - [`bento_core`]: values, types, syntax-tree nodes and errors
//! - [`bento_registry`]: the definition graph, type lattice and validation
//! - [`bento_resolver`]: the scope stack, overload matcher, collections,
//!   operators and the [`Resolver`]
//! - [`Site`] / [`SiteTable`]: process-wide namespaces with serialized
//!   registration and a retention table
//!
//! # Example
//!
//! ```
//! use bento::prelude::*;
//!
//! let site = Site::new("main");
//! site.register(DefId::ROOT, DefinitionEntry::sequence("xs", vec![Construction::int(1)]))
//!     .unwrap();
//! assert_eq!(site.instantiate("xs", Vec::new()).unwrap(), Value::list([Value::Int(1)]));
//! ```

mod error;
mod site;

pub use bento_core;
pub use bento_registry;
pub use bento_resolver;

pub use bento_resolver::{Context, Resolver, ResolverOptions};
pub use error::{SiteError, SiteResult};
pub use site::{Site, SiteTable};

pub mod prelude {
    pub use bento_core::{
        Access, Arguments, BentoError, BinaryOp, Catch, Construction, DefId, Dim, Durability,
        Generator, Index, Instantiation, PrimitiveKind, Redirection, ResolveResult, Type, Value,
    };
    pub use bento_registry::{
        CollectionContents, Contents, DefinitionEntry, DefinitionGraph, Parameter, ParameterList,
    };
    pub use bento_resolver::{Context, Definition, Resolver, ResolverOptions};

    pub use crate::error::{SiteError, SiteResult};
    pub use crate::site::{Site, SiteTable};
}
