//! Namespaces owning a definition graph and a retention table.
//!
//! A [`Site`] serializes registration behind the write half of a lock and
//! resolves behind the read half, so independent load paths may register
//! while other threads instantiate. Each instantiation runs on a fresh
//! [`Context`]; nothing but the retention ("keep") table outlives a call.

use std::sync::{Arc, Mutex, RwLock};

use bento_core::{Construction, DefId, NameRef, Value};
use bento_registry::{DefinitionEntry, DefinitionGraph, validation};
use bento_resolver::{Context, Resolver, ResolverOptions};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{SiteError, SiteResult};

/// One namespace of definitions.
#[derive(Debug)]
pub struct Site {
    name: String,
    options: ResolverOptions,
    definitions: RwLock<DefinitionGraph>,
    keep: Mutex<FxHashMap<String, Value>>,
}

impl Site {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, ResolverOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: ResolverOptions) -> Self {
        Self {
            name: name.into(),
            options,
            definitions: RwLock::new(DefinitionGraph::new()),
            keep: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Register `entry` under `owner`.
    pub fn register(&self, owner: DefId, entry: DefinitionEntry) -> SiteResult<DefId> {
        let mut graph = self.definitions.write()?;
        let name = entry.name.clone();
        let id = graph.define(owner, entry)?;
        debug!(site = %self.name, definition = %name, id = %id, "registered definition");
        Ok(id)
    }

    /// Register `entry` under the definition named by the dotted path
    /// `owner`; the empty path is the root namespace.
    pub fn register_in(&self, owner: &str, entry: DefinitionEntry) -> SiteResult<DefId> {
        let mut graph = self.definitions.write()?;
        let owner_id = if owner.is_empty() {
            DefId::ROOT
        } else {
            graph
                .find_definition(&NameRef::parse(owner), DefId::ROOT)
                .ok_or_else(|| SiteError::UnknownOwner(owner.to_string()))?
        };
        Ok(graph.define(owner_id, entry)?)
    }

    /// Instantiate the definition `name` with `args`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn instantiate(&self, name: &str, args: Vec<Construction>) -> SiteResult<Value> {
        let graph = self.definitions.read()?;
        let resolver = Resolver::with_options(&graph, self.options);
        let mut ctx = Context::new();
        Ok(resolver.instantiate_name(name, args, &mut ctx)?)
    }

    /// Run `f` with a resolver over the current definitions.
    pub fn with_resolver<R>(&self, f: impl FnOnce(&Resolver<'_>) -> R) -> SiteResult<R> {
        let graph = self.definitions.read()?;
        let resolver = Resolver::with_options(&graph, self.options);
        Ok(f(&resolver))
    }

    /// Definitions whose supertype chains look circular.
    pub fn validate(&self) -> SiteResult<Vec<String>> {
        let graph = self.definitions.read()?;
        let circular = validation::find_circular(&graph, self.options.max_super_depth);
        if !circular.is_empty() {
            warn!(site = %self.name, count = circular.len(), "site has probably circular definitions");
        }
        Ok(circular.into_iter().map(|id| graph.full_name(id)).collect())
    }

    /// Retain `value` under `key`, returning the value it replaces.
    pub fn keep(&self, key: impl Into<String>, value: Value) -> SiteResult<Option<Value>> {
        Ok(self.keep.lock()?.insert(key.into(), value))
    }

    pub fn kept(&self, key: &str) -> SiteResult<Option<Value>> {
        Ok(self.keep.lock()?.get(key).cloned())
    }

    pub fn forget(&self, key: &str) -> SiteResult<Option<Value>> {
        Ok(self.keep.lock()?.remove(key))
    }
}

/// Process-wide table of sites keyed by namespace name.
#[derive(Debug, Default)]
pub struct SiteTable {
    sites: Mutex<FxHashMap<String, Arc<Site>>>,
}

impl SiteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The site named `name`, created on first use.
    pub fn site(&self, name: &str) -> SiteResult<Arc<Site>> {
        let mut sites = self.sites.lock()?;
        let site = sites
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Site::new(name)));
        Ok(Arc::clone(site))
    }

    pub fn get(&self, name: &str) -> SiteResult<Option<Arc<Site>>> {
        Ok(self.sites.lock()?.get(name).cloned())
    }

    /// Install a preconfigured site, replacing any site of the same name.
    pub fn insert(&self, site: Site) -> SiteResult<Arc<Site>> {
        let site = Arc::new(site);
        self.sites
            .lock()?
            .insert(site.name().to_string(), Arc::clone(&site));
        Ok(site)
    }

    pub fn remove(&self, name: &str) -> SiteResult<Option<Arc<Site>>> {
        Ok(self.sites.lock()?.remove(name))
    }

    /// Sorted namespace names.
    pub fn names(&self) -> SiteResult<Vec<String>> {
        let mut names: Vec<_> = self.sites.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
