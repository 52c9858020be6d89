//! Resolver configuration.

/// Limits and switches for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Bound on alias/flavor/bound/element unwrapping.
    pub max_delegation_depth: usize,
    /// Hop bound before a supertype chain is reported as probably circular.
    pub max_super_depth: usize,
    /// Bound on nested instantiation frames.
    pub max_stack_depth: usize,
    /// When false, every resolution rebuilds regardless of durability.
    pub cache_enabled: bool,
    /// Safety bound for generated collections without a definite size.
    pub max_generated_elements: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_delegation_depth: 32,
            max_super_depth: bento_registry::MAX_SUPER_DEPTH,
            max_stack_depth: 512,
            cache_enabled: true,
            max_generated_elements: 65_536,
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    pub fn with_max_super_depth(mut self, depth: usize) -> Self {
        self.max_super_depth = depth;
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_max_generated_elements(mut self, max: usize) -> Self {
        self.max_generated_elements = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ResolverOptions::default();
        assert_eq!(options.max_delegation_depth, 32);
        assert_eq!(options.max_super_depth, 10);
        assert!(options.cache_enabled);
        assert_eq!(options.max_generated_elements, 65_536);
    }

    #[test]
    fn builder_overrides() {
        let options = ResolverOptions::new()
            .with_cache(false)
            .with_max_generated_elements(8)
            .with_max_stack_depth(4);
        assert!(!options.cache_enabled);
        assert_eq!(options.max_generated_elements, 8);
        assert_eq!(options.max_stack_depth, 4);
    }
}
