//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use bento::prelude::*;

pub fn int() -> Type {
    Type::primitive(PrimitiveKind::Int)
}

pub fn string() -> Type {
    Type::primitive(PrimitiveKind::String)
}

pub fn strs(items: &[&str]) -> Vec<Construction> {
    items.iter().map(|s| Construction::str(*s)).collect()
}

pub fn str_values(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::str(*s)))
}

/// A site holding a small shape hierarchy: `shape` < `polygon` < `square`.
pub fn shapes_site() -> Site {
    let site = Site::new("shapes");
    site.register(DefId::ROOT, DefinitionEntry::body("shape", Construction::str("shape")))
        .unwrap();
    site.register(DefId::ROOT, DefinitionEntry::new("polygon").with_super(Type::named("shape")))
        .unwrap();
    site.register(
        DefId::ROOT,
        DefinitionEntry::body("square", Construction::str("square")).with_super(Type::named("polygon")),
    )
    .unwrap();
    site
}

/// Instantiate `construction` against the site's definitions in a fresh scope.
pub fn construct(site: &Site, construction: &Construction) -> ResolveResult<Value> {
    site.with_resolver(|resolver| resolver.construct(construction, &mut Context::new()))
        .unwrap()
}

pub fn redirection(err: SiteError) -> Redirection {
    match err {
        SiteError::Resolve(err) => err.into_redirection(),
        other => panic!("expected a resolution fault, got {other:?}"),
    }
}
