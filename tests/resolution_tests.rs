//! End-to-end resolution through a [`Site`]: lookup, overloads, aliases,
//! supertypes and fault recovery.

mod common;

use bento::bento_registry::{lattice, validation};
use bento::prelude::*;
use common::*;

#[test]
fn test_levels_below_is_reflexive() {
    let site = shapes_site();
    site.with_resolver(|resolver| {
        let graph = resolver.graph();
        for name in ["shape", "polygon", "square"] {
            let ty = Type::named(name);
            assert_eq!(lattice::levels_below(graph, &ty, &ty), 0, "{name}");
            assert!(lattice::is_type_of(graph, &ty, &ty), "{name}");
        }
        let int = int();
        assert_eq!(lattice::levels_below(graph, &int, &int), 0);
    })
    .unwrap();
}

#[test]
fn test_levels_below_counts_supertype_hops() {
    let site = shapes_site();
    site.with_resolver(|resolver| {
        let graph = resolver.graph();
        let (square, polygon, shape) = (Type::named("square"), Type::named("polygon"), Type::named("shape"));
        assert_eq!(lattice::levels_below(graph, &square, &polygon), 1);
        assert_eq!(lattice::levels_below(graph, &square, &shape), 2);
        assert_eq!(lattice::levels_below(graph, &shape, &square), -1);
        assert!(lattice::is_type_of(graph, &shape, &square));
        assert!(!lattice::is_type_of(graph, &square, &shape));
    })
    .unwrap();
}

#[test]
fn test_validation_flags_circular_chains() {
    let site = shapes_site();
    assert!(site.validate().unwrap().is_empty());

    site.register(DefId::ROOT, DefinitionEntry::new("chicken").with_super(Type::named("egg")))
        .unwrap();
    site.register(DefId::ROOT, DefinitionEntry::new("egg").with_super(Type::named("chicken")))
        .unwrap();

    let mut circular = site.validate().unwrap();
    circular.sort();
    assert_eq!(circular, vec!["chicken".to_string(), "egg".to_string()]);
    site.with_resolver(|resolver| assert!(validation::has_supertype_cycle(resolver.graph())))
        .unwrap();
}

#[test]
fn test_empty_definitions_fall_through_to_supertypes() {
    let site = shapes_site();
    assert_eq!(site.instantiate("polygon", Vec::new()).unwrap(), Value::str("shape"));
    assert_eq!(site.instantiate("square", Vec::new()).unwrap(), Value::str("square"));
}

#[test]
fn test_undefined_name_is_not_found() {
    let site = shapes_site();
    let fault = redirection(site.instantiate("circle", Vec::new()).unwrap_err());
    assert_eq!(fault.status, Redirection::STATUS_NOT_FOUND);
    assert_eq!(fault.location, "circle");
}

#[test]
fn test_arguments_bind_to_parameters() {
    let site = Site::new("main");
    site.register(
        DefId::ROOT,
        DefinitionEntry::body(
            "greet",
            Construction::Block(vec![Construction::str("hello "), Construction::reference("name")]),
        )
        .with_params(ParameterList::new(vec![Parameter::untyped("name")])),
    )
    .unwrap();
    assert_eq!(
        site.instantiate("greet", vec![Construction::str("bento")]).unwrap(),
        Value::str("hello bento")
    );
}

#[test]
fn test_overloads_pick_the_closest_parameter_list() {
    let site = Site::new("main");
    site.register(
        DefId::ROOT,
        DefinitionEntry::body("describe", Construction::reference("x"))
            .with_params(ParameterList::new(vec![Parameter::new("x", int())]))
            .with_params(ParameterList::new(vec![Parameter::new("x", string())])),
    )
    .unwrap();

    assert_eq!(site.instantiate("describe", vec![Construction::int(7)]).unwrap(), Value::Int(7));
    assert_eq!(
        site.instantiate("describe", vec![Construction::str("seven")]).unwrap(),
        Value::str("seven")
    );
    let fault = redirection(
        site.instantiate("describe", vec![Construction::int(1), Construction::int(2)])
            .unwrap_err(),
    );
    assert_eq!(fault.status, Redirection::STATUS_SERVER_ERROR);
}

#[test]
fn test_aliases_forward_to_their_target() {
    let site = shapes_site();
    site.register(
        DefId::ROOT,
        DefinitionEntry::new("tile").with_contents(Contents::Alias(Instantiation::new("square"))),
    )
    .unwrap();
    assert_eq!(site.instantiate("tile", Vec::new()).unwrap(), Value::str("square"));
}

#[test]
fn test_nested_definitions_resolve_by_dotted_name() {
    let site = Site::new("main");
    site.register_in("", DefinitionEntry::new("config")).unwrap();
    site.register_in("config", DefinitionEntry::body("port", Construction::int(8080)))
        .unwrap();
    site.register_in(
        "config",
        DefinitionEntry::body(
            "next_port",
            Construction::binary(BinaryOp::Add, Construction::reference("port"), Construction::int(1)),
        ),
    )
    .unwrap();
    assert_eq!(site.instantiate("config.port", Vec::new()).unwrap(), Value::Int(8080));
    assert_eq!(site.instantiate("config.next_port", Vec::new()).unwrap(), Value::Int(8081));
}

#[test]
fn test_catch_all_recovers_from_missing_names() {
    let site = shapes_site();
    let guarded = Construction::Guarded {
        body: Box::new(Construction::reference("circle")),
        catches: vec![Catch::all(Construction::str("fallback"))],
    };
    assert_eq!(construct(&site, &guarded).unwrap(), Value::str("fallback"));
}

#[test]
fn test_explicit_redirects_propagate() {
    let site = Site::new("main");
    site.register(
        DefId::ROOT,
        DefinitionEntry::body(
            "moved",
            Construction::Redirect {
                location: "/elsewhere".to_string(),
            },
        ),
    )
    .unwrap();
    let fault = redirection(site.instantiate("moved", Vec::new()).unwrap_err());
    assert!(fault.is_redirect());
    assert_eq!(fault.location, "/elsewhere");
}

#[test]
fn test_runaway_recursion_faults_as_circular() {
    let options = ResolverOptions {
        max_stack_depth: 32,
        ..ResolverOptions::default()
    };
    let site = Site::with_options("main", options);
    site.register(DefId::ROOT, DefinitionEntry::body("forever", Construction::reference("forever")))
        .unwrap();
    let fault = redirection(site.instantiate("forever", Vec::new()).unwrap_err());
    assert_eq!(fault.location, Redirection::CIRCULAR);
}
