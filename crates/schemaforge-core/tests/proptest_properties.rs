//! Property-based checks over generated single-class graphs.
//!
//! - Exclusion: an excluded decorator never appears, however many providers
//!   try to contribute it.
//! - Imports: every decorator written into the output is imported.
//! - Round trip: the default a factory synthesizes for a property satisfies
//!   the matcher the expectation pass derives for the same property.

use std::collections::BTreeSet;

use proptest::prelude::*;
use schemaforge_core::engine::Engine;
use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property, TypeGraph};
use schemaforge_core::providers::{
    ApiDocumentationProvider, CoercionProvider, TransformProvider, ValidationProvider,
};
use schemaforge_core::variants::{ExpectationHooks, FactoryHooks, ModelClassHooks};
use schemaforge_core::{ExpectationOptions, FactoryOptions, PropertyAttributes, RenderOptions};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const DECORATORS: &[&str] = &[
    "IsOptional",
    "ValidateIf",
    "IsString",
    "IsUUID",
    "IsInt",
    "IsNumber",
    "IsBoolean",
    "IsDate",
    "Type",
    "Transform",
    "ApiProperty",
    "ApiPropertyOptional",
];

#[derive(Debug, Clone)]
struct Field {
    primitive: PrimitiveKind,
    optional: bool,
    nullable: bool,
}

fn arb_primitive() -> impl Strategy<Value = PrimitiveKind> {
    prop::sample::select(PrimitiveKind::ALL.to_vec())
}

fn arb_field() -> impl Strategy<Value = Field> {
    (arb_primitive(), any::<bool>(), any::<bool>()).prop_map(|(primitive, optional, nullable)| {
        Field {
            primitive,
            optional,
            nullable,
        }
    })
}

fn arb_excluded() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(prop::sample::select(DECORATORS.to_vec()), 0..DECORATORS.len())
        .prop_map(|names| names.into_iter().map(str::to_string).collect())
}

/// A single `Thing` class with one property per field, named `f0`, `f1`, ...
fn build_graph(fields: &[Field], excluded: &BTreeSet<String>) -> TypeGraph {
    let mut b = GraphBuilder::new();
    let mut properties = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let mut ty = b.primitive(field.primitive);
        if field.nullable {
            ty = b.nullable(ty);
        }
        let mut property = Property::new(format!("f{i}"), ty).with_attributes(PropertyAttributes {
            excluded_decorators: excluded.clone(),
            ..PropertyAttributes::default()
        });
        if field.optional {
            property = property.optional();
        }
        properties.push(property);
    }
    let thing = b.class("Thing", Some("file:///schemas/entities/thing.json"), properties);
    b.attributes(thing).unwrap().open_api_enabled = true;
    b.build().unwrap()
}

fn render_all_providers(graph: &TypeGraph) -> String {
    Engine::new(
        graph,
        RenderOptions::default().with_output_file("model.ts"),
        ModelClassHooks,
    )
    .with_provider(ValidationProvider)
    .with_provider(TransformProvider)
    .with_provider(ApiDocumentationProvider)
    .with_provider(CoercionProvider::default())
    // a second registration of the same provider must be vetoed just the same
    .with_provider(ValidationProvider)
    .render()
    .unwrap()
    .source
}

// ---------------------------------------------------------------------------
// Matcher evaluation
// ---------------------------------------------------------------------------

/// Whether a synthesized default expression satisfies a matcher expression.
fn satisfies(default: &str, matcher: &str) -> bool {
    if let Some(inner) = matcher
        .strip_prefix("anyOf(")
        .and_then(|m| m.strip_suffix(')'))
    {
        return inner.split(", ").any(|m| satisfies(default, m));
    }
    match matcher {
        "expect.anything()" => default != "null" && default != "undefined",
        "expect.any(String)" => default.starts_with('"') || default == "randomUUID()",
        "expect.any(Number)" => default.parse::<f64>().is_ok(),
        "expect.any(Boolean)" => default == "true" || default == "false",
        "expect.any(Date)" => default == "new Date()",
        "null" => default == "null",
        "undefined" => default == "undefined",
        literal => literal == default,
    }
}

/// `key: value,` lines at the given indent, keyed by property name.
fn fields_at(source: &str, indent: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|l| l.strip_prefix(indent))
        .filter(|l| !l.starts_with(' ') && !l.starts_with("..."))
        .filter_map(|l| l.strip_suffix(','))
        .filter_map(|l| l.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_excluded_decorators_never_appear(
        fields in prop::collection::vec(arb_field(), 1..5),
        excluded in arb_excluded(),
    ) {
        let graph = build_graph(&fields, &excluded);
        let source = render_all_providers(&graph);

        for name in &excluded {
            let usage = format!("@{name}(");
            prop_assert!(!source.contains(&usage), "{usage} leaked into:\n{source}");
        }
    }

    #[test]
    fn test_every_decorator_is_imported(
        fields in prop::collection::vec(arb_field(), 1..5),
        excluded in arb_excluded(),
    ) {
        let graph = build_graph(&fields, &excluded);
        let source = render_all_providers(&graph);
        let imports: String = source
            .lines()
            .filter(|l| l.starts_with("import "))
            .collect::<Vec<_>>()
            .join("\n");

        for line in source.lines().map(str::trim).filter(|l| l.starts_with('@')) {
            let name = &line[1..line.find('(').unwrap_or(line.len())];
            let imported = imports
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == name);
            prop_assert!(imported, "@{name} is not imported:\n{source}");
        }
    }

    #[test]
    fn test_factory_defaults_satisfy_matchers(fields in prop::collection::vec(arb_field(), 1..6)) {
        let graph = build_graph(&fields, &BTreeSet::new());
        let model = Engine::new(
            &graph,
            RenderOptions::default().with_output_file("model.ts"),
            ModelClassHooks,
        )
        .render()
        .unwrap();

        let factories = Engine::new(
            &graph,
            RenderOptions::default().with_output_file("factories.ts"),
            FactoryHooks::new(FactoryOptions::default()),
        )
        .with_upstream(model.registry.clone())
        .render()
        .unwrap()
        .source;

        let expectations = Engine::new(
            &graph,
            RenderOptions::default().with_output_file("expectations.ts"),
            ExpectationHooks::new(ExpectationOptions {
                entity_globs: vec!["**/entities/*.json".to_string()],
                ..ExpectationOptions::default()
            })
            .unwrap(),
        )
        .with_upstream(model.registry)
        .render()
        .unwrap()
        .source;

        let defaults = fields_at(&factories, "    ");
        let matchers = fields_at(&expectations, "    ");

        for (i, field) in fields.iter().enumerate() {
            let key = format!("f{i}");
            let matcher = matchers
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, m)| m.as_str())
                .unwrap_or_else(|| panic!("no matcher for {key}:\n{expectations}"));
            match defaults.iter().find(|(k, _)| *k == key) {
                Some((_, default)) => prop_assert!(
                    satisfies(default, matcher),
                    "default {default} does not satisfy {matcher} for {field:?}"
                ),
                None => {
                    prop_assert!(field.optional, "required {key} has no default");
                    prop_assert!(satisfies("undefined", matcher));
                }
            }
        }
    }
}

#[test]
fn test_satisfies_table() {
    assert!(satisfies("randomUUID()", "expect.any(String)"));
    assert!(satisfies("0.0", "expect.any(Number)"));
    assert!(satisfies("new Date()", "anyOf(null, expect.any(Date))"));
    assert!(!satisfies("false", "expect.any(String)"));
}
