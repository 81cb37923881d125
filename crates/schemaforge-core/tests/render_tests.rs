//! End-to-end render passes over the fixture graphs in `tests/graphs`.
//!
//! The model pass runs first and its registry feeds the factory and
//! expectation passes, the same way the CLI chains them.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use schemaforge_core::config::EventTopic;
use schemaforge_core::engine::Engine;
use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property};
use schemaforge_core::providers::{CoercionProvider, ValidationProvider};
use schemaforge_core::variants::ModelClassHooks;
use schemaforge_core::{
    render_expectations, render_factories, render_models, Decoration, ExpectationOptions,
    FactoryOptions, ObjectAttributes, RegistryError, RenderError, RenderOptions, RenderOutput,
    SchemaRegistry, TypeGraph,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

const GRAPHS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/graphs");

fn load_graph(name: &str) -> TypeGraph {
    let path = Path::new(GRAPHS_DIR).join(format!("{name}.json"));
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read graph {name}.json: {e}"));
    TypeGraph::from_json_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse graph {name}.json: {e}"))
}

fn out(file: &str) -> RenderOptions {
    RenderOptions::default().with_output_file(file)
}

fn expectation_options() -> ExpectationOptions {
    ExpectationOptions {
        entity_globs: vec!["**/entities/*.json".to_string()],
        event_topics: vec![EventTopic {
            topic: "cars.sold".to_string(),
            schema: "file:///schemas/events/car-sold.json".to_string(),
        }],
        ..ExpectationOptions::default()
    }
}

fn models(graph: &TypeGraph) -> RenderOutput {
    render_models(graph, out("src/model.ts")).expect("model pass")
}

// ── Car scenario ────────────────────────────────────────────────────────────

#[test]
fn test_car_model_class() {
    let graph = load_graph("car");
    let output = models(&graph);

    assert_eq!(
        output.source,
        r#"import { IsOptional, IsString, IsUUID } from "class-validator";

export class Car {
  @IsOptional()
  @IsUUID()
  readonly id?: string;

  @IsString()
  readonly plate!: string;

  constructor(init: Car) {
    Object.assign(this, init);
  }
}
"#
    );
    let entry = output
        .registry
        .lookup("file:///schemas/entities/car.json")
        .unwrap();
    assert_eq!(entry.name, "Car");
    assert_eq!(entry.file, Path::new("src/model.ts"));
}

#[test]
fn test_car_factory() {
    let graph = load_graph("car");
    let model = models(&graph);
    let output = render_factories(
        &graph,
        out("src/testing/factories.ts"),
        FactoryOptions::default(),
        vec![model.registry],
    )
    .unwrap();

    assert_eq!(
        output.source,
        r#"import { Car } from "../model";

export function makeCar(data: Partial<Car> = {}): Car {
  return new Car({
    plate: "string",
    ...data,
  });
}
"#
    );
    assert_eq!(
        output
            .registry
            .lookup("file:///schemas/entities/car.json")
            .unwrap()
            .name,
        "makeCar"
    );
}

#[test]
fn test_car_expectation() {
    let graph = load_graph("car");
    let model = models(&graph);
    let output = render_expectations(
        &graph,
        out("src/testing/expectations.ts"),
        expectation_options(),
        vec![model.registry],
    )
    .unwrap();

    assert_eq!(
        output.source,
        r#"import { Car } from "../model";
import { expect } from "@jest/globals";
import { type TransactionRunner, anyOf } from "@schemaforge/testing";

export async function expectCar(
  runner: TransactionRunner,
  expected: Partial<Car> = {},
): Promise<Car> {
  const actual = await runner.findOne(Car, expected);
  expect(actual).toEqual({
    id: anyOf(undefined, expect.any(String)),
    plate: expect.any(String),
    ...expected,
  });
  return actual as Car;
}

export async function expectCarNotToExist(
  runner: TransactionRunner,
  expected: Partial<Car>,
): Promise<void> {
  const actual = await runner.findOne(Car, expected);
  expect(actual ?? undefined).toBeUndefined();
}
"#
    );
}

// ── Fleet: models ───────────────────────────────────────────────────────────

#[test]
fn test_fleet_models_declarations() {
    let graph = load_graph("fleet");
    let output = models(&graph);
    let src = &output.source;

    assert!(src.contains("export enum Color {\n  Red = \"red\",\n  Blue = \"blue\",\n}"));
    assert!(src.contains("export enum CarStatus {"));
    assert!(!src.contains("ArchivedStatus"), "constant-only enum must not be declared");
    assert!(!src.contains("LegacyRecord"));

    assert!(src.contains("/**\n * A registered vehicle.\n */\nexport class Car {"));
    assert!(src.contains("  /**\n   * License plate.\n   */\n  @IsString()"));
    assert!(src.contains("readonly status: CarStatus = CarStatus.Active;"));
    assert!(src.contains("readonly color?: string | Color;"));
    assert!(src.contains("readonly owner!: Owner;"));
    assert!(src.contains("readonly tags!: string[];"));
    assert!(src.contains("readonly archivedAt!: Date | null;"));
}

#[test]
fn test_fleet_models_decorations() {
    let graph = load_graph("fleet");
    let src = models(&graph).source;

    assert!(src.contains(
        "  @ValidateIf((_, value) => value !== null)\n  @IsDate()\n  @Type(() => Date)\n  @ApiProperty({ type: Date, nullable: true })\n  readonly archivedAt!: Date | null;"
    ));
    assert!(src.contains("@ApiProperty({ enum: CarStatus, default: \"active\" })"));
    assert!(src.contains("@ApiPropertyOptional({ type: String })"));
    assert!(src.contains("@ValidateNested()\n  @Type(() => Owner)\n  @ApiProperty({ type: () => Owner })"));
    // openApiEnabled is per class
    assert!(!src.contains("ApiProperty({ type: String })\n  readonly name!"));
    assert!(src.contains("import { ApiProperty, ApiPropertyOptional } from \"@nestjs/swagger\";"));
    assert!(src.contains("import { Type } from \"class-transformer\";"));
}

#[test]
fn test_fleet_constraint_intersection() {
    let graph = load_graph("fleet");
    let output = models(&graph);

    assert!(output.source.contains("export class ArchivedCarConstraint {"));
    assert!(output.source.contains("@IsIn([\"archived\"])"));
    assert!(output.source.contains("readonly status!: CarStatus.Archived;"));
    assert!(output
        .source
        .contains("export type ArchivedCar = Car & ArchivedCarConstraint;"));
    assert_eq!(
        output
            .registry
            .lookup("file:///schemas/entities/archived-car.json")
            .unwrap()
            .name,
        "ArchivedCar"
    );
}

#[test]
fn test_fleet_registry_contents() {
    let graph = load_graph("fleet");
    let registry = models(&graph).registry;

    let names: Vec<&str> = registry.iter().map(|(_, e)| e.name.as_str()).collect();
    assert_eq!(registry.len(), 6, "got {names:?}");
    assert!(matches!(
        registry.lookup("file:///schemas/legacy.json"),
        Err(RegistryError::Unresolved { .. })
    ));
}

// ── Fleet: factories ────────────────────────────────────────────────────────

#[test]
fn test_fleet_factories() {
    let graph = load_graph("fleet");
    let model = models(&graph);
    let src = render_factories(
        &graph,
        out("src/factories.ts"),
        FactoryOptions::default(),
        vec![model.registry],
    )
    .unwrap()
    .source;

    assert!(src.starts_with(
        "import { type ArchivedCar, Car, CarSold, CarStatus, Owner } from \"./model\";\nimport { randomUUID } from \"crypto\";\n"
    ));
    assert!(src.contains(
        r#"export function makeCar(data: Partial<Car> = {}): Car {
  return new Car({
    id: randomUUID(),
    plate: "string",
    status: CarStatus.Active,
    owner: makeOwner(),
    tags: [],
    archivedAt: new Date(),
    ...data,
  });
}"#
    ));
    assert!(src.contains(
        r#"export function makeArchivedCar(data: Partial<ArchivedCar> = {}): ArchivedCar {
  return new Car({
    id: randomUUID(),
    plate: "string",
    status: CarStatus.Archived,
    owner: makeOwner(),
    tags: [],
    archivedAt: new Date(),
    ...data,
  }) as ArchivedCar;
}"#
    ));
    assert!(src.contains("    carId: randomUUID(),\n    price: 0,\n    ...data,"));
}

#[test]
fn test_factories_require_model_registry() {
    let graph = load_graph("car");
    let err = render_factories(&graph, out("factories.ts"), FactoryOptions::default(), vec![])
        .unwrap_err();

    match err {
        RenderError::Reference { error, .. } => assert_eq!(
            error,
            RegistryError::Unresolved {
                reference: "file:///schemas/entities/car.json".to_string()
            }
        ),
        other => panic!("expected a reference error, got {other}"),
    }
}

// ── Fleet: expectations ─────────────────────────────────────────────────────

#[test]
fn test_fleet_expectations() {
    let graph = load_graph("fleet");
    let model = models(&graph);
    let output = render_expectations(
        &graph,
        out("src/expectations.ts"),
        expectation_options(),
        vec![model.registry],
    )
    .unwrap();
    let src = &output.source;

    assert!(src.contains("export async function expectOwner("));
    assert!(src.contains("    status: anyOf(\"active\", \"archived\"),"));
    assert!(src.contains("    color: anyOf(undefined, expect.any(String)),"));
    assert!(src.contains("    owner: expect.any(Owner),"));
    assert!(src.contains("    tags: expect.any(Array),"));
    assert!(src.contains("    archivedAt: anyOf(null, expect.any(Date)),"));

    assert!(src.contains("return fixture.expectEvent<CarSold>(\"cars.sold\", {"));
    assert!(src.contains("export async function expectNoCarSold(fixture: EventFixture): Promise<void> {"));
    assert!(src.contains("    bids: anyOf(undefined, expect.any(Object)),"));

    assert!(src.contains("export async function expectArchivedCar("));
    assert!(src.contains("  before: Car,\n  updates: Partial<ArchivedCar>,\n  tests: Partial<ArchivedCar> = {},"));
    assert!(src.contains("    plate: expect.any(String),"));
    assert!(src.contains(
        "    status: (\"status\" in updates ? updates.status : before.status),"
    ));
    assert!(src.contains(
        "    archivedAt: (\"archivedAt\" in updates ? updates.archivedAt : before.archivedAt),"
    ));
    assert_eq!(src.matches("export async function expectCarNotMutated(").count(), 1);

    assert!(!src.contains("expectLegacyRecord"));
    assert!(output
        .registry
        .get("file:///schemas/events/car-sold.json")
        .is_some_and(|e| e.name == "expectCarSold"));
}

#[test]
fn test_expectations_skip_unqualified_classes() {
    let graph = load_graph("car");
    let model = models(&graph);
    let output = render_expectations(
        &graph,
        out("expectations.ts"),
        ExpectationOptions::default(),
        vec![model.registry],
    )
    .unwrap();
    assert!(output.source.is_empty());
    assert!(output.registry.is_empty());
}

// ── Engine behavior ─────────────────────────────────────────────────────────

#[test]
fn test_missing_output_file_fails_before_traversal() {
    let graph = load_graph("car");
    let err = render_models(&graph, RenderOptions::default()).unwrap_err();
    assert!(matches!(err, RenderError::MissingConfiguration("output-file")));
}

#[test]
fn test_policy_knobs_and_leading_comment() {
    let graph = load_graph("car");
    let options = RenderOptions {
        readonly_properties: false,
        non_null_assertion_on_properties: false,
        assign_constructor: false,
        leading_comment: Some("Generated file.\nDo not edit.".to_string()),
        ..out("model.ts")
    };
    let src = Engine::new(&graph, options, ModelClassHooks)
        .render()
        .unwrap()
        .source;

    assert_eq!(
        src,
        "// Generated file.\n// Do not edit.\n\nexport class Car {\n  id?: string;\n\n  plate: string;\n}\n"
    );
}

#[test]
fn test_source_level_decorations_come_first() {
    let mut b = GraphBuilder::new();
    let s = b.primitive(PrimitiveKind::String);
    let mut attrs = schemaforge_core::PropertyAttributes::default();
    attrs.decorators.push(
        Decoration::named("Expose", "@Expose()").with_import("class-transformer", "Expose"),
    );
    attrs
        .decorators
        .push(Decoration::new("").with_import("./helpers", "registerPlate"));
    b.class(
        "Car",
        Some("file:///car.json"),
        vec![Property::new("plate", s).with_attributes(attrs)],
    );
    let graph = b.build().unwrap();

    let src = Engine::new(&graph, out("model.ts"), ModelClassHooks)
        .with_provider(ValidationProvider)
        .render()
        .unwrap()
        .source;

    assert!(src.contains("  @Expose()\n  @IsString()\n  readonly plate!: string;"));
    assert!(src.contains("import { registerPlate } from \"./helpers\";"));
    assert!(src.contains("import { Expose } from \"class-transformer\";"));
}

#[test]
fn test_class_level_decorations_and_exclusions() {
    let mut b = GraphBuilder::new();
    let i = b.primitive(PrimitiveKind::Integer);
    let car = b.class("Car", Some("file:///car.json"), vec![Property::new("seats", i)]);
    *b.attributes(car).unwrap() = ObjectAttributes {
        decorators: vec![Decoration::named("Entity", "@Entity(\"cars\")").with_import("typeorm", "Entity")],
        ..ObjectAttributes::default()
    };
    let graph = b.build().unwrap();

    let src = Engine::new(&graph, out("model.ts"), ModelClassHooks)
        .with_provider(ValidationProvider)
        .with_provider(CoercionProvider::new("./coerce"))
        .render()
        .unwrap()
        .source;

    assert!(src.contains("@Entity(\"cars\")\nexport class Car {"));
    assert!(src.contains("  @IsInt()\n  @Transform(toNumber)\n  readonly seats!: number;"));
    assert!(src.contains("import { toNumber } from \"./coerce\";"));
    assert!(src.contains("import { Transform } from \"class-transformer\";"));
}

#[test]
fn test_constraint_property_decorates_with_base_class() {
    let mut b = GraphBuilder::new();
    let s = b.primitive(PrimitiveKind::String);
    let car = b.class("Car", Some("file:///car.json"), vec![Property::new("plate", s)]);
    let archived = b.class(
        "ArchivedCarConstraint",
        Some("file:///archived-car.json"),
        vec![Property::new("reason", s)],
    );
    b.attributes(archived).unwrap().constraint_for = Some(car);
    let garage = b.class(
        "Garage",
        Some("file:///garage.json"),
        vec![Property::new("last", archived)],
    );
    b.attributes(garage).unwrap().open_api_enabled = true;
    let graph = b.build().unwrap();

    let src = render_models(&graph, out("model.ts")).unwrap().source;
    assert!(src.contains(
        "  @ValidateNested()\n  @Type(() => Car)\n  @ApiProperty({ type: () => Car })\n  readonly last!: ArchivedCar;"
    ));
    assert!(!src.contains("() => ArchivedCar"));
}

#[test]
fn test_multi_case_constant_enum_is_declared() {
    let mut b = GraphBuilder::new();
    let color = b.enumeration("Color", &["red", "blue"], Some("file:///color.json"));
    let attrs = schemaforge_core::PropertyAttributes {
        is_constant: true,
        ..Default::default()
    };
    b.class(
        "Car",
        Some("file:///car.json"),
        vec![Property::new("color", color).with_attributes(attrs)],
    );
    let graph = b.build().unwrap();

    let output = render_models(&graph, out("model.ts")).unwrap();
    assert!(output.source.contains("export enum Color {\n  Red = \"red\",\n  Blue = \"blue\",\n}"));
    assert!(output.source.contains("@IsEnum(Color)"));
    assert!(output.source.contains("readonly color!: Color;"));
    assert_eq!(output.registry.lookup("file:///color.json").unwrap().name, "Color");
}

#[test]
fn test_unresolved_enum_hint_falls_back() {
    let mut b = GraphBuilder::new();
    let s = b.primitive(PrimitiveKind::String);
    let attrs = schemaforge_core::PropertyAttributes {
        enum_hint: Some("file:///missing.json".to_string()),
        ..Default::default()
    };
    b.class(
        "Car",
        Some("file:///car.json"),
        vec![Property::new("color", s).with_attributes(attrs)],
    );
    let graph = b.build().unwrap();

    let src = render_models(&graph, out("model.ts")).unwrap().source;
    assert!(src.contains("readonly color!: string;"));
}

#[test]
fn test_upstream_registry_from_json() {
    let graph = load_graph("car");
    let registry: SchemaRegistry = serde_json::from_str(
        r#"{ "file:///schemas/entities/car.json": { "name": "Vehicle", "file": "lib/vehicle.ts" } }"#,
    )
    .unwrap();
    let src = render_factories(&graph, out("lib/testing/make.ts"), FactoryOptions::default(), vec![registry])
        .unwrap()
        .source;

    assert!(src.starts_with("import { Vehicle } from \"../vehicle\";\n"));
    assert!(src.contains("export function makeVehicle(data: Partial<Vehicle> = {}): Vehicle {"));
}
