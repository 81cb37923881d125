//! Decorator-aware TypeScript generation from resolved JSON Schema type
//! graphs.
//!
//! A render pass walks a [`TypeGraph`] once and produces one source file:
//! decorated model classes, test-object factories or test-expectation
//! helpers. Passes chain through the [`SchemaRegistry`] each one returns.
//!
//! ```
//! use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property};
//! use schemaforge_core::{render_factories, render_models, FactoryOptions, RenderOptions};
//!
//! let mut b = GraphBuilder::new();
//! let s = b.primitive(PrimitiveKind::String);
//! b.class("Car", Some("file:///car.json"), vec![Property::new("plate", s)]);
//! let graph = b.build().unwrap();
//!
//! let models = render_models(&graph, RenderOptions::default().with_output_file("model.ts")).unwrap();
//! let factories = render_factories(
//!     &graph,
//!     RenderOptions::default().with_output_file("factories.ts"),
//!     FactoryOptions::default(),
//!     vec![models.registry],
//! )
//! .unwrap();
//! assert!(factories.source.contains("export function makeCar("));
//! ```

pub mod attributes;
pub mod config;
pub mod context;
pub mod decoration;
pub mod engine;
pub mod error;
pub mod graph;
pub mod imports;
pub mod naming;
pub mod providers;
pub mod registry;
pub mod variants;
pub mod writer;

pub use attributes::{ObjectAttributes, PropertyAttributes, PropertyChanges};
pub use config::{EventTopic, ExpectationOptions, FactoryOptions, RenderOptions};
pub use decoration::Decoration;
pub use engine::{Engine, RenderHooks, RenderOutput, RenderPass};
pub use error::{GraphError, RegistryError, RenderError};
pub use graph::{TypeGraph, TypeId};
pub use providers::{default_providers, DecoratorProvider, RenderingUtilities};
pub use registry::{RegistryEntry, SchemaRegistry};

use variants::{ExpectationHooks, FactoryHooks, ModelClassHooks};

/// Model classes decorated by the default providers.
pub fn render_models(graph: &TypeGraph, options: RenderOptions) -> Result<RenderOutput, RenderError> {
    Engine::new(graph, options, ModelClassHooks)
        .with_providers(default_providers())
        .render()
}

/// One `makeX` factory per class, referencing the model pass's output.
pub fn render_factories(
    graph: &TypeGraph,
    options: RenderOptions,
    factory_options: FactoryOptions,
    upstream: Vec<SchemaRegistry>,
) -> Result<RenderOutput, RenderError> {
    Engine::new(graph, options, FactoryHooks::new(factory_options))
        .with_upstreams(upstream)
        .render()
}

/// Expectation helpers for entities, events and mutations.
pub fn render_expectations(
    graph: &TypeGraph,
    options: RenderOptions,
    expectation_options: ExpectationOptions,
    upstream: Vec<SchemaRegistry>,
) -> Result<RenderOutput, RenderError> {
    let hooks = ExpectationHooks::new(expectation_options)?;
    Engine::new(graph, options, hooks)
        .with_upstreams(upstream)
        .render()
}
