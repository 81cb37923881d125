//! Base emission engine.
//!
//! The engine walks the type graph once, in discovery order, and hands each
//! class and enum to a [`RenderHooks`] implementation. Variants differ only
//! in the hooks value they supply; traversal, decoration, import bookkeeping
//! and registry population live here.

mod enums;
mod pass;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::RenderOptions;
use crate::context::{ClassContext, EnumContext};
use crate::error::RenderError;
use crate::graph::{TypeGraph, TypeKind};
use crate::providers::DecoratorProvider;
use crate::registry::SchemaRegistry;

pub use enums::{resolve_enum_hint, suppressed_enums};
pub use pass::{RenderPass, TypeNaming};

/// The product of one render pass.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Output file the source is meant for; the engine performs no I/O.
    pub file: PathBuf,
    pub source: String,
    /// Everything this pass registered, for chaining into later passes.
    pub registry: SchemaRegistry,
}

/// Variant behavior plugged into the engine.
///
/// Every method has a default that renders plain model declarations, so
/// a variant overrides only what it changes.
pub trait RenderHooks {
    /// How classes and enums are named in this pass's output.
    fn type_naming(&self) -> TypeNaming {
        TypeNaming::Local
    }

    /// Skip a class entirely: no output, no registry entry.
    fn suppress_class(&mut self, _ctx: &ClassContext<'_>, _pass: &RenderPass<'_>) -> bool {
        false
    }

    /// Whether enums are visited at all.
    fn emits_enums(&self) -> bool {
        true
    }

    /// Emit a class and return the name to register it under.
    fn render_class<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<Option<String>, RenderError> {
        pass.emit_class_declaration(ctx, ctx.name());
        Ok(Some(ctx.name().to_string()))
    }

    /// Emit an enum and return the name to register it under.
    fn render_enum<'a>(
        &mut self,
        ctx: &EnumContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<Option<String>, RenderError> {
        pass.emit_enum_declaration(ctx);
        Ok(Some(ctx.name().to_string()))
    }

    /// Called once after the last node.
    fn finish(&mut self, _pass: &mut RenderPass<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Single-pass renderer over a type graph.
///
/// ```
/// use schemaforge_core::engine::Engine;
/// use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property};
/// use schemaforge_core::variants::ModelClassHooks;
/// use schemaforge_core::RenderOptions;
///
/// let mut b = GraphBuilder::new();
/// let s = b.primitive(PrimitiveKind::String);
/// b.class("Car", Some("file:///car.json"), vec![Property::new("plate", s)]);
/// let graph = b.build().unwrap();
///
/// let output = Engine::new(&graph, RenderOptions::default().with_output_file("model.ts"), ModelClassHooks)
///     .render()
///     .unwrap();
/// assert!(output.source.contains("readonly plate!: string;"));
/// assert_eq!(output.registry.lookup("file:///car.json").unwrap().name, "Car");
/// ```
pub struct Engine<'g, H> {
    graph: &'g TypeGraph,
    options: RenderOptions,
    providers: Vec<Box<dyn DecoratorProvider>>,
    upstream: Vec<SchemaRegistry>,
    hooks: H,
}

impl<'g, H: RenderHooks> Engine<'g, H> {
    /// An engine with no decorator providers and no upstream registries.
    pub fn new(graph: &'g TypeGraph, options: RenderOptions, hooks: H) -> Self {
        Self {
            graph,
            options,
            providers: Vec::new(),
            upstream: Vec::new(),
            hooks,
        }
    }

    /// Replace the provider list. Order is decoration order.
    pub fn with_providers(mut self, providers: Vec<Box<dyn DecoratorProvider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_provider(mut self, provider: impl DecoratorProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Make an earlier pass's registry available for cross-file references.
    pub fn with_upstream(mut self, registry: SchemaRegistry) -> Self {
        self.upstream.push(registry);
        self
    }

    pub fn with_upstreams(mut self, registries: impl IntoIterator<Item = SchemaRegistry>) -> Self {
        self.upstream.extend(registries);
        self
    }

    /// Run the pass.
    ///
    /// Fails before traversal when no output file is configured. Any error
    /// raised while visiting a node aborts the whole pass.
    pub fn render(mut self) -> Result<RenderOutput, RenderError> {
        let file = self
            .options
            .output_file
            .clone()
            .ok_or(RenderError::MissingConfiguration("output-file"))?;

        let graph = self.graph;
        let mut pass = RenderPass::new(
            graph,
            &self.options,
            &self.providers,
            &self.upstream,
            file.clone(),
            self.hooks.type_naming(),
        );

        for (id, node) in graph.iter() {
            let registered = match &node.kind {
                TypeKind::Class(_) => {
                    let Some(ctx) = ClassContext::new(graph, id) else {
                        continue;
                    };
                    pass.location = ctx.location();
                    if ctx.attributes.type_override.is_some() {
                        debug!(class = ctx.name(), "class has a type override; not emitted");
                        continue;
                    }
                    if self.hooks.suppress_class(&ctx, &pass) {
                        debug!(class = ctx.name(), "class suppressed");
                        continue;
                    }
                    self.hooks.render_class(&ctx, &mut pass)?
                }
                TypeKind::Enum(_) => {
                    if !self.hooks.emits_enums() {
                        continue;
                    }
                    let Some(ctx) = EnumContext::new(graph, id) else {
                        continue;
                    };
                    if pass.is_enum_suppressed(id) {
                        continue;
                    }
                    pass.location = node
                        .source
                        .clone()
                        .unwrap_or_else(|| format!("enum {} ({id})", ctx.name()));
                    self.hooks.render_enum(&ctx, &mut pass)?
                }
                _ => continue,
            };

            let Some(name) = registered else {
                continue;
            };
            match node.source.as_deref() {
                Some(source) => {
                    pass.registry
                        .register(source, name.as_str(), &file)
                        .map_err(|e| RenderError::reference(pass.location.clone(), e))?;
                    debug!(source, name = %name, "registered");
                }
                None => debug!(name = %name, "no source location; not registered"),
            }
        }

        self.hooks.finish(&mut pass)?;
        let (source, registry) = pass.assemble();
        info!(file = %file.display(), entries = registry.len(), "render pass complete");
        Ok(RenderOutput {
            file,
            source,
            registry,
        })
    }
}
