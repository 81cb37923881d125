//! Decorator providers.
//!
//! A provider is a stateless strategy that, given a class or property
//! context, returns the decorations to attach to it. Providers never touch
//! renderer state; they receive the engine's [`RenderingUtilities`] by
//! reference and express side effects only as import requests on the
//! decorations they return.
//!
//! All contributions must go through [`add_decoration`], which applies the
//! `excludedDecorators` veto and merges imports in one place.

pub mod api_docs;
pub mod coercion;
pub mod transform;
pub mod validation;

use tracing::trace;

use crate::context::{ClassContext, DecorationTarget, PropertyContext};
use crate::decoration::{merge_imports, Decoration, ImportRequests};
use crate::graph::{TypeGraph, TypeId};

pub use api_docs::ApiDocumentationProvider;
pub use coercion::CoercionProvider;
pub use transform::TransformProvider;
pub use validation::ValidationProvider;

/// Engine capabilities exposed to providers.
pub trait RenderingUtilities {
    fn graph(&self) -> &TypeGraph;

    /// TypeScript type expression for a node, as the engine renders it.
    fn type_expression(&self, id: TypeId) -> String;

    /// Runtime class name for a class node. A constraint names its base
    /// class, since its own emitted name is a type alias.
    fn value_name(&self, id: TypeId) -> String;

    /// The enum named by the property's `enumHint`, if it resolves.
    fn enum_hint(&self, property: &PropertyContext<'_>) -> Option<TypeId>;
}

pub trait DecoratorProvider {
    /// Identifier used on the command line and in logs.
    fn name(&self) -> &'static str;

    fn class_decorations(
        &self,
        _ctx: &ClassContext<'_>,
        _utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        Vec::new()
    }

    fn property_decorations(
        &self,
        _ctx: &PropertyContext<'_>,
        _utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        Vec::new()
    }
}

/// Append a decoration named `name`, imported from `module`, unless the
/// target excludes that name or already declares it in the schema.
pub fn add_decoration(
    decorations: &mut Vec<Decoration>,
    target: &dyn DecorationTarget,
    name: &str,
    module: &str,
    source: impl Into<String>,
    extra_imports: Option<&ImportRequests>,
) {
    if !target.accepts(name) {
        trace!(decorator = name, "decoration excluded");
        return;
    }
    let mut decoration = Decoration::named(name, source).with_import(module, name);
    if let Some(extra) = extra_imports {
        merge_imports(&mut decoration.imports, extra);
    }
    decorations.push(decoration);
}

/// Built-in provider by its command-line name.
pub fn builtin(name: &str) -> Option<Box<dyn DecoratorProvider>> {
    match name {
        "validation" => Some(Box::new(ValidationProvider)),
        "transform" => Some(Box::new(TransformProvider)),
        "api-docs" => Some(Box::new(ApiDocumentationProvider)),
        "coercion" => Some(Box::new(CoercionProvider::default())),
        _ => None,
    }
}

/// Validation, transform and API documentation, in that order.
pub fn default_providers() -> Vec<Box<dyn DecoratorProvider>> {
    vec![
        Box::new(ValidationProvider),
        Box::new(TransformProvider),
        Box::new(ApiDocumentationProvider),
    ]
}

/// The class a property ultimately points at, looking through arrays.
pub(crate) fn nested_class(graph: &TypeGraph, id: TypeId) -> Option<(TypeId, bool)> {
    use crate::graph::TypeKind;
    match &graph.node(id).kind {
        TypeKind::Class(_) => Some((id, false)),
        TypeKind::Array { items } => {
            let (inner, _) = graph.nullable_view(*items);
            match graph.node(inner).kind {
                TypeKind::Class(_) => Some((inner, true)),
                _ => None,
            }
        }
        _ => None,
    }
}
