//! `class-transformer` hints so plain objects deserialize into nested
//! classes and dates.

use crate::context::PropertyContext;
use crate::decoration::Decoration;
use crate::graph::{PrimitiveKind, TypeKind};

use super::{add_decoration, nested_class, DecoratorProvider, RenderingUtilities};

const MODULE: &str = "class-transformer";

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformProvider;

impl DecoratorProvider for TransformProvider {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn property_decorations(
        &self,
        ctx: &PropertyContext<'_>,
        utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        let mut out = Vec::new();
        if ctx.attributes.type_override.is_some() {
            return out;
        }
        let graph = utils.graph();

        let target = match nested_class(graph, ctx.value_type) {
            Some((class_id, _)) => Some(utils.value_name(class_id)),
            None => match graph.node(ctx.value_type).kind {
                TypeKind::Primitive {
                    primitive: PrimitiveKind::Date | PrimitiveKind::DateTime,
                } => Some("Date".to_string()),
                _ => None,
            },
        };

        if let Some(target) = target {
            add_decoration(&mut out, ctx, "Type", MODULE, format!("@Type(() => {target})"), None);
        }
        out
    }
}
