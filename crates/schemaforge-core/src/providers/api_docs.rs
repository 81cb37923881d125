//! `@nestjs/swagger` property documentation for classes that opt in with
//! `openApiEnabled`.

use crate::context::PropertyContext;
use crate::decoration::Decoration;
use crate::graph::{PrimitiveKind, TypeKind};
use crate::naming::{json_literal, string_literal};

use super::{add_decoration, nested_class, DecoratorProvider, RenderingUtilities};

const MODULE: &str = "@nestjs/swagger";

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiDocumentationProvider;

impl DecoratorProvider for ApiDocumentationProvider {
    fn name(&self) -> &'static str {
        "api-docs"
    }

    fn property_decorations(
        &self,
        ctx: &PropertyContext<'_>,
        utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        let mut out = Vec::new();
        if !ctx.class.attributes.open_api_enabled {
            return out;
        }

        let options = api_property_options(ctx, utils);
        let name = if ctx.optional() {
            "ApiPropertyOptional"
        } else {
            "ApiProperty"
        };
        let source = if options.is_empty() {
            format!("@{name}()")
        } else {
            format!("@{name}({{ {} }})", options.join(", "))
        };
        add_decoration(&mut out, ctx, name, MODULE, source, None);
        out
    }
}

fn api_property_options(ctx: &PropertyContext<'_>, utils: &dyn RenderingUtilities) -> Vec<String> {
    let graph = utils.graph();
    let mut options = Vec::new();

    if let Some(description) = &ctx.property.description {
        options.push(format!("description: {}", string_literal(description)));
    }

    if ctx.attributes.type_override.is_none() {
        if let Some(value) = ctx.constant_value(graph) {
            options.push(format!("enum: [{}]", string_literal(value)));
        } else if let Some((class_id, is_array)) = nested_class(graph, ctx.value_type) {
            options.push(format!("type: () => {}", utils.value_name(class_id)));
            if is_array {
                options.push("isArray: true".to_string());
            }
        } else {
            match &graph.node(ctx.value_type).kind {
                TypeKind::Primitive { primitive } => {
                    let ty = match primitive {
                        PrimitiveKind::String | PrimitiveKind::Uuid => "String",
                        PrimitiveKind::Integer => "\"integer\"",
                        PrimitiveKind::Double => "Number",
                        PrimitiveKind::Boolean => "Boolean",
                        PrimitiveKind::Date | PrimitiveKind::DateTime => "Date",
                    };
                    options.push(format!("type: {ty}"));
                    if *primitive == PrimitiveKind::Uuid {
                        options.push("format: \"uuid\"".to_string());
                    }
                }
                TypeKind::Enum(_) => {
                    options.push(format!("enum: {}", utils.type_expression(ctx.value_type)));
                }
                TypeKind::Array { .. } => options.push("isArray: true".to_string()),
                TypeKind::Map { .. } => options.push("type: \"object\"".to_string()),
                TypeKind::Class(_) | TypeKind::Union { .. } | TypeKind::Null | TypeKind::Any => {}
            }
        }
    }

    if ctx.nullable {
        options.push("nullable: true".to_string());
    }
    if let Some(default) = &ctx.attributes.default_value {
        options.push(format!("default: {}", json_literal(default)));
    }
    options
}
