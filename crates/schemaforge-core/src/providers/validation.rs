//! `class-validator` decorations derived from property types.

use crate::context::PropertyContext;
use crate::decoration::Decoration;
use crate::graph::{PrimitiveKind, TypeKind};
use crate::naming::string_literal;

use super::{add_decoration, nested_class, DecoratorProvider, RenderingUtilities};

const MODULE: &str = "class-validator";

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationProvider;

impl DecoratorProvider for ValidationProvider {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn property_decorations(
        &self,
        ctx: &PropertyContext<'_>,
        utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        let graph = utils.graph();
        let mut out = Vec::new();

        if ctx.optional() {
            add_decoration(&mut out, ctx, "IsOptional", MODULE, "@IsOptional()", None);
        } else if ctx.nullable {
            add_decoration(
                &mut out,
                ctx,
                "ValidateIf",
                MODULE,
                "@ValidateIf((_, value) => value !== null)",
                None,
            );
        }

        if ctx.attributes.type_override.is_some() {
            return out;
        }

        if let Some(value) = ctx.constant_value(graph) {
            add_decoration(
                &mut out,
                ctx,
                "IsIn",
                MODULE,
                format!("@IsIn([{}])", string_literal(value)),
                None,
            );
            return out;
        }

        match &graph.node(ctx.value_type).kind {
            TypeKind::Primitive { primitive } => {
                let (name, source) = match primitive {
                    PrimitiveKind::String => ("IsString", "@IsString()"),
                    PrimitiveKind::Uuid => ("IsUUID", "@IsUUID()"),
                    PrimitiveKind::Integer => ("IsInt", "@IsInt()"),
                    PrimitiveKind::Double => ("IsNumber", "@IsNumber()"),
                    PrimitiveKind::Boolean => ("IsBoolean", "@IsBoolean()"),
                    PrimitiveKind::Date | PrimitiveKind::DateTime => ("IsDate", "@IsDate()"),
                };
                add_decoration(&mut out, ctx, name, MODULE, source, None);
            }
            TypeKind::Enum(_) => {
                let name = utils.type_expression(ctx.value_type);
                add_decoration(&mut out, ctx, "IsEnum", MODULE, format!("@IsEnum({name})"), None);
            }
            TypeKind::Class(_) => {
                add_decoration(&mut out, ctx, "ValidateNested", MODULE, "@ValidateNested()", None);
            }
            TypeKind::Array { .. } => {
                add_decoration(&mut out, ctx, "IsArray", MODULE, "@IsArray()", None);
                if let Some((_, true)) = nested_class(graph, ctx.value_type) {
                    add_decoration(
                        &mut out,
                        ctx,
                        "ValidateNested",
                        MODULE,
                        "@ValidateNested({ each: true })",
                        None,
                    );
                }
            }
            TypeKind::Map { .. } => {
                add_decoration(&mut out, ctx, "IsObject", MODULE, "@IsObject()", None);
            }
            TypeKind::Union { .. } | TypeKind::Null | TypeKind::Any => {}
        }

        out
    }
}
