//! Coerce string input (query strings, headers, env) into primitives.
//!
//! The conversion helpers live in a runtime module of the consumer's
//! choosing; only their names are fixed.

use crate::context::PropertyContext;
use crate::decoration::{Decoration, ImportRequests};
use crate::graph::{PrimitiveKind, TypeKind};

use super::{add_decoration, DecoratorProvider, RenderingUtilities};

const MODULE: &str = "class-transformer";

#[derive(Debug, Clone)]
pub struct CoercionProvider {
    pub helper_module: String,
}

impl Default for CoercionProvider {
    fn default() -> Self {
        Self {
            helper_module: "@schemaforge/coercion".to_string(),
        }
    }
}

impl CoercionProvider {
    pub fn new(helper_module: impl Into<String>) -> Self {
        Self {
            helper_module: helper_module.into(),
        }
    }
}

impl DecoratorProvider for CoercionProvider {
    fn name(&self) -> &'static str {
        "coercion"
    }

    fn property_decorations(
        &self,
        ctx: &PropertyContext<'_>,
        utils: &dyn RenderingUtilities,
    ) -> Vec<Decoration> {
        let mut out = Vec::new();
        if ctx.attributes.type_override.is_some() || ctx.is_constant() {
            return out;
        }

        let helper = match utils.graph().node(ctx.value_type).kind {
            TypeKind::Primitive {
                primitive: PrimitiveKind::Integer | PrimitiveKind::Double,
            } => "toNumber",
            TypeKind::Primitive {
                primitive: PrimitiveKind::Boolean,
            } => "toBoolean",
            TypeKind::Primitive {
                primitive: PrimitiveKind::Date | PrimitiveKind::DateTime,
            } => "toDate",
            _ => return out,
        };

        let extra: ImportRequests = Decoration::new("")
            .with_import(self.helper_module.as_str(), helper)
            .imports;
        add_decoration(
            &mut out,
            ctx,
            "Transform",
            MODULE,
            format!("@Transform({helper})"),
            Some(&extra),
        );
        out
    }
}
