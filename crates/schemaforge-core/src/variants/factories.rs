//! Test-object factories: `makeX(data = {})` per model class.

use tracing::warn;

use crate::config::FactoryOptions;
use crate::context::{ClassContext, PropertyContext};
use crate::engine::{RenderHooks, RenderPass, TypeNaming};
use crate::error::RenderError;
use crate::graph::{PrimitiveKind, TypeId, TypeKind};
use crate::naming::{enum_member_name, json_literal, property_key, string_literal};
use crate::providers::RenderingUtilities;

/// Sentinel default for shapes with no synthesis rule.
pub const UNKNOWN_DEFAULT: &str = "\"unknown\"";

/// Emits one factory function per model class.
///
/// Model names come from the upstream model registry; a class the model
/// pass never registered is a hard error.
#[derive(Debug, Clone, Default)]
pub struct FactoryHooks {
    pub options: FactoryOptions,
}

impl FactoryHooks {
    pub fn new(options: FactoryOptions) -> Self {
        Self { options }
    }
}

impl RenderHooks for FactoryHooks {
    fn type_naming(&self) -> TypeNaming {
        TypeNaming::Upstream
    }

    fn emits_enums(&self) -> bool {
        false
    }

    fn render_class<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<Option<String>, RenderError> {
        let target = pass.reference_type(ctx.id)?;
        // constraints are built through the base class constructor
        let constructed = match ctx.constraint_for {
            Some(base) => pass.reference_value(base.id)?,
            None => pass.reference_value(ctx.id)?,
        };

        let mut fields = Vec::new();
        for prop in ctx.merged_properties(pass.graph()) {
            if prop.optional() && prop.attributes.default_value.is_none() {
                continue;
            }
            let value = self.default_value(&prop, pass)?;
            fields.push(format!("{}: {value},", property_key(prop.name())));
        }

        let function = factory_name(&target);
        pass.begin_declaration();
        pass.writer
            .open(&format!("export function {function}(data: Partial<{target}> = {{}}): {target}"));
        pass.writer.line(&format!("return new {constructed}({{"));
        pass.writer.indent();
        for field in &fields {
            pass.writer.line(field);
        }
        pass.writer.line("...data,");
        pass.writer.dedent();
        if ctx.is_constraint() {
            pass.writer.line(&format!("}}) as {target};"));
        } else {
            pass.writer.line("});");
        }
        pass.writer.close();
        Ok(Some(function))
    }
}

impl FactoryHooks {
    /// Default for one property. Attribute defaults win, then constants,
    /// then synthesis by kind.
    fn default_value(
        &self,
        prop: &PropertyContext<'_>,
        pass: &mut RenderPass<'_>,
    ) -> Result<String, RenderError> {
        let graph = pass.graph();

        if let Some(value) = &prop.attributes.default_value {
            if let (Some(text), Some(e)) = (value.as_str(), graph.enumeration(prop.value_type)) {
                if e.cases.iter().any(|c| c == text) {
                    let name = pass.reference_value(prop.value_type)?;
                    return Ok(format!("{name}.{}", enum_member_name(text)));
                }
            }
            return Ok(json_literal(value));
        }

        if prop.attributes.type_override.is_some() {
            warn!(property = %prop.location(), "no default for an overridden type");
            return Ok(UNKNOWN_DEFAULT.to_string());
        }

        if let Some(value) = prop.constant_value(graph) {
            if let Some(base_enum) = pass.base_enum(prop) {
                let name = pass.reference_value(base_enum)?;
                return Ok(format!("{name}.{}", enum_member_name(value)));
            }
            return Ok(string_literal(value));
        }

        if prop.nullable && graph.class(prop.value_type).is_some() {
            return Ok("null".to_string());
        }

        if let TypeKind::Primitive {
            primitive: PrimitiveKind::String,
        } = graph.node(prop.value_type).kind
        {
            if let Some(hint) = pass.enum_hint(prop) {
                if let Some(first) = graph.enumeration(hint).and_then(|e| e.cases.first()) {
                    return Ok(string_literal(first));
                }
            }
        }

        self.synthesize(prop.value_type, &prop.location(), pass)
    }

    /// Structural default for a type.
    pub fn synthesize(
        &self,
        id: TypeId,
        location: &str,
        pass: &mut RenderPass<'_>,
    ) -> Result<String, RenderError> {
        let graph = pass.graph();
        let node = graph.node(id);
        if node.attributes.as_ref().is_some_and(|a| a.type_override.is_some()) {
            warn!(property = location, "no default for an overridden type");
            return Ok(UNKNOWN_DEFAULT.to_string());
        }

        Ok(match &node.kind {
            TypeKind::Primitive { primitive } => match primitive {
                PrimitiveKind::String => "\"string\"".to_string(),
                PrimitiveKind::Integer => "0".to_string(),
                PrimitiveKind::Double => "0.0".to_string(),
                PrimitiveKind::Boolean => "false".to_string(),
                PrimitiveKind::Date | PrimitiveKind::DateTime => "new Date()".to_string(),
                PrimitiveKind::Uuid => {
                    pass.imports.add_value(&self.options.uuid_module, "randomUUID");
                    "randomUUID()".to_string()
                }
            },
            TypeKind::Array { .. } => "[]".to_string(),
            TypeKind::Map { .. } => "{}".to_string(),
            TypeKind::Class(_) => {
                let entry = pass.lookup(id)?.clone();
                format!("{}()", factory_name(&entry.name))
            }
            TypeKind::Enum(e) => {
                let name = pass.reference_value(id)?;
                match e.cases.first() {
                    Some(first) => format!("{name}.{}", enum_member_name(first)),
                    None => UNKNOWN_DEFAULT.to_string(),
                }
            }
            TypeKind::Union { .. } => match graph.non_null_members(id).first() {
                Some(first) => self.synthesize(*first, location, pass)?,
                None => "null".to_string(),
            },
            TypeKind::Null => "null".to_string(),
            TypeKind::Any => {
                warn!(property = location, "no default for an unconstrained type");
                UNKNOWN_DEFAULT.to_string()
            }
        })
    }
}

/// `Car` becomes `makeCar`.
pub fn factory_name(model: &str) -> String {
    format!("make{model}")
}
