//! Model classes: decorated data classes plus constraint intersections.

use tracing::debug;

use crate::context::ClassContext;
use crate::engine::{RenderHooks, RenderPass};
use crate::error::RenderError;

/// Renders one decorated class per graph class and one enum per declared
/// enum.
///
/// A constraint class `XConstraint` refining `Base` is emitted as the class
/// itself followed by `export type X = Base & XConstraint;`, and `X` is what
/// gets registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelClassHooks;

impl RenderHooks for ModelClassHooks {
    fn render_class<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<Option<String>, RenderError> {
        let Some(base) = ctx.constraint_for else {
            pass.emit_class_declaration(ctx, ctx.name());
            return Ok(Some(ctx.name().to_string()));
        };

        let (class_name, intersection) = pass.constraint_names(ctx);
        check_intersection_name(ctx, pass, &class_name, &intersection)?;

        pass.emit_class_declaration(ctx, &class_name);
        let base_name = pass.local_name(base.id);
        pass.writer.blank();
        pass.writer.line(&format!(
            "export type {intersection} = {base_name} & {class_name};"
        ));
        debug!(constraint = %class_name, base = %base_name, "constraint intersection emitted");
        Ok(Some(intersection))
    }
}

/// The intersection must not shadow the base class or any other declared
/// type.
fn check_intersection_name(
    ctx: &ClassContext<'_>,
    pass: &RenderPass<'_>,
    class_name: &str,
    intersection: &str,
) -> Result<(), RenderError> {
    let graph = pass.graph();
    let collides = graph.iter().any(|(id, node)| {
        if id == ctx.id || node.attributes.as_ref().is_some_and(|a| a.type_override.is_some()) {
            return false;
        }
        let declared = match (graph.class(id), graph.enumeration(id)) {
            (Some(c), _) => Some(c.name.as_str()),
            (_, Some(e)) => Some(e.name.as_str()),
            _ => None,
        };
        declared.is_some_and(|name| name == intersection || name == class_name)
    });
    if collides {
        return Err(RenderError::NameCollision {
            reference: ctx.location(),
            name: intersection.to_string(),
        });
    }
    Ok(())
}
