//! Which enums get a standalone declaration.
//!
//! A single-case enum that only ever carries a constant is rendered as a
//! literal on the property instead. Everything else is declared.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use url::Url;

use crate::attributes::EMPTY_PROPERTY_ATTRIBUTES;
use crate::graph::{TypeGraph, TypeId, TypeKind};

#[derive(Debug, Default, Clone, Copy)]
struct Usage {
    direct: usize,
    constant: usize,
    indirect: bool,
}

/// Enums that are referenced only by constant properties.
///
/// An enum is kept when it carries its own attributes, when nothing
/// references it, or when anything reaches it other than a class property
/// typed as the enum (optionally wrapped in `| null`): union members, array
/// items, map values and enum hints all count as indirect use.
pub fn suppressed_enums(graph: &TypeGraph) -> BTreeSet<TypeId> {
    let mut usage: BTreeMap<TypeId, Usage> = graph
        .iter()
        .filter(|(_, n)| matches!(n.kind, TypeKind::Enum(_)))
        .map(|(id, _)| (id, Usage::default()))
        .collect();

    let mut mark_indirect = |usage: &mut BTreeMap<TypeId, Usage>, id: TypeId| {
        let (inner, _) = graph.nullable_view(id);
        if let Some(u) = usage.get_mut(&inner) {
            u.indirect = true;
        }
    };

    for (_, node) in graph.iter() {
        match &node.kind {
            TypeKind::Class(class) => {
                for prop in &class.properties {
                    let attrs = prop.attributes.as_ref().unwrap_or(&EMPTY_PROPERTY_ATTRIBUTES);
                    let (inner, _) = graph.nullable_view(prop.type_id);
                    if let Some(u) = usage.get_mut(&inner) {
                        u.direct += 1;
                        if attrs.is_constant {
                            u.constant += 1;
                        }
                    }
                    if let Some(hint) = &attrs.enum_hint {
                        if let Some(target) = resolve_enum_hint(graph, node.source.as_deref(), hint)
                        {
                            mark_indirect(&mut usage, target);
                        }
                    }
                }
            }
            TypeKind::Union { members } => {
                let rest: Vec<TypeId> = members
                    .iter()
                    .copied()
                    .filter(|m| !graph.is_null(*m))
                    .collect();
                if rest.len() > 1 {
                    for member in rest {
                        mark_indirect(&mut usage, member);
                    }
                }
            }
            TypeKind::Array { items } => mark_indirect(&mut usage, *items),
            TypeKind::Map { values } => mark_indirect(&mut usage, *values),
            _ => {}
        }
    }

    usage
        .into_iter()
        .filter(|(id, u)| {
            // only single-case enums collapse to a literal
            let single_case = graph.enumeration(*id).is_some_and(|e| e.cases.len() == 1);
            let suppress = single_case
                && graph.node(*id).attributes.is_none()
                && !u.indirect
                && u.direct > 0
                && u.constant == u.direct;
            if suppress {
                debug!(enum_id = %id, "enum only carries constants; not declared");
            }
            suppress
        })
        .map(|(id, _)| id)
        .collect()
}

/// Resolve an `enumHint` URI against the owning class's source location.
///
/// Relative hints are joined onto the class source; the raw hint is tried
/// as a fallback. Only enum nodes resolve.
pub fn resolve_enum_hint(graph: &TypeGraph, base: Option<&str>, hint: &str) -> Option<TypeId> {
    let joined = base
        .and_then(|b| Url::parse(b).ok())
        .and_then(|b| b.join(hint).ok())
        .map(|u| u.to_string());

    joined
        .as_deref()
        .and_then(|j| graph.find_by_source(j))
        .or_else(|| graph.find_by_source(hint))
        .filter(|id| graph.enumeration(*id).is_some())
}
