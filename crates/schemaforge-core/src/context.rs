//! Transient per-node views built fresh on every visit.
//!
//! A context joins a graph node with its resolved attributes. For constraint
//! classes the base class is resolved once here and reused by every hook
//! that needs it.

use std::collections::BTreeSet;

use crate::attributes::{
    ObjectAttributes, PropertyAttributes, EMPTY_OBJECT_ATTRIBUTES, EMPTY_PROPERTY_ATTRIBUTES,
};
use crate::decoration::Decoration;
use crate::graph::{ClassType, EnumType, Property, TypeGraph, TypeId, TypeNode};

/// Anything decorations can be attached to.
pub trait DecorationTarget {
    fn excluded_decorators(&self) -> &BTreeSet<String>;

    /// Decorations declared in the schema itself.
    fn source_decorations(&self) -> &[Decoration];

    /// Whether a provider may contribute a decoration named `name`.
    fn accepts(&self, name: &str) -> bool {
        !self.excluded_decorators().contains(name)
            && !self
                .source_decorations()
                .iter()
                .any(|d| d.name.as_deref() == Some(name))
    }
}

/// The class a constraint refines.
#[derive(Debug, Clone, Copy)]
pub struct BaseClass<'g> {
    pub id: TypeId,
    pub node: &'g TypeNode,
    pub class: &'g ClassType,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassContext<'g> {
    pub id: TypeId,
    pub node: &'g TypeNode,
    pub class: &'g ClassType,
    pub attributes: &'g ObjectAttributes,
    pub constraint_for: Option<BaseClass<'g>>,
}

impl<'g> ClassContext<'g> {
    /// `None` when `id` is not a class.
    pub fn new(graph: &'g TypeGraph, id: TypeId) -> Option<Self> {
        let node = graph.node(id);
        let class = graph.class(id)?;
        let attributes = node.attributes.as_ref().unwrap_or(&EMPTY_OBJECT_ATTRIBUTES);
        let constraint_for = attributes.constraint_for.and_then(|base_id| {
            graph.class(base_id).map(|class| BaseClass {
                id: base_id,
                node: graph.node(base_id),
                class,
            })
        });
        Some(Self {
            id,
            node,
            class,
            attributes,
            constraint_for,
        })
    }

    pub fn name(&self) -> &'g str {
        &self.class.name
    }

    pub fn source(&self) -> Option<&'g str> {
        self.node.source.as_deref()
    }

    pub fn is_constraint(&self) -> bool {
        self.constraint_for.is_some()
    }

    /// Human-readable location for log and error messages.
    pub fn location(&self) -> String {
        match self.source() {
            Some(source) => source.to_string(),
            None => format!("class {} ({})", self.name(), self.id),
        }
    }

    /// Property contexts in declaration order.
    pub fn properties(&self, graph: &'g TypeGraph) -> Vec<PropertyContext<'g>> {
        self.class
            .properties
            .iter()
            .map(|p| PropertyContext::new(graph, *self, p))
            .collect()
    }

    /// For a constraint: the base properties it does not redeclare, then its
    /// own. For any other class: its own properties.
    pub fn merged_properties(&self, graph: &'g TypeGraph) -> Vec<PropertyContext<'g>> {
        let Some(base) = self.constraint_for else {
            return self.properties(graph);
        };
        let Some(base_ctx) = ClassContext::new(graph, base.id) else {
            return self.properties(graph);
        };

        let mut merged: Vec<PropertyContext<'g>> = base
            .class
            .properties
            .iter()
            .filter(|p| self.class.property(&p.name).is_none())
            .map(|p| PropertyContext::new(graph, base_ctx, p))
            .collect();
        merged.extend(self.properties(graph));

        // keep the base declaration order for redeclared properties
        let position = |name: &str| {
            base.class
                .properties
                .iter()
                .position(|p| p.name == name)
                .unwrap_or(usize::MAX)
        };
        merged.sort_by_key(|p| position(p.name()));
        merged
    }
}

impl DecorationTarget for ClassContext<'_> {
    fn excluded_decorators(&self) -> &BTreeSet<String> {
        &self.attributes.excluded_decorators
    }

    fn source_decorations(&self) -> &[Decoration] {
        &self.attributes.decorators
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyContext<'g> {
    pub class: ClassContext<'g>,
    pub property: &'g Property,
    pub attributes: &'g PropertyAttributes,
    /// The property type without `null`.
    pub value_type: TypeId,
    pub nullable: bool,
    /// Same-named property of the base class, for constraint classes.
    pub base_property: Option<&'g Property>,
}

impl<'g> PropertyContext<'g> {
    pub fn new(graph: &'g TypeGraph, class: ClassContext<'g>, property: &'g Property) -> Self {
        let (value_type, nullable) = graph.nullable_view(property.type_id);
        let base_property = class
            .constraint_for
            .and_then(|base| base.class.property(&property.name));
        Self {
            class,
            property,
            attributes: property
                .attributes
                .as_ref()
                .unwrap_or(&EMPTY_PROPERTY_ATTRIBUTES),
            value_type,
            nullable,
            base_property,
        }
    }

    pub fn name(&self) -> &'g str {
        &self.property.name
    }

    pub fn optional(&self) -> bool {
        self.property.optional
    }

    pub fn is_constant(&self) -> bool {
        self.attributes.is_constant
    }

    /// The single value of a constant property whose type is a one-case enum.
    pub fn constant_value(&self, graph: &'g TypeGraph) -> Option<&'g str> {
        if !self.is_constant() {
            return None;
        }
        match graph.enumeration(self.value_type) {
            Some(EnumType { cases, .. }) if cases.len() == 1 => Some(cases[0].as_str()),
            _ => None,
        }
    }

    pub fn location(&self) -> String {
        format!("{}/properties/{}", self.class.location(), self.name())
    }
}

impl DecorationTarget for PropertyContext<'_> {
    fn excluded_decorators(&self) -> &BTreeSet<String> {
        &self.attributes.excluded_decorators
    }

    fn source_decorations(&self) -> &[Decoration] {
        &self.attributes.decorators
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnumContext<'g> {
    pub id: TypeId,
    pub node: &'g TypeNode,
    pub enumeration: &'g EnumType,
}

impl<'g> EnumContext<'g> {
    pub fn new(graph: &'g TypeGraph, id: TypeId) -> Option<Self> {
        Some(Self {
            id,
            node: graph.node(id),
            enumeration: graph.enumeration(id)?,
        })
    }

    pub fn name(&self) -> &'g str {
        &self.enumeration.name
    }
}
