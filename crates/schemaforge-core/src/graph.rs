//! The resolved type graph consumed by every render pass.
//!
//! The graph is produced by an external JSON-Schema compiler: `$ref`,
//! `oneOf` and `allOf` are already resolved into a flat list of nodes. A
//! node's identity is its position in that list, and the list order is the
//! discovery order the engine walks.
//!
//! ## Serialized shape
//!
//! ```json
//! { "types": [
//!     { "kind": "primitive", "primitive": "string" },
//!     { "kind": "class", "name": "Car", "source": "file:///car.json",
//!       "properties": [ { "name": "plate", "type": 0 } ] }
//! ] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{ObjectAttributes, PropertyAttributes};
use crate::error::GraphError;

// ---------------------------------------------------------------------------
// Node identity and kinds
// ---------------------------------------------------------------------------

/// Index of a node in the [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub usize);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Leaf value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    DateTime,
    Uuid,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::String,
        PrimitiveKind::Integer,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
        PrimitiveKind::Date,
        PrimitiveKind::DateTime,
        PrimitiveKind::Uuid,
    ];

    /// The TypeScript type a value of this kind is declared with.
    pub fn type_expression(self) -> &'static str {
        match self {
            PrimitiveKind::String | PrimitiveKind::Uuid => "string",
            PrimitiveKind::Integer | PrimitiveKind::Double => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Date | PrimitiveKind::DateTime => "Date",
        }
    }
}

/// A class property, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: TypeId,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PropertyAttributes>,
}

impl Property {
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            optional: false,
            description: None,
            attributes: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attributes(mut self, attributes: PropertyAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl ClassType {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub cases: Vec<String>,
}

/// The structural kind of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeKind {
    Class(ClassType),
    Enum(EnumType),
    Union { members: Vec<TypeId> },
    Array { items: TypeId },
    Map { values: TypeId },
    Primitive { primitive: PrimitiveKind },
    Null,
    Any,
}

/// A node of the graph plus its side-channel metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Source schema location, `uri[#fragment]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ObjectAttributes>,
}

impl TypeNode {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            source: None,
            description: None,
            attributes: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attributes(mut self, attributes: ObjectAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A validated, read-only type graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeGraph {
    types: Vec<TypeNode>,
}

#[derive(Deserialize)]
struct RawGraph {
    types: Vec<TypeNode>,
}

impl<'de> Deserialize<'de> for TypeGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawGraph::deserialize(deserializer)?;
        TypeGraph::new(raw.types).map_err(serde::de::Error::custom)
    }
}

impl TypeGraph {
    /// Validate and wrap a node list.
    pub fn new(types: Vec<TypeNode>) -> Result<Self, GraphError> {
        let graph = Self { types };
        graph.validate()?;
        Ok(graph)
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let raw: RawGraph = serde_json::from_str(json)?;
        Self::new(raw.types)
    }

    pub fn from_value(value: Value) -> Result<Self, GraphError> {
        let raw: RawGraph = serde_json::from_value(value)?;
        Self::new(raw.types)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Node lookup. Ids handed out by this graph are always in range.
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    /// Nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.types.iter().enumerate().map(|(i, n)| (TypeId(i), n))
    }

    pub fn class(&self, id: TypeId) -> Option<&ClassType> {
        match &self.node(id).kind {
            TypeKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn enumeration(&self, id: TypeId) -> Option<&EnumType> {
        match &self.node(id).kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Exact lookup of a node by its source location.
    pub fn find_by_source(&self, source: &str) -> Option<TypeId> {
        self.iter()
            .find(|(_, n)| n.source.as_deref() == Some(source))
            .map(|(id, _)| id)
    }

    pub fn is_null(&self, id: TypeId) -> bool {
        matches!(self.node(id).kind, TypeKind::Null)
    }

    /// Split a type into its non-null view and a nullable flag.
    ///
    /// A union with exactly one non-null member collapses to that member.
    /// Larger unions keep their own id; [`TypeGraph::non_null_members`]
    /// lists what remains.
    pub fn nullable_view(&self, id: TypeId) -> (TypeId, bool) {
        match &self.node(id).kind {
            TypeKind::Union { members } => {
                let nullable = members.iter().any(|m| self.is_null(*m));
                let rest: Vec<TypeId> = members
                    .iter()
                    .copied()
                    .filter(|m| !self.is_null(*m))
                    .collect();
                match rest.as_slice() {
                    [single] => (*single, nullable),
                    _ => (id, nullable),
                }
            }
            TypeKind::Null => (id, true),
            _ => (id, false),
        }
    }

    /// Members of a union without `null`; a non-union yields itself.
    pub fn non_null_members(&self, id: TypeId) -> Vec<TypeId> {
        match &self.node(id).kind {
            TypeKind::Union { members } => members
                .iter()
                .copied()
                .filter(|m| !self.is_null(*m))
                .collect(),
            TypeKind::Null => Vec::new(),
            _ => vec![id],
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    fn validate(&self) -> Result<(), GraphError> {
        for (id, node) in self.iter() {
            match &node.kind {
                TypeKind::Class(class) => {
                    for prop in &class.properties {
                        if prop.name.is_empty() {
                            return Err(GraphError::EmptyPropertyName {
                                name: class.name.clone(),
                            });
                        }
                        self.check_ref(id, prop.type_id)?;
                    }
                }
                TypeKind::Enum(e) => {
                    if e.cases.is_empty() {
                        return Err(GraphError::EmptyEnum {
                            name: e.name.clone(),
                        });
                    }
                }
                TypeKind::Union { members } => {
                    if members.is_empty() {
                        return Err(GraphError::EmptyUnion { id });
                    }
                    for member in members {
                        self.check_ref(id, *member)?;
                    }
                }
                TypeKind::Array { items } => self.check_ref(id, *items)?,
                TypeKind::Map { values } => self.check_ref(id, *values)?,
                TypeKind::Primitive { .. } | TypeKind::Null | TypeKind::Any => {}
            }

            if let Some(attrs) = &node.attributes {
                if let Some(base) = attrs.constraint_for {
                    self.check_class_ref(id, "constraintFor", base)?;
                }
                for from in attrs.entity_mutation_from.iter().flatten().flatten() {
                    self.check_class_ref(id, "entityMutationFrom", *from)?;
                }
            }
        }
        Ok(())
    }

    fn check_ref(&self, from: TypeId, target: TypeId) -> Result<(), GraphError> {
        if target.0 < self.types.len() {
            Ok(())
        } else {
            Err(GraphError::DanglingReference { from, target })
        }
    }

    fn check_class_ref(
        &self,
        id: TypeId,
        attribute: &'static str,
        target: TypeId,
    ) -> Result<(), GraphError> {
        self.check_ref(id, target)?;
        if self.class(target).is_none() {
            return Err(GraphError::NotAClass {
                id,
                attribute,
                target,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Programmatic graph construction.
///
/// ```
/// use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property};
///
/// let mut b = GraphBuilder::new();
/// let string = b.primitive(PrimitiveKind::String);
/// b.class("Car", Some("file:///car.json"), vec![Property::new("plate", string)]);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    types: Vec<TypeNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next added node will receive (for self references).
    pub fn next_id(&self) -> TypeId {
        TypeId(self.types.len())
    }

    pub fn add(&mut self, node: TypeNode) -> TypeId {
        let id = self.next_id();
        self.types.push(node);
        id
    }

    /// Primitive nodes are shared.
    pub fn primitive(&mut self, primitive: PrimitiveKind) -> TypeId {
        let kind = TypeKind::Primitive { primitive };
        self.shared(kind)
    }

    pub fn null(&mut self) -> TypeId {
        self.shared(TypeKind::Null)
    }

    pub fn any(&mut self) -> TypeId {
        self.shared(TypeKind::Any)
    }

    pub fn array(&mut self, items: TypeId) -> TypeId {
        self.add(TypeNode::new(TypeKind::Array { items }))
    }

    pub fn map(&mut self, values: TypeId) -> TypeId {
        self.add(TypeNode::new(TypeKind::Map { values }))
    }

    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        self.add(TypeNode::new(TypeKind::Union { members }))
    }

    /// `inner | null`.
    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        let null = self.null();
        self.union(vec![inner, null])
    }

    pub fn enumeration(&mut self, name: &str, cases: &[&str], source: Option<&str>) -> TypeId {
        let mut node = TypeNode::new(TypeKind::Enum(EnumType {
            name: name.to_string(),
            cases: cases.iter().map(|c| c.to_string()).collect(),
        }));
        node.source = source.map(str::to_string);
        self.add(node)
    }

    pub fn class(&mut self, name: &str, source: Option<&str>, properties: Vec<Property>) -> TypeId {
        let mut node = TypeNode::new(TypeKind::Class(ClassType {
            name: name.to_string(),
            properties,
        }));
        node.source = source.map(str::to_string);
        self.add(node)
    }

    /// Mutable access to a node added earlier, e.g. to attach attributes.
    pub fn node_mut(&mut self, id: TypeId) -> Option<&mut TypeNode> {
        self.types.get_mut(id.0)
    }

    /// Attributes of a node, created on first access.
    pub fn attributes(&mut self, id: TypeId) -> Option<&mut ObjectAttributes> {
        self.node_mut(id)
            .map(|n| n.attributes.get_or_insert_with(ObjectAttributes::default))
    }

    pub fn build(self) -> Result<TypeGraph, GraphError> {
        TypeGraph::new(self.types)
    }

    fn shared(&mut self, kind: TypeKind) -> TypeId {
        if let Some(pos) = self
            .types
            .iter()
            .position(|n| n.kind == kind && n.source.is_none() && n.attributes.is_none())
        {
            return TypeId(pos);
        }
        self.add(TypeNode::new(kind))
    }
}
