//! Schema attributes: the semantic side-channel attached to graph nodes.
//!
//! Attributes come from a vendor extension namespace in the source schemas.
//! Every field is optional; an absent attribute means "defer to structural
//! inference from the type graph".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decoration::Decoration;
use crate::graph::TypeId;

/// Class- (and enum-) level attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectAttributes {
    /// Decorator names providers must not contribute.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_decorators: BTreeSet<String>,
    /// Decorations declared directly in the schema.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<Decoration>,
    /// Replaces every reference to this class with the given type text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_override: Option<String>,
    /// The base class this class refines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_for: Option<TypeId>,
    /// Designates the class as a persisted entity.
    pub entity_event: bool,
    /// States an entity may be mutated from; `None` entries are the
    /// "no prior state" sentinel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_mutation_from: Option<Vec<Option<TypeId>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_property_changes: Option<PropertyChanges>,
    pub open_api_enabled: bool,
}

/// Property-level attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyAttributes {
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_decorators: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<Decoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// URI of an enum whose values the property may take, in addition to
    /// its declared type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_hint: Option<String>,
    /// The property carries a single `const` value.
    pub is_constant: bool,
}

pub(crate) static EMPTY_OBJECT_ATTRIBUTES: ObjectAttributes = ObjectAttributes {
    excluded_decorators: BTreeSet::new(),
    decorators: Vec::new(),
    type_override: None,
    constraint_for: None,
    entity_event: false,
    entity_mutation_from: None,
    entity_property_changes: None,
    open_api_enabled: false,
};

pub(crate) static EMPTY_PROPERTY_ATTRIBUTES: PropertyAttributes = PropertyAttributes {
    excluded_decorators: BTreeSet::new(),
    decorators: Vec::new(),
    type_override: None,
    default_value: None,
    enum_hint: None,
    is_constant: false,
};

// ---------------------------------------------------------------------------
// Property changes
// ---------------------------------------------------------------------------

/// Which properties a mutation may change: `"*"` or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPropertyChanges", into = "RawPropertyChanges")]
pub enum PropertyChanges {
    All,
    Only(BTreeSet<String>),
}

impl PropertyChanges {
    pub fn allows(&self, property: &str) -> bool {
        match self {
            PropertyChanges::All => true,
            PropertyChanges::Only(names) => names.contains(property),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPropertyChanges {
    Wildcard(String),
    Names(BTreeSet<String>),
}

impl TryFrom<RawPropertyChanges> for PropertyChanges {
    type Error = String;

    fn try_from(raw: RawPropertyChanges) -> Result<Self, Self::Error> {
        match raw {
            RawPropertyChanges::Wildcard(w) if w == "*" => Ok(PropertyChanges::All),
            RawPropertyChanges::Wildcard(other) => Err(format!(
                "entityPropertyChanges must be \"*\" or a list of names, got \"{other}\""
            )),
            RawPropertyChanges::Names(names) => Ok(PropertyChanges::Only(names)),
        }
    }
}

impl From<PropertyChanges> for RawPropertyChanges {
    fn from(changes: PropertyChanges) -> Self {
        match changes {
            PropertyChanges::All => RawPropertyChanges::Wildcard("*".to_string()),
            PropertyChanges::Only(names) => RawPropertyChanges::Names(names),
        }
    }
}
