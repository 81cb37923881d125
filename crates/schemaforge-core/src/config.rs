//! Configuration for render passes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rendering policy shared by every graph-based pass.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `readonly-properties`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderOptions {
    /// File the pass output is written to. Required; registry entries and
    /// relative imports are computed from it.
    pub output_file: Option<PathBuf>,
    /// Append `!` to required properties without a default value.
    pub non_null_assertion_on_properties: bool,
    /// Prefix every property with `readonly`.
    pub readonly_properties: bool,
    /// Emit `constructor(init) { Object.assign(this, init); }`.
    pub assign_constructor: bool,
    /// Emitted as a comment at the top of the file.
    pub leading_comment: Option<String>,
    /// Suffix stripped from constraint class names to name the intersection.
    pub constraint_suffix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            output_file: None,
            non_null_assertion_on_properties: true,
            readonly_properties: true,
            assign_constructor: true,
            leading_comment: None,
            constraint_suffix: "Constraint".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn with_output_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(file.into());
        self
    }
}

/// A topic and the schema of the events published to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventTopic {
    pub topic: String,
    /// Source location of the payload class.
    pub schema: String,
}

/// Options for the test-expectation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExpectationOptions {
    /// Globs matched against class source locations to find entities.
    pub entity_globs: Vec<String>,
    pub event_topics: Vec<EventTopic>,
    /// Module providing `anyOf` and the fixture types.
    pub testing_module: String,
    /// Module providing `expect`.
    pub matchers_module: String,
}

impl Default for ExpectationOptions {
    fn default() -> Self {
        Self {
            entity_globs: Vec::new(),
            event_topics: Vec::new(),
            testing_module: "@schemaforge/testing".to_string(),
            matchers_module: "@jest/globals".to_string(),
        }
    }
}

/// Options for the test-object-factory pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FactoryOptions {
    /// Module providing `randomUUID`.
    pub uuid_module: String,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            uuid_module: "crypto".to_string(),
        }
    }
}
