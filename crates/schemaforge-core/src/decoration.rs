//! The value exchanged between the engine and decorator providers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Module path → symbols required from it. A symbol spelled `type X` is a
/// type-only import.
pub type ImportRequests = BTreeMap<String, BTreeSet<String>>;

/// A rendered annotation plus the imports it needs.
///
/// A decoration with an empty `source` is never written to the output, but
/// its imports are still recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    /// Symbolic name used for exclusion (`IsString`, `ApiProperty`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: ImportRequests,
}

impl Decoration {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: source.into(),
            imports: ImportRequests::new(),
        }
    }

    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(source)
        }
    }

    pub fn with_import(mut self, module: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.imports
            .entry(module.into())
            .or_default()
            .insert(symbol.into());
        self
    }

    /// Carries imports only and renders no text.
    pub fn is_import_only(&self) -> bool {
        self.source.trim().is_empty()
    }
}

/// Merge `extra` into `into`.
pub fn merge_imports(into: &mut ImportRequests, extra: &ImportRequests) {
    for (module, symbols) in extra {
        into.entry(module.clone())
            .or_default()
            .extend(symbols.iter().cloned());
    }
}
