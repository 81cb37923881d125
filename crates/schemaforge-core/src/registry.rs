//! Cross-pass schema registry.
//!
//! Maps a source schema location (`uri[#fragment]`) to the name and output
//! file of the artifact emitted for it. Entries are created once and never
//! mutated; lookups are exact and a miss is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an emitted artifact. Registering the same location twice fails.
    pub fn register(
        &mut self,
        source: impl Into<String>,
        name: impl Into<String>,
        file: impl AsRef<Path>,
    ) -> Result<(), RegistryError> {
        let source = source.into();
        if let Some(existing) = self.entries.get(&source) {
            return Err(RegistryError::Duplicate {
                reference: source,
                existing: existing.name.clone(),
            });
        }
        self.entries.insert(
            source,
            RegistryEntry {
                name: name.into(),
                file: file.as_ref().to_path_buf(),
            },
        );
        Ok(())
    }

    /// Exact lookup; a miss names the unresolved reference.
    pub fn lookup(&self, source: &str) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .get(source)
            .ok_or_else(|| RegistryError::Unresolved {
                reference: source.to_string(),
            })
    }

    pub fn get(&self, source: &str) -> Option<&RegistryEntry> {
        self.entries.get(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Look `source` up in each registry in turn.
pub fn lookup_in<'r, I>(registries: I, source: &str) -> Result<&'r RegistryEntry, RegistryError>
where
    I: IntoIterator<Item = &'r SchemaRegistry>,
{
    registries
        .into_iter()
        .find_map(|r| r.get(source))
        .ok_or_else(|| RegistryError::Unresolved {
            reference: source.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_returns_registered_entry() {
        let mut registry = SchemaRegistry::new();
        registry
            .register("file:///car.json#/$defs/Car", "Car", "model.ts")
            .unwrap();

        let entry = registry.lookup("file:///car.json#/$defs/Car").unwrap();
        assert_eq!(entry.name, "Car");
        assert_eq!(entry.file, PathBuf::from("model.ts"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry = SchemaRegistry::new();
        registry.register("file:///car.json", "Car", "model.ts").unwrap();

        let err = registry.lookup("file:///car.json#").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Unresolved {
                reference: "file:///car.json#".to_string()
            }
        );
        assert!(registry.lookup("file:///Car.json").is_err());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register("a", "A", "model.ts").unwrap();
        let err = registry.register("a", "B", "model.ts").unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(registry.lookup("a").unwrap().name, "A");
    }

    #[test]
    fn test_lookup_in_chain() {
        let mut models = SchemaRegistry::new();
        models.register("a", "A", "model.ts").unwrap();
        let mut factories = SchemaRegistry::new();
        factories.register("b", "makeB", "factories.ts").unwrap();

        let chain = [models, factories];
        assert_eq!(lookup_in(&chain, "b").unwrap().name, "makeB");
        assert!(lookup_in(&chain, "c").is_err());
    }

    #[test]
    fn test_registry_json_round_trip() {
        let mut registry = SchemaRegistry::new();
        registry.register("file:///car.json", "Car", "out/model.ts").unwrap();

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["file:///car.json"]["name"], "Car");
        let back: SchemaRegistry = serde_json::from_value(json).unwrap();
        assert_eq!(back, registry);
    }
}
