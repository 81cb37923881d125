//! Per-pass import table and module path resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

use crate::decoration::ImportRequests;

/// A symbol imported from a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportSymbol {
    pub name: String,
    pub type_only: bool,
}

impl ImportSymbol {
    /// Parse `X` or `type X`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix("type ") {
            Some(name) => Self::type_only(name.trim()),
            None => Self::value(raw),
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_only: false,
        }
    }

    pub fn type_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_only: true,
        }
    }
}

/// Accumulated `module → symbols` for one output file.
///
/// Rendering sorts modules and symbols and collapses a type-only symbol into
/// the value import of the same name.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    modules: BTreeMap<String, BTreeSet<ImportSymbol>>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw symbol (`X` or `type X`).
    pub fn add(&mut self, module: &str, symbol: &str) {
        self.insert(module, ImportSymbol::parse(symbol));
    }

    pub fn add_value(&mut self, module: &str, name: &str) {
        self.insert(module, ImportSymbol::value(name));
    }

    pub fn add_type(&mut self, module: &str, name: &str) {
        self.insert(module, ImportSymbol::type_only(name));
    }

    pub fn merge(&mut self, requests: &ImportRequests) {
        for (module, symbols) in requests {
            for symbol in symbols {
                self.add(module, symbol);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Whether `name` is imported from `module`, as a type or a value.
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|s| s.iter().any(|sym| sym.name == name))
    }

    /// Render one `import` statement per module.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (module, symbols) in &self.modules {
            // name → type-only; a value import of the same name wins
            let mut collapsed: BTreeMap<&str, bool> = BTreeMap::new();
            for symbol in symbols {
                collapsed
                    .entry(symbol.name.as_str())
                    .and_modify(|type_only| *type_only &= symbol.type_only)
                    .or_insert(symbol.type_only);
            }

            let all_types = collapsed.values().all(|t| *t);
            let names: Vec<String> = collapsed
                .iter()
                .map(|(name, type_only)| {
                    if *type_only && !all_types {
                        format!("type {name}")
                    } else {
                        name.to_string()
                    }
                })
                .collect();

            let keyword = if all_types { "import type" } else { "import" };
            out.push_str(&format!(
                "{keyword} {{ {} }} from \"{module}\";\n",
                names.join(", ")
            ));
        }
        out
    }

    fn insert(&mut self, module: &str, symbol: ImportSymbol) {
        if symbol.name.is_empty() {
            return;
        }
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(symbol);
    }
}

// ---------------------------------------------------------------------------
// Module paths
// ---------------------------------------------------------------------------

/// Module specifier of `target` as seen from a file at `from`.
///
/// Both paths name output files relative to the same root. The extension of
/// `target` is dropped and separators are always `/`.
///
/// ```
/// use schemaforge_core::imports::relative_module_path;
/// use std::path::Path;
///
/// assert_eq!(
///     relative_module_path(Path::new("src/testing/factories.ts"), Path::new("src/model.ts")),
///     "../model"
/// );
/// ```
pub fn relative_module_path(from: &Path, target: &Path) -> String {
    let from_dir: Vec<Component<'_>> = from
        .parent()
        .map(|p| p.components().filter(|c| !matches!(c, Component::CurDir)).collect())
        .unwrap_or_default();
    let target_no_ext = target.with_extension("");
    let target_parts: Vec<Component<'_>> = target_no_ext
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from_dir
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Whether two output paths name the same file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    let strip = |p: &Path| -> Vec<String> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    strip(a) == strip(b)
}
