//! Per-pass state and the emission primitives every variant builds on.
//!
//! A [`RenderPass`] owns the output buffer, the import table and the
//! registry being filled by the current pass. It is created by
//! [`Engine::render`](super::Engine::render), handed to the variant hooks for
//! each visited node, and consumed when the file is assembled.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::config::RenderOptions;
use crate::context::{ClassContext, EnumContext, PropertyContext};
use crate::decoration::Decoration;
use crate::error::RenderError;
use crate::graph::{TypeGraph, TypeId, TypeKind};
use crate::imports::{relative_module_path, same_file, ImportTable};
use crate::naming::{enum_member_name, json_literal, property_key, string_literal};
use crate::providers::{DecoratorProvider, RenderingUtilities};
use crate::registry::{lookup_in, RegistryEntry, SchemaRegistry};
use crate::writer::{comment_block, SourceWriter};

use super::enums::{resolve_enum_hint, suppressed_enums};

/// How class and enum references are named inside the pass output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNaming {
    /// Declared in the file being rendered.
    Local,
    /// Declared by an earlier pass; resolved through the registries and
    /// imported.
    Upstream,
}

pub struct RenderPass<'a> {
    graph: &'a TypeGraph,
    options: &'a RenderOptions,
    providers: &'a [Box<dyn DecoratorProvider>],
    upstream: &'a [SchemaRegistry],
    file: PathBuf,
    naming: TypeNaming,
    suppressed_enums: BTreeSet<TypeId>,
    pub(crate) registry: SchemaRegistry,
    /// Schema location of the node being visited, for error context.
    pub(crate) location: String,
    pub writer: SourceWriter,
    pub imports: ImportTable,
}

impl<'a> RenderPass<'a> {
    pub(crate) fn new(
        graph: &'a TypeGraph,
        options: &'a RenderOptions,
        providers: &'a [Box<dyn DecoratorProvider>],
        upstream: &'a [SchemaRegistry],
        file: PathBuf,
        naming: TypeNaming,
    ) -> Self {
        Self {
            graph,
            options,
            providers,
            upstream,
            file,
            naming,
            suppressed_enums: suppressed_enums(graph),
            registry: SchemaRegistry::new(),
            location: String::new(),
            writer: SourceWriter::new(),
            imports: ImportTable::new(),
        }
    }

    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    pub fn options(&self) -> &'a RenderOptions {
        self.options
    }

    /// The output file of this pass.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn is_enum_suppressed(&self, id: TypeId) -> bool {
        self.suppressed_enums.contains(&id)
    }

    /// Separate top-level declarations by one blank line.
    pub fn begin_declaration(&mut self) {
        if !self.writer.is_empty() {
            self.writer.blank();
        }
    }

    // -----------------------------------------------------------------------
    // Names and cross-pass references
    // -----------------------------------------------------------------------

    /// Emitted class name and intersection name for a constraint class.
    ///
    /// `CarConstraint` yields `("CarConstraint", "Car")`. A name without the
    /// suffix gains it: `ArchivedCar` yields `("ArchivedCarConstraint",
    /// "ArchivedCar")`.
    pub fn constraint_names(&self, ctx: &ClassContext<'_>) -> (String, String) {
        let suffix = self.options.constraint_suffix.as_str();
        let name = ctx.name();
        match name.strip_suffix(suffix) {
            Some(stripped) if !suffix.is_empty() && !stripped.is_empty() => {
                (name.to_string(), stripped.to_string())
            }
            _ => (format!("{name}{suffix}"), name.to_string()),
        }
    }

    /// The name a class or enum is declared under in the model output.
    pub fn local_name(&self, id: TypeId) -> String {
        if let Some(ctx) = ClassContext::new(self.graph, id) {
            if ctx.is_constraint() {
                return self.constraint_names(&ctx).1;
            }
            return ctx.name().to_string();
        }
        match self.graph.enumeration(id) {
            Some(e) => e.name.clone(),
            None => id.to_string(),
        }
    }

    /// Registry entry for a node.
    ///
    /// Local passes search their own registry before the upstream ones;
    /// upstream passes search only upstream.
    pub fn lookup(&self, id: TypeId) -> Result<&RegistryEntry, RenderError> {
        let node = self.graph.node(id);
        let Some(source) = node.source.as_deref() else {
            return Err(RenderError::SchemaError {
                path: self.local_name(id),
                message: "type has no source location and cannot be referenced across passes"
                    .to_string(),
            });
        };
        let result = match self.naming {
            TypeNaming::Local => {
                lookup_in(std::iter::once(&self.registry).chain(self.upstream.iter()), source)
            }
            // this pass registers its own artifacts under the same sources
            TypeNaming::Upstream => lookup_in(self.upstream.iter(), source),
        };
        result.map_err(|e| RenderError::reference(self.location.clone(), e))
    }

    /// Import a registered artifact into this file unless it lives here.
    pub fn import_registered(&mut self, entry: &RegistryEntry, type_only: bool) {
        if same_file(&entry.file, &self.file) {
            return;
        }
        let module = relative_module_path(&self.file, &entry.file);
        if type_only {
            self.imports.add_type(&module, &entry.name);
        } else {
            self.imports.add_value(&module, &entry.name);
        }
    }

    /// Resolve a node to its registered name and import it as a value.
    pub fn reference_value(&mut self, id: TypeId) -> Result<String, RenderError> {
        let entry = self.lookup(id)?.clone();
        self.import_registered(&entry, false);
        Ok(entry.name)
    }

    /// Resolve a node to its registered name and import it as a type.
    pub fn reference_type(&mut self, id: TypeId) -> Result<String, RenderError> {
        let entry = self.lookup(id)?.clone();
        self.import_registered(&entry, true);
        Ok(entry.name)
    }

    // -----------------------------------------------------------------------
    // Type expressions
    // -----------------------------------------------------------------------

    /// TypeScript type for a node, naming classes and enums per the pass's
    /// [`TypeNaming`].
    pub fn resolve_type(&mut self, id: TypeId) -> Result<String, RenderError> {
        match self.naming {
            TypeNaming::Local => Ok(self.local_type_expression(id)),
            TypeNaming::Upstream => {
                let graph = self.graph;
                render_type(graph, id, &mut |named| self.reference_type(named))
            }
        }
    }

    fn local_type_expression(&self, id: TypeId) -> String {
        let mut name = |named: TypeId| Ok::<_, RenderError>(self.local_name(named));
        render_type(self.graph, id, &mut name).unwrap_or_else(|_| "unknown".to_string())
    }

    /// The declared type of a property in a model class.
    ///
    /// Precedence: `typeOverride`, then a collapsed constant, then the
    /// structural type widened by an enum hint. `| null` is appended for
    /// nullable properties that were collapsed to their non-null member.
    pub fn property_type_source(&self, prop: &PropertyContext<'_>) -> String {
        if let Some(type_override) = &prop.attributes.type_override {
            return type_override.clone();
        }

        let mut source = match self.constant_expression(prop) {
            Some(constant) => constant,
            None => {
                if prop.is_constant() {
                    warn!(
                        property = %prop.location(),
                        "constant property is not a single-case enum; using its structural type"
                    );
                }
                let structural = self.local_type_expression(prop.value_type);
                match self.enum_hint(prop) {
                    Some(hint) => format!("{structural} | {}", self.local_name(hint)),
                    None => structural,
                }
            }
        };

        if prop.nullable && prop.value_type != prop.property.type_id {
            source.push_str(" | null");
        }
        source
    }

    /// A constant as `BaseEnum.Member` when the base class declares the
    /// property as a multi-case enum containing the value, else a literal.
    pub fn constant_expression(&self, prop: &PropertyContext<'_>) -> Option<String> {
        let value = prop.constant_value(self.graph)?;
        if let Some(base_enum) = self.base_enum(prop) {
            if let Some(e) = self.graph.enumeration(base_enum) {
                if e.cases.iter().any(|c| c == value) {
                    return Some(format!(
                        "{}.{}",
                        self.local_name(base_enum),
                        enum_member_name(value)
                    ));
                }
            }
        }
        Some(string_literal(value))
    }

    /// The multi-case enum behind the base class's same-named property.
    pub fn base_enum(&self, prop: &PropertyContext<'_>) -> Option<TypeId> {
        let base = prop.base_property?;
        let (inner, _) = self.graph.nullable_view(base.type_id);
        self.graph
            .enumeration(inner)
            .filter(|e| e.cases.len() > 1)
            .map(|_| inner)
    }

    /// Literal for an attribute-declared default, qualified as an enum
    /// member when the property is an enum containing the value.
    pub fn default_literal(&self, prop: &PropertyContext<'_>) -> Option<String> {
        let value = prop.attributes.default_value.as_ref()?;
        if let (Some(text), Some(e)) = (value.as_str(), self.graph.enumeration(prop.value_type)) {
            if e.cases.iter().any(|c| c == text) {
                return Some(format!(
                    "{}.{}",
                    self.local_name(prop.value_type),
                    enum_member_name(text)
                ));
            }
        }
        Some(json_literal(value))
    }

    // -----------------------------------------------------------------------
    // Decorations
    // -----------------------------------------------------------------------

    /// Source-declared decorations first, then every provider in
    /// registration order.
    pub fn class_decorations(&self, ctx: &ClassContext<'_>) -> Vec<Decoration> {
        let mut out = ctx.attributes.decorators.clone();
        for provider in self.providers {
            let contributed = provider.class_decorations(ctx, self);
            trace!(provider = provider.name(), count = contributed.len(), "class decorations");
            out.extend(contributed);
        }
        out
    }

    pub fn property_decorations(&self, prop: &PropertyContext<'_>) -> Vec<Decoration> {
        let mut out = prop.attributes.decorators.clone();
        for provider in self.providers {
            out.extend(provider.property_decorations(prop, self));
        }
        out
    }

    /// Write decorations above the next declaration and record their
    /// imports. Import-only decorations contribute imports but no text.
    pub fn emit_decorations(&mut self, decorations: &[Decoration]) {
        for decoration in decorations {
            self.imports.merge(&decoration.imports);
            if !decoration.is_import_only() {
                self.writer.lines(decoration.source.trim());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    /// `export class <name> { ... }` with decorations, properties and the
    /// assign constructor.
    pub fn emit_class_declaration(&mut self, ctx: &ClassContext<'_>, class_name: &str) {
        self.begin_declaration();
        if let Some(description) = &ctx.node.description {
            self.writer.doc_comment(description);
        }
        let decorations = self.class_decorations(ctx);
        self.emit_decorations(&decorations);

        self.writer.open(&format!("export class {class_name}"));
        let properties = ctx.properties(self.graph);
        for (i, prop) in properties.iter().enumerate() {
            if i > 0 {
                self.writer.blank();
            }
            if let Some(description) = &prop.property.description {
                self.writer.doc_comment(description);
            }
            let decorations = self.property_decorations(prop);
            self.emit_decorations(&decorations);
            let line = self.property_line(prop);
            self.writer.line(&line);
        }

        if self.options.assign_constructor {
            if !properties.is_empty() {
                self.writer.blank();
            }
            self.writer.open(&format!("constructor(init: {class_name})"));
            self.writer.line("Object.assign(this, init);");
            self.writer.close();
        }
        self.writer.close();
    }

    /// `readonly key!: type = default;`
    pub fn property_line(&self, prop: &PropertyContext<'_>) -> String {
        let default = self.default_literal(prop);
        let marker = if prop.optional() {
            "?"
        } else if default.is_none() && self.options.non_null_assertion_on_properties {
            "!"
        } else {
            ""
        };
        let readonly = if self.options.readonly_properties {
            "readonly "
        } else {
            ""
        };
        let type_source = self.property_type_source(prop);
        let key = property_key(prop.name());
        match default {
            Some(value) => format!("{readonly}{key}{marker}: {type_source} = {value};"),
            None => format!("{readonly}{key}{marker}: {type_source};"),
        }
    }

    /// `export enum <Name> { Member = "case", ... }`.
    pub fn emit_enum_declaration(&mut self, ctx: &EnumContext<'_>) {
        self.begin_declaration();
        if let Some(description) = &ctx.node.description {
            self.writer.doc_comment(description);
        }
        self.writer.open(&format!("export enum {}", ctx.name()));
        let mut used = BTreeSet::new();
        for case in &ctx.enumeration.cases {
            let mut member = enum_member_name(case);
            if !used.insert(member.clone()) {
                let mut n = 2;
                while used.contains(&format!("{member}{n}")) {
                    n += 1;
                }
                member = format!("{member}{n}");
                used.insert(member.clone());
            }
            self.writer
                .line(&format!("{member} = {},", string_literal(case)));
        }
        self.writer.close();
    }

    /// Leading comment, import block, then the body.
    pub(crate) fn assemble(self) -> (String, SchemaRegistry) {
        let mut out = String::new();
        if let Some(comment) = &self.options.leading_comment {
            out.push_str(&comment_block(comment));
            out.push('\n');
        }
        if !self.imports.is_empty() {
            out.push_str(&self.imports.render());
            out.push('\n');
        }
        out.push_str(&self.writer.finish());
        (out, self.registry)
    }
}

impl RenderingUtilities for RenderPass<'_> {
    fn graph(&self) -> &TypeGraph {
        self.graph
    }

    fn type_expression(&self, id: TypeId) -> String {
        self.local_type_expression(id)
    }

    fn value_name(&self, id: TypeId) -> String {
        match ClassContext::new(self.graph, id).and_then(|c| c.constraint_for) {
            Some(base) => self.local_name(base.id),
            None => self.local_name(id),
        }
    }

    fn enum_hint(&self, prop: &PropertyContext<'_>) -> Option<TypeId> {
        let hint = prop.attributes.enum_hint.as_deref()?;
        let resolved = resolve_enum_hint(self.graph, prop.class.source(), hint);
        if resolved.is_none() {
            warn!(
                property = %prop.location(),
                hint,
                "enum hint does not resolve to an enum; using the structural type"
            );
        }
        resolved
    }
}

/// Render a type expression, delegating class and enum names to `name_of`.
///
/// A node-level `typeOverride` always wins. Array items that are unions are
/// parenthesized.
pub(crate) fn render_type<F>(
    graph: &TypeGraph,
    id: TypeId,
    name_of: &mut F,
) -> Result<String, RenderError>
where
    F: FnMut(TypeId) -> Result<String, RenderError>,
{
    let node = graph.node(id);
    if let Some(type_override) = node.attributes.as_ref().and_then(|a| a.type_override.as_ref()) {
        return Ok(type_override.clone());
    }
    Ok(match &node.kind {
        TypeKind::Class(_) | TypeKind::Enum(_) => name_of(id)?,
        TypeKind::Primitive { primitive } => primitive.type_expression().to_string(),
        TypeKind::Null => "null".to_string(),
        TypeKind::Any => "any".to_string(),
        TypeKind::Array { items } => {
            let inner = render_type(graph, *items, name_of)?;
            if inner.contains(' ') {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        TypeKind::Map { values } => {
            format!("Record<string, {}>", render_type(graph, *values, name_of)?)
        }
        TypeKind::Union { members } => {
            let mut parts = Vec::with_capacity(members.len());
            let mut nullable = false;
            for member in members {
                if graph.is_null(*member) {
                    nullable = true;
                } else {
                    parts.push(render_type(graph, *member, name_of)?);
                }
            }
            if nullable {
                parts.push("null".to_string());
            }
            parts.join(" | ")
        }
    })
}
