//! Test-expectation helpers for entities, events and entity mutations.
//!
//! Generated helpers rely on a small runtime contract imported from the
//! configured testing module:
//!
//! - `TransactionRunner.findOne(type, partial)` for entity lookups
//! - `EventFixture.expectEvent(topic, matcher)` / `expectNoEvent(topic, matcher)`
//! - `EntityMutationFixture.findMutated(type, before)`
//! - `anyOf(...candidates)`, an asymmetric matcher accepting any candidate

use std::collections::BTreeSet;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use url::Url;

use crate::attributes::PropertyChanges;
use crate::config::ExpectationOptions;
use crate::context::{ClassContext, PropertyContext};
use crate::engine::{RenderHooks, RenderPass, TypeNaming};
use crate::error::RenderError;
use crate::graph::{PrimitiveKind, TypeId, TypeKind};
use crate::naming::{property_key, string_literal};

/// Fallback matcher for shapes with no specific rule.
pub const ANYTHING: &str = "expect.anything()";

/// What a qualifying class is tested as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationKind {
    Entity,
    Event { topic: String },
    Mutation,
}

#[derive(Debug, Clone)]
pub struct ExpectationHooks {
    options: ExpectationOptions,
    entities: GlobSet,
    not_mutated_emitted: BTreeSet<TypeId>,
}

impl ExpectationHooks {
    /// Compile the entity globs.
    pub fn new(options: ExpectationOptions) -> Result<Self, RenderError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &options.entity_globs {
            let glob = Glob::new(pattern).map_err(|source| RenderError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let entities = builder.build().map_err(|source| RenderError::InvalidGlob {
            pattern: options.entity_globs.join(", "),
            source,
        })?;
        Ok(Self {
            options,
            entities,
            not_mutated_emitted: BTreeSet::new(),
        })
    }

    /// Classify a class. Mutations take precedence over events, events over
    /// entities.
    pub fn classify(&self, ctx: &ClassContext<'_>) -> Option<ExpectationKind> {
        if ctx.is_constraint() && ctx.attributes.entity_mutation_from.is_some() {
            return Some(ExpectationKind::Mutation);
        }
        let source = ctx.source()?;
        if let Some(topic) = self
            .options
            .event_topics
            .iter()
            .find(|t| t.schema == source)
        {
            return Some(ExpectationKind::Event {
                topic: topic.topic.clone(),
            });
        }
        if ctx.attributes.entity_event || self.is_entity_source(source) {
            return Some(ExpectationKind::Entity);
        }
        None
    }

    /// Globs match the source without its fragment, and for URLs also the
    /// path alone.
    fn is_entity_source(&self, source: &str) -> bool {
        let document = source.split('#').next().unwrap_or(source);
        if self.entities.is_match(document) {
            return true;
        }
        Url::parse(document).is_ok_and(|url| self.entities.is_match(url.path()))
    }

    fn imports(&self, pass: &mut RenderPass<'_>, fixture: &str) {
        pass.imports.add_value(&self.options.matchers_module, "expect");
        pass.imports.add(&self.options.testing_module, fixture);
    }

    fn import_any_of(&self, pass: &mut RenderPass<'_>, matchers: &[(String, String)]) {
        if matchers.iter().any(|(_, m)| m.contains("anyOf(")) {
            pass.imports.add_value(&self.options.testing_module, "anyOf");
        }
    }
}

impl RenderHooks for ExpectationHooks {
    fn type_naming(&self) -> TypeNaming {
        TypeNaming::Upstream
    }

    fn emits_enums(&self) -> bool {
        false
    }

    fn suppress_class(&mut self, ctx: &ClassContext<'_>, _pass: &RenderPass<'_>) -> bool {
        self.classify(ctx).is_none()
    }

    fn render_class<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<Option<String>, RenderError> {
        let Some(kind) = self.classify(ctx) else {
            return Ok(None);
        };
        debug!(class = ctx.name(), ?kind, "rendering expectations");
        let name = match kind {
            ExpectationKind::Entity => self.render_entity(ctx, pass)?,
            ExpectationKind::Event { topic } => self.render_event(ctx, &topic, pass)?,
            ExpectationKind::Mutation => self.render_mutation(ctx, pass)?,
        };
        Ok(Some(name))
    }
}

// ---------------------------------------------------------------------------
// Helper shapes
// ---------------------------------------------------------------------------

impl ExpectationHooks {
    fn render_entity<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<String, RenderError> {
        self.imports(pass, "type TransactionRunner");
        let model = pass.reference_type(ctx.id)?;
        let constructed = constructor_for(ctx, pass)?;
        let matchers = property_matchers(ctx, pass, |_| None)?;
        self.import_any_of(pass, &matchers);
        let function = format!("expect{model}");

        pass.begin_declaration();
        pass.writer.line(&format!("export async function {function}("));
        pass.writer.indent();
        pass.writer.line("runner: TransactionRunner,");
        pass.writer.line(&format!("expected: Partial<{model}> = {{}},"));
        pass.writer.dedent();
        pass.writer.open(&format!("): Promise<{model}>"));
        pass.writer
            .line(&format!("const actual = await runner.findOne({constructed}, expected);"));
        write_to_equal(pass, "actual", &matchers, "expected");
        pass.writer.line(&format!("return actual as {model};"));
        pass.writer.close();

        pass.writer.blank();
        pass.writer
            .line(&format!("export async function {function}NotToExist("));
        pass.writer.indent();
        pass.writer.line("runner: TransactionRunner,");
        pass.writer.line(&format!("expected: Partial<{model}>,"));
        pass.writer.dedent();
        pass.writer.open("): Promise<void>");
        pass.writer
            .line(&format!("const actual = await runner.findOne({constructed}, expected);"));
        pass.writer.line("expect(actual ?? undefined).toBeUndefined();");
        pass.writer.close();
        Ok(function)
    }

    fn render_event<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        topic: &str,
        pass: &mut RenderPass<'a>,
    ) -> Result<String, RenderError> {
        self.imports(pass, "type EventFixture");
        let model = pass.reference_type(ctx.id)?;
        let matchers = property_matchers(ctx, pass, |_| None)?;
        self.import_any_of(pass, &matchers);
        let function = format!("expect{model}");
        let topic = string_literal(topic);

        pass.begin_declaration();
        pass.writer.line(&format!("export async function {function}("));
        pass.writer.indent();
        pass.writer.line("fixture: EventFixture,");
        pass.writer.line(&format!("expected: Partial<{model}> = {{}},"));
        pass.writer.dedent();
        pass.writer.open(&format!("): Promise<{model}>"));
        pass.writer
            .line(&format!("return fixture.expectEvent<{model}>({topic}, {{"));
        write_fields(pass, &matchers, Some("expected"));
        pass.writer.line("});");
        pass.writer.close();

        pass.writer.blank();
        pass.writer
            .open(&format!("export async function expectNo{model}(fixture: EventFixture): Promise<void>"));
        pass.writer
            .line(&format!("await fixture.expectNoEvent({topic}, {{"));
        write_fields(pass, &matchers, None);
        pass.writer.line("});");
        pass.writer.close();
        Ok(function)
    }

    fn render_mutation<'a>(
        &mut self,
        ctx: &ClassContext<'a>,
        pass: &mut RenderPass<'a>,
    ) -> Result<String, RenderError> {
        let Some(base) = ctx.constraint_for else {
            return Err(RenderError::SchemaError {
                path: ctx.location(),
                message: "entityMutationFrom requires constraintFor".to_string(),
            });
        };
        self.imports(pass, "type EntityMutationFixture");

        let model = pass.reference_type(ctx.id)?;
        let entity = pass.reference_value(base.id)?;
        let function = format!("expect{model}");

        let from = ctx.attributes.entity_mutation_from.as_deref().unwrap_or(&[]);
        let mut before_types = Vec::new();
        for state in from.iter().flatten() {
            let name = pass.reference_type(*state)?;
            if !before_types.contains(&name) {
                before_types.push(name);
            }
        }
        if before_types.is_empty() {
            before_types.push(entity.clone());
        }
        let before_type = before_types.join(" | ");

        // absent means nothing may change
        let changes = ctx
            .attributes
            .entity_property_changes
            .clone()
            .unwrap_or_else(|| PropertyChanges::Only(BTreeSet::new()));
        let matchers = property_matchers(ctx, pass, |prop| {
            changes.allows(prop.name()).then(|| {
                let key = string_literal(prop.name());
                let field = accessor(prop.name());
                format!("({key} in updates ? updates{field} : before{field})")
            })
        })?;
        self.import_any_of(pass, &matchers);

        pass.begin_declaration();
        pass.writer.line(&format!("export async function {function}("));
        pass.writer.indent();
        pass.writer.line("fixture: EntityMutationFixture,");
        pass.writer.line(&format!("before: {before_type},"));
        pass.writer.line(&format!("updates: Partial<{model}>,"));
        pass.writer.line(&format!("tests: Partial<{model}> = {{}},"));
        pass.writer.dedent();
        pass.writer.open(&format!("): Promise<{model}>"));
        pass.writer
            .line(&format!("const actual = await fixture.findMutated({entity}, before);"));
        write_to_equal(pass, "actual", &matchers, "tests");
        pass.writer.line(&format!("return actual as {model};"));
        pass.writer.close();

        if from.iter().any(Option::is_none) && self.not_mutated_emitted.insert(base.id) {
            pass.writer.blank();
            pass.writer
                .line(&format!("export async function expect{entity}NotMutated("));
            pass.writer.indent();
            pass.writer.line("fixture: EntityMutationFixture,");
            pass.writer.line(&format!("before: {entity},"));
            pass.writer.dedent();
            pass.writer.open("): Promise<void>");
            pass.writer
                .line(&format!("const actual = await fixture.findMutated({entity}, before);"));
            pass.writer.line("expect(actual).toEqual(before);");
            pass.writer.close();
        }
        Ok(function)
    }
}

fn write_to_equal(pass: &mut RenderPass<'_>, actual: &str, fields: &[(String, String)], rest: &str) {
    pass.writer.line(&format!("expect({actual}).toEqual({{"));
    write_fields(pass, fields, Some(rest));
    pass.writer.line("});");
}

fn write_fields(pass: &mut RenderPass<'_>, fields: &[(String, String)], rest: Option<&str>) {
    pass.writer.indent();
    for (key, matcher) in fields {
        pass.writer.line(&format!("{key}: {matcher},"));
    }
    if let Some(rest) = rest {
        pass.writer.line(&format!("...{rest},"));
    }
    pass.writer.dedent();
}

/// `.name` or `["odd-name"]`.
fn accessor(name: &str) -> String {
    let key = property_key(name);
    if key.starts_with('"') {
        format!("[{key}]")
    } else {
        format!(".{key}")
    }
}

/// The runtime class used for lookups: the base class for constraints.
fn constructor_for(ctx: &ClassContext<'_>, pass: &mut RenderPass<'_>) -> Result<String, RenderError> {
    match ctx.constraint_for {
        Some(base) => pass.reference_value(base.id),
        None => pass.reference_value(ctx.id),
    }
}

// ---------------------------------------------------------------------------
// Matcher synthesis
// ---------------------------------------------------------------------------

/// `(key, matcher)` for every property of the class, merged with the base
/// class for constraints. `custom` may replace a property's matcher.
pub fn property_matchers<'a, F>(
    ctx: &ClassContext<'a>,
    pass: &mut RenderPass<'a>,
    custom: F,
) -> Result<Vec<(String, String)>, RenderError>
where
    F: Fn(&PropertyContext<'a>) -> Option<String>,
{
    let mut out = Vec::new();
    for prop in ctx.merged_properties(pass.graph()) {
        let matcher = match custom(&prop) {
            Some(m) => m,
            None => property_matcher(&prop, pass)?,
        };
        out.push((property_key(prop.name()), matcher));
    }
    Ok(out)
}

/// Matcher for one property, accepting `undefined` when optional and
/// `null` when nullable.
pub fn property_matcher(
    prop: &PropertyContext<'_>,
    pass: &mut RenderPass<'_>,
) -> Result<String, RenderError> {
    if prop.attributes.type_override.is_some() {
        debug!(property = %prop.location(), "overridden type matches anything");
        return Ok(ANYTHING.to_string());
    }
    if let Some(value) = prop.constant_value(pass.graph()) {
        return Ok(string_literal(value));
    }

    let graph = pass.graph();
    let mut candidates = Vec::new();
    if prop.optional() {
        candidates.push("undefined".to_string());
    }
    if prop.nullable {
        candidates.push("null".to_string());
    }
    for member in graph.non_null_members(prop.property.type_id) {
        candidates.push(type_matcher(member, &prop.location(), pass)?);
    }
    Ok(any_of(candidates))
}

/// Structural matcher for a type.
pub fn type_matcher(
    id: TypeId,
    location: &str,
    pass: &mut RenderPass<'_>,
) -> Result<String, RenderError> {
    let graph = pass.graph();
    let node = graph.node(id);
    if node.attributes.as_ref().is_some_and(|a| a.type_override.is_some()) {
        return Ok(ANYTHING.to_string());
    }
    Ok(match &node.kind {
        TypeKind::Primitive { primitive } => {
            let constructor = match primitive {
                PrimitiveKind::String | PrimitiveKind::Uuid => "String",
                PrimitiveKind::Integer | PrimitiveKind::Double => "Number",
                PrimitiveKind::Boolean => "Boolean",
                PrimitiveKind::Date | PrimitiveKind::DateTime => "Date",
            };
            format!("expect.any({constructor})")
        }
        TypeKind::Enum(e) => any_of(e.cases.iter().map(|c| string_literal(c)).collect()),
        TypeKind::Class(_) => {
            // constraint names are type aliases; match the base class instead
            let runtime = match ClassContext::new(graph, id).and_then(|c| c.constraint_for) {
                Some(base) => base.id,
                None => id,
            };
            format!("expect.any({})", pass.reference_value(runtime)?)
        }
        TypeKind::Array { .. } => "expect.any(Array)".to_string(),
        TypeKind::Map { .. } => "expect.any(Object)".to_string(),
        TypeKind::Union { members } => {
            let mut candidates = Vec::new();
            if members.iter().any(|m| graph.is_null(*m)) {
                candidates.push("null".to_string());
            }
            for member in graph.non_null_members(id) {
                candidates.push(type_matcher(member, location, pass)?);
            }
            any_of(candidates)
        }
        TypeKind::Null => "null".to_string(),
        TypeKind::Any => {
            warn!(property = location, "no matcher for an unconstrained type; matching anything");
            ANYTHING.to_string()
        }
    })
}

/// A single candidate stands alone; several become `anyOf(...)`.
fn any_of(mut candidates: Vec<String>) -> String {
    match candidates.len() {
        0 => ANYTHING.to_string(),
        1 => candidates.remove(0),
        _ => format!("anyOf({})", candidates.join(", ")),
    }
}
