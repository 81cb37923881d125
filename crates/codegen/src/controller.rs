//! Controller contracts: an interface with one handler signature per
//! operation, and a function that routes a hand-written class implementing
//! it.
//!
//! The generated function applies the `@nestjs/common` decorators through
//! property descriptors, so the controller body stays in user code and only
//! the wiring is generated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use heck::{ToLowerCamelCase, ToUpperCamelCase};
use rust_embed::Embed;
use schemaforge_core::graph::PrimitiveKind;
use schemaforge_core::imports::{relative_module_path, same_file, ImportTable};
use schemaforge_core::naming::{is_identifier, string_literal};
use schemaforge_core::registry::{lookup_in, SchemaRegistry};
use schemaforge_core::writer::comment_block;
use schemaforge_core::{RenderError, RenderOptions};
use serde::Serialize;
use tera::Tera;
use tracing::{debug, info};

use crate::operations::{
    method_name, path_suffix, ApiSpecification, Operation, ParameterLocation, ParameterSchema,
};

const NEST_COMMON: &str = "@nestjs/common";
const TEMPLATE: &str = "contract.ts.tera";

#[derive(Embed)]
#[folder = "templates/controller/"]
struct ControllerTemplates;

/// Template context for one contract file.
#[derive(Serialize)]
struct ContractContext {
    header: String,
    imports: String,
    title: String,
    interface_name: String,
    function_name: String,
    controller_route: String,
    methods: Vec<MethodContext>,
}

/// Template context for one handler method.
#[derive(Serialize)]
struct MethodContext {
    name: String,
    summary: Option<String>,
    signature: String,
    return_type: String,
    method_decorators: String,
    parameter_decorators: String,
}

/// A rendered contract file.
#[derive(Debug, Clone)]
pub struct ControllerContract {
    pub file: PathBuf,
    pub interface_name: String,
    pub function_name: String,
    pub source: String,
}

/// `Car` becomes `CarApiContract`.
pub fn interface_name(resource_name: &str) -> String {
    format!("{}ApiContract", resource_name.to_upper_camel_case())
}

/// `Car` becomes `decorateCarApiController`.
pub fn decoration_function_name(resource_name: &str) -> String {
    format!("decorate{}ApiController", resource_name.to_upper_camel_case())
}

/// Render the contract for one API document.
///
/// Request, response and parameter schemas are resolved through the given
/// registries (normally the model pass); a miss fails the whole contract.
pub fn render_contract(
    api: &ApiSpecification,
    options: &RenderOptions,
    registries: &[SchemaRegistry],
) -> Result<ControllerContract> {
    let output_file = options
        .output_file
        .clone()
        .ok_or(RenderError::MissingConfiguration("output-file"))?;
    let tera = templates()?;

    let mut builder = ContractBuilder {
        output_file: &output_file,
        registries,
        imports: ImportTable::new(),
    };
    builder.imports.add_value(NEST_COMMON, "Controller");

    let base_path = api.base_path();
    let mut methods = Vec::with_capacity(api.operations.len());
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for operation in &api.operations {
        let method = builder.method(operation, &api.resource_name, &base_path)?;
        if let Some(previous) = seen.insert(method.name.clone(), &operation.operation_id) {
            bail!(
                "Operations '{}' and '{}' both map to handler method '{}'",
                previous,
                operation.operation_id,
                method.name
            );
        }
        methods.push(method);
    }

    let route = path_suffix(&base_path, "");
    let context = ContractContext {
        header: options
            .leading_comment
            .as_deref()
            .map(|c| comment_block(c) + "\n")
            .unwrap_or_default(),
        imports: builder.imports.render(),
        title: escape_comment(&api.title),
        interface_name: interface_name(&api.resource_name),
        function_name: decoration_function_name(&api.resource_name),
        controller_route: if route.is_empty() {
            String::new()
        } else {
            string_literal(&route)
        },
        methods,
    };

    let ctx = tera::Context::from_serialize(&context)
        .with_context(|| format!("Failed to build template context for {}", api.title))?;
    let source = tera
        .render(TEMPLATE, &ctx)
        .with_context(|| format!("Failed to render controller contract for {}", api.title))?;

    info!(
        file = %output_file.display(),
        operations = context.methods.len(),
        "rendered controller contract"
    );
    Ok(ControllerContract {
        file: output_file,
        interface_name: context.interface_name,
        function_name: context.function_name,
        source,
    })
}

fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    for file_name in ControllerTemplates::iter() {
        let file = ControllerTemplates::get(&file_name)
            .with_context(|| format!("Failed to load embedded template: {}", file_name))?;
        let content = std::str::from_utf8(file.data.as_ref())
            .with_context(|| format!("Template {} is not valid UTF-8", file_name))?;
        tera.add_raw_template(&file_name, content)
            .with_context(|| format!("Failed to register template: {}", file_name))?;
    }
    Ok(tera)
}

fn escape_comment(text: &str) -> String {
    text.replace("*/", "*\\/")
}

// ---------------------------------------------------------------------------
// Per-operation derivation
// ---------------------------------------------------------------------------

struct ContractBuilder<'r> {
    output_file: &'r Path,
    registries: &'r [SchemaRegistry],
    imports: ImportTable,
}

impl ContractBuilder<'_> {
    fn method(
        &mut self,
        operation: &Operation,
        resource_name: &str,
        base_path: &str,
    ) -> Result<MethodContext> {
        let id = &operation.operation_id;
        let Some(name) = method_name(id, resource_name) else {
            bail!("Operation '{}' does not yield a handler method name", id);
        };

        let mut params = Vec::new();
        let mut param_decorators = Vec::new();
        for parameter in &operation.parameters {
            let param_name = parameter.name.to_lower_camel_case();
            if !is_identifier(&param_name) {
                bail!(
                    "Parameter '{}' of operation '{}' is not a valid identifier",
                    parameter.name,
                    id
                );
            }
            let ty = match &parameter.schema {
                ParameterSchema::Reference { reference } => self.reference(reference, id)?,
                ParameterSchema::Primitive { primitive } => parameter_type(*primitive).to_string(),
            };
            let ty = if parameter.required {
                ty
            } else {
                format!("{ty} | undefined")
            };
            params.push(format!("{param_name}: {ty}"));

            let decorator = parameter.location.decorator();
            self.imports.add_value(NEST_COMMON, decorator);
            let key = match parameter.location {
                ParameterLocation::Header => parameter.name.to_ascii_lowercase(),
                ParameterLocation::Path | ParameterLocation::Query => parameter.name.clone(),
            };
            param_decorators.push(format!("{decorator}({})", string_literal(&key)));
        }

        if let Some(body) = &operation.request_body_ref {
            let ty = self.reference(body, id)?;
            let taken = params.iter().any(|p| p.starts_with("body:"));
            let body_name = if taken { "requestBody" } else { "body" };
            params.push(format!("{body_name}: {ty}"));
            self.imports.add_value(NEST_COMMON, "Body");
            param_decorators.push("Body()".to_string());
        }
        params.push("...rest: unknown[]".to_string());

        let return_type = match operation
            .success_response
            .as_ref()
            .and_then(|r| r.schema_ref.as_deref())
        {
            Some(reference) => self.reference(reference, id)?,
            None => "void".to_string(),
        };

        let route_decorator = operation.method.decorator();
        self.imports.add_value(NEST_COMMON, route_decorator);
        let suffix = path_suffix(&operation.path, base_path);
        let mut method_decorators = vec![if suffix.is_empty() {
            format!("{route_decorator}()")
        } else {
            format!("{route_decorator}({})", string_literal(&suffix))
        }];
        if let Some(response) = &operation.success_response {
            self.imports.add_value(NEST_COMMON, "HttpCode");
            method_decorators.push(format!("HttpCode({})", response.status_code));
        }

        debug!(operation = %id, method = %name, route = %suffix, "derived handler");
        Ok(MethodContext {
            name,
            summary: operation.summary.as_deref().map(escape_comment),
            signature: params.join(", "),
            return_type,
            method_decorators: method_decorators.join(", "),
            parameter_decorators: param_decorators.join(", "),
        })
    }

    /// Registered name of a schema, imported as a type when it lives in
    /// another file.
    fn reference(&mut self, reference: &str, operation_id: &str) -> Result<String> {
        let entry = lookup_in(self.registries, reference)
            .with_context(|| format!("Operation '{}' references an unregistered schema", operation_id))?;
        if !same_file(self.output_file, &entry.file) {
            let module = relative_module_path(self.output_file, &entry.file);
            self.imports.add_type(&module, &entry.name);
        }
        Ok(entry.name.clone())
    }
}

/// Request parameters arrive as text, so dates stay strings.
fn parameter_type(primitive: PrimitiveKind) -> &'static str {
    match primitive {
        PrimitiveKind::Date | PrimitiveKind::DateTime => "string",
        other => other.type_expression(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contract_names() {
        assert_eq!(interface_name("Car"), "CarApiContract");
        assert_eq!(interface_name("fleet-vehicle"), "FleetVehicleApiContract");
        assert_eq!(decoration_function_name("car"), "decorateCarApiController");
    }

    #[test]
    fn test_parameter_type() {
        assert_eq!(parameter_type(PrimitiveKind::DateTime), "string");
        assert_eq!(parameter_type(PrimitiveKind::Uuid), "string");
        assert_eq!(parameter_type(PrimitiveKind::Integer), "number");
        assert_eq!(parameter_type(PrimitiveKind::Boolean), "boolean");
    }

    #[test]
    fn test_escape_comment() {
        assert_eq!(escape_comment("ends */ here"), "ends *\\/ here");
    }

    #[test]
    fn test_embedded_template_registers() {
        let tera = templates().unwrap();
        assert!(tera.get_template_names().any(|n| n == TEMPLATE));
    }
}
