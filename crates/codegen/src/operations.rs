//! Parsed HTTP operation model and the naming rules derived from it.
//!
//! The model is produced by an OpenAPI parser outside this crate and read
//! here as JSON:
//!
//! ```json
//! { "title": "Cars", "resourceName": "Car", "basePath": "/cars",
//!   "operations": [ { "operationId": "carArchive", "method": "post",
//!                     "path": "/cars/{id}/archive", "parameters": [...],
//!                     "successResponse": { "statusCode": 200 } } ] }
//! ```

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use heck::ToLowerCamelCase;
use regex::Regex;
use schemaforge_core::graph::PrimitiveKind;
use schemaforge_core::naming::decapitalize;
use serde::{Deserialize, Serialize};

static PATH_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("valid path template regex"));

static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z]").expect("valid letter regex"));

/// One API document: a resource and the operations served for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpecification {
    pub title: String,
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ApiSpecification {
    /// Read a specification from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read API specification at {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse API specification {}", path.display()))
    }

    /// Declared base path, or the one shared by every operation path.
    pub fn base_path(&self) -> String {
        match &self.base_path {
            Some(declared) => normalize_path(declared),
            None => infer_base_path(self.operations.iter().map(|op| op.path.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Source location of the request body schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_response: Option<SuccessResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Routing decorator exported by `@nestjs/common`.
    pub fn decorator(self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Patch => "Patch",
            HttpMethod::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(alias = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    pub schema: ParameterSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    /// Parameter extraction decorator exported by `@nestjs/common`.
    pub fn decorator(self) -> &'static str {
        match self {
            ParameterLocation::Path => "Param",
            ParameterLocation::Query => "Query",
            ParameterLocation::Header => "Headers",
        }
    }
}

/// Either a reference to a registered schema or an inline primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSchema {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Primitive {
        #[serde(rename = "type")]
        primitive: PrimitiveKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Derived names
// ---------------------------------------------------------------------------

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn normalize_path(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    if joined.is_empty() {
        String::new()
    } else {
        format!("/{joined}")
    }
}

/// Longest run of leading path segments shared by every path.
///
/// ```
/// use schemaforge_codegen::operations::infer_base_path;
///
/// assert_eq!(infer_base_path(["/cars", "/cars/{id}", "/cars/{id}/archive"]), "/cars");
/// ```
pub fn infer_base_path<'p>(paths: impl IntoIterator<Item = &'p str>) -> String {
    let mut common: Option<Vec<&str>> = None;
    for path in paths {
        let parts: Vec<&str> = segments(path).collect();
        common = Some(match common {
            None => parts,
            Some(prefix) => prefix
                .into_iter()
                .zip(parts)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    normalize_path(&common.unwrap_or_default().join("/"))
}

/// Handler method name: the operation id without the resource prefix,
/// decapitalized, letters only.
///
/// Returns `None` when nothing usable is left.
pub fn method_name(operation_id: &str, resource_name: &str) -> Option<String> {
    let prefix = resource_name.to_lower_camel_case();
    let stripped = match operation_id.get(..prefix.len()) {
        Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(&prefix) => {
            &operation_id[prefix.len()..]
        }
        _ => operation_id,
    };
    let candidate = NON_LETTERS.replace_all(&decapitalize(stripped), "").into_owned();
    let name = if candidate.is_empty() {
        NON_LETTERS
            .replace_all(&decapitalize(operation_id), "")
            .into_owned()
    } else {
        decapitalize(&candidate)
    };
    (!name.is_empty()).then_some(name)
}

/// Route of an operation below the controller's base path, in the router's
/// `:param` notation and without a leading slash.
pub fn path_suffix(path: &str, base_path: &str) -> String {
    let path_parts: Vec<&str> = segments(path).collect();
    let base_parts: Vec<&str> = segments(base_path).collect();
    let rest = if path_parts.starts_with(&base_parts) {
        &path_parts[base_parts.len()..]
    } else {
        &path_parts[..]
    };
    PATH_TEMPLATE
        .replace_all(&rest.join("/"), ":$1")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_archive_operation_names() {
        assert_eq!(method_name("carArchive", "Car").as_deref(), Some("archive"));
        assert_eq!(path_suffix("/cars/{id}/archive", "/cars"), ":id/archive");
    }

    #[test]
    fn test_method_name_strips_non_letters() {
        assert_eq!(method_name("car_find_by_id2", "car").as_deref(), Some("findbyid"));
        assert_eq!(method_name("CarGetV2", "Car").as_deref(), Some("getV"));
    }

    #[test]
    fn test_method_name_keeps_unprefixed_ids() {
        assert_eq!(method_name("listVehicles", "Car").as_deref(), Some("listVehicles"));
        assert_eq!(method_name("car", "Car").as_deref(), Some("car"));
        assert_eq!(method_name("42", "Car"), None);
    }

    #[test]
    fn test_multi_word_resource_prefix() {
        assert_eq!(
            method_name("fleetVehicleRetire", "FleetVehicle").as_deref(),
            Some("retire")
        );
    }

    #[test]
    fn test_path_suffix_at_base() {
        assert_eq!(path_suffix("/cars", "/cars"), "");
        assert_eq!(path_suffix("/cars/", "/cars"), "");
        assert_eq!(path_suffix("/cars/{carId}", "/cars/"), ":carId");
    }

    #[test]
    fn test_path_suffix_outside_base() {
        assert_eq!(path_suffix("/health", "/cars"), "health");
        // segment-wise, so /carsales is not below /cars
        assert_eq!(path_suffix("/carsales/{id}", "/cars"), "carsales/:id");
    }

    #[test]
    fn test_infer_base_path() {
        assert_eq!(infer_base_path(["/v1/cars/{id}", "/v1/cars"]), "/v1/cars");
        assert_eq!(infer_base_path(["/{tenant}/cars/{id}", "/{tenant}/cars"]), "/{tenant}/cars");
        assert_eq!(infer_base_path(["/cars/{id}/archive"]), "/cars/{id}/archive");
        assert_eq!(infer_base_path(["/cars", "/owners"]), "");
        assert_eq!(infer_base_path(std::iter::empty::<&str>()), "");
    }

    #[test]
    fn test_declared_base_path_is_normalized() {
        let api = ApiSpecification {
            title: "Cars".to_string(),
            resource_name: "Car".to_string(),
            base_path: Some("cars/".to_string()),
            operations: Vec::new(),
        };
        assert_eq!(api.base_path(), "/cars");
    }

    #[test]
    fn test_deserialize_operation() {
        let op: Operation = serde_json::from_str(
            r##"{
                "operationId": "carList",
                "method": "get",
                "path": "/cars",
                "parameters": [
                    { "name": "limit", "in": "query", "schema": { "type": "integer" } },
                    { "name": "owner", "location": "query", "required": true,
                      "schema": { "$ref": "file:///schemas/entities/owner.json" } }
                ],
                "successResponse": { "statusCode": 200 }
            }"##,
        )
        .unwrap();

        assert_eq!(op.method, HttpMethod::Get);
        assert_eq!(op.parameters.len(), 2);
        assert!(!op.parameters[0].required);
        assert_eq!(
            op.parameters[0].schema,
            ParameterSchema::Primitive {
                primitive: PrimitiveKind::Integer
            }
        );
        assert_eq!(op.parameters[1].location, ParameterLocation::Query);
        assert_eq!(op.success_response.unwrap().schema_ref, None);
    }
}
