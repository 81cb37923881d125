//! Template-driven generators that work beside the type-graph passes.
//!
//! The controller contract is not derived from the type graph. It reads a
//! parsed HTTP operation model and resolves the schemas it mentions through
//! the registry of an earlier model pass.

pub mod controller;
pub mod operations;

pub use controller::{
    decoration_function_name, interface_name, render_contract, ControllerContract,
};
pub use operations::{
    infer_base_path, method_name, path_suffix, ApiSpecification, HttpMethod, Operation, Parameter,
    ParameterLocation, ParameterSchema, SuccessResponse,
};
