//! Renderer variants.
//!
//! Each variant is a [`RenderHooks`](crate::engine::RenderHooks) value; the
//! engine and the decorator machinery are shared.

pub mod expectations;
pub mod factories;
pub mod model;

pub use expectations::{ExpectationHooks, ExpectationKind};
pub use factories::FactoryHooks;
pub use model::ModelClassHooks;
