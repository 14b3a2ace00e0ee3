//! Metadata-driven forms.
//!
//! [`FieldGenerator`] turns catalog metadata into ordered, sectioned
//! [`FieldDescriptor`]s; [`DynamicForm`] binds them to live controls with
//! validation rules and produces the submitted payload.

pub mod descriptor;
pub mod form;
pub mod generator;
pub mod policy;

// Re-export key types
pub use descriptor::{FieldDescriptor, FieldWidth};
pub use form::{DynamicForm, FormError, ValidationError};
pub use generator::{default_options, generate, preset_constraints, FieldGenerator};
pub use policy::NamingPolicy;
