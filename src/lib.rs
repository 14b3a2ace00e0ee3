//! # rules-console: headless administration for a rules backend
//!
//! Client-side logic of an administrative console for a customer
//! classification rules service and its parametric reference tables
//! (UIT values, process types, contracting objects, amount operators,
//! sub-descriptions and contracting caps).
//!
//! ## Features
//!
//! - **Metadata-driven forms**: field descriptors generated from backend
//!   metadata, validated by [`forms::DynamicForm`]
//! - **Backend façade**: typed REST clients with documented fallbacks when the
//!   backend is unreachable
//! - **Rule authoring**: templates and a condition/action builder that emits
//!   rule text
//! - **Simulation**: local classifier, random customers and saved scenarios
//! - **Stub backend**: an in-memory axum server exposing the same endpoints
//!
//! ## Example: generating a form
//!
//! ```no_run
//! use rules_console::forms::{DynamicForm, FieldGenerator};
//! use rules_console::metadata::ParametricaMetadata;
//!
//! let metadata = ParametricaMetadata::with_fields(["codigo", "nombre"]);
//! let fields = FieldGenerator::new().generate("tipo_proceso", Some(&metadata));
//! let form = DynamicForm::new(fields).unwrap();
//! println!("{}", form.title());
//! ```

// Data model
pub mod entity;
pub mod metadata;
pub mod parametricas;

// Forms and their generation from metadata
pub mod forms;

// Backend access
pub mod client;
pub mod config;

// Domain logic
pub mod rules;
pub mod simulation;
pub mod topes;

// Notifications and screen state
pub mod notify;
pub mod screens;

// In-memory backend
pub mod stub;

// Re-export key types
pub use client::{ApiError, ApiResult, Backend};
pub use config::{ConfigError, ConsoleConfig};
pub use entity::{EntityError, EntityRecord, FieldValue};
pub use metadata::{Catalog, FieldKind, ParametricaMetadata};
pub use notify::{Notification, NotificationQueue, Notifier, TracingNotifier};
pub use parametricas::{EvaluationRequest, EvaluationResult, ParametricKind, VigentesSnapshot};
