//! Rule authoring: stored rule records, the visual builder and its templates.

pub mod builder;
pub mod model;
pub mod templates;

pub use builder::{action_placeholder, Condition, Connector, RuleAction, RuleBuilder};
pub use model::{RuleDraft, RuleRecord};
pub use templates::{builder_template, default_rules, drl_template, RuleTemplate, TEMPLATE_KEYS};
