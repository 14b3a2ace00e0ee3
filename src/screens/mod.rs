//! Headless view state for each console page.
//!
//! A screen owns what its page shows (records, the open form, the last
//! result) and reports every outcome through its [`Notifier`](crate::notify::Notifier).
//! Mutations are followed by a refetch; nothing is patched locally.

pub mod entities;
pub mod evaluator;
pub mod rules;
pub mod simulator;
pub mod topes;

// Re-export key types
pub use entities::EntityScreen;
pub use evaluator::EvaluatorScreen;
pub use rules::RulesScreen;
pub use simulator::SimulatorScreen;
pub use topes::TopesScreen;
