//! Access policy engine.
//!
//! An access question flows through four pieces: the [`RoleClassifier`]
//! reduces an actor to one [`Role`](edumanage_models::Role), the
//! [`PolicyTable`] maps `(role, class, action)` to a [`Decision`], and, only
//! when that decision depends on the record, the [`RelationshipResolver`]
//! supplies the ids the actor owns or is related to. [`PolicyEvaluator`] ties
//! them together for single-record checks and collection scopes.

pub mod classifier;
pub mod evaluator;
pub mod predicate;
pub mod resolver;
pub mod table;

pub use classifier::{RoleClassifier, classify_role};
pub use evaluator::{AccessDecision, DecisionReason, PolicyEvaluator};
pub use predicate::{Predicate, RelatedIds, ScopeKey};
pub use resolver::RelationshipResolver;
pub use table::{Decision, PolicyRule, PolicyTable};

/// `tracing` target of access decisions, e.g. `RUST_LOG=edumanage::audit=debug`.
pub const AUDIT_TARGET: &str = "edumanage::audit";
