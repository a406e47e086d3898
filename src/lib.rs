//! # EduManage Access Policy Engine
//!
//! Role-based, relationship-aware authorization for the EduManage school
//! backend. Given an authenticated actor, an action and a resource, the engine
//! decides whether the action is permitted, and for collection reads it
//! compiles a predicate the query layer applies to its own query.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── modules/
//! │   ├── access/      # Classifier, policy table, resolver, evaluator
//! │   └── profiles/    # Role profile lifecycle
//! ├── store/           # Storage ports, Postgres and in-memory stores
//! └── utils/           # Error types
//! ```
//!
//! Shared domain types live in `edumanage-models`; configuration in
//! `edumanage-config`.
//!
//! ## Decision flow
//!
//! ```text
//! actor ──classify──▶ Role
//!   Admin         → allow / match all
//!   Unclassified  → deny  / match none
//!   otherwise     → PolicyTable::lookup(role, class, action)
//!                     Allow          → allow / match all
//!                     Deny           → deny  / match none
//!                     AllowIfOwner   → ownership field == actor
//!                     AllowIfRelated → key ∈ RelationshipResolver::related_ids
//! ```
//!
//! "No" is a value ([`AccessDecision`] with `allowed == false`, or
//! [`Predicate::MatchNone`]), never an error.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edumanage::{InMemoryPolicyStore, PolicyEvaluator};
//! use edumanage_models::{Action, ResourceClass};
//!
//! let store = Arc::new(InMemoryPolicyStore::new());
//! let evaluator = PolicyEvaluator::new(store);
//! let scope = evaluator
//!     .scope(&actor, Action::ReadCollection, ResourceClass::Student)
//!     .await?;
//! ```

pub mod modules;
pub mod store;
pub mod utils;

pub use modules::access::{
    AUDIT_TARGET, AccessDecision, Decision, DecisionReason, PolicyEvaluator, PolicyRule,
    PolicyTable, Predicate, RelatedIds, RelationshipResolver, RoleClassifier, ScopeKey,
    classify_role,
};
pub use modules::profiles::ProfileService;
pub use store::{InMemoryPolicyStore, PgPolicyStore, ProfileStore, RelationshipStore, push_scope};
pub use utils::errors::{PolicyError, PolicyTableError, ProfileError, StoreError};
