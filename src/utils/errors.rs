//! Error types of the policy engine.
//!
//! "Access denied" is never an error here: it is an ordinary
//! [`AccessDecision`](crate::modules::access::AccessDecision) or an empty
//! [`Predicate`](crate::modules::access::Predicate). These types cover storage
//! failures and rejected lifecycle transitions only.

use edumanage_models::{ActorId, ProfileRole, ResourceClass, Role};

/// Failure reported by a relationship or profile store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("actor {0} does not exist")]
    UnknownActor(ActorId),

    #[error("stored data is inconsistent: {0}")]
    Inconsistent(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure while evaluating a decision or compiling a scope.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to resolve {class} relations for {role} {actor}: {source}")]
    Relationship {
        actor: ActorId,
        role: Role,
        class: ResourceClass,
        #[source]
        source: StoreError,
    },
}

/// Rejected or failed profile lifecycle operation.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Unknown role name, or a role switch for an actor without a profile.
    #[error("invalid role transition from {} to '{requested}'", describe(.from))]
    InvalidTransition {
        from: Option<ProfileRole>,
        requested: String,
    },

    /// Provisioning asked for a role other than the one already held.
    /// Roles only change through an explicit switch.
    #[error("actor {actor} already holds role {current}, cannot provision {requested}")]
    RoleConflict {
        actor: ActorId,
        current: ProfileRole,
        requested: ProfileRole,
    },

    #[error("actor {0} does not exist")]
    UnknownActor(ActorId),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ProfileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownActor(actor) => ProfileError::UnknownActor(actor),
            other => ProfileError::Store(other),
        }
    }
}

/// Invalid policy table definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyTableError {
    #[error("duplicate rule for ({role}, {class}, {action})")]
    DuplicateRule {
        role: Role,
        class: ResourceClass,
        action: edumanage_models::Action,
    },

    /// Admin bypasses the table and unclassified actors never reach it, so
    /// rows for either role would never be consulted.
    #[error("rules for role {0} are never consulted")]
    ReservedRole(Role),
}

fn describe(role: &Option<ProfileRole>) -> String {
    match role {
        Some(role) => role.to_string(),
        None => "no profile".to_string(),
    }
}
