use std::fmt;
use std::sync::Arc;

use edumanage_config::PolicyConfig;
use edumanage_models::{Action, Actor, ActorId, Resource, ResourceClass, ResourceRef, Role};
use serde::Serialize;
use tracing::{debug, info};

use super::AUDIT_TARGET;
use super::classifier::RoleClassifier;
use super::predicate::{Predicate, RelatedIds};
use super::resolver::RelationshipResolver;
use super::table::{Decision, PolicyTable};
use crate::store::RelationshipStore;
use crate::utils::errors::{PolicyError, StoreError};

/// Why a decision came out the way it did.
///
/// Admin allowances are reported as [`RoleAllow`](Self::RoleAllow) with
/// `role: Admin`. A failed owner or relation check is a
/// [`TableDeny`](Self::TableDeny): the table rule did not admit the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    RoleAllow,
    OwnerAllow,
    RelationAllow,
    TableDeny,
    UnclassifiedDeny,
}

impl DecisionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoleAllow => "role_allow",
            Self::OwnerAllow => "owner_allow",
            Self::RelationAllow => "relation_allow",
            Self::TableDeny => "table_deny",
            Self::UnclassifiedDeny => "unclassified_deny",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
    /// Role the actor was classified as.
    pub role: Role,
}

impl AccessDecision {
    fn allow(role: Role, reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
            role,
        }
    }

    fn deny(role: Role, reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
            role,
        }
    }
}

/// Answers instance checks and compiles collection scopes.
///
/// Both paths read the same table entry and the same related-id set, so a
/// record passes [`can`](Self::can) exactly when it matches the predicate
/// returned by [`scope`](Self::scope). The evaluator holds no mutable state
/// and is cheap to clone.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    classifier: RoleClassifier,
    table: Arc<PolicyTable>,
    resolver: RelationshipResolver,
}

impl PolicyEvaluator {
    /// Evaluator over the school's default table.
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self {
            classifier: RoleClassifier::default(),
            table: Arc::new(PolicyTable::school_defaults()),
            resolver: RelationshipResolver::new(store),
        }
    }

    pub fn with_config(store: Arc<dyn RelationshipStore>, config: &PolicyConfig) -> Self {
        Self::new(store).with_classifier(RoleClassifier::new(config))
    }

    pub fn with_table(mut self, table: PolicyTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    pub fn with_classifier(mut self, classifier: RoleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classify(&self, actor: &Actor) -> Role {
        self.classifier.classify(actor)
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Related ids for the actor's classified role.
    pub async fn related_ids(
        &self,
        actor: &Actor,
        class: ResourceClass,
    ) -> Result<RelatedIds, PolicyError> {
        let role = self.classify(actor);
        self.resolve(actor.id, role, class).await
    }

    /// Decides whether `actor` may perform `action` on one record.
    pub async fn can<R>(
        &self,
        actor: &Actor,
        action: Action,
        resource: &R,
    ) -> Result<AccessDecision, PolicyError>
    where
        R: Resource + Sync + ?Sized,
    {
        let class = resource.resource_class();
        let role = self.classify(actor);

        let decision = match role {
            Role::Admin => AccessDecision::allow(role, DecisionReason::RoleAllow),
            Role::Unclassified => AccessDecision::deny(role, DecisionReason::UnclassifiedDeny),
            _ => match self.table.lookup(role, class, action) {
                Decision::Allow => AccessDecision::allow(role, DecisionReason::RoleAllow),
                Decision::Deny => AccessDecision::deny(role, DecisionReason::TableDeny),
                Decision::AllowIfOwner => {
                    let owned = self.resolve_owned(actor.id, role, class).await?;
                    if owned.contains(resource) {
                        AccessDecision::allow(role, DecisionReason::OwnerAllow)
                    } else {
                        AccessDecision::deny(role, DecisionReason::TableDeny)
                    }
                }
                Decision::AllowIfRelated => {
                    let related = self.resolve(actor.id, role, class).await?;
                    if related.contains(resource) {
                        AccessDecision::allow(role, DecisionReason::RelationAllow)
                    } else {
                        AccessDecision::deny(role, DecisionReason::TableDeny)
                    }
                }
            },
        };

        audit(actor.id, class, action, &decision);
        Ok(decision)
    }

    /// Compiles the filter for collection reads of `class`.
    pub async fn scope(
        &self,
        actor: &Actor,
        action: Action,
        class: ResourceClass,
    ) -> Result<Predicate, PolicyError> {
        let role = self.classify(actor);

        let (predicate, reason) = match role {
            Role::Admin => (Predicate::MatchAll, DecisionReason::RoleAllow),
            Role::Unclassified => (Predicate::MatchNone, DecisionReason::UnclassifiedDeny),
            _ => match self.table.lookup(role, class, action) {
                Decision::Allow => (Predicate::MatchAll, DecisionReason::RoleAllow),
                Decision::Deny => (Predicate::MatchNone, DecisionReason::TableDeny),
                Decision::AllowIfOwner => {
                    let owned = self.resolve_owned(actor.id, role, class).await?;
                    (Predicate::from_related(owned), DecisionReason::OwnerAllow)
                }
                Decision::AllowIfRelated => {
                    let related = self.resolve(actor.id, role, class).await?;
                    (Predicate::from_related(related), DecisionReason::RelationAllow)
                }
            },
        };

        debug!(
            target: AUDIT_TARGET,
            actor = %actor.id,
            %role,
            %class,
            %action,
            %reason,
            matches_nothing = predicate.matches_nothing(),
            "scope compiled"
        );
        Ok(predicate)
    }

    /// Whether `actor` may change the role profile of `target`.
    ///
    /// No default rule grants [`Action::Administer`], so this holds for admins
    /// only unless a custom table says otherwise.
    pub async fn can_administer(
        &self,
        actor: &Actor,
        target: ActorId,
    ) -> Result<AccessDecision, PolicyError> {
        let profile =
            ResourceRef::new(ResourceClass::RoleProfile, target).with_owner("actor_id", target);
        self.can(actor, Action::Administer, &profile).await
    }

    async fn resolve(
        &self,
        actor: ActorId,
        role: Role,
        class: ResourceClass,
    ) -> Result<RelatedIds, PolicyError> {
        self.resolver
            .related_ids(actor, role, class)
            .await
            .map_err(relationship_error(actor, role, class))
    }

    async fn resolve_owned(
        &self,
        actor: ActorId,
        role: Role,
        class: ResourceClass,
    ) -> Result<RelatedIds, PolicyError> {
        self.resolver
            .owned_ids(actor, class)
            .await
            .map_err(relationship_error(actor, role, class))
    }
}

fn relationship_error(
    actor: ActorId,
    role: Role,
    class: ResourceClass,
) -> impl FnOnce(StoreError) -> PolicyError {
    move |source| PolicyError::Relationship {
        actor,
        role,
        class,
        source,
    }
}

fn audit(actor: ActorId, class: ResourceClass, action: Action, decision: &AccessDecision) {
    let role = decision.role;
    let reason = decision.reason;
    if reason == DecisionReason::UnclassifiedDeny {
        info!(
            target: AUDIT_TARGET,
            %actor, %role, %class, %action,
            allowed = decision.allowed,
            %reason,
            "access denied to unclassified actor"
        );
    } else {
        debug!(
            target: AUDIT_TARGET,
            %actor, %role, %class, %action,
            allowed = decision.allowed,
            %reason,
            "access decision"
        );
    }
}
