use std::sync::Arc;

use edumanage::{InMemoryPolicyStore, PolicyEvaluator, ProfileService, RelationshipStore};
use edumanage_models::{
    Actor, ActorId, OwnerRef, ProfileRole, ResourceClass, ResourceId, RoleExtension,
};

/// An in-memory school with the engine wired on top.
#[allow(dead_code)]
pub struct TestSchool {
    pub store: Arc<InMemoryPolicyStore>,
    pub evaluator: PolicyEvaluator,
    pub profiles: ProfileService,
}

#[allow(dead_code)]
pub struct TestMember {
    pub actor: Actor,
    pub extension: Option<RoleExtension>,
}

#[allow(dead_code)]
impl TestMember {
    /// Extension id; panics for admins.
    pub fn ext(&self) -> edumanage_models::ExtensionId {
        self.extension
            .as_ref()
            .map(|e| e.id)
            .expect("member has no extension")
    }
}

pub fn create_test_school() -> TestSchool {
    let store = Arc::new(InMemoryPolicyStore::new());
    TestSchool {
        evaluator: PolicyEvaluator::new(store.clone()),
        profiles: ProfileService::new(store.clone()),
        store,
    }
}

#[allow(dead_code)]
impl TestSchool {
    /// Registers an account without a profile.
    pub async fn create_actor(&self) -> Actor {
        let actor = Actor::new(ActorId::new());
        self.store.register_actor(&actor).await;
        actor
    }

    pub async fn create_superuser(&self) -> Actor {
        let actor = Actor::superuser(ActorId::new());
        self.store.register_actor(&actor).await;
        actor
    }

    /// Registers an account and provisions `role` for it.
    pub async fn create_member(&self, role: ProfileRole) -> TestMember {
        let actor = self.create_actor().await;
        let provisioned = self
            .profiles
            .ensure_profile(actor.id, role)
            .await
            .unwrap();
        TestMember {
            actor: self.reload(actor.id).await,
            extension: provisioned.extension,
        }
    }

    pub async fn reload(&self, actor: ActorId) -> Actor {
        self.profiles.load_actor(actor).await.unwrap()
    }

    /// Value `class`'s ownership columns hold for records `actor` owns.
    pub async fn owner_value(&self, actor: ActorId, class: ResourceClass) -> Option<ResourceId> {
        match class.owner_ref()? {
            OwnerRef::Actor => Some(actor.into()),
            OwnerRef::Extension(kind) => self
                .store
                .find_extension(actor, kind)
                .await
                .unwrap()
                .map(|ext| ext.id.into()),
        }
    }

    /// The actor id plus every extension id the actor has held.
    pub async fn identities(&self, actor: ActorId) -> Vec<ResourceId> {
        let history = self.profiles.history(actor).await.unwrap();
        let mut ids = vec![ResourceId::from(actor)];
        ids.extend(history.extensions.iter().map(|ext| ResourceId::from(ext.id)));
        ids
    }
}
