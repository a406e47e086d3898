use std::sync::Arc;

use edumanage_models::{
    Actor, ActorId, ExtensionId, ProfileHistory, ProfileRole, ProvisionedProfile, RoleExtension,
    RoleProfile,
};
use tracing::{info, instrument};

use crate::store::ProfileStore;
use crate::utils::errors::ProfileError;

/// Explicit lifecycle transitions of role profiles.
///
/// ```text
/// None ──ensure_profile──▶ Student | Teacher | Staff | Admin
///   X  ──switch_role────▶ Y   (extensions of X are kept)
/// ```
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Parses a role name, reporting failures as a rejected transition.
    pub fn parse_role(
        name: &str,
        from: Option<ProfileRole>,
    ) -> Result<ProfileRole, ProfileError> {
        name.parse().map_err(|_| ProfileError::InvalidTransition {
            from,
            requested: name.to_string(),
        })
    }

    /// Creates the actor's profile and matching extension if absent.
    ///
    /// Calling again with the held role returns the existing rows. Asking for
    /// a different role than the one held is a [`ProfileError::RoleConflict`].
    #[instrument(skip(self))]
    pub async fn ensure_profile(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> Result<ProvisionedProfile, ProfileError> {
        let outcome = self.store.provision(actor, role).await?;

        if outcome.profile.role != role {
            return Err(ProfileError::RoleConflict {
                actor,
                current: outcome.profile.role,
                requested: role,
            });
        }

        if outcome.changed {
            info!(
                %actor,
                %role,
                business_id = outcome.extension.as_ref().map(|e| e.business_id.as_str()),
                "role profile created"
            );
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn ensure_profile_named(
        &self,
        actor: ActorId,
        role: &str,
    ) -> Result<ProvisionedProfile, ProfileError> {
        let from = self.current_role(actor).await?;
        let role = Self::parse_role(role, from)?;
        self.ensure_profile(actor, role).await
    }

    /// Moves an existing profile to `role`, creating the extension for the
    /// new role if needed. Switching to the held role changes nothing.
    #[instrument(skip(self))]
    pub async fn switch_role(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> Result<ProvisionedProfile, ProfileError> {
        let Some(outcome) = self.store.switch_role(actor, role).await? else {
            if self.store.find_actor(actor).await?.is_none() {
                return Err(ProfileError::UnknownActor(actor));
            }
            return Err(ProfileError::InvalidTransition {
                from: None,
                requested: role.to_string(),
            });
        };

        if outcome.changed {
            info!(%actor, %role, "role switched");
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn switch_role_named(
        &self,
        actor: ActorId,
        role: &str,
    ) -> Result<ProvisionedProfile, ProfileError> {
        let from = self.current_role(actor).await?;
        let role = Self::parse_role(role, from)?;
        self.switch_role(actor, role).await
    }

    pub async fn profile(&self, actor: ActorId) -> Result<Option<RoleProfile>, ProfileError> {
        Ok(self.store.find_profile(actor).await?)
    }

    /// Current profile plus every extension ever created for the actor.
    #[instrument(skip(self))]
    pub async fn history(&self, actor: ActorId) -> Result<ProfileHistory, ProfileError> {
        let profile = self.store.find_profile(actor).await?;
        let extensions = self.store.list_extensions(actor).await?;
        Ok(ProfileHistory {
            profile,
            extensions,
        })
    }

    pub async fn extension(&self, id: ExtensionId) -> Result<Option<RoleExtension>, ProfileError> {
        Ok(self.store.find_extension_by_id(id).await?)
    }

    /// Loads an actor with flags and profile, ready for classification.
    pub async fn load_actor(&self, actor: ActorId) -> Result<Actor, ProfileError> {
        self.store
            .find_actor(actor)
            .await?
            .ok_or(ProfileError::UnknownActor(actor))
    }

    async fn current_role(&self, actor: ActorId) -> Result<Option<ProfileRole>, ProfileError> {
        Ok(self.store.find_profile(actor).await?.map(|p| p.role))
    }
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}
