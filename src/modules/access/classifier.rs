use edumanage_config::PolicyConfig;
use edumanage_models::{Actor, Role};

/// Derives one canonical [`Role`] from an actor's flags and profile.
///
/// Pure: reads only the actor value it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleClassifier {
    staff_flag_is_admin: bool,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

impl RoleClassifier {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            staff_flag_is_admin: config.staff_flag_is_admin,
        }
    }

    pub fn classify(&self, actor: &Actor) -> Role {
        if actor.is_superuser {
            return Role::Admin;
        }
        if actor.is_staff_flag && self.staff_flag_is_admin {
            return Role::Admin;
        }
        match &actor.profile {
            Some(profile) => profile.role.into(),
            None => Role::Unclassified,
        }
    }
}

/// Classifies with the default configuration.
pub fn classify_role(actor: &Actor) -> Role {
    RoleClassifier::default().classify(actor)
}
