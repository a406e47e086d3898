//! # EduManage Models
//!
//! Domain types shared by the access policy engine, its stores and the CLI.
//!
//! # Modules
//!
//! - [`ids`]: strongly-typed `Uuid` newtypes
//! - [`roles`]: stored profile roles, classified roles, extension kinds
//! - [`resources`]: resource classes, actions and the [`Resource`] trait
//! - [`actors`]: actors, role profiles and role extensions
//! - [`courses`]: courses and enrollments
//!
//! # Example
//!
//! ```ignore
//! use edumanage_models::{Actor, ActorId, ResourceClass, ResourceRef};
//!
//! let actor = Actor::new(ActorId::new());
//! let message = ResourceRef::new(ResourceClass::Message, message_id)
//!     .with_owner("sender_id", actor.id);
//! ```

pub mod actors;
pub mod courses;
pub mod ids;
pub mod resources;
pub mod roles;

pub use actors::{Actor, ProfileHistory, ProvisionedProfile, RoleExtension, RoleProfile};
pub use courses::{Course, Enrollment};
pub use ids::{ActorId, CourseId, EnrollmentId, ExtensionId, ResourceId};
pub use resources::{Action, OwnerRef, Resource, ResourceClass, ResourceRef, UnknownName};
pub use roles::{ExtensionKind, ProfileRole, Role, UnknownRole};
