//! Resource classes, actions and resource instances.
//!
//! A resource class is one of the closed set of record types the school
//! backend exposes. Classes that carry a direct owner reference declare the
//! columns holding it and what those columns point at, so the engine and the
//! query layer agree on which value identifies the owner.

use crate::ids::ResourceId;
use crate::roles::ExtensionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A resource class or action name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownName {
    #[error("unknown resource class '{0}'")]
    ResourceClass(String),
    #[error("unknown action '{0}'")]
    Action(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Account,
    RoleProfile,
    Student,
    Teacher,
    Staff,
    Course,
    Enrollment,
    Attendance,
    Exam,
    ExamResult,
    Assignment,
    Submission,
    Schedule,
    DisciplineRecord,
    BehaviorNote,
    Message,
    Notification,
    Announcement,
    LeaveRequest,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 19] = [
        Self::Account,
        Self::RoleProfile,
        Self::Student,
        Self::Teacher,
        Self::Staff,
        Self::Course,
        Self::Enrollment,
        Self::Attendance,
        Self::Exam,
        Self::ExamResult,
        Self::Assignment,
        Self::Submission,
        Self::Schedule,
        Self::DisciplineRecord,
        Self::BehaviorNote,
        Self::Message,
        Self::Notification,
        Self::Announcement,
        Self::LeaveRequest,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::RoleProfile => "role_profile",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
            Self::Course => "course",
            Self::Enrollment => "enrollment",
            Self::Attendance => "attendance",
            Self::Exam => "exam",
            Self::ExamResult => "exam_result",
            Self::Assignment => "assignment",
            Self::Submission => "submission",
            Self::Schedule => "schedule",
            Self::DisciplineRecord => "discipline_record",
            Self::BehaviorNote => "behavior_note",
            Self::Message => "message",
            Self::Notification => "notification",
            Self::Announcement => "announcement",
            Self::LeaveRequest => "leave_request",
        }
    }

    /// Columns holding the owner of a record.
    ///
    /// A record is owned by an actor when any of these columns holds the
    /// actor's identity for this class (see [`owner_ref`](Self::owner_ref)).
    /// An empty slice means the class has no ownership edge.
    pub const fn ownership_fields(self) -> &'static [&'static str] {
        match self {
            Self::Account => &["id"],
            Self::RoleProfile | Self::Student | Self::Teacher | Self::Staff => &["actor_id"],
            Self::Notification => &["user_id"],
            Self::Enrollment | Self::Attendance | Self::ExamResult | Self::Submission => {
                &["student_id"]
            }
            Self::Announcement => &["author_id"],
            Self::Message => &["sender_id", "recipient_id"],
            Self::LeaveRequest => &["requested_by_id"],
            Self::DisciplineRecord => &["reported_by_id"],
            Self::BehaviorNote => &["noted_by_id"],
            Self::Exam | Self::Assignment => &["created_by_id"],
            Self::Course | Self::Schedule => &[],
        }
    }

    /// What the ownership columns of this class reference.
    ///
    /// `student_id` on an enrollment is a student extension id, not an
    /// actor id, so owning such a record means holding that extension.
    pub const fn owner_ref(self) -> Option<OwnerRef> {
        match self {
            Self::Enrollment | Self::ExamResult | Self::Submission => {
                Some(OwnerRef::Extension(ExtensionKind::Student))
            }
            Self::Exam | Self::Assignment => Some(OwnerRef::Extension(ExtensionKind::Teacher)),
            Self::Course | Self::Schedule => None,
            _ => Some(OwnerRef::Actor),
        }
    }

    pub const fn has_owner(self) -> bool {
        !self.ownership_fields().is_empty()
    }
}

/// Target of a class's ownership columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    /// The column holds an actor id.
    Actor,
    /// The column holds the id of the actor's extension of this kind.
    Extension(ExtensionKind),
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceClass {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == wanted)
            .ok_or_else(|| UnknownName::ResourceClass(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    ReadCollection,
    /// Privileged operations such as switching an actor's role.
    Administer,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::ReadCollection,
        Self::Administer,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ReadCollection => "read_collection",
            Self::Administer => "administer",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| UnknownName::Action(s.to_string()))
    }
}

/// A resource instance the engine can make a decision about.
///
/// Domain records implement this so callers can hand them to the evaluator
/// directly. [`ResourceRef`] is a ready-made implementation.
pub trait Resource {
    fn resource_class(&self) -> ResourceClass;

    fn resource_id(&self) -> ResourceId;

    /// Value of the named ownership column, if the record has one set.
    fn owner_field(&self, field: &str) -> Option<ResourceId>;
}

/// Minimal description of a resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub class: ResourceClass,
    pub id: ResourceId,
    pub owners: Vec<(&'static str, ResourceId)>,
}

impl ResourceRef {
    pub fn new(class: ResourceClass, id: impl Into<ResourceId>) -> Self {
        Self {
            class,
            id: id.into(),
            owners: Vec::new(),
        }
    }

    /// Sets an ownership column. Columns the class does not declare are
    /// ignored by the engine.
    pub fn with_owner(mut self, field: &'static str, owner: impl Into<ResourceId>) -> Self {
        self.owners.retain(|(name, _)| *name != field);
        self.owners.push((field, owner.into()));
        self
    }
}

impl Resource for ResourceRef {
    fn resource_class(&self) -> ResourceClass {
        self.class
    }

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn owner_field(&self, field: &str) -> Option<ResourceId> {
        self.owners
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, owner)| *owner)
    }
}
