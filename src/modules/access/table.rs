use std::collections::HashMap;
use std::fmt;

use edumanage_models::{Action, ResourceClass, Role};
use serde::Serialize;

use crate::utils::errors::PolicyTableError;

/// Verdict of the policy table for one `(role, class, action)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    /// Allowed when an ownership field of the record holds the actor's id.
    AllowIfOwner,
    /// Allowed when the record is among the actor's related ids.
    AllowIfRelated,
}

impl Decision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::AllowIfOwner => "allow_if_owner",
            Self::AllowIfRelated => "allow_if_related",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub role: Role,
    pub class: ResourceClass,
    pub action: Action,
    pub decision: Decision,
}

/// Closed-world table of access rules.
///
/// Any triple without a rule is [`Decision::Deny`]. Admins are allowed before
/// the table is consulted and unclassified actors are denied before it is
/// consulted, so neither role may appear in a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
    index: HashMap<(Role, ResourceClass, Action), Decision>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::school_defaults()
    }
}

impl PolicyTable {
    pub fn from_rules(rules: impl IntoIterator<Item = PolicyRule>) -> Result<Self, PolicyTableError> {
        let mut table = Self {
            rules: Vec::new(),
            index: HashMap::new(),
        };
        for rule in rules {
            if matches!(rule.role, Role::Admin | Role::Unclassified) {
                return Err(PolicyTableError::ReservedRole(rule.role));
            }
            let key = (rule.role, rule.class, rule.action);
            if table.index.insert(key, rule.decision).is_some() {
                return Err(PolicyTableError::DuplicateRule {
                    role: rule.role,
                    class: rule.class,
                    action: rule.action,
                });
            }
            table.rules.push(rule);
        }
        Ok(table)
    }

    /// The role matrix of the school backend.
    pub fn school_defaults() -> Self {
        let mut rules = Vec::new();
        for (role, grants) in [
            (Role::Student, defaults::STUDENT),
            (Role::Teacher, defaults::TEACHER),
            (Role::Staff, defaults::STAFF),
        ] {
            for (class, actions) in grants {
                for (action, decision) in *actions {
                    rules.push(PolicyRule {
                        role,
                        class: *class,
                        action: *action,
                        decision: *decision,
                    });
                }
            }
        }
        let index = rules
            .iter()
            .map(|r| ((r.role, r.class, r.action), r.decision))
            .collect();
        Self { rules, index }
    }

    /// Total lookup; absent triples are denied.
    pub fn lookup(&self, role: Role, class: ResourceClass, action: Action) -> Decision {
        self.index
            .get(&(role, class, action))
            .copied()
            .unwrap_or(Decision::Deny)
    }

    /// Rules in definition order, for audit.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn rules_for(&self, role: Role) -> impl Iterator<Item = &PolicyRule> + '_ {
        self.rules.iter().filter(move |rule| rule.role == role)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

mod defaults {
    use edumanage_models::Action::{self, *};
    use edumanage_models::ResourceClass as C;

    use super::Decision::{self, *};

    type Grants = &'static [(Action, Decision)];

    const READ_ONLY: Grants = &[(Read, Allow), (ReadCollection, Allow)];
    const FULL: Grants = &[
        (Create, Allow),
        (Read, Allow),
        (Update, Allow),
        (Delete, Allow),
        (ReadCollection, Allow),
    ];
    const OWN_READ: Grants = &[(Read, AllowIfOwner), (ReadCollection, AllowIfOwner)];
    const OWN_ACCOUNT: Grants = &[(Read, AllowIfOwner), (Update, AllowIfOwner)];
    const OWN_NOTIFICATIONS: Grants = &[
        (Read, AllowIfOwner),
        (ReadCollection, AllowIfOwner),
        (Update, AllowIfOwner),
    ];
    const OWN_MESSAGES: Grants = &[
        (Create, Allow),
        (Read, AllowIfOwner),
        (ReadCollection, AllowIfOwner),
        (Delete, AllowIfOwner),
    ];
    const OWN_LEAVE: Grants = &[
        (Create, Allow),
        (Read, AllowIfOwner),
        (ReadCollection, AllowIfOwner),
        (Update, AllowIfOwner),
    ];
    const AUTHORED: Grants = &[
        (Create, Allow),
        (Read, Allow),
        (ReadCollection, Allow),
        (Update, AllowIfOwner),
        (Delete, AllowIfOwner),
    ];
    const READ_AND_EDIT_OWN: Grants = &[
        (Read, Allow),
        (ReadCollection, Allow),
        (Update, AllowIfOwner),
    ];

    pub(super) const STUDENT: &[(C, Grants)] = &[
        (C::Account, OWN_ACCOUNT),
        (C::RoleProfile, OWN_READ),
        (
            C::Student,
            &[
                (Read, AllowIfOwner),
                (ReadCollection, AllowIfOwner),
                (Update, AllowIfOwner),
            ],
        ),
        (C::Course, &[(Read, Allow), (ReadCollection, AllowIfRelated)]),
        (C::Enrollment, OWN_READ),
        (C::Attendance, OWN_READ),
        (C::Exam, READ_ONLY),
        (C::ExamResult, OWN_READ),
        (C::Assignment, READ_ONLY),
        (
            C::Submission,
            &[
                (Create, Allow),
                (Read, AllowIfOwner),
                (ReadCollection, AllowIfOwner),
                (Update, AllowIfOwner),
            ],
        ),
        (C::Schedule, READ_ONLY),
        (C::Message, OWN_MESSAGES),
        (C::Notification, OWN_NOTIFICATIONS),
        (C::Announcement, READ_ONLY),
    ];

    pub(super) const TEACHER: &[(C, Grants)] = &[
        (C::Account, OWN_ACCOUNT),
        (C::RoleProfile, OWN_READ),
        (
            C::Student,
            &[(Read, AllowIfRelated), (ReadCollection, AllowIfRelated)],
        ),
        (C::Teacher, READ_AND_EDIT_OWN),
        (C::Staff, READ_ONLY),
        (
            C::Course,
            &[
                (Create, Allow),
                (Read, Allow),
                (ReadCollection, Allow),
                (Update, AllowIfRelated),
                (Delete, AllowIfRelated),
            ],
        ),
        (
            C::Enrollment,
            &[
                (Read, AllowIfRelated),
                (ReadCollection, AllowIfRelated),
                (Update, AllowIfRelated),
            ],
        ),
        (C::Attendance, FULL),
        (C::Exam, AUTHORED),
        (C::ExamResult, FULL),
        (C::Assignment, AUTHORED),
        (
            C::Submission,
            &[(Read, Allow), (ReadCollection, Allow), (Update, Allow)],
        ),
        (C::Schedule, READ_ONLY),
        (
            C::DisciplineRecord,
            &[
                (Create, Allow),
                (Read, Allow),
                (ReadCollection, Allow),
                (Update, AllowIfOwner),
            ],
        ),
        (
            C::BehaviorNote,
            &[
                (Create, Allow),
                (Read, AllowIfOwner),
                (ReadCollection, AllowIfOwner),
                (Update, AllowIfOwner),
                (Delete, AllowIfOwner),
            ],
        ),
        (C::Message, OWN_MESSAGES),
        (C::Notification, OWN_NOTIFICATIONS),
        (C::Announcement, AUTHORED),
        (C::LeaveRequest, OWN_LEAVE),
    ];

    pub(super) const STAFF: &[(C, Grants)] = &[
        (C::Account, OWN_ACCOUNT),
        (C::RoleProfile, OWN_READ),
        (C::Student, FULL),
        (C::Teacher, READ_ONLY),
        (C::Staff, READ_AND_EDIT_OWN),
        (C::Course, FULL),
        (C::Enrollment, FULL),
        (C::Attendance, FULL),
        (C::Exam, FULL),
        (C::ExamResult, FULL),
        (C::Assignment, READ_ONLY),
        (C::Submission, READ_ONLY),
        (C::Schedule, FULL),
        (C::DisciplineRecord, FULL),
        (C::BehaviorNote, FULL),
        (C::Message, OWN_MESSAGES),
        (C::Notification, OWN_NOTIFICATIONS),
        (C::Announcement, FULL),
        (C::LeaveRequest, OWN_LEAVE),
    ];
}
