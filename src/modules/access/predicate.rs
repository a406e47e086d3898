use std::collections::BTreeSet;
use std::sync::Arc;

use edumanage_models::{Resource, ResourceClass, ResourceId};

/// Which field of a record a set of related ids is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKey {
    /// The record's own id.
    Id,
    /// Any of the listed ownership fields.
    Owner(&'static [&'static str]),
}

impl ScopeKey {
    fn matches<R: Resource + ?Sized>(&self, resource: &R, ids: &BTreeSet<ResourceId>) -> bool {
        match self {
            ScopeKey::Id => ids.contains(&resource.resource_id()),
            ScopeKey::Owner(fields) => fields.iter().any(|field| {
                resource
                    .owner_field(field)
                    .is_some_and(|owner| ids.contains(&owner))
            }),
        }
    }
}

/// Resource ids an actor is related to for one resource class.
///
/// An empty set means "no related records", never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedIds {
    pub key: ScopeKey,
    pub ids: BTreeSet<ResourceId>,
}

impl RelatedIds {
    pub fn none() -> Self {
        Self {
            key: ScopeKey::Id,
            ids: BTreeSet::new(),
        }
    }

    pub fn by_id(ids: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            key: ScopeKey::Id,
            ids: ids.into_iter().collect(),
        }
    }

    /// `{owner}` keyed by the class's ownership fields. `owner` is whatever
    /// those columns reference: an actor id or an extension id.
    pub fn owned_by(class: ResourceClass, owner: impl Into<ResourceId>) -> Self {
        let fields = class.ownership_fields();
        if fields.is_empty() {
            return Self::none();
        }
        Self {
            key: ScopeKey::Owner(fields),
            ids: BTreeSet::from([owner.into()]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains<R: Resource + ?Sized>(&self, resource: &R) -> bool {
        self.key.matches(resource, &self.ids)
    }
}

/// Filter describing which records of a collection an actor may see.
///
/// A storage layer applies it to its own query (see
/// [`push_scope`](crate::store::push_scope)); in-memory callers can use
/// [`Predicate::matches`] or [`Predicate::filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    MatchAll,
    MatchNone,
    /// Records whose `key` field is one of `ids`.
    KeyIn {
        key: ScopeKey,
        ids: Arc<BTreeSet<ResourceId>>,
    },
}

impl Predicate {
    pub fn from_related(related: RelatedIds) -> Self {
        if related.is_empty() {
            return Predicate::MatchNone;
        }
        Predicate::KeyIn {
            key: related.key,
            ids: Arc::new(related.ids),
        }
    }

    /// True when no record can match; callers should skip the query.
    pub fn matches_nothing(&self) -> bool {
        match self {
            Predicate::MatchAll => false,
            Predicate::MatchNone => true,
            Predicate::KeyIn { ids, .. } => ids.is_empty(),
        }
    }

    pub fn matches<R: Resource + ?Sized>(&self, resource: &R) -> bool {
        match self {
            Predicate::MatchAll => true,
            Predicate::MatchNone => false,
            Predicate::KeyIn { key, ids } => key.matches(resource, ids),
        }
    }

    pub fn filter<R: Resource>(&self, records: impl IntoIterator<Item = R>) -> Vec<R> {
        if self.matches_nothing() {
            return Vec::new();
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
