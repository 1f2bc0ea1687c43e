//! Cache keys for reads and the patterns used to invalidate them.

use crate::models::EntityKind;
use crate::pagination::PageCursor;
use crate::types::EntityId;

/// A listing scoped to one parent entity, e.g. the courses of a department.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentScope {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl ParentScope {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ParentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Identity of one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of a (possibly scoped) listing.
    Collection {
        kind: EntityKind,
        parent: Option<ParentScope>,
        cursor: PageCursor,
    },
    /// A single entity by id.
    Entity { kind: EntityKind, id: EntityId },
    /// Dropdown options for `kind`, filtered by the chain of selected
    /// ancestor ids (top-level first).
    Options {
        kind: EntityKind,
        ancestors: Vec<EntityId>,
    },
}

impl QueryKey {
    pub fn collection(kind: EntityKind, parent: Option<ParentScope>, cursor: PageCursor) -> Self {
        QueryKey::Collection {
            kind,
            parent,
            cursor,
        }
    }

    pub fn entity(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        QueryKey::Entity {
            kind,
            id: id.into(),
        }
    }

    pub fn options(kind: EntityKind, ancestors: Vec<EntityId>) -> Self {
        QueryKey::Options { kind, ancestors }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            QueryKey::Collection { kind, .. }
            | QueryKey::Entity { kind, .. }
            | QueryKey::Options { kind, .. } => *kind,
        }
    }

    /// Parent scope the read is filtered by. For options this is the
    /// nearest selected ancestor.
    pub fn scope(&self) -> Option<ParentScope> {
        match self {
            QueryKey::Collection { parent, .. } => parent.clone(),
            QueryKey::Entity { .. } => None,
            QueryKey::Options { kind, ancestors } => {
                let parent_kind = kind.parent()?;
                let id = ancestors.last()?;
                Some(ParentScope::new(parent_kind, id.clone()))
            }
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::Collection {
                kind,
                parent,
                cursor,
            } => {
                write!(f, "{}", kind.resource())?;
                if let Some(p) = parent {
                    write!(f, "[{p}]")?;
                }
                write!(f, "?page={}&limit={}", cursor.page, cursor.page_size)
            }
            QueryKey::Entity { kind, id } => write!(f, "{}/{id}", kind.resource()),
            QueryKey::Options { kind, ancestors } => {
                write!(f, "{}#options[{}]", kind.resource(), ancestors.join(","))
            }
        }
    }
}

/// Selects a set of cache entries to invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    /// Exactly one key.
    Exact(QueryKey),
    /// Every key of this kind: all pages, scopes, options, and entities.
    Kind(EntityKind),
    /// Collections and options of `kind` scoped to `parent`.
    Scoped { kind: EntityKind, parent: ParentScope },
    /// One entity by id.
    Entity { kind: EntityKind, id: EntityId },
}

impl KeyPattern {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyPattern::Exact(exact) => exact == key,
            KeyPattern::Kind(kind) => key.kind() == *kind,
            KeyPattern::Scoped { kind, parent } => {
                key.kind() == *kind
                    && !matches!(key, QueryKey::Entity { .. })
                    && key.scope().as_ref() == Some(parent)
            }
            KeyPattern::Entity { kind, id } => matches!(
                key,
                QueryKey::Entity { kind: k, id: i } if k == kind && i == id
            ),
        }
    }
}
