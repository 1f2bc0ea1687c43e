//! Entity schemas, form drafts, and the traits that let the generic page
//! controller treat every entity type uniformly.
//!
//! Entity structs mirror the backend JSON (`_id`, camelCase fields) and
//! deserialize strictly: status, role, and type fields only accept their
//! closed wire enumerations. Drafts are the create/update form payloads and
//! carry the field-level validation rules.

pub mod course;
pub mod department;
pub mod semester;
pub mod session;
pub mod subject;
pub mod user;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::query::ParentScope;
use crate::status::WireEnum;
use crate::types::EntityId;

pub use course::{Course, CourseDraft};
pub use department::{Department, DepartmentDraft};
pub use semester::{Semester, SemesterDraft};
pub use session::{Session, SessionDraft};
pub use subject::{Subject, SubjectDraft, SubjectMetadata};
pub use user::{User, UserDraft};

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The entity types managed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Department,
    Course,
    Session,
    Semester,
    Subject,
    User,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Department,
        EntityKind::Course,
        EntityKind::Session,
        EntityKind::Semester,
        EntityKind::Subject,
        EntityKind::User,
    ];

    /// REST collection segment, e.g. `"departments"`.
    pub fn resource(self) -> &'static str {
        match self {
            EntityKind::Department => "departments",
            EntityKind::Course => "courses",
            EntityKind::Session => "sessions",
            EntityKind::Semester => "semesters",
            EntityKind::Subject => "subjects",
            EntityKind::User => "users",
        }
    }

    /// Singular lower-case noun used in messages.
    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Department => "department",
            EntityKind::Course => "course",
            EntityKind::Session => "session",
            EntityKind::Semester => "semester",
            EntityKind::Subject => "subject",
            EntityKind::User => "user",
        }
    }

    /// Plural lower-case noun used in page summaries.
    pub fn plural(self) -> &'static str {
        self.resource()
    }

    /// Capitalized singular noun for notification text.
    pub fn title(self) -> &'static str {
        match self {
            EntityKind::Department => "Department",
            EntityKind::Course => "Course",
            EntityKind::Session => "Session",
            EntityKind::Semester => "Semester",
            EntityKind::Subject => "Subject",
            EntityKind::User => "User",
        }
    }

    /// The kind whose id scopes nested listings of this kind.
    ///
    /// Users are scoped by department (faculty listings).
    pub fn parent(self) -> Option<EntityKind> {
        match self {
            EntityKind::Department => None,
            EntityKind::Course => Some(EntityKind::Department),
            EntityKind::Session => Some(EntityKind::Course),
            EntityKind::Semester => Some(EntityKind::Session),
            EntityKind::Subject => Some(EntityKind::Semester),
            EntityKind::User => Some(EntityKind::Department),
        }
    }

    /// Parse a REST collection segment or a singular noun.
    pub fn from_name(name: &str) -> Option<EntityKind> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|k| k.resource() == name || k.singular() == name)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.singular())
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// Relationship assignments that have their own side-action dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// A faculty member heads a department.
    DepartmentHead,
    /// A faculty member teaches a subject.
    SubjectFaculty,
    /// A user belongs to a department.
    UserDepartment,
}

impl Relation {
    /// Kind of the entity the relation is assigned on.
    pub fn owner(self) -> EntityKind {
        match self {
            Relation::DepartmentHead => EntityKind::Department,
            Relation::SubjectFaculty => EntityKind::Subject,
            Relation::UserDepartment => EntityKind::User,
        }
    }

    /// Kind of the entity being assigned.
    pub fn target(self) -> EntityKind {
        match self {
            Relation::DepartmentHead | Relation::SubjectFaculty => EntityKind::User,
            Relation::UserDepartment => EntityKind::Department,
        }
    }

    /// Request body field carrying the assigned id.
    pub fn field(self) -> &'static str {
        match self {
            Relation::DepartmentHead => "head",
            Relation::SubjectFaculty => "faculty",
            Relation::UserDepartment => "department",
        }
    }

    /// Action sub-path under `{resource}/{id}/`.
    pub fn action(self) -> &'static str {
        match self {
            Relation::DepartmentHead => "assign-head",
            Relation::SubjectFaculty => "assign-faculty",
            Relation::UserDepartment => "department",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Relation::DepartmentHead => "department head",
            Relation::SubjectFaculty => "subject faculty",
            Relation::UserDepartment => "user department",
        }
    }
}

// ---------------------------------------------------------------------------
// References and options
// ---------------------------------------------------------------------------

/// A reference to a related entity.
///
/// The backend sends relations either as a bare id string or as an
/// embedded object with `_id` and a display name. An embedded course or
/// user may also carry its own department.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRef")]
pub struct EntityRef {
    pub id: EntityId,
    pub name: Option<String>,
    /// Department of the referenced entity, when embedded.
    pub department: Option<EntityId>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Id(String),
    Object {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default, alias = "fullName", alias = "semesterName")]
        name: Option<String>,
        #[serde(default)]
        department: Option<EntityRef>,
    },
}

impl From<RawRef> for EntityRef {
    fn from(raw: RawRef) -> Self {
        match raw {
            RawRef::Id(id) => EntityRef::new(id),
            RawRef::Object {
                id,
                name,
                department,
            } => EntityRef {
                id,
                name,
                department: department.map(|d| d.id),
            },
        }
    }
}

impl EntityRef {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            department: None,
        }
    }
}

/// One entry of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: EntityId,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A create/update form payload.
pub trait EntityDraft:
    Validate + Serialize + Clone + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Store the id chosen in the last field of the form's cascade.
    fn set_parent(&mut self, _parent: Option<EntityId>) {}

    /// The parent id the draft currently points at, if any.
    fn parent(&self) -> Option<&EntityId> {
        None
    }
}

/// A backend-owned entity managed by one dashboard page.
pub trait Entity: DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static {
    type Status: WireEnum;
    type Draft: EntityDraft;

    const KIND: EntityKind;

    /// Dependent dropdowns of this entity's form, top to bottom. The last
    /// field supplies the draft's parent id.
    const CASCADE: &'static [EntityKind] = &[];

    /// Relation that can be assigned from this entity's page.
    const ASSIGNABLE: Option<Relation> = None;

    /// Whether the dashboard may create this entity.
    const CREATABLE: bool = true;

    fn id(&self) -> &EntityId;

    fn display_name(&self) -> &str;

    fn status(&self) -> Self::Status;

    /// Id of the immediate parent ([`EntityKind::parent`]), if known.
    fn parent_id(&self) -> Option<&EntityId>;

    /// Pre-filled form payload for editing this entity.
    fn to_draft(&self) -> Self::Draft;

    /// Values of [`Self::CASCADE`] for this entity, used to hydrate the
    /// edit form. Unknown ancestors are `None`.
    fn cascade_values(&self) -> Vec<Option<EntityId>> {
        Vec::new()
    }

    /// Current holder of [`Self::ASSIGNABLE`].
    fn assigned(&self) -> Option<&EntityId> {
        None
    }

    /// Scope assignment candidates are drawn from. `None` with a scoped
    /// relation target means no candidates can be offered.
    fn assignment_scope(&self) -> Option<ParentScope> {
        None
    }

    fn to_option(&self) -> SelectOption {
        SelectOption {
            id: self.id().clone(),
            label: self.display_name().to_string(),
        }
    }
}

/// Read an optional reference's id.
pub(crate) fn ref_id(reference: &Option<EntityRef>) -> Option<EntityId> {
    reference.as_ref().map(|r| r.id.clone())
}

/// Render a `validator` error tree as one line per field, sorted by field
/// name, e.g. `"name: Name must be at least 3 characters"`.
pub fn describe_validation_errors(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    lines.sort();
    lines
}
