//! Closed string enumerations exchanged with the backend.
//!
//! Each enum variant serializes to its upper-case wire value (e.g.
//! `"ACTIVE"`). Unknown values fail deserialization so a malformed server
//! payload is rejected at the client boundary instead of surfacing later
//! as a missing field.

use crate::error::CoreError;

/// Common behaviour of every closed wire enumeration.
pub trait WireEnum:
    Copy + Eq + std::hash::Hash + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
    /// Every legal value, in display order.
    const ALL: &'static [Self];

    /// Human-readable name of the enumeration, used in error messages.
    const NAME: &'static str;

    /// The wire representation (e.g. `"ACTIVE"`).
    fn as_str(self) -> &'static str;

    /// The label shown in selectors (e.g. `"Active"`).
    fn label(self) -> &'static str;

    /// Look up a value by its wire representation.
    fn parse_wire(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }
}

/// Validate a wire string against an enumeration, producing a
/// [`CoreError::Validation`] listing the legal values on failure.
pub fn parse_wire_enum<E: WireEnum>(value: &str) -> Result<E, CoreError> {
    E::parse_wire(value).ok_or_else(|| {
        let legal: Vec<&str> = E::ALL.iter().map(|v| v.as_str()).collect();
        CoreError::Validation(format!(
            "Invalid {} '{value}'. Must be one of: {}",
            E::NAME,
            legal.join(", ")
        ))
    })
}

macro_rules! define_wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl WireEnum for $name {
            const ALL: &'static [Self] = &[$( Self::$variant ),+];
            const NAME: &'static str = stringify!($name);

            fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_wire_enum(s)
            }
        }
    };
}

define_wire_enum! {
    /// Department lifecycle status.
    DepartmentStatus {
        Active = "ACTIVE" => "Active",
        Inactive = "INACTIVE" => "Inactive",
        Discontinued = "DISCONTINUED" => "Discontinued",
    }
}

define_wire_enum! {
    /// Course lifecycle status.
    CourseStatus {
        Active = "ACTIVE" => "Active",
        Inactive = "INACTIVE" => "Inactive",
        Discontinued = "DISCONTINUED" => "Discontinued",
    }
}

define_wire_enum! {
    /// Academic session status.
    SessionStatus {
        Active = "ACTIVE" => "Active",
        Inactive = "INACTIVE" => "Inactive",
        Upcoming = "UPCOMING" => "Upcoming",
        Completed = "COMPLETED" => "Completed",
    }
}

define_wire_enum! {
    /// Semester status.
    SemesterStatus {
        Active = "ACTIVE" => "Active",
        Inactive = "INACTIVE" => "Inactive",
        Upcoming = "UPCOMING" => "Upcoming",
        Completed = "COMPLETED" => "Completed",
    }
}

define_wire_enum! {
    /// Subject lifecycle status.
    SubjectStatus {
        Active = "ACTIVE" => "Active",
        Inactive = "INACTIVE" => "Inactive",
        Discontinued = "DISCONTINUED" => "Discontinued",
    }
}

define_wire_enum! {
    /// Account status of a user.
    UserStatus {
        Active = "ACTIVE" => "Active",
        Blocked = "BLOCKED" => "Blocked",
    }
}

define_wire_enum! {
    /// Role of a user account.
    UserRole {
        Admin = "ADMIN" => "Admin",
        Faculty = "FACULTY" => "Faculty",
        Student = "STUDENT" => "Student",
    }
}

define_wire_enum! {
    /// Degree level of a course.
    CourseType {
        Undergraduate = "UG" => "Undergraduate",
        Postgraduate = "PG" => "Postgraduate",
        Diploma = "DIPLOMA" => "Diploma",
        Certificate = "CERTIFICATE" => "Certificate",
    }
}
