//! Concrete entity pages: controller aliases, user side actions, and the
//! table columns each page renders.

use campus_core::error::CoreError;
use campus_core::models::{Course, Department, EntityRef, Semester, Session, Subject, User};
use campus_core::mutation::{MutationIntent, UserAction};
use campus_core::status::{UserRole, WireEnum};

use crate::controller::EntityController;
use crate::error::AdminError;

pub type DepartmentPage = EntityController<Department>;
pub type CoursePage = EntityController<Course>;
pub type SessionPage = EntityController<Session>;
pub type SemesterPage = EntityController<Semester>;
pub type SubjectPage = EntityController<Subject>;
pub type UserPage = EntityController<User>;

// ---------------------------------------------------------------------------
// User side actions
// ---------------------------------------------------------------------------

impl EntityController<User> {
    pub async fn verify(&self, user: &User) -> Result<(), AdminError> {
        if user.is_verified {
            return Err(CoreError::Conflict(format!("{} is already verified", user.full_name)).into());
        }
        self.run_action(MutationIntent::user_action(user.id.clone(), UserAction::Verify))
            .await
            .map(|_| ())
    }

    /// Change the user's role. Choosing the role the user already has is
    /// rejected without a request.
    pub async fn change_role(&self, user: &User, role: UserRole) -> Result<(), AdminError> {
        if user.role == role {
            return Err(CoreError::Validation(format!(
                "{} is already {}",
                user.full_name,
                role.label()
            ))
            .into());
        }
        self.run_action(MutationIntent::user_action(
            user.id.clone(),
            UserAction::ChangeRole(role),
        ))
        .await
        .map(|_| ())
    }

    pub async fn reset_password(&self, user: &User) -> Result<(), AdminError> {
        self.run_action(MutationIntent::user_action(
            user.id.clone(),
            UserAction::ResetPassword,
        ))
        .await
        .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Column headers and cell text of an entity table.
pub trait TableRow {
    fn columns() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn reference(r: Option<&EntityRef>) -> String {
    match r {
        Some(EntityRef { name: Some(name), .. }) => name.clone(),
        Some(EntityRef { id, .. }) => id.clone(),
        None => "-".to_string(),
    }
}

impl TableRow for Department {
    fn columns() -> &'static [&'static str] {
        &["Name", "Code", "Head", "Courses", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.code.clone(),
            reference(self.head.as_ref()),
            self.courses.len().to_string(),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for Course {
    fn columns() -> &'static [&'static str] {
        &["Name", "Code", "Department", "Type", "Duration", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.code.clone(),
            reference(Some(&self.department)),
            self.course_type.label().to_string(),
            format!("{} years", self.duration),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for Session {
    fn columns() -> &'static [&'static str] {
        &["Name", "Years", "Course", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("{}-{}", self.start_year, self.end_year),
            reference(Some(&self.course)),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for Semester {
    fn columns() -> &'static [&'static str] {
        &["Name", "Number", "Session", "Dates", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.semester_name.clone(),
            self.semester_number.to_string(),
            reference(Some(&self.session)),
            format!("{} to {}", date_only(&self.start_date), date_only(&self.end_date)),
            self.status.label().to_string(),
        ]
    }
}

fn date_only(value: &str) -> &str {
    value.get(..10).unwrap_or(value)
}

impl TableRow for Subject {
    fn columns() -> &'static [&'static str] {
        &["Name", "Code", "Credits", "Faculty", "Type", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        let mut kinds = vec![if self.metadata.is_elective { "Elective" } else { "Core" }];
        if self.metadata.has_lab {
            kinds.push("Lab");
        }
        if self.metadata.is_online {
            kinds.push("Online");
        }
        vec![
            self.name.clone(),
            self.code.clone(),
            self.credits.to_string(),
            reference(self.faculty.as_ref()),
            kinds.join(", "),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for User {
    fn columns() -> &'static [&'static str] {
        &["Name", "Email", "Role", "Department", "Verified", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.full_name.clone(),
            self.email.clone(),
            self.role.label().to_string(),
            reference(self.department.as_ref()),
            if self.is_verified { "Yes" } else { "No" }.to_string(),
            self.status.label().to_string(),
        ]
    }
}
