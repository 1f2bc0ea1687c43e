//! Client-side filters applied to already-fetched lists.
//!
//! Filtered results are paginated locally with
//! [`paginate_local`](crate::pagination::paginate_local).

use crate::models::{Subject, User};
use crate::status::{UserRole, UserStatus};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Search box plus role and status selectors of the user list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive substring matched against name or email.
    pub search: String,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let term = self.search.trim().to_lowercase();
        if !term.is_empty() && !contains_ci(&user.full_name, &term) && !contains_ci(&user.email, &term)
        {
            return false;
        }
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        if self.status.is_some_and(|s| s != user.status) {
            return false;
        }
        true
    }

    pub fn apply(&self, users: &[User]) -> Vec<User> {
        users.iter().filter(|u| self.matches(u)).cloned().collect()
    }
}

/// Per-role tallies shown on the user list tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub all: usize,
    pub admin: usize,
    pub faculty: usize,
    pub student: usize,
}

pub fn role_counts(users: &[User]) -> RoleCounts {
    users.iter().fold(RoleCounts::default(), |mut acc, u| {
        acc.all += 1;
        match u.role {
            UserRole::Admin => acc.admin += 1,
            UserRole::Faculty => acc.faculty += 1,
            UserRole::Student => acc.student += 1,
        }
        acc
    })
}

/// Tabs of a semester's subject list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SubjectTab {
    #[default]
    All,
    /// Non-elective subjects.
    Core,
    Elective,
    Lab,
    Online,
}

impl SubjectTab {
    pub const ALL: &'static [SubjectTab] = &[
        SubjectTab::All,
        SubjectTab::Core,
        SubjectTab::Elective,
        SubjectTab::Lab,
        SubjectTab::Online,
    ];

    pub fn matches(self, subject: &Subject) -> bool {
        let m = &subject.metadata;
        match self {
            SubjectTab::All => true,
            SubjectTab::Core => !m.is_elective,
            SubjectTab::Elective => m.is_elective,
            SubjectTab::Lab => m.has_lab,
            SubjectTab::Online => m.is_online,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubjectTab::All => "All",
            SubjectTab::Core => "Core",
            SubjectTab::Elective => "Elective",
            SubjectTab::Lab => "Lab",
            SubjectTab::Online => "Online",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    /// Case-insensitive substring matched against name or code.
    pub search: String,
    pub tab: SubjectTab,
}

impl SubjectFilter {
    pub fn matches(&self, subject: &Subject) -> bool {
        let term = self.search.trim().to_lowercase();
        if !term.is_empty() && !contains_ci(&subject.name, &term) && !contains_ci(&subject.code, &term)
        {
            return false;
        }
        self.tab.matches(subject)
    }

    pub fn apply(&self, subjects: &[Subject]) -> Vec<Subject> {
        subjects.iter().filter(|s| self.matches(s)).cloned().collect()
    }

    /// Number of subjects under each tab, in [`SubjectTab::ALL`] order.
    pub fn tab_counts(subjects: &[Subject]) -> Vec<(SubjectTab, usize)> {
        SubjectTab::ALL
            .iter()
            .map(|&tab| (tab, subjects.iter().filter(|s| tab.matches(s)).count()))
            .collect()
    }
}
