//! Domain entities: core identifiers and categories

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Host user account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Host course identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Calendar event category, the classification target of the labeler pass.
///
/// Order matters: classification tries the variants in declaration order and
/// the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Course,
    User,
    Group,
    Site,
}

impl EventCategory {
    /// All categories in classification order.
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Course,
        EventCategory::User,
        EventCategory::Group,
        EventCategory::Site,
    ];

    /// Human-readable badge label, e.g. `Course`.
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Course => "Course",
            EventCategory::User => "User",
            EventCategory::Group => "Group",
            EventCategory::Site => "Site",
        }
    }

    /// Lowercase keyword used in class names and data attributes.
    pub fn keyword(&self) -> &'static str {
        match self {
            EventCategory::Course => "course",
            EventCategory::User => "user",
            EventCategory::Group => "group",
            EventCategory::Site => "site",
        }
    }

    /// Legacy class-name marker, e.g. `calendar_event_course`.
    pub fn class_marker(&self) -> String {
        format!("calendar_event_{}", self.keyword())
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EventCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "course" => Ok(EventCategory::Course),
            "user" => Ok(EventCategory::User),
            "group" => Ok(EventCategory::Group),
            "site" => Ok(EventCategory::Site),
            other => Err(DomainError::UnknownCategory(other.to_string())),
        }
    }
}
