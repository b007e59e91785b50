//! In-memory host roster
//!
//! Answers capability and enrolment queries from plain maps. Scenario
//! fixtures and tests use this where the production integration would call
//! into the host application.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{CourseId, UserId};
use crate::infrastructure::traits::{CapabilityProvider, EnrolmentProvider, HostApiError};

/// Roster of admins and enrolments backing both host APIs.
///
/// Users absent from the roster are ordinary users with no enrolments, not
/// errors; the host answers those queries the same way.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    admins: BTreeSet<UserId>,
    enrolments: BTreeMap<UserId, Vec<CourseId>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant the site-administrator capability.
    pub fn with_admin(mut self, user: UserId) -> Self {
        self.admins.insert(user);
        self
    }

    /// Record an active enrolment.
    pub fn with_enrolment(mut self, user: UserId, course: CourseId) -> Self {
        self.enrolments.entry(user).or_default().push(course);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty() && self.enrolments.is_empty()
    }
}

impl CapabilityProvider for InMemoryRoster {
    fn is_site_admin(&self, user: UserId) -> Result<bool, HostApiError> {
        Ok(self.admins.contains(&user))
    }
}

impl EnrolmentProvider for InMemoryRoster {
    fn active_courses(&self, user: UserId) -> Result<Vec<CourseId>, HostApiError> {
        Ok(self.enrolments.get(&user).cloned().unwrap_or_default())
    }
}
