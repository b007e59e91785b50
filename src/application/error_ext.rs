//! Error conversion helpers for host API calls
//!
//! Provides an extension trait for cleaner error handling with call-site context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::HostApiError;

/// Extension trait for converting host API results to `ApplicationResult`
/// with context.
pub trait HostResultExt<T> {
    /// Add an action description to a host API error.
    ///
    /// # Example
    /// ```ignore
    /// self.enrolments
    ///     .active_courses(user)
    ///     .with_host_context("query active enrolments")?;
    /// ```
    fn with_host_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> HostResultExt<T> for Result<T, HostApiError> {
    fn with_host_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }
}
