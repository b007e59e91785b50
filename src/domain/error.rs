//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of tree, document, or selector rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("stale node index: {context}")]
    StaleNode { context: String },

    #[error("element is already attached to a parent")]
    AlreadyAttached,
    #[error("document already has a root element")]
    RootAlreadySet,

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("unknown event category: {0}")]
    UnknownCategory(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
