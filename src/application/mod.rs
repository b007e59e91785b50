//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod fingerprint;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::HostResultExt;
pub use fingerprint::{content_hash, document_fingerprint, nav_fingerprint};
