//! Content fingerprinting for idempotence checks
//!
//! Provides SHA-256 based fingerprints for detecting whether a pass actually
//! changed a document or navigation tree, and for spotting drift in scenario
//! fixtures.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Document, NavTree};

/// Compute 8-character hex hash of content (first 32 bits of SHA-256).
///
/// # Arguments
/// * `content` - Byte slice to hash
///
/// # Returns
/// 8-character lowercase hex string (e.g., "a1b2c3d4")
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    // First 4 bytes = 8 hex characters
    hex::encode(&result[..4])
}

/// Fingerprint of a document's structure, attributes and text.
///
/// Two documents with the same outline hash are indistinguishable to the
/// enhancement passes, so running a pass twice and comparing fingerprints is
/// a cheap idempotence check.
pub fn document_fingerprint(document: &Document) -> String {
    content_hash(document.outline().as_bytes())
}

/// Fingerprint of a navigation tree's reachable structure.
pub fn nav_fingerprint(tree: &NavTree) -> String {
    content_hash(tree.outline().as_bytes())
}

/// Compute hash of file contents.
///
/// # Arguments
/// * `path` - Path to file
///
/// # Returns
/// 8-character hex hash of file content
pub fn file_hash(path: &Path) -> ApplicationResult<String> {
    let content = std::fs::read(path).map_err(|e| ApplicationError::OperationFailed {
        context: format!("read file for hashing: {}", path.display()),
        source: Box::new(e),
    })?;
    Ok(content_hash(&content))
}
