//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod dom;
pub mod entities;
pub mod error;
pub mod nav;
pub mod observe;
pub mod selector;

pub use dom::{Document, Element, ElementData};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use nav::{NavNode, NavNodeData, NavTree, NodeType};
pub use observe::{MutationBatch, MutationJournal};
pub use selector::{parse_selector_list, Selector, SelectorList};
