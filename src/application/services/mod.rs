//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! The three enhancement passes are stateless over a document; the
//! navigation filter depends on host boundary traits (CapabilityProvider,
//! EnrolmentProvider); the enhancer runtime owns the observation lifecycle.

mod calendar;
mod enhancer;
mod forms;
mod navigation;
mod placeholder;

pub use calendar::{AppliedBadge, CalendarLabelService, CalendarReport};
pub use enhancer::{EnhanceReport, EnhancerRuntime, LifecycleState, SweepReport};
pub use forms::{FormsReport, RequiredFieldService, RequiredProbe, RowDecision};
pub use navigation::{FilterDecision, FilterOutcome, NavigationFilterService, RemovedNode};
pub use placeholder::{PlaceholderReport, PlaceholderService};

use generational_arena::Index;

use crate::domain::{Document, SelectorList};

/// Whole-document or inserted-subtree scope of one pass run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The full document, root included.
    Document,
    /// Strict descendants of one inserted subtree root.
    Subtree(Index),
}

/// Resolve a scope against a selector list, in document order.
pub(crate) fn select_scoped(document: &Document, scope: Scope, list: &SelectorList) -> Vec<Index> {
    match scope {
        Scope::Document => document.select(list),
        Scope::Subtree(root) => document.select_within(root, list),
    }
}
