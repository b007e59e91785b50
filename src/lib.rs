//! lmstune: navigation cleanup and accessibility tuning for LMS pages.
//!
//! Two host customizations live here as pure services over in-memory trees:
//! a navigation filter that prunes personal-learning clutter from a site
//! administrator's menu, and an enhancer runtime that marks required form
//! fields, seeds the event title placeholder, and labels calendar events by
//! type. Scenario fixtures replay host pages so both can be driven from the
//! CLI or from tests without a live host.
//!
//! Layering: `domain` (trees, selectors, mutation journal) -> `application`
//! (services and runtime) -> `infrastructure` (fixtures, host providers,
//! I/O) -> `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
