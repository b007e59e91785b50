//! Infrastructure layer: I/O implementations, host stand-ins and DI container
//!
//! This layer implements the I/O and host boundary traits and wires up
//! services.

pub mod di;
pub mod error;
pub mod roster;
pub mod scenario;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use roster::InMemoryRoster;
pub use scenario::{Scenario, ScenarioLoader, ScenarioSummary};
