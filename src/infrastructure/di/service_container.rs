//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::{EnhancerRuntime, NavigationFilterService};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::scenario::ScenarioLoader;
use crate::infrastructure::traits::{
    CapabilityProvider, EnrolmentProvider, FileSystem, RealFileSystem, ScenarioPicker, SkimPicker,
};

/// Container holding settings and the I/O boundary implementations.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Interactive scenario picker abstraction
    pub picker: Arc<dyn ScenarioPicker>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(SkimPicker))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        picker: Arc<dyn ScenarioPicker>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            picker,
        }
    }

    /// Scenario loader bound to the container's filesystem.
    pub fn scenario_loader(&self) -> ScenarioLoader {
        ScenarioLoader::new(self.fs.clone())
    }

    /// Navigation filter bound to the given host providers.
    ///
    /// The providers come from whatever stands in for the host (usually a
    /// scenario's roster), not from the container itself.
    pub fn navigation_filter(
        &self,
        capabilities: Arc<dyn CapabilityProvider>,
        enrolments: Arc<dyn EnrolmentProvider>,
    ) -> NavigationFilterService {
        NavigationFilterService::new(capabilities, enrolments, self.settings.nav.clone())
    }

    /// Fresh enhancer runtime from the container's settings.
    pub fn enhancer(&self) -> ApplicationResult<EnhancerRuntime> {
        EnhancerRuntime::new(&self.settings)
    }
}
