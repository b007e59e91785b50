//! Navigation filter service
//!
//! Prunes "my courses"/dashboard affordances from the navigation tree of a
//! site administrator who is not actively enrolled anywhere. Runs once per
//! render; administrators who also learn or teach keep their full menu.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error_ext::HostResultExt;
use crate::application::ApplicationResult;
use crate::config::NavConfig;
use crate::domain::{NavTree, NodeType, UserId};
use crate::infrastructure::traits::{CapabilityProvider, EnrolmentProvider};

/// What the filter decided for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Acting user does not hold the site-administrator capability
    NotSiteAdmin,
    /// Administrator is actively enrolled in this many courses
    ActivelyEnrolled { courses: usize },
    /// Administrator with zero enrolments: course affordances were pruned
    Pruned,
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSiteAdmin => write!(f, "not a site administrator, tree untouched"),
            Self::ActivelyEnrolled { courses } => {
                write!(f, "actively enrolled in {courses} course(s), tree untouched")
            }
            Self::Pruned => write!(f, "site administrator with no enrolments, tree pruned"),
        }
    }
}

/// One node the filter removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    /// Node key
    pub key: String,
    /// Action URL the node carried, if any
    pub action: Option<String>,
}

impl fmt::Display for RemovedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{} -> {}", self.key, action),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Outcome of one filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// The decision taken
    pub decision: FilterDecision,
    /// Removed nodes, in removal order (empty unless pruned)
    pub removed: Vec<RemovedNode>,
}

impl FilterOutcome {
    fn skip(decision: FilterDecision) -> Self {
        Self {
            decision,
            removed: Vec::new(),
        }
    }

    /// Whether the pruning branch ran.
    pub fn pruned(&self) -> bool {
        self.decision == FilterDecision::Pruned
    }
}

/// Service deciding whether and how to prune the navigation tree.
pub struct NavigationFilterService {
    capabilities: Arc<dyn CapabilityProvider>,
    enrolments: Arc<dyn EnrolmentProvider>,
    config: NavConfig,
}

impl NavigationFilterService {
    /// Create a new navigation filter service.
    ///
    /// # Arguments
    /// * `capabilities` - Host capability checks
    /// * `enrolments` - Host enrolment queries
    /// * `config` - Node keys and URL fragments to prune
    pub fn new(
        capabilities: Arc<dyn CapabilityProvider>,
        enrolments: Arc<dyn EnrolmentProvider>,
        config: NavConfig,
    ) -> Self {
        Self {
            capabilities,
            enrolments,
            config,
        }
    }

    /// Apply the filter for `user` to `tree`.
    ///
    /// Absent nodes and an absent secondary container count as already
    /// satisfied, never as errors. Host API failures propagate; a render-time
    /// failure belongs to the host's own error handling.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn apply(&self, user: UserId, tree: &mut NavTree) -> ApplicationResult<FilterOutcome> {
        if !self
            .capabilities
            .is_site_admin(user)
            .with_host_context("check site-administrator capability")?
        {
            debug!("apply: {} is not a site admin, navigation untouched", user);
            return Ok(FilterOutcome::skip(FilterDecision::NotSiteAdmin));
        }

        let enrolled = self
            .enrolments
            .active_courses(user)
            .with_host_context("query active enrolments")?;
        if !enrolled.is_empty() {
            debug!(
                "apply: {} has {} active enrolments, keeping course links",
                user,
                enrolled.len()
            );
            return Ok(FilterOutcome::skip(FilterDecision::ActivelyEnrolled {
                courses: enrolled.len(),
            }));
        }

        let mut removed = Vec::new();

        for key in &self.config.custom_node_keys {
            if let Some(idx) = tree.find(key, NodeType::Custom) {
                let action = tree.node(idx).and_then(|n| n.data.action.clone());
                if tree.remove(idx) {
                    removed.push(RemovedNode {
                        key: key.clone(),
                        action,
                    });
                }
            }
        }

        self.prune_flat_container(tree, &mut removed);

        debug!("apply: removed {} nodes for {}", removed.len(), user);
        Ok(FilterOutcome {
            decision: FilterDecision::Pruned,
            removed,
        })
    }

    /// Sweep the secondary flat container, removing children whose action URL
    /// carries one of the configured dashboard/course fragments.
    fn prune_flat_container(&self, tree: &mut NavTree, removed: &mut Vec<RemovedNode>) {
        let Some(flat) = tree.get_from_root(&self.config.flat_container_key) else {
            return;
        };
        // Snapshot keys first: removal invalidates child indices mid-walk.
        for key in tree.children_keys(flat) {
            let Some(child) = tree.get(flat, &key) else {
                continue;
            };
            let action = tree.node(child).and_then(|n| n.data.action.clone());
            let matches = action
                .as_deref()
                .is_some_and(|url| self.matches_fragment(url));
            if matches && tree.remove(child) {
                removed.push(RemovedNode { key, action });
            }
        }
    }

    fn matches_fragment(&self, action: &str) -> bool {
        !action.is_empty()
            && self
                .config
                .action_fragments
                .iter()
                .any(|fragment| action.contains(fragment.as_str()))
    }
}
