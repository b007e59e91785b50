//! Tests for NavigationFilterService
//!
//! The filter must only ever touch the tree for a site administrator with
//! zero active enrolments, and then remove exactly the configured course
//! affordances: the custom dashboard/course nodes plus flat-container
//! children whose action URL carries a dashboard fragment.

use std::sync::Arc;

use rstest::rstest;

use lmstune::application::services::{FilterDecision, NavigationFilterService};
use lmstune::application::ApplicationError;
use lmstune::config::NavConfig;
use lmstune::domain::{CourseId, NavNodeData, NavTree, NodeType, UserId};
use lmstune::infrastructure::traits::{CapabilityProvider, HostApiError};
use lmstune::infrastructure::InMemoryRoster;
use lmstune::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const ADMIN: UserId = UserId(7);

/// Helper building the navigation of a typical logged-in page: the custom
/// dashboard/course nodes plus a flat container mirroring them.
fn sample_tree() -> NavTree {
    let mut tree = NavTree::new();
    let root = tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);

    tree.insert_node(
        NavNodeData::new("myhome", NodeType::Custom, "Dashboard")
            .with_action("https://lms.example/my/"),
        Some(root),
    );
    tree.insert_node(
        NavNodeData::new("mycourses", NodeType::Custom, "My courses")
            .with_action("https://lms.example/my/courses.php"),
        Some(root),
    );
    tree.insert_node(
        NavNodeData::new("courses", NodeType::Container, "Courses"),
        Some(root),
    );

    let flat = tree.insert_node(
        NavNodeData::new("flatnavigation", NodeType::Container, "Nav drawer"),
        Some(root),
    );
    tree.insert_node(
        NavNodeData::new("flat-myhome", NodeType::Custom, "Dashboard")
            .with_action("https://lms.example/my/"),
        Some(flat),
    );
    tree.insert_node(
        NavNodeData::new("flat-calendar", NodeType::Custom, "Calendar")
            .with_action("https://lms.example/calendar/view.php"),
        Some(flat),
    );
    tree.insert_node(
        NavNodeData::new("flat-home", NodeType::Custom, "Home"),
        Some(flat),
    );

    tree
}

fn service(roster: InMemoryRoster) -> NavigationFilterService {
    let roster = Arc::new(roster);
    NavigationFilterService::new(roster.clone(), roster, NavConfig::default())
}

// ============================================================
// Decision gates
// ============================================================

#[test]
fn given_ordinary_user_when_filtering_then_tree_untouched() {
    // Arrange
    let mut tree = sample_tree();
    let before = tree.len();
    let filter = service(InMemoryRoster::new());

    // Act
    let outcome = filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert_eq!(outcome.decision, FilterDecision::NotSiteAdmin);
    assert!(outcome.removed.is_empty());
    assert_eq!(tree.len(), before);
    assert!(tree.find("myhome", NodeType::Custom).is_some());
}

#[test]
fn given_enrolled_admin_when_filtering_then_tree_untouched() {
    // Arrange - admin who also teaches two courses
    let roster = InMemoryRoster::new()
        .with_admin(ADMIN)
        .with_enrolment(ADMIN, CourseId(101))
        .with_enrolment(ADMIN, CourseId(102));
    let mut tree = sample_tree();
    let before = tree.len();

    // Act
    let outcome = service(roster).apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert_eq!(
        outcome.decision,
        FilterDecision::ActivelyEnrolled { courses: 2 }
    );
    assert_eq!(tree.len(), before);
    assert!(tree.find("mycourses", NodeType::Custom).is_some());
}

// ============================================================
// Pruning branch
// ============================================================

#[test]
fn given_unenrolled_admin_when_filtering_then_course_nodes_removed() {
    // Arrange
    let mut tree = sample_tree();
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    let outcome = filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert!(outcome.pruned());
    assert!(tree.find("myhome", NodeType::Custom).is_none());
    assert!(tree.find("mycourses", NodeType::Custom).is_none());
    // Untargeted containers survive
    assert!(tree.find("courses", NodeType::Container).is_some());

    let keys: Vec<_> = outcome.removed.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["myhome", "mycourses", "flat-myhome"]);
}

#[test]
fn given_unenrolled_admin_when_filtering_then_flat_children_pruned_by_fragment() {
    // Arrange
    let mut tree = sample_tree();
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    filter.apply(ADMIN, &mut tree).unwrap();

    // Assert - only the dashboard link leaves the drawer
    let flat = tree.get_from_root("flatnavigation").unwrap();
    assert_eq!(
        tree.children_keys(flat),
        vec!["flat-calendar".to_string(), "flat-home".to_string()]
    );
}

#[rstest]
#[case::dashboard_path("https://lms.example/my/", false)]
#[case::course_overview("https://lms.example/my/courses.php", false)]
#[case::course_view("https://lms.example/course/view.php?id=7", true)]
#[case::relative_dashboard("/my/", false)]
fn given_flat_child_action_when_filtering_then_fragment_decides(
    #[case] action: &str,
    #[case] survives: bool,
) {
    // Arrange
    let mut tree = NavTree::new();
    let root = tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);
    let flat = tree.insert_node(
        NavNodeData::new("flatnavigation", NodeType::Container, "Nav drawer"),
        Some(root),
    );
    tree.insert_node(
        NavNodeData::new("candidate", NodeType::Custom, "Link").with_action(action),
        Some(flat),
    );
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert_eq!(tree.get(flat, "candidate").is_some(), survives);
}

#[test]
fn given_flat_child_without_action_when_filtering_then_kept() {
    // Arrange
    let mut tree = sample_tree();
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    let flat = tree.get_from_root("flatnavigation").unwrap();
    assert!(tree.get(flat, "flat-home").is_some());
}

#[test]
fn given_tree_without_targets_when_filtering_then_pruned_with_empty_removals() {
    // Arrange - bare tree, nothing to remove
    let mut tree = NavTree::new();
    tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    let outcome = filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert_eq!(outcome.decision, FilterDecision::Pruned);
    assert!(outcome.removed.is_empty());
}

#[test]
fn given_course_node_with_target_key_when_filtering_then_type_mismatch_keeps_it() {
    // Arrange - a course that happens to reuse the key "myhome"
    let mut tree = NavTree::new();
    let root = tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);
    tree.insert_node(
        NavNodeData::new("myhome", NodeType::Course, "Oddly named course"),
        Some(root),
    );
    let filter = service(InMemoryRoster::new().with_admin(ADMIN));

    // Act
    let outcome = filter.apply(ADMIN, &mut tree).unwrap();

    // Assert
    assert!(outcome.removed.is_empty());
    assert!(tree.find("myhome", NodeType::Course).is_some());
}

#[test]
fn given_custom_node_keys_when_configured_then_extra_nodes_removed() {
    // Arrange
    let mut tree = sample_tree();
    let root = tree.root().unwrap();
    tree.insert_node(
        NavNodeData::new("latestbadges", NodeType::Custom, "Badges"),
        Some(root),
    );

    let config = NavConfig {
        custom_node_keys: vec!["latestbadges".to_string()],
        ..NavConfig::default()
    };
    let roster = Arc::new(InMemoryRoster::new().with_admin(ADMIN));
    let filter = NavigationFilterService::new(roster.clone(), roster, config);

    // Act
    let outcome = filter.apply(ADMIN, &mut tree).unwrap();

    // Assert - the defaults are replaced, not extended
    assert!(tree.find("latestbadges", NodeType::Custom).is_none());
    assert!(tree.find("myhome", NodeType::Custom).is_some());
    assert_eq!(outcome.removed[0].key, "latestbadges");
}

// ============================================================
// Host API failures
// ============================================================

struct FailingCapabilities;

impl CapabilityProvider for FailingCapabilities {
    fn is_site_admin(&self, _user: UserId) -> Result<bool, HostApiError> {
        Err(HostApiError::new("capability", "backend down"))
    }
}

#[test]
fn given_failing_capability_check_when_filtering_then_error_propagates() {
    // Arrange
    let mut tree = sample_tree();
    let before = tree.len();
    let enrolments = Arc::new(InMemoryRoster::new());
    let filter = NavigationFilterService::new(
        Arc::new(FailingCapabilities),
        enrolments,
        NavConfig::default(),
    );

    // Act
    let err = filter.apply(ADMIN, &mut tree).unwrap_err();

    // Assert - tree untouched, error carries the call-site context
    assert_eq!(tree.len(), before);
    match err {
        ApplicationError::OperationFailed { context, .. } => {
            assert_eq!(context, "check site-administrator capability");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
