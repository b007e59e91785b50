//! Tests for the arena-backed navigation tree
//!
//! Structural guarantees the filter leans on: preorder traversal, subtree
//! removal that leaves every retained index stale, and a deterministic
//! outline for fingerprinting.

use generational_arena::Index;
use rstest::rstest;

use lmstune::domain::{DomainError, NavNodeData, NavTree, NodeType};
use lmstune::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Helper building a small drawer-style tree. Returns the tree plus the
/// indices of the flat container and its deepest descendant.
fn drawer_tree() -> (NavTree, Index, Index) {
    let mut tree = NavTree::new();
    let root = tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);
    tree.insert_node(
        NavNodeData::new("about", NodeType::Custom, "About"),
        Some(root),
    );
    let flat = tree.insert_node(
        NavNodeData::new("flatnavigation", NodeType::Container, "Nav drawer"),
        Some(root),
    );
    tree.insert_node(
        NavNodeData::new("flat-home", NodeType::Custom, "Home")
            .with_action("https://lms.example/"),
        Some(flat),
    );
    let calendar = tree.insert_node(
        NavNodeData::new("flat-calendar", NodeType::Custom, "Calendar"),
        Some(flat),
    );
    (tree, flat, calendar)
}

// ============================================================
// Shape
// ============================================================

#[test]
fn given_nested_tree_when_measuring_then_depth_counts_levels() {
    // Arrange
    let (tree, _, _) = drawer_tree();

    // Assert
    assert_eq!(tree.depth(), 3);
    assert_eq!(tree.len(), 5);
    assert_eq!(NavTree::new().depth(), 0);
}

#[test]
fn given_tree_when_iterating_then_preorder_left_to_right() {
    // Arrange
    let (tree, _, _) = drawer_tree();

    // Act
    let keys: Vec<&str> = tree.iter().map(|(_, node)| node.data.key.as_str()).collect();

    // Assert
    assert_eq!(
        keys,
        vec!["root", "about", "flatnavigation", "flat-home", "flat-calendar"]
    );
}

// ============================================================
// Removal
// ============================================================

#[test]
fn given_removed_subtree_when_resolving_retained_indices_then_stale() {
    // Arrange
    let (mut tree, flat, calendar) = drawer_tree();

    // Act
    assert!(tree.remove(flat));

    // Assert - the container and everything under it is gone from the arena
    assert!(tree.node(flat).is_none());
    assert!(tree.node(calendar).is_none());
    assert!(tree.find("flat-calendar", NodeType::Custom).is_none());
    assert_eq!(tree.len(), 2);

    let root = tree.root().unwrap();
    assert_eq!(tree.children_keys(root), vec!["about".to_string()]);
}

#[test]
fn given_stale_index_when_removing_again_then_returns_false() {
    // Arrange
    let (mut tree, flat, _) = drawer_tree();
    tree.remove(flat);

    // Act / Assert
    assert!(!tree.remove(flat));
}

#[test]
fn given_root_removal_when_querying_then_tree_is_empty() {
    // Arrange
    let (mut tree, _, _) = drawer_tree();
    let root = tree.root().unwrap();

    // Act
    tree.remove(root);

    // Assert
    assert!(tree.root().is_none());
    assert!(tree.is_empty());
}

// ============================================================
// Outline
// ============================================================

#[test]
fn given_tree_when_outlining_then_lines_are_indented_preorder() {
    // Arrange
    let (mut tree, _, calendar) = drawer_tree();
    tree.node_mut(calendar).unwrap().data.action =
        Some("https://lms.example/calendar/view.php".to_string());

    // Act
    let outline = tree.outline();

    // Assert
    let expected = "\
root [root]
  about [custom]
  flatnavigation [container]
    flat-home [custom] -> https://lms.example/
    flat-calendar [custom] -> https://lms.example/calendar/view.php
";
    assert_eq!(outline, expected);
}

// ============================================================
// Node types
// ============================================================

#[rstest]
#[case::custom("custom", NodeType::Custom)]
#[case::mixed_case("Container", NodeType::Container)]
#[case::course("course", NodeType::Course)]
fn given_type_keyword_when_parsing_then_variant_returned(
    #[case] input: &str,
    #[case] expected: NodeType,
) {
    assert_eq!(input.parse::<NodeType>().unwrap(), expected);
    assert_eq!(expected.to_string(), input.to_lowercase());
}

#[test]
fn given_unknown_type_keyword_when_parsing_then_error() {
    let err = "drawer".parse::<NodeType>().unwrap_err();
    assert!(matches!(err, DomainError::UnknownNodeType(ref s) if s == "drawer"));
}
