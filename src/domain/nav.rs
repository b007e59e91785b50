//! Arena-backed navigation tree, the host's menu structure.
//!
//! The filter only consumes this model: find a node by key and type, walk a
//! container's children, detach subtrees. Construction is the host's business
//! (scenario fixtures stand in for it here).

use std::fmt;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::error::DomainError;

/// Type tag carried by every navigation node, mirroring the host's typed menu
/// entries. The filter targets `Custom` nodes; the rest exist so fixtures can
/// describe realistic trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    System,
    Category,
    Course,
    Section,
    Activity,
    Custom,
    Setting,
    User,
    Container,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Root => "root",
            NodeType::System => "system",
            NodeType::Category => "category",
            NodeType::Course => "course",
            NodeType::Section => "section",
            NodeType::Activity => "activity",
            NodeType::Custom => "custom",
            NodeType::Setting => "setting",
            NodeType::User => "user",
            NodeType::Container => "container",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for NodeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "root" => Ok(NodeType::Root),
            "system" => Ok(NodeType::System),
            "category" => Ok(NodeType::Category),
            "course" => Ok(NodeType::Course),
            "section" => Ok(NodeType::Section),
            "activity" => Ok(NodeType::Activity),
            "custom" => Ok(NodeType::Custom),
            "setting" => Ok(NodeType::Setting),
            "user" => Ok(NodeType::User),
            "container" => Ok(NodeType::Container),
            other => Err(DomainError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Data payload for navigation nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNodeData {
    /// Stable key the host addresses the node by, e.g. `mycourses`
    pub key: String,
    /// Type tag, e.g. `NodeType::Custom`
    pub node_type: NodeType,
    /// Display label
    pub text: String,
    /// Target URL, if the node links anywhere
    pub action: Option<String>,
}

impl NavNodeData {
    pub fn new(key: impl Into<String>, node_type: NodeType, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            node_type,
            text: text.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

impl fmt::Display for NavNodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{} [{}] -> {}", self.key, self.node_type, action),
            None => write!(f, "{} [{}]", self.key, self.node_type),
        }
    }
}

/// Tree node in the arena-based navigation hierarchy.
#[derive(Debug)]
pub struct NavNode {
    /// Node payload
    pub data: NavNodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in menu order
    pub children: Vec<Index>,
}

/// Arena-based navigation tree.
///
/// Uses a generational arena so that indices into a removed subtree are
/// detectably stale: after `remove`, lookups through any retained index
/// return `None` instead of aliasing a recycled slot.
#[derive(Debug, Default)]
pub struct NavTree {
    arena: Arena<NavNode>,
    root: Option<Index>,
}

impl NavTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a node under `parent`, or as the root when `parent` is None.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NavNodeData, parent: Option<Index>) -> Index {
        let node = NavNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    #[instrument(level = "trace", skip(self))]
    pub fn node(&self, idx: Index) -> Option<&NavNode> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn node_mut(&mut self, idx: Index) -> Option<&mut NavNode> {
        self.arena.get_mut(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Number of nodes reachable through the arena.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// First node matching `key` and `node_type` in preorder, the host's
    /// find-by-identifier-and-type lookup.
    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, key: &str, node_type: NodeType) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.data.key == key && node.data.node_type == node_type)
            .map(|(idx, _)| idx)
    }

    /// Direct child of `parent` with the given key.
    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, parent: Index, key: &str) -> Option<Index> {
        let parent = self.arena.get(parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|&child| self.arena.get(child).is_some_and(|n| n.data.key == key))
    }

    /// Direct child of the root with the given key, e.g. the flat-navigation
    /// container.
    #[instrument(level = "trace", skip(self))]
    pub fn get_from_root(&self, key: &str) -> Option<Index> {
        self.get(self.root?, key)
    }

    /// Keys of the direct children of `parent`, in menu order.
    #[instrument(level = "trace", skip(self))]
    pub fn children_keys(&self, parent: Index) -> Vec<String> {
        let Some(parent) = self.arena.get(parent) else {
            return Vec::new();
        };
        parent
            .children
            .iter()
            .filter_map(|&child| self.arena.get(child).map(|n| n.data.key.clone()))
            .collect()
    }

    /// Detach a node from its parent and free its whole subtree.
    ///
    /// Returns false when `idx` is already stale. After this returns true,
    /// neither the node nor any descendant is reachable from the root, and
    /// all retained indices into the subtree are stale.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, idx: Index) -> bool {
        let Some(node) = self.arena.get(idx) else {
            return false;
        };
        let parent = node.parent;

        // Collect the subtree before mutating the arena.
        let mut doomed = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current) {
                stack.extend(node.children.iter().copied());
                doomed.push(current);
            }
        }

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.retain(|&child| child != idx);
            }
        } else if self.root == Some(idx) {
            self.root = None;
        }

        for current in doomed {
            self.arena.remove(current);
        }
        true
    }

    /// Preorder iterator over the reachable tree.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> NavIterator {
        NavIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Deterministic indented outline of the reachable tree, used for
    /// fingerprinting and terminal display.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.outline_node(root, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, idx: Index, depth: usize, out: &mut String) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.data.to_string());
        out.push('\n');
        for &child in &node.children {
            self.outline_node(child, depth + 1, out);
        }
    }
}

pub struct NavIterator<'a> {
    tree: &'a NavTree,
    stack: Vec<Index>,
}

impl<'a> NavIterator<'a> {
    fn new(tree: &'a NavTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for NavIterator<'a> {
    type Item = (Index, &'a NavNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
