//! termtree conversions for CLI display.
//!
//! Rendering stays out of the domain types; anything that needs a printable
//! tree goes through `TreeDisplay`.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Document, ElementData, NavTree};

pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for NavTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        if let Some(root_idx) = self.root() {
            let label = self
                .node(root_idx)
                .map(|n| n.data.to_string())
                .unwrap_or_else(|| "?".to_string());
            let mut tree = Tree::new(label);

            fn build_tree(nav: &NavTree, node_idx: Index, parent_tree: &mut Tree<String>) {
                if let Some(node) = nav.node(node_idx) {
                    for &child_idx in &node.children {
                        if let Some(child) = nav.node(child_idx) {
                            let mut child_tree = Tree::new(child.data.to_string());
                            build_tree(nav, child_idx, &mut child_tree);
                            parent_tree.push(child_tree);
                        }
                    }
                }
            }

            build_tree(self, root_idx, &mut tree);
            tree
        } else {
            Tree::new("Empty tree".to_string())
        }
    }
}

impl TreeDisplay for Document {
    fn to_tree_string(&self) -> Tree<String> {
        if let Some(root_idx) = self.root() {
            let label = self
                .element(root_idx)
                .map(element_label)
                .unwrap_or_else(|| "?".to_string());
            let mut tree = Tree::new(label);

            fn build_tree(doc: &Document, idx: Index, parent_tree: &mut Tree<String>) {
                for &child_idx in doc.children(idx) {
                    if let Some(child) = doc.element(child_idx) {
                        let mut child_tree = Tree::new(element_label(child));
                        build_tree(doc, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }

            build_tree(self, root_idx, &mut tree);
            tree
        } else {
            Tree::new("Empty document".to_string())
        }
    }
}

fn element_label(data: &ElementData) -> String {
    let mut label = format!("<{}", data.tag);
    for (name, value) in &data.attrs {
        label.push_str(&format!(" {name}={value:?}"));
    }
    label.push('>');
    if !data.text.is_empty() {
        label.push_str(&format!(" {:?}", data.text));
    }
    label
}
