//! Arena-backed document model.
//!
//! A deliberately small rendition of the page structures the enhancement
//! passes touch: elements with a tag, attributes and text, selector queries,
//! and an insertion journal. The arena gives the same safety property as the
//! navigation tree: an index into a removed or never-attached element resolves
//! to `None` instead of some recycled slot.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::observe::{MutationBatch, MutationJournal};
use crate::domain::selector::{Selector, SelectorList};

/// Tag, attributes and own text of a single element.
///
/// Attributes are kept sorted so document outlines render deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_class(self, classes: impl Into<String>) -> Self {
        self.with_attr("class", classes)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Whole class token match against the whitespace-separated class list.
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    /// Raw class attribute value, empty when absent. The calendar pass does
    /// substring checks against this, matching the host's class-name probing.
    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or("")
    }
}

/// An element node: payload plus tree links into the arena.
#[derive(Debug)]
pub struct Element {
    pub data: ElementData,
    pub parent: Option<Index>,
    pub children: Vec<Index>,
}

/// Arena-based document tree with an insertion journal.
#[derive(Debug, Default)]
pub struct Document {
    arena: Arena<Element>,
    root: Option<Index>,
    journal: MutationJournal,
}

impl Document {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            journal: MutationJournal::new(),
        }
    }

    /// Create a detached element. It joins the tree via `append_child` or
    /// `set_root`.
    #[instrument(level = "trace", skip(self, data))]
    pub fn create_element(&mut self, data: ElementData) -> Index {
        self.arena.insert(Element {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Install `idx` as the document root. Fails if a root already exists or
    /// the element is attached somewhere.
    #[instrument(level = "trace", skip(self))]
    pub fn set_root(&mut self, idx: Index) -> DomainResult<()> {
        if self.root.is_some() {
            return Err(DomainError::RootAlreadySet);
        }
        let element = self.arena.get(idx).ok_or_else(|| DomainError::StaleNode {
            context: "set_root".to_string(),
        })?;
        if element.parent.is_some() {
            return Err(DomainError::AlreadyAttached);
        }
        self.root = Some(idx);
        Ok(())
    }

    /// Create an element and attach it in one step; `parent` None makes it
    /// the root.
    pub fn insert(&mut self, data: ElementData, parent: Option<Index>) -> DomainResult<Index> {
        let idx = self.create_element(data);
        match parent {
            Some(parent_idx) => self.append_child(parent_idx, idx)?,
            None => self.set_root(idx)?,
        }
        Ok(idx)
    }

    /// Attach a detached element under `parent`.
    ///
    /// When the parent is connected to the root and observation is on, the
    /// child is journaled as an inserted subtree root. Attaching into a
    /// detached subtree journals nothing; the eventual attach of that
    /// subtree's top element is the observable insertion.
    #[instrument(level = "trace", skip(self))]
    pub fn append_child(&mut self, parent: Index, child: Index) -> DomainResult<()> {
        if self.arena.get(child).is_none() {
            return Err(DomainError::StaleNode {
                context: "append_child child".to_string(),
            });
        }
        if self.arena.get(parent).is_none() {
            return Err(DomainError::StaleNode {
                context: "append_child parent".to_string(),
            });
        }
        if self.root == Some(child) || self.arena[child].parent.is_some() {
            return Err(DomainError::AlreadyAttached);
        }

        self.arena[child].parent = Some(parent);
        self.arena[parent].children.push(child);

        if self.is_connected(parent) {
            self.journal.record(child);
        }
        Ok(())
    }

    /// Whether `idx` is reachable from the document root.
    pub fn is_connected(&self, idx: Index) -> bool {
        let mut current = Some(idx);
        while let Some(cursor) = current {
            if self.root == Some(cursor) {
                return true;
            }
            match self.arena.get(cursor) {
                Some(element) => current = element.parent,
                None => return false,
            }
        }
        false
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn element(&self, idx: Index) -> Option<&ElementData> {
        self.arena.get(idx).map(|e| &e.data)
    }

    pub fn element_mut(&mut self, idx: Index) -> Option<&mut ElementData> {
        self.arena.get_mut(idx).map(|e| &mut e.data)
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.arena.get(idx)?.parent
    }

    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena.get(idx).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn attr(&self, idx: Index, name: &str) -> Option<&str> {
        self.element(idx)?.attr(name)
    }

    #[instrument(level = "trace", skip(self, value))]
    pub fn set_attr(&mut self, idx: Index, name: &str, value: &str) -> DomainResult<()> {
        let element = self.element_mut(idx).ok_or_else(|| DomainError::StaleNode {
            context: format!("set_attr {name}"),
        })?;
        element.set_attr(name, value);
        Ok(())
    }

    pub fn has_class(&self, idx: Index, class: &str) -> bool {
        self.element(idx).is_some_and(|e| e.has_class(class))
    }

    /// Concatenated text of the element and its whole subtree, own text
    /// before children, no separators.
    pub fn text_content(&self, idx: Index) -> String {
        let mut out = String::new();
        self.collect_text(idx, &mut out);
        out
    }

    fn collect_text(&self, idx: Index, out: &mut String) {
        if let Some(element) = self.arena.get(idx) {
            out.push_str(&element.data.text);
            for &child in &element.children {
                self.collect_text(child, out);
            }
        }
    }

    /// All elements in the document matching any selector of `list`, in
    /// document order, root included.
    #[instrument(level = "trace", skip(self, list), fields(selector = %list))]
    pub fn select(&self, list: &SelectorList) -> Vec<Index> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if self.matches_any(root, list) {
            out.push(root);
        }
        self.select_into(root, list, &mut out);
        out
    }

    /// Strict descendants of `scope` matching any selector of `list`, in
    /// document order. Ancestor parts of a descendant chain may match nodes
    /// above `scope`; only the reported element must live inside it.
    #[instrument(level = "trace", skip(self, list), fields(selector = %list))]
    pub fn select_within(&self, scope: Index, list: &SelectorList) -> Vec<Index> {
        let mut out = Vec::new();
        self.select_into(scope, list, &mut out);
        out
    }

    /// First strict descendant of `scope` matching `list`, in document order.
    pub fn first_match_within(&self, scope: Index, list: &SelectorList) -> Option<Index> {
        self.descendants(scope).find(|&idx| self.matches_any(idx, list))
    }

    fn select_into(&self, scope: Index, list: &SelectorList, out: &mut Vec<Index>) {
        out.extend(self.descendants(scope).filter(|&idx| self.matches_any(idx, list)));
    }

    fn matches_any(&self, idx: Index, list: &SelectorList) -> bool {
        list.selectors().iter().any(|s| self.matches_selector(idx, s))
    }

    /// Full selector match: target compound on the element, then each
    /// ancestor compound greedily on the parent chain, innermost last.
    fn matches_selector(&self, idx: Index, selector: &Selector) -> bool {
        let Some(element) = self.arena.get(idx) else {
            return false;
        };
        if !selector.target().matches(&element.data) {
            return false;
        }
        let mut cursor = element.parent;
        for compound in selector.ancestors().iter().rev() {
            loop {
                let Some(ancestor_idx) = cursor else {
                    return false;
                };
                let Some(ancestor) = self.arena.get(ancestor_idx) else {
                    return false;
                };
                cursor = ancestor.parent;
                if compound.matches(&ancestor.data) {
                    break;
                }
            }
        }
        true
    }

    /// Preorder iterator over the strict descendants of `scope`.
    pub fn descendants(&self, scope: Index) -> Descendants {
        let mut stack = Vec::new();
        if let Some(element) = self.arena.get(scope) {
            for &child in element.children.iter().rev() {
                stack.push(child);
            }
        }
        Descendants { document: self, stack }
    }

    /// Deterministic indented outline of the tree, used for fingerprinting
    /// and terminal display.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.outline_node(root, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, idx: Index, depth: usize, out: &mut String) {
        let Some(element) = self.arena.get(idx) else {
            return;
        };
        let _ = write!(out, "{}{}", "  ".repeat(depth), element.data.tag);
        for (name, value) in &element.data.attrs {
            let _ = write!(out, " {name}={value:?}");
        }
        if !element.data.text.is_empty() {
            let _ = write!(out, " {:?}", element.data.text);
        }
        out.push('\n');
        for &child in &element.children {
            self.outline_node(child, depth + 1, out);
        }
    }

    // --- journal surface ---

    pub fn start_observing(&mut self) {
        self.journal.start();
    }

    pub fn stop_observing(&mut self) {
        self.journal.stop();
    }

    pub fn is_observing(&self) -> bool {
        self.journal.is_observing()
    }

    /// Drain pending insertions into one batch, None when the page was quiet.
    pub fn take_mutations(&mut self) -> Option<MutationBatch> {
        self.journal.take_batch()
    }

    pub fn pending_mutations(&self) -> usize {
        self.journal.pending_len()
    }

    /// Run `f` with the journal paused, so the mutations it performs are not
    /// fed back into observation. Used by the passes for their own inserts.
    pub fn while_paused<T>(&mut self, f: impl FnOnce(&mut Document) -> T) -> T {
        let was_paused = self.journal.is_paused();
        self.journal.pause();
        let result = f(self);
        if !was_paused {
            self.journal.resume();
        }
        result
    }
}

pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<Index>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = Index;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        if let Some(element) = self.document.arena.get(idx) {
            for &child in element.children.iter().rev() {
                self.stack.push(child);
            }
        }
        Some(idx)
    }
}
