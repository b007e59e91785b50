//! Scenario fixtures
//!
//! TOML files describing a roster, a navigation tree, a page and staged
//! insertions. They stand in for the host application when exercising the
//! filter and the enhancement passes from the harness binary and from tests.
//!
//! Minimal scenario:
//!
//! ```toml
//! [meta]
//! name = "admin-no-enrolments"
//! description = "Admin without enrolments loses dashboard links"
//!
//! acting_user = 10
//!
//! [[roster.users]]
//! id = 10
//! username = "admin"
//! siteadmin = true
//!
//! [[nav]]
//! key = "myhome"
//! type = "custom"
//! text = "Dashboard"
//! action = "/my/"
//!
//! [page]
//! tag = "body"
//!
//! [[page.children]]
//! tag = "div"
//! classes = "calendar"
//!
//! [[inserts]]
//! parent = ".calendar"
//! [inserts.element]
//! tag = "div"
//! classes = "event"
//! attrs = { data-eventtype = "course" }
//! ```
//!
//! Nav and page specs nest through `children`; insert parents are named by
//! selector, first match wins.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::{
    parse_selector_list, CourseId, Document, ElementData, NavNodeData, NavTree, NodeType, UserId,
};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::roster::InMemoryRoster;
use crate::infrastructure::traits::FileSystem;
use crate::util::path::PathExt;

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub meta: MetaSection,
    pub acting_user: u64,
    #[serde(default)]
    pub roster: RosterSection,
    #[serde(default)]
    pub nav: Vec<NavSpec>,
    pub page: Option<ElementSpec>,
    #[serde(default)]
    pub inserts: Vec<InsertSpec>,
}

#[derive(Debug, Deserialize)]
pub struct MetaSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RosterSection {
    #[serde(default)]
    pub users: Vec<UserSpec>,
}

#[derive(Debug, Deserialize)]
pub struct UserSpec {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub siteadmin: bool,
    #[serde(default)]
    pub courses: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct NavSpec {
    pub key: String,
    #[serde(default = "default_node_type", rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub text: String,
    pub action: Option<String>,
    #[serde(default)]
    pub children: Vec<NavSpec>,
}

fn default_node_type() -> NodeType {
    NodeType::Custom
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    /// Shorthand for the `class` attribute; `attrs` wins on conflict.
    #[serde(default)]
    pub classes: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

/// One staged dynamic insertion: a subtree attached under the first element
/// matching `parent`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertSpec {
    pub parent: String,
    pub element: ElementSpec,
}

/// Listing entry for the scenarios directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub path: PathBuf,
    pub name: String,
    pub description: String,
}

/// A fully built scenario: host stand-ins plus staged insertions.
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub acting_user: UserId,
    pub roster: InMemoryRoster,
    pub nav: NavTree,
    pub document: Document,
    usernames: BTreeMap<u64, String>,
    source: PathBuf,
    inserts: Vec<InsertSpec>,
    next_insert: usize,
}

impl Scenario {
    /// Path of the fixture this scenario was built from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Username for display, when the roster carries one.
    pub fn username(&self, user: UserId) -> Option<&str> {
        self.usernames.get(&user.0).map(String::as_str)
    }

    /// Staged insertions not yet applied.
    pub fn pending_inserts(&self) -> usize {
        self.inserts.len() - self.next_insert
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            path: self.source.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Build and attach the next staged insertion.
    ///
    /// The subtree is assembled detached and hooked in with a single append,
    /// the way a host-built modal arrives in one piece, so observation
    /// reports exactly one root for it. Returns the attached root, or None
    /// once all insertions have been applied.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_next_insert(&mut self) -> InfraResult<Option<Index>> {
        let Some(spec) = self.inserts.get(self.next_insert).cloned() else {
            return Ok(None);
        };
        self.next_insert += 1;

        let selectors = parse_selector_list(&spec.parent).map_err(|e| {
            InfraError::scenario(
                &self.source,
                format!("insert parent selector '{}': {e}", spec.parent),
            )
        })?;
        let attach_point = self
            .document
            .select(&selectors)
            .into_iter()
            .next()
            .ok_or_else(|| {
                InfraError::scenario(
                    &self.source,
                    format!("insert parent '{}' matched nothing", spec.parent),
                )
            })?;

        let root = self.build_detached(&spec.element)?;
        self.document.append_child(attach_point, root).map_err(|e| {
            InfraError::scenario(&self.source, format!("insert attach failed: {e}"))
        })?;

        debug!(
            "apply_next_insert: attached <{}> under '{}'",
            spec.element.tag, spec.parent
        );
        Ok(Some(root))
    }

    /// Create a spec subtree without connecting it to the page.
    fn build_detached(&mut self, spec: &ElementSpec) -> InfraResult<Index> {
        let idx = self.document.create_element(element_data(spec));
        for child_spec in &spec.children {
            let child = self.build_detached(child_spec)?;
            self.document.append_child(idx, child).map_err(|e| {
                InfraError::scenario(&self.source, format!("insert assembly failed: {e}"))
            })?;
        }
        Ok(idx)
    }
}

/// Loads and lists scenario fixtures.
pub struct ScenarioLoader {
    fs: Arc<dyn FileSystem>,
}

impl ScenarioLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load a scenario file and build its host stand-ins.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> InfraResult<Scenario> {
        if !self.fs.is_file(path) {
            return Err(InfraError::FileNotFound(path.to_path_buf()));
        }
        if !path.is_scenario_file() {
            return Err(InfraError::scenario(path, "expected a .toml scenario file"));
        }
        let raw = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read scenario: {}", path.display()), e))?;
        let file: ScenarioFile =
            toml::from_str(&raw).map_err(|e| InfraError::scenario(path, e.to_string()))?;

        debug!("load: scenario '{}' from {}", file.meta.name, path.display());
        build_scenario(file, path)
    }

    /// List scenario files under `dir`, fully validating each in parallel.
    /// Files that fail to build are skipped with a warning so one bad
    /// fixture does not hide the rest.
    #[instrument(level = "debug", skip(self))]
    pub fn list(&self, dir: &Path) -> InfraResult<Vec<ScenarioSummary>> {
        if !self.fs.is_dir(dir) {
            return Err(InfraError::FileNotFound(dir.to_path_buf()));
        }
        let files = self
            .fs
            .list_files(dir, "toml")
            .map_err(|e| InfraError::io(format!("list scenarios: {}", dir.display()), e))?;

        let summaries: Vec<Option<ScenarioSummary>> = files
            .par_iter()
            .map(|path| match self.load(path) {
                Ok(scenario) => Some(scenario.summary()),
                Err(e) => {
                    warn!("list: skipping {}: {e}", path.display());
                    None
                }
            })
            .collect();

        Ok(summaries.into_iter().flatten().collect())
    }
}

fn build_scenario(file: ScenarioFile, path: &Path) -> InfraResult<Scenario> {
    let mut roster = InMemoryRoster::new();
    let mut usernames = BTreeMap::new();
    for user in &file.roster.users {
        if user.siteadmin {
            roster = roster.with_admin(UserId(user.id));
        }
        for course in &user.courses {
            roster = roster.with_enrolment(UserId(user.id), CourseId(*course));
        }
        if !user.username.is_empty() {
            usernames.insert(user.id, user.username.clone());
        }
    }

    let nav = build_nav(&file.nav, path)?;
    let document = build_page(file.page.as_ref(), path)?;

    // Bad insert selectors should surface at load, not at step N of a run.
    for insert in &file.inserts {
        parse_selector_list(&insert.parent).map_err(|e| {
            InfraError::scenario(path, format!("insert parent selector '{}': {e}", insert.parent))
        })?;
    }

    Ok(Scenario {
        name: file.meta.name,
        description: file.meta.description,
        acting_user: UserId(file.acting_user),
        roster,
        nav,
        document,
        usernames,
        source: path.to_path_buf(),
        inserts: file.inserts,
        next_insert: 0,
    })
}

fn build_nav(specs: &[NavSpec], path: &Path) -> InfraResult<NavTree> {
    let mut tree = NavTree::new();
    let root = tree.insert_node(NavNodeData::new("root", NodeType::Root, "Site"), None);

    let mut seen: BTreeSet<String> = BTreeSet::new();
    seen.insert("root".to_string());
    for spec in specs {
        grow_nav(&mut tree, spec, root, &mut seen, path)?;
    }
    Ok(tree)
}

fn grow_nav(
    tree: &mut NavTree,
    spec: &NavSpec,
    parent: Index,
    seen: &mut BTreeSet<String>,
    path: &Path,
) -> InfraResult<()> {
    if !seen.insert(spec.key.clone()) {
        return Err(InfraError::scenario(
            path,
            format!("duplicate nav key '{}'", spec.key),
        ));
    }
    let mut data = NavNodeData::new(&spec.key, spec.node_type, &spec.text);
    data.action = spec.action.clone();
    let idx = tree.insert_node(data, Some(parent));
    for child in &spec.children {
        grow_nav(tree, child, idx, seen, path)?;
    }
    Ok(())
}

fn build_page(spec: Option<&ElementSpec>, path: &Path) -> InfraResult<Document> {
    let mut document = Document::new();
    if let Some(root_spec) = spec {
        grow_element(&mut document, root_spec, None, path)?;
    }
    Ok(document)
}

fn grow_element(
    document: &mut Document,
    spec: &ElementSpec,
    parent: Option<Index>,
    path: &Path,
) -> InfraResult<Index> {
    let idx = document.insert(element_data(spec), parent).map_err(|e| {
        InfraError::scenario(path, format!("page element <{}> rejected: {e}", spec.tag))
    })?;
    for child in &spec.children {
        grow_element(document, child, Some(idx), path)?;
    }
    Ok(idx)
}

fn element_data(spec: &ElementSpec) -> ElementData {
    let mut data = ElementData::new(&spec.tag);
    if !spec.classes.is_empty() {
        data.set_attr("class", &spec.classes);
    }
    for (name, value) in &spec.attrs {
        data.set_attr(name, value);
    }
    if !spec.text.is_empty() {
        data.text = spec.text.clone();
    }
    data
}
