//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lmstune/lmstune.toml`
//! 3. Local config: `<scenario_dir>/.lmstune.toml` (beside the fixtures)
//! 4. Environment variables: `LMSTUNE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::util::path::expand_env_vars;

/// Navigation filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NavConfig {
    /// Keys of custom menu nodes pruned for unenrolled administrators
    pub custom_node_keys: Vec<String>,
    /// Key of the secondary flat container swept for course links
    pub flat_container_key: String,
    /// Action-URL fragments marking a child of the flat container for removal
    pub action_fragments: Vec<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            custom_node_keys: vec!["myhome".into(), "mycourses".into()],
            flat_container_key: "flatnavigation".into(),
            action_fragments: vec!["/my/".into(), "my/courses.php".into()],
        }
    }
}

/// Required-field pass configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FormsConfig {
    /// Selectors unioned into the built-in field-row list, for themes with
    /// non-standard form markup
    pub extra_row_selectors: Vec<String>,
}

/// Calendar badge and title-placeholder configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalendarConfig {
    /// Selectors locating the event title input
    pub title_selectors: Vec<String>,
    /// Placeholder text set when the title input has none
    pub title_placeholder: String,
    /// Class carried by appended badges; also the idempotence probe
    pub badge_class: String,
    /// Inline style of appended badges
    pub badge_style: String,
    /// Selectors unioned into the built-in calendar event list
    pub extra_event_selectors: Vec<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            title_selectors: vec!["#id_name".into(), "input[name=\"name\"]".into()],
            title_placeholder: "Please enter your event title (e.g., Birthday, Meeting)".into(),
            badge_class: "event-type-label".into(),
            badge_style: "font-size:0.8em;font-weight:600;margin-left:0.35rem;color:#555".into(),
            extra_event_selectors: vec![],
        }
    }
}

/// Raw nav config for intermediate parsing (fields are Option to detect
/// "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawNavConfig {
    pub custom_node_keys: Option<Vec<String>>,
    pub flat_container_key: Option<String>,
    pub action_fragments: Option<Vec<String>>,
}

/// Raw forms config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFormsConfig {
    pub extra_row_selectors: Option<Vec<String>>,
}

/// Raw calendar config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCalendarConfig {
    pub title_selectors: Option<Vec<String>>,
    pub title_placeholder: Option<String>,
    pub badge_class: Option<String>,
    pub badge_style: Option<String>,
    pub extra_event_selectors: Option<Vec<String>>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub scenario_dir: Option<PathBuf>,
    #[serde(default)]
    pub nav: RawNavConfig,
    #[serde(default)]
    pub forms: RawFormsConfig,
    #[serde(default)]
    pub calendar: RawCalendarConfig,
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    // Convert to sorted Vec for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

fn merge_opt_array(base: &[String], overlay: Option<&Vec<String>>) -> Vec<String> {
    overlay
        .map(|o| merge_array(base, o))
        .unwrap_or_else(|| base.to_vec())
}

fn replace_opt_array(base: &[String], overlay: Option<&Vec<String>>) -> Vec<String> {
    overlay.cloned().unwrap_or_else(|| base.to_vec())
}

impl NavConfig {
    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Arrays: union merge with negation support (if overlay specified)
    pub fn merge(&self, overlay: &RawNavConfig) -> Self {
        Self {
            custom_node_keys: merge_opt_array(
                &self.custom_node_keys,
                overlay.custom_node_keys.as_ref(),
            ),
            flat_container_key: overlay
                .flat_container_key
                .clone()
                .unwrap_or_else(|| self.flat_container_key.clone()),
            action_fragments: merge_opt_array(
                &self.action_fragments,
                overlay.action_fragments.as_ref(),
            ),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()` which uses union semantics for arrays, this method
    /// uses REPLACE semantics: if global config specifies an array, it
    /// completely replaces the default array.
    pub fn apply_global(&self, global: &RawNavConfig) -> Self {
        Self {
            custom_node_keys: replace_opt_array(
                &self.custom_node_keys,
                global.custom_node_keys.as_ref(),
            ),
            flat_container_key: global
                .flat_container_key
                .clone()
                .unwrap_or_else(|| self.flat_container_key.clone()),
            action_fragments: replace_opt_array(
                &self.action_fragments,
                global.action_fragments.as_ref(),
            ),
        }
    }
}

impl FormsConfig {
    pub fn merge(&self, overlay: &RawFormsConfig) -> Self {
        Self {
            extra_row_selectors: merge_opt_array(
                &self.extra_row_selectors,
                overlay.extra_row_selectors.as_ref(),
            ),
        }
    }

    pub fn apply_global(&self, global: &RawFormsConfig) -> Self {
        Self {
            extra_row_selectors: replace_opt_array(
                &self.extra_row_selectors,
                global.extra_row_selectors.as_ref(),
            ),
        }
    }
}

impl CalendarConfig {
    pub fn merge(&self, overlay: &RawCalendarConfig) -> Self {
        Self {
            title_selectors: merge_opt_array(
                &self.title_selectors,
                overlay.title_selectors.as_ref(),
            ),
            title_placeholder: overlay
                .title_placeholder
                .clone()
                .unwrap_or_else(|| self.title_placeholder.clone()),
            badge_class: overlay
                .badge_class
                .clone()
                .unwrap_or_else(|| self.badge_class.clone()),
            badge_style: overlay
                .badge_style
                .clone()
                .unwrap_or_else(|| self.badge_style.clone()),
            extra_event_selectors: merge_opt_array(
                &self.extra_event_selectors,
                overlay.extra_event_selectors.as_ref(),
            ),
        }
    }

    pub fn apply_global(&self, global: &RawCalendarConfig) -> Self {
        Self {
            title_selectors: replace_opt_array(
                &self.title_selectors,
                global.title_selectors.as_ref(),
            ),
            title_placeholder: global
                .title_placeholder
                .clone()
                .unwrap_or_else(|| self.title_placeholder.clone()),
            badge_class: global
                .badge_class
                .clone()
                .unwrap_or_else(|| self.badge_class.clone()),
            badge_style: global
                .badge_style
                .clone()
                .unwrap_or_else(|| self.badge_style.clone()),
            extra_event_selectors: replace_opt_array(
                &self.extra_event_selectors,
                global.extra_event_selectors.as_ref(),
            ),
        }
    }
}

/// Unified configuration for lmstune.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for scenario fixtures (default: ~/.lmstune/scenarios)
    pub scenario_dir: PathBuf,
    /// Navigation filter settings
    pub nav: NavConfig,
    /// Required-field pass settings
    pub forms: FormsConfig,
    /// Calendar badge / placeholder settings
    pub calendar: CalendarConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scenario_dir: dirs_default_scenario_dir(),
            nav: NavConfig::default(),
            forms: FormsConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

/// Get the default scenario directory (~/.lmstune/scenarios).
fn dirs_default_scenario_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".lmstune").join("scenarios"))
        .unwrap_or_else(|| PathBuf::from("~/.lmstune/scenarios"))
}

/// Get the XDG config directory for lmstune.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lmstune").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("lmstune.toml"))
}

/// Get the path to the local config file beside a scenario directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".lmstune.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.scenario_dir.to_string_lossy().as_ref());
        self.scenario_dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            scenario_dir: overlay
                .scenario_dir
                .clone()
                .unwrap_or_else(|| self.scenario_dir.clone()),
            nav: self.nav.merge(&overlay.nav),
            forms: self.forms.merge(&overlay.forms),
            calendar: self.calendar.merge(&overlay.calendar),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            scenario_dir: global
                .scenario_dir
                .clone()
                .unwrap_or_else(|| self.scenario_dir.clone()),
            nav: self.nav.apply_global(&global.nav),
            forms: self.forms.apply_global(&global.forms),
            calendar: self.calendar.apply_global(&global.calendar),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory checked for a `.lmstune.toml`,
    ///   usually the directory holding the scenario being run
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/lmstune/lmstune.toml` (arrays REPLACE defaults)
    /// 3. Local config: `<local_dir>/.lmstune.toml` (arrays UNION with global)
    /// 4. Environment variables: `LMSTUNE_*` prefix (REPLACES - explicit override)
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support (local adds fixture-specific entries)
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Load global config (REPLACES defaults - global defines the real baseline)
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Load and merge local config (UNION with global)
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Apply environment variables (replaces - explicit override)
        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();

        Ok(current)
    }

    /// Apply LMSTUNE_* environment variables as explicit overrides.
    ///
    /// Env vars replace values (not merge) - they are explicit user overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("LMSTUNE")
                .separator("__")
                .list_separator(","),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("scenario_dir") {
            settings.scenario_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<Vec<String>>("nav.custom_node_keys") {
            settings.nav.custom_node_keys = val;
        }
        if let Ok(val) = config.get_string("nav.flat_container_key") {
            settings.nav.flat_container_key = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("nav.action_fragments") {
            settings.nav.action_fragments = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("forms.extra_row_selectors") {
            settings.forms.extra_row_selectors = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("calendar.title_selectors") {
            settings.calendar.title_selectors = val;
        }
        if let Ok(val) = config.get_string("calendar.title_placeholder") {
            settings.calendar.title_placeholder = val;
        }
        if let Ok(val) = config.get_string("calendar.badge_class") {
            settings.calendar.badge_class = val;
        }
        if let Ok(val) = config.get_string("calendar.badge_style") {
            settings.calendar.badge_style = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("calendar.extra_event_selectors") {
            settings.calendar.extra_event_selectors = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# lmstune configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/lmstune/lmstune.toml  (defines your baseline)
#   Local:  <scenario_dir>/.lmstune.toml    (fixture-specific additions)
#   Env:    LMSTUNE_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global (adds fixture-specific entries).
#   Use "!item" in local config to REMOVE an inherited item:
#     custom_node_keys = ["latestbadges", "!myhome"]

# Directory scanned for scenario fixtures
# scenario_dir = "~/.lmstune/scenarios"

[nav]
# Custom menu nodes pruned for unenrolled administrators
# custom_node_keys = ["myhome", "mycourses"]

# Secondary flat container swept for course links
# flat_container_key = "flatnavigation"

# Action-URL fragments marking a flat-container child for removal
# action_fragments = ["/my/", "my/courses.php"]

[forms]
# Extra field-row selectors for themes with non-standard form markup
# extra_row_selectors = [".custom-form .field-wrapper"]

[calendar]
# Event title inputs that get the instructional placeholder
# title_selectors = ["#id_name", "input[name=\"name\"]"]

# title_placeholder = "Please enter your event title (e.g., Birthday, Meeting)"

# Badge appearance
# badge_class = "event-type-label"
# badge_style = "font-size:0.8em;font-weight:600;margin-left:0.35rem;color:#555"

# Extra calendar event selectors
# extra_event_selectors = [".theme-calendar .entry"]
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert!(settings
            .nav
            .custom_node_keys
            .contains(&"myhome".to_string()));
        assert_eq!(settings.nav.flat_container_key, "flatnavigation");
        assert!(!settings.calendar.title_placeholder.is_empty());
    }

    #[test]
    fn given_tilde_in_scenario_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            scenario_dir: PathBuf::from("~/.lmstune/scenarios"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir_str = settings.scenario_dir.to_string_lossy();
        assert!(
            dir_str.starts_with(&home),
            "scenario_dir should start with home dir: {}",
            dir_str
        );
        assert!(
            !dir_str.contains('~'),
            "scenario_dir should not contain tilde: {}",
            dir_str
        );
    }

    // ========================================
    // Tests for merge_array union semantics
    // ========================================

    #[test]
    fn test_merge_array_union() {
        // Basic union: ["a", "b"] + ["c"] → ["a", "b", "c"]
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["c".to_string()];
        let result = merge_array(&base, &overlay);

        assert!(result.contains(&"a".to_string()));
        assert!(result.contains(&"b".to_string()));
        assert!(result.contains(&"c".to_string()));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_merge_array_negation() {
        // Negation: ["a", "b"] + ["!a", "c"] → ["b", "c"]
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!a".to_string(), "c".to_string()];
        let result = merge_array(&base, &overlay);

        assert!(
            !result.contains(&"a".to_string()),
            "a should be removed by !a"
        );
        assert!(result.contains(&"b".to_string()));
        assert!(result.contains(&"c".to_string()));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        // Noop for non-existent: ["a", "b"] + ["!x"] → ["a", "b"]
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!x".to_string()];
        let result = merge_array(&base, &overlay);

        assert!(result.contains(&"a".to_string()));
        assert!(result.contains(&"b".to_string()));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_merge_array_duplicates() {
        // Duplicates should be de-duped: ["a", "b"] + ["a", "c"] → ["a", "b", "c"]
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["a".to_string(), "c".to_string()];
        let result = merge_array(&base, &overlay);

        assert!(result.contains(&"a".to_string()));
        assert!(result.contains(&"b".to_string()));
        assert!(result.contains(&"c".to_string()));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_merge_nav_config() {
        let base = NavConfig::default();

        let overlay = RawNavConfig {
            custom_node_keys: Some(vec!["latestbadges".to_string(), "!myhome".to_string()]),
            flat_container_key: None,
            action_fragments: None,
        };

        let result = base.merge(&overlay);

        // Union with negation: myhome removed, latestbadges added
        assert!(!result.custom_node_keys.contains(&"myhome".to_string()));
        assert!(result.custom_node_keys.contains(&"mycourses".to_string()));
        assert!(result
            .custom_node_keys
            .contains(&"latestbadges".to_string()));
        // Unspecified fields keep base
        assert_eq!(result.flat_container_key, "flatnavigation");
        assert_eq!(result.action_fragments, base.action_fragments);
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        // Global config should REPLACE base arrays, not union
        let base = CalendarConfig::default();

        let global = RawCalendarConfig {
            title_selectors: Some(vec!["#event_title".to_string()]),
            title_placeholder: None,
            badge_class: Some("badge".to_string()),
            badge_style: None,
            extra_event_selectors: None,
        };

        let result = base.apply_global(&global);

        assert_eq!(
            result.title_selectors,
            vec!["#event_title".to_string()],
            "Global should REPLACE base title_selectors"
        );
        assert_eq!(result.badge_class, "badge");
        // Unspecified fields keep base
        assert_eq!(result.title_placeholder, base.title_placeholder);
        assert_eq!(result.badge_style, base.badge_style);
    }

    #[test]
    fn test_merge_keeps_base_when_overlay_empty() {
        let base = FormsConfig {
            extra_row_selectors: vec![".theme .row".to_string()],
        };
        let overlay = RawFormsConfig {
            extra_row_selectors: None,
        };

        let result = base.merge(&overlay);

        assert_eq!(result.extra_row_selectors, base.extra_row_selectors);
    }
}
