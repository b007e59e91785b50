//! Required-field marking pass
//!
//! Scans form field rows, decides "required" from layered signals and
//! reflects the decision as accessibility attributes on the row's control.
//! Deliberately never injects visible "(Required)" text: the host may render
//! its own textual marker, and a duplicate would be worse than none. The
//! duplicate-text detection is still computed so the decision trail shows it.

use generational_arena::Index;
use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::application::services::{select_scoped, Scope};
use crate::application::ApplicationResult;
use crate::config::FormsConfig;
use crate::domain::{parse_selector_list, Document, ElementData, SelectorList};

const ROW_SELECTORS: &str = ".mform .fitem.row, .mform .form-group";
const LABEL_SELECTORS: &str = ".col-form-label, .form-label, label";
const ADDON_SELECTORS: &str = ".form-label-addon";
const CONTROL_SELECTORS: &str = "input, select, textarea";
const MARKER_SELECTORS: &str = ".form-label .form-required, .col-form-label .form-required, \
     label .form-required, abbr.required[title*=\"Required\" i]";
const HELP_ICON_SELECTORS: &str =
    ".helptooltip, [data-region=\"help-icon\"], .iconhelp, .fa-circle-question, .fa-question-circle";

/// Tri-state attribute probe over a control: `Some(true)`/`Some(false)` when
/// the signal is present with that polarity, `None` when absent.
pub type RequiredProbe = fn(&ElementData) -> Option<bool>;

/// Presence of the native `required` attribute. Boolean attribute, so it can
/// never be present-false.
fn probe_required_attribute(control: &ElementData) -> Option<bool> {
    control.attr("required").map(|_| true)
}

/// `aria-required`, present-true only for the exact value "true".
fn probe_aria_required(control: &ElementData) -> Option<bool> {
    control.attr("aria-required").map(|value| value == "true")
}

/// Ordered native-signal probes. The native signal holds when any probe
/// reports present-true; present-false and absent both fall through.
const NATIVE_PROBES: &[RequiredProbe] = &[probe_required_attribute, probe_aria_required];

/// Per-row decision trail, exposed for tests and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowDecision {
    /// A native probe reported present-true on the control
    pub native: bool,
    /// The row carries an explicit required-marker element
    pub marker: bool,
    /// The row carries a help-icon element
    pub help_icon: bool,
    /// Label or addon text already contains the word "required"
    pub has_required_text: bool,
    /// Final verdict: native OR (marker AND NOT help-icon)
    pub required: bool,
}

/// Outcome of one pass run: the decision trail plus mutation count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormsReport {
    /// One decision per scanned field row, in document order
    pub decisions: Vec<RowDecision>,
    /// Rows whose control received at least one new attribute
    pub marked: usize,
}

impl FormsReport {
    /// Field rows scanned.
    pub fn rows(&self) -> usize {
        self.decisions.len()
    }

    /// Rows judged required.
    pub fn required(&self) -> usize {
        self.decisions.iter().filter(|d| d.required).count()
    }
}

/// The required-field marking pass.
pub struct RequiredFieldService {
    rows: SelectorList,
    labels: SelectorList,
    addons: SelectorList,
    controls: SelectorList,
    markers: SelectorList,
    help_icons: SelectorList,
    word_required: Regex,
    loose_required: Regex,
}

impl RequiredFieldService {
    /// Create the pass, compiling its selectors.
    ///
    /// # Arguments
    /// * `config` - Extra row selectors unioned into the built-in list
    pub fn new(config: &FormsConfig) -> ApplicationResult<Self> {
        let mut row_source = ROW_SELECTORS.to_string();
        for extra in &config.extra_row_selectors {
            row_source.push_str(", ");
            row_source.push_str(extra);
        }

        Ok(Self {
            rows: parse_selector_list(&row_source)?,
            labels: parse_selector_list(LABEL_SELECTORS)?,
            addons: parse_selector_list(ADDON_SELECTORS)?,
            controls: parse_selector_list(CONTROL_SELECTORS)?,
            markers: parse_selector_list(MARKER_SELECTORS)?,
            help_icons: parse_selector_list(HELP_ICON_SELECTORS)?,
            word_required: Regex::new(r"(?i)(^|\s)required\b").unwrap(),
            loose_required: Regex::new(r"(?i)required").unwrap(),
        })
    }

    /// Run the pass over `scope`.
    ///
    /// Each row is handled independently; a stale index mid-row is swallowed
    /// so the remaining rows still get their attributes.
    #[instrument(level = "debug", skip(self, document))]
    pub fn run(&self, document: &mut Document, scope: Scope) -> ApplicationResult<FormsReport> {
        let mut report = FormsReport::default();

        for row in select_scoped(document, scope, &self.rows) {
            let decision = self.assess_row(document, row);
            trace!(?row, ?decision, "assessed field row");
            report.decisions.push(decision);

            if !decision.required {
                continue;
            }
            let Some(control) = document.first_match_within(row, &self.controls) else {
                continue;
            };
            if self.mark_control(document, control) {
                report.marked += 1;
            }
        }

        debug!(
            "run: rows={} required={} marked={}",
            report.rows(),
            report.required(),
            report.marked
        );
        Ok(report)
    }

    /// Evaluate the layered required signals for one row.
    pub fn assess_row(&self, document: &Document, row: Index) -> RowDecision {
        let control = document.first_match_within(row, &self.controls);
        let native = control
            .and_then(|idx| document.element(idx))
            .is_some_and(|data| {
                NATIVE_PROBES
                    .iter()
                    .any(|probe| probe(data) == Some(true))
            });

        let marker = document.first_match_within(row, &self.markers).is_some();
        let help_icon = document.first_match_within(row, &self.help_icons).is_some();

        let addon_text = document
            .first_match_within(row, &self.addons)
            .map(|idx| document.text_content(idx))
            .unwrap_or_default();
        let label_text = document
            .first_match_within(row, &self.labels)
            .map(|idx| document.text_content(idx))
            .unwrap_or_default();
        let has_required_text = self.loose_required.is_match(addon_text.trim())
            || self.word_required.is_match(label_text.trim());

        RowDecision {
            native,
            marker,
            help_icon,
            has_required_text,
            required: native || (marker && !help_icon),
        }
    }

    /// Reflect "required" onto the control. Returns true when an attribute
    /// was actually added.
    fn mark_control(&self, document: &mut Document, control: Index) -> bool {
        let mut changed = false;

        // Absent or empty both count as unset, so a blank stub gets the
        // canonical value.
        let aria_unset = document
            .attr(control, "aria-required")
            .map_or(true, str::is_empty);
        if aria_unset && document.set_attr(control, "aria-required", "true").is_ok() {
            changed = true;
        }

        // Best-effort native flag; a failure here must not kill the pass.
        if document.attr(control, "required").is_none() {
            match document.set_attr(control, "required", "") {
                Ok(()) => changed = true,
                Err(e) => trace!("mark_control: setting required flag failed: {e}"),
            }
        }

        changed
    }
}
