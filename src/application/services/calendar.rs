//! Calendar badge pass
//!
//! Appends a textual " (Course)" / " (User)" / " (Group)" / " (Site)" badge
//! to calendar entries that would otherwise be distinguishable by color
//! alone. Classification reads the legacy class names first, then the data
//! attribute; unclassifiable entries are left alone. At most one badge per
//! anchor, no matter how often the pass runs.

use std::fmt;

use generational_arena::Index;
use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::application::services::{select_scoped, Scope};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::CalendarConfig;
use crate::domain::{
    parse_selector_list, Document, ElementData, EventCategory, SelectorList,
};

const EVENT_SELECTORS: &str = ".calendar_event_course, .calendar_event_user, \
     .calendar_event_group, .calendar_event_site, .calendar .calendar-event, .calendar .event";
const ANCHOR_SELECTORS: &str = ".eventname, .name, a, .calendar-event-link";

/// Data attributes probed for the event type, in order. The first one with a
/// non-empty value wins.
const TYPE_ATTRIBUTES: &[&str] = &["data-eventtype", "data-event-type"];

/// One badge the pass appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedBadge {
    /// Resolved category
    pub category: EventCategory,
    /// Short description of the element the badge landed on, e.g. `a.eventname`
    pub anchor: String,
}

impl fmt::Display for AppliedBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) on {}", self.category.label(), self.anchor)
    }
}

/// Outcome of one pass run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarReport {
    /// Calendar entries seen
    pub events: usize,
    /// Badges appended, in document order
    pub badges: Vec<AppliedBadge>,
    /// Entries with no resolvable category
    pub unclassified: usize,
}

impl CalendarReport {
    /// Entries that received a new badge.
    pub fn badged(&self) -> usize {
        self.badges.len()
    }
}

/// The calendar badge pass.
pub struct CalendarLabelService {
    events: SelectorList,
    anchors: SelectorList,
    existing_badge: SelectorList,
    badge_class: String,
    badge_style: String,
    word_patterns: Vec<(EventCategory, Regex)>,
}

impl CalendarLabelService {
    /// Create the pass.
    ///
    /// # Arguments
    /// * `config` - Badge class/style and extra event selectors
    pub fn new(config: &CalendarConfig) -> ApplicationResult<Self> {
        let mut event_source = EVENT_SELECTORS.to_string();
        for extra in &config.extra_event_selectors {
            event_source.push_str(", ");
            event_source.push_str(extra);
        }

        let word_patterns = EventCategory::ALL
            .iter()
            .map(|&category| {
                // Whole word, bounded by whitespace or the value's ends.
                Regex::new(&format!(r"(?i)(^|\s){}(\s|$)", category.keyword()))
                    .map(|re| (category, re))
                    .map_err(|e| ApplicationError::OperationFailed {
                        context: format!("compile category pattern for {category}"),
                        source: Box::new(e),
                    })
            })
            .collect::<ApplicationResult<Vec<_>>>()?;

        Ok(Self {
            events: parse_selector_list(&event_source)?,
            anchors: parse_selector_list(ANCHOR_SELECTORS)?,
            existing_badge: parse_selector_list(&format!(".{}", config.badge_class))?,
            badge_class: config.badge_class.clone(),
            badge_style: config.badge_style.clone(),
            word_patterns,
        })
    }

    /// Run the pass over `scope`.
    ///
    /// Badge insertions happen with the journal paused, so the pass never
    /// observes its own output.
    #[instrument(level = "debug", skip(self, document))]
    pub fn run(&self, document: &mut Document, scope: Scope) -> ApplicationResult<CalendarReport> {
        let mut report = CalendarReport::default();

        for event in select_scoped(document, scope, &self.events) {
            report.events += 1;

            let Some(category) = self.classify(document, event) else {
                report.unclassified += 1;
                continue;
            };

            let anchor = document
                .first_match_within(event, &self.anchors)
                .unwrap_or(event);

            if document.first_match_within(anchor, &self.existing_badge).is_some() {
                trace!(?event, "badge already present, skipping");
                continue;
            }

            if self.append_badge(document, anchor, category) {
                report.badges.push(AppliedBadge {
                    category,
                    anchor: describe_element(document, anchor),
                });
            }
        }

        debug!(
            "run: events={} badged={} unclassified={}",
            report.events,
            report.badged(),
            report.unclassified
        );
        Ok(report)
    }

    /// Resolve an entry's category: class-name substring first, then the
    /// data attribute matched as a whole word.
    pub fn classify(&self, document: &Document, event: Index) -> Option<EventCategory> {
        let data = document.element(event)?;
        let class = data.class_name();
        let type_value = TYPE_ATTRIBUTES
            .iter()
            .filter_map(|name| data.attr(name))
            .find(|value| !value.is_empty())
            .unwrap_or("");

        self.word_patterns
            .iter()
            .find(|(category, pattern)| {
                class.contains(&category.class_marker()) || pattern.is_match(type_value)
            })
            .map(|&(category, _)| category)
    }

    fn append_badge(
        &self,
        document: &mut Document,
        anchor: Index,
        category: EventCategory,
    ) -> bool {
        let badge = ElementData::new("span")
            .with_class(self.badge_class.clone())
            .with_attr("style", self.badge_style.clone())
            .with_text(format!(" ({})", category.label()));

        document.while_paused(|doc| {
            let idx = doc.create_element(badge);
            match doc.append_child(anchor, idx) {
                Ok(()) => true,
                Err(e) => {
                    trace!("append_badge: insertion failed, skipping: {e}");
                    false
                }
            }
        })
    }
}

/// Tag plus first class, the way a selector would name the element.
fn describe_element(document: &Document, idx: Index) -> String {
    let Some(data) = document.element(idx) else {
        return String::from("?");
    };
    match data.class_name().split_whitespace().next() {
        Some(class) => format!("{}.{}", data.tag, class),
        None => data.tag.clone(),
    }
}
