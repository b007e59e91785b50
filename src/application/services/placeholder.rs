//! Event-title placeholder pass
//!
//! Gives the calendar "new event" title input an instructional placeholder,
//! covering both the full-page form and the modal variant. Purely cosmetic:
//! any failure is swallowed, and an existing non-empty placeholder (e.g. a
//! site-localized one) is never overwritten.

use tracing::{debug, instrument, trace};

use crate::application::services::{select_scoped, Scope};
use crate::application::ApplicationResult;
use crate::config::CalendarConfig;
use crate::domain::{parse_selector_list, Document, SelectorList};

/// Counters from one pass run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaceholderReport {
    /// Candidate title inputs seen
    pub candidates: usize,
    /// Inputs that received the placeholder
    pub set: usize,
}

/// The placeholder pass.
pub struct PlaceholderService {
    candidates: SelectorList,
    text: String,
}

impl PlaceholderService {
    /// Create the pass from the configured title selectors and text.
    pub fn new(config: &CalendarConfig) -> ApplicationResult<Self> {
        Ok(Self {
            candidates: parse_selector_list(&config.title_selectors.join(", "))?,
            text: config.title_placeholder.clone(),
        })
    }

    /// Run the pass over `scope`.
    #[instrument(level = "debug", skip(self, document))]
    pub fn run(&self, document: &mut Document, scope: Scope) -> ApplicationResult<PlaceholderReport> {
        let mut report = PlaceholderReport::default();

        for input in select_scoped(document, scope, &self.candidates) {
            report.candidates += 1;

            let blank = document
                .attr(input, "placeholder")
                .map_or(true, |value| value.trim().is_empty());
            if !blank {
                continue;
            }
            match document.set_attr(input, "placeholder", &self.text) {
                Ok(()) => report.set += 1,
                Err(e) => trace!("run: placeholder write failed, skipping: {e}"),
            }
        }

        debug!("run: candidates={} set={}", report.candidates, report.set);
        Ok(report)
    }
}
