//! Enhancer runtime
//!
//! Process-wide runtime that owns the three enhancement passes and the
//! observation lifecycle: started once at page initialization, it sweeps the
//! whole document, then consumes insertion batches until stopped. Dynamic
//! content (modal forms, lazily rendered calendar cells) gets the same
//! treatment as the initial page without any caller bookkeeping.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::services::{
    CalendarLabelService, CalendarReport, FormsReport, PlaceholderReport, PlaceholderService,
    RequiredFieldService, Scope,
};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::Document;

/// Runtime lifecycle. The runtime is single-shot: once stopped it stays
/// stopped, matching a page teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Observing,
    Stopped,
}

/// Aggregated outcome of running all three passes over one scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub forms: FormsReport,
    pub placeholder: PlaceholderReport,
    pub calendar: CalendarReport,
}

impl SweepReport {
    /// Fold another sweep's outcome into this one.
    pub fn merge(&mut self, other: SweepReport) {
        self.forms.decisions.extend(other.forms.decisions);
        self.forms.marked += other.forms.marked;
        self.placeholder.candidates += other.placeholder.candidates;
        self.placeholder.set += other.placeholder.set;
        self.calendar.events += other.calendar.events;
        self.calendar.badges.extend(other.calendar.badges);
        self.calendar.unclassified += other.calendar.unclassified;
    }
}

/// Outcome of draining one insertion batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceReport {
    /// Batch sequence number from the journal
    pub seq: u64,
    /// Inserted roots that were still attached when processed
    pub roots: usize,
    pub report: SweepReport,
}

/// The enhancement runtime.
pub struct EnhancerRuntime {
    required: RequiredFieldService,
    placeholder: PlaceholderService,
    calendar: CalendarLabelService,
    state: LifecycleState,
    tag: String,
    batches: u64,
}

impl EnhancerRuntime {
    /// Build the runtime and its passes from settings.
    pub fn new(settings: &Settings) -> ApplicationResult<Self> {
        let mut tag = Uuid::new_v4().simple().to_string();
        tag.truncate(8);
        Ok(Self {
            required: RequiredFieldService::new(&settings.forms)?,
            placeholder: PlaceholderService::new(&settings.calendar)?,
            calendar: CalendarLabelService::new(&settings.calendar)?,
            state: LifecycleState::Idle,
            tag,
            batches: 0,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Short unique tag identifying this runtime instance in logs.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Batches processed since start.
    pub fn batches_processed(&self) -> u64 {
        self.batches
    }

    /// Run the initial full-document sweep, then start observing `document`.
    ///
    /// Observation begins only after the sweep, so nothing the initial sweep
    /// inserts is ever journaled.
    #[instrument(level = "debug", skip(self, document), fields(instance = %self.tag))]
    pub fn start(&mut self, document: &mut Document) -> ApplicationResult<SweepReport> {
        if self.state != LifecycleState::Idle {
            return Err(ApplicationError::Lifecycle {
                message: format!("start called on {:?} runtime", self.state),
            });
        }
        info!("start: initial sweep, then observing");
        let report = self.sweep(document, Scope::Document);
        document.start_observing();
        self.state = LifecycleState::Observing;
        Ok(report)
    }

    /// Drain one insertion batch and enhance each inserted subtree.
    ///
    /// The journal is paused for the whole drain, so the runtime's own
    /// insertions (badges) cannot feed back into a later batch. Returns
    /// Ok(None) when the page was quiet. Roots that were detached again
    /// between insertion and processing resolve stale and are skipped.
    #[instrument(level = "debug", skip(self, document), fields(instance = %self.tag))]
    pub fn pump(&mut self, document: &mut Document) -> ApplicationResult<Option<EnhanceReport>> {
        if self.state != LifecycleState::Observing {
            return Err(ApplicationError::Lifecycle {
                message: format!("pump called on {:?} runtime", self.state),
            });
        }
        let Some(batch) = document.take_mutations() else {
            return Ok(None);
        };
        self.batches += 1;

        let (report, live_roots) = document.while_paused(|doc| {
            let mut report = SweepReport::default();
            let mut live = 0usize;
            for &root in &batch.roots {
                if doc.element(root).is_none() {
                    continue;
                }
                live += 1;
                report.merge(self.sweep(doc, Scope::Subtree(root)));
            }
            (report, live)
        });

        debug!(
            "pump: batch={} roots={} live={}",
            batch.seq,
            batch.roots.len(),
            live_roots
        );
        Ok(Some(EnhanceReport {
            seq: batch.seq,
            roots: live_roots,
            report,
        }))
    }

    /// Stop observing. Undrained insertions are discarded.
    #[instrument(level = "debug", skip(self, document), fields(instance = %self.tag))]
    pub fn stop(&mut self, document: &mut Document) -> ApplicationResult<()> {
        if self.state != LifecycleState::Observing {
            return Err(ApplicationError::Lifecycle {
                message: format!("stop called on {:?} runtime", self.state),
            });
        }
        document.stop_observing();
        self.state = LifecycleState::Stopped;
        info!("stop: done after {} batches", self.batches);
        Ok(())
    }

    /// Run the three passes over one scope. A failing pass is logged and
    /// reported as empty; it never blocks the remaining passes.
    fn sweep(&self, document: &mut Document, scope: Scope) -> SweepReport {
        let mut report = SweepReport::default();
        match self.required.run(document, scope) {
            Ok(forms) => report.forms = forms,
            Err(e) => warn!("required-field pass failed: {e}"),
        }
        match self.placeholder.run(document, scope) {
            Ok(placeholder) => report.placeholder = placeholder,
            Err(e) => warn!("placeholder pass failed: {e}"),
        }
        match self.calendar.run(document, scope) {
            Ok(calendar) => report.calendar = calendar,
            Err(e) => warn!("calendar badge pass failed: {e}"),
        }
        report
    }
}
