//! Structural-change journal for the document.
//!
//! Stands in for the page's mutation-observation API as a pull-based event
//! stream: the document records the root of every subtree attached while
//! observation is on, and the runtime drains those roots in batches. Only
//! insertions are journaled; attribute writes never are, so the enhancement
//! passes cannot feed themselves.

use chrono::{DateTime, Utc};
use generational_arena::Index;
use itertools::Itertools;
use tracing::{instrument, trace};

/// One drained batch of newly inserted subtree roots.
///
/// `roots` preserves insertion order. Nested insertions are reported the way
/// they were attached: appending a connected parent and then its children
/// yields one root per append, which downstream scans tolerate because every
/// pass is idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    /// Monotonic batch number, starting at 1 for the first drained batch.
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub roots: Vec<Index>,
}

/// Insertion journal owned by the document.
///
/// `record` is a no-op unless observation has been started, and while the
/// journal is paused. Pausing is how the runtime keeps its own insertions
/// (badges) out of the stream it consumes.
#[derive(Debug, Default)]
pub struct MutationJournal {
    observing: bool,
    paused: bool,
    next_seq: u64,
    pending: Vec<Index>,
}

impl MutationJournal {
    pub fn new() -> Self {
        Self {
            observing: false,
            paused: false,
            next_seq: 1,
            pending: Vec::new(),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn start(&mut self) {
        self.observing = true;
    }

    /// Stop observing and discard anything not yet drained.
    #[instrument(level = "debug", skip(self))]
    pub fn stop(&mut self) {
        self.observing = false;
        self.pending.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn record(&mut self, root: Index) {
        if self.observing && !self.paused {
            trace!(?root, "journal insertion");
            self.pending.push(root);
        }
    }

    /// Drain the pending roots into a batch, or None when nothing happened.
    /// Duplicate roots collapse to their first occurrence.
    #[instrument(level = "trace", skip(self))]
    pub fn take_batch(&mut self) -> Option<MutationBatch> {
        if self.pending.is_empty() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(MutationBatch {
            seq,
            recorded_at: Utc::now(),
            roots: std::mem::take(&mut self.pending)
                .into_iter()
                .unique()
                .collect(),
        })
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
