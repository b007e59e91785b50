//! Tests for EnhancerRuntime
//!
//! Lifecycle: one initial full-document sweep on start, then batch-wise
//! enhancement of inserted subtrees on every pump, until stop. The runtime
//! must never observe its own badge insertions, and inserted content must
//! not trigger a second pass over the rest of the page.

use generational_arena::Index;

use lmstune::application::services::{EnhancerRuntime, LifecycleState};
use lmstune::application::ApplicationError;
use lmstune::config::Settings;
use lmstune::domain::{Document, ElementData};
use lmstune::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn runtime() -> EnhancerRuntime {
    EnhancerRuntime::new(&Settings::default()).unwrap()
}

/// Helper building a page with one required form row and one course event.
fn sample_page() -> (Document, Index) {
    let mut doc = Document::new();
    let body = doc.insert(ElementData::new("body"), None).unwrap();

    let form = doc
        .insert(ElementData::new("form").with_class("mform"), Some(body))
        .unwrap();
    let row = doc
        .insert(ElementData::new("div").with_class("fitem row"), Some(form))
        .unwrap();
    doc.insert(
        ElementData::new("input").with_attr("required", ""),
        Some(row),
    )
    .unwrap();

    let calendar = doc
        .insert(ElementData::new("div").with_class("calendar"), Some(body))
        .unwrap();
    let event = doc
        .insert(
            ElementData::new("div").with_class("calendar_event_course"),
            Some(calendar),
        )
        .unwrap();
    doc.insert(
        ElementData::new("a").with_class("eventname"),
        Some(event),
    )
    .unwrap();

    (doc, body)
}

/// Helper attaching a detached modal form (one required row) under `parent`,
/// journaled as a single inserted root.
fn attach_modal(doc: &mut Document, parent: Index) -> Index {
    let modal = doc.create_element(ElementData::new("div").with_class("modal"));
    let form = doc.create_element(ElementData::new("form").with_class("mform"));
    let row = doc.create_element(ElementData::new("div").with_class("fitem row"));
    let input = doc.create_element(
        ElementData::new("input")
            .with_attr("name", "name")
            .with_attr("required", ""),
    );
    doc.append_child(row, input).unwrap();
    doc.append_child(form, row).unwrap();
    doc.append_child(modal, form).unwrap();
    doc.append_child(parent, modal).unwrap();
    modal
}

// ============================================================
// Lifecycle transitions
// ============================================================

#[test]
fn given_idle_runtime_when_started_then_whole_document_swept() {
    // Arrange
    let (mut doc, _) = sample_page();
    let mut runtime = runtime();
    assert_eq!(runtime.state(), LifecycleState::Idle);

    // Act
    let report = runtime.start(&mut doc).unwrap();

    // Assert
    assert_eq!(runtime.state(), LifecycleState::Observing);
    assert_eq!(report.forms.rows(), 1);
    assert_eq!(report.forms.marked, 1);
    assert_eq!(report.calendar.badged(), 1);
    assert!(doc.is_observing());
}

#[test]
fn given_started_runtime_when_started_again_then_lifecycle_error() {
    // Arrange
    let (mut doc, _) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();

    // Act
    let err = runtime.start(&mut doc).unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::Lifecycle { .. }));
    assert_eq!(runtime.state(), LifecycleState::Observing);
}

#[test]
fn given_idle_runtime_when_stopped_then_lifecycle_error() {
    // Arrange
    let (mut doc, _) = sample_page();
    let mut runtime = runtime();

    // Act & Assert
    assert!(matches!(
        runtime.stop(&mut doc),
        Err(ApplicationError::Lifecycle { .. })
    ));
}

#[test]
fn given_stopped_runtime_when_pumped_then_lifecycle_error() {
    // Arrange - stopped runtimes stay stopped, like a torn-down page
    let (mut doc, _) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();
    runtime.stop(&mut doc).unwrap();
    assert_eq!(runtime.state(), LifecycleState::Stopped);

    // Act & Assert
    assert!(matches!(
        runtime.pump(&mut doc),
        Err(ApplicationError::Lifecycle { .. })
    ));
    assert!(matches!(
        runtime.start(&mut doc),
        Err(ApplicationError::Lifecycle { .. })
    ));
}

// ============================================================
// Batch pumping
// ============================================================

#[test]
fn given_quiet_page_when_pumped_then_none() {
    // Arrange
    let (mut doc, _) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();

    // Act & Assert
    assert_eq!(runtime.pump(&mut doc).unwrap(), None);
    assert_eq!(runtime.batches_processed(), 0);
}

#[test]
fn given_inserted_modal_when_pumped_then_only_subtree_enhanced() {
    // Arrange
    let (mut doc, body) = sample_page();
    let mut runtime = runtime();
    let initial = runtime.start(&mut doc).unwrap();
    assert_eq!(initial.forms.rows(), 1);

    attach_modal(&mut doc, body);

    // Act
    let enhanced = runtime.pump(&mut doc).unwrap().unwrap();

    // Assert - one batch, one root, and only the modal's row was scanned
    assert_eq!(enhanced.seq, 1);
    assert_eq!(enhanced.roots, 1);
    assert_eq!(enhanced.report.forms.rows(), 1);
    assert_eq!(enhanced.report.forms.marked, 1);
    assert_eq!(enhanced.report.placeholder.set, 1);
    assert_eq!(runtime.batches_processed(), 1);
}

#[test]
fn given_two_inserts_when_pumped_once_then_single_batch_with_both_roots() {
    // Arrange
    let (mut doc, body) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();

    attach_modal(&mut doc, body);
    attach_modal(&mut doc, body);

    // Act
    let enhanced = runtime.pump(&mut doc).unwrap().unwrap();

    // Assert
    assert_eq!(enhanced.roots, 2);
    assert_eq!(enhanced.report.forms.rows(), 2);
    assert_eq!(runtime.pump(&mut doc).unwrap(), None);
}

#[test]
fn given_inserted_event_when_pumped_then_badge_not_rejournaled() {
    // Arrange - an insertion wrapper holding a classifiable event
    let (mut doc, body) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();
    assert_eq!(doc.pending_mutations(), 0);

    let calendar = doc
        .insert(ElementData::new("div").with_class("calendar"), Some(body))
        .unwrap();
    let wrapper = doc.create_element(ElementData::new("div"));
    let event = doc.create_element(
        ElementData::new("div")
            .with_class("calendar-event")
            .with_attr("data-eventtype", "group"),
    );
    doc.append_child(wrapper, event).unwrap();
    doc.append_child(calendar, wrapper).unwrap();

    // Act - drain; the badge lands inside the event during the drain
    let enhanced = runtime.pump(&mut doc).unwrap().unwrap();

    // Assert - the runtime's own insertion never becomes a new batch
    assert_eq!(enhanced.report.calendar.badged(), 1);
    assert_eq!(doc.pending_mutations(), 0);
    assert_eq!(runtime.pump(&mut doc).unwrap(), None);
}

#[test]
fn given_batches_when_pumped_then_sequence_numbers_increase() {
    // Arrange
    let (mut doc, body) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();

    // Act
    attach_modal(&mut doc, body);
    let first = runtime.pump(&mut doc).unwrap().unwrap();
    attach_modal(&mut doc, body);
    let second = runtime.pump(&mut doc).unwrap().unwrap();

    // Assert
    assert_eq!(first.seq, 1);
    assert_eq!(second.seq, 2);
    assert_eq!(runtime.batches_processed(), 2);
}

#[test]
fn given_undrained_insertions_when_stopped_then_discarded() {
    // Arrange
    let (mut doc, body) = sample_page();
    let mut runtime = runtime();
    runtime.start(&mut doc).unwrap();
    attach_modal(&mut doc, body);
    assert_eq!(doc.pending_mutations(), 1);

    // Act
    runtime.stop(&mut doc).unwrap();

    // Assert
    assert!(!doc.is_observing());
    assert_eq!(doc.pending_mutations(), 0);
}

#[test]
fn given_two_runtimes_then_instance_tags_differ() {
    // Arrange & Act
    let a = runtime();
    let b = runtime();

    // Assert
    assert_eq!(a.tag().len(), 8);
    assert_ne!(a.tag(), b.tag());
}
