//! Tests for RequiredFieldService
//!
//! The pass layers three signals per field row: a native flag on the
//! control, an explicit marker element, and a help icon that demotes the
//! marker. The verdict lands on the control as `aria-required="true"` plus
//! the native flag, and running the pass twice must change nothing.

use generational_arena::Index;
use rstest::rstest;

use lmstune::application::services::{RequiredFieldService, Scope};
use lmstune::config::FormsConfig;
use lmstune::domain::{Document, ElementData};
use lmstune::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Helper building `body > form.mform > div.fitem.row > label + input`,
/// returning the document plus the row and input indices.
fn form_with_row(input: ElementData) -> (Document, Index, Index) {
    let mut doc = Document::new();
    let body = doc.insert(ElementData::new("body"), None).unwrap();
    let form = doc
        .insert(ElementData::new("form").with_class("mform"), Some(body))
        .unwrap();
    let row = doc
        .insert(ElementData::new("div").with_class("fitem row"), Some(form))
        .unwrap();
    doc.insert(
        ElementData::new("label")
            .with_class("col-form-label")
            .with_text("Full name"),
        Some(row),
    )
    .unwrap();
    let control = doc.insert(input, Some(row)).unwrap();
    (doc, row, control)
}

fn pass() -> RequiredFieldService {
    RequiredFieldService::new(&FormsConfig::default()).unwrap()
}

// ============================================================
// Native signal probes
// ============================================================

#[test]
fn given_control_with_required_attribute_when_running_then_aria_added() {
    // Arrange
    let (mut doc, _, control) = form_with_row(
        ElementData::new("input").with_attr("required", ""),
    );
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.rows(), 1);
    assert_eq!(report.required(), 1);
    assert_eq!(report.marked, 1);
    assert_eq!(doc.attr(control, "aria-required"), Some("true"));
}

#[test]
fn given_control_with_aria_required_true_when_running_then_native_flag_added() {
    // Arrange
    let (mut doc, _, control) = form_with_row(
        ElementData::new("input").with_attr("aria-required", "true"),
    );
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert - the aria signal alone drives the native flag onto the control
    assert_eq!(report.required(), 1);
    assert_eq!(doc.attr(control, "required"), Some(""));
}

#[rstest]
#[case::aria_false("false", false)]
#[case::aria_true("true", true)]
fn given_aria_required_value_when_assessing_then_only_true_counts(
    #[case] value: &str,
    #[case] expected: bool,
) {
    // Arrange
    let (doc, row, _) = form_with_row(
        ElementData::new("input").with_attr("aria-required", value),
    );
    let service = pass();

    // Act
    let decision = service.assess_row(&doc, row);

    // Assert
    assert_eq!(decision.native, expected);
    assert_eq!(decision.required, expected);
}

#[test]
fn given_plain_control_when_running_then_row_left_alone() {
    // Arrange
    let (mut doc, _, control) = form_with_row(ElementData::new("input"));
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.required(), 0);
    assert_eq!(report.marked, 0);
    assert_eq!(doc.attr(control, "aria-required"), None);
}

// ============================================================
// Marker and help icon
// ============================================================

#[test]
fn given_marker_without_help_icon_when_running_then_marked() {
    // Arrange - marker element inside the label
    let (mut doc, row, control) = form_with_row(ElementData::new("input"));
    let label = doc.children(row)[0];
    doc.insert(
        ElementData::new("span")
            .with_class("form-required")
            .with_text("*"),
        Some(label),
    )
    .unwrap();
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.required(), 1);
    assert_eq!(doc.attr(control, "aria-required"), Some("true"));
    assert_eq!(doc.attr(control, "required"), Some(""));
}

#[test]
fn given_marker_with_help_icon_when_running_then_untouched() {
    // Arrange - a help icon in the row demotes the marker
    let (mut doc, row, control) = form_with_row(ElementData::new("input"));
    let label = doc.children(row)[0];
    doc.insert(
        ElementData::new("span")
            .with_class("form-required")
            .with_text("*"),
        Some(label),
    )
    .unwrap();
    doc.insert(
        ElementData::new("a").with_attr("data-region", "help-icon"),
        Some(row),
    )
    .unwrap();
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    let decision = report.decisions[0];
    assert!(decision.marker);
    assert!(decision.help_icon);
    assert!(!decision.required);
    assert_eq!(doc.attr(control, "aria-required"), None);
}

#[test]
fn given_native_signal_and_help_icon_when_running_then_still_required() {
    // Arrange - help icon only demotes the marker, never the native signal
    let (mut doc, row, _) = form_with_row(
        ElementData::new("input").with_attr("required", ""),
    );
    doc.insert(
        ElementData::new("a").with_attr("data-region", "help-icon"),
        Some(row),
    )
    .unwrap();
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.required(), 1);
}

#[test]
fn given_abbr_marker_when_assessing_then_title_matched_case_insensitively() {
    // Arrange - the abbr variant advertises itself via the title attribute
    let (mut doc, row, _) = form_with_row(ElementData::new("input"));
    doc.insert(
        ElementData::new("abbr")
            .with_class("required")
            .with_attr("title", "This field is REQUIRED"),
        Some(row),
    )
    .unwrap();
    let service = pass();

    // Act
    let decision = service.assess_row(&doc, row);

    // Assert
    assert!(decision.marker);
    assert!(decision.required);
}

// ============================================================
// Idempotence and duplicate text
// ============================================================

#[test]
fn given_marked_row_when_running_twice_then_second_run_changes_nothing() {
    // Arrange
    let (mut doc, _, control) = form_with_row(
        ElementData::new("input").with_attr("required", ""),
    );
    let service = pass();
    service.run(&mut doc, Scope::Document).unwrap();

    // Act
    let second = service.run(&mut doc, Scope::Document).unwrap();

    // Assert - still judged required, but no new attributes
    assert_eq!(second.required(), 1);
    assert_eq!(second.marked, 0);
    assert_eq!(doc.attr(control, "aria-required"), Some("true"));
}

#[test]
fn given_blank_aria_stub_when_running_then_canonical_value_written() {
    // Arrange - an empty aria-required left by some other script
    let (mut doc, _, control) = form_with_row(
        ElementData::new("input")
            .with_attr("required", "")
            .with_attr("aria-required", ""),
    );
    let service = pass();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.marked, 1);
    assert_eq!(doc.attr(control, "aria-required"), Some("true"));
}

#[rstest]
#[case::word_in_label("Full name (required)", false)]
#[case::word_standalone("required", true)]
#[case::word_leading("required before Friday", true)]
#[case::substring_only("requiredness", false)]
fn given_label_text_when_assessing_then_required_word_detected(
    #[case] text: &str,
    #[case] expected: bool,
) {
    // Arrange - whole-word match on the label, ignoring punctuation-wrapped hits
    let mut doc = Document::new();
    let body = doc.insert(ElementData::new("body"), None).unwrap();
    let form = doc
        .insert(ElementData::new("form").with_class("mform"), Some(body))
        .unwrap();
    let row = doc
        .insert(ElementData::new("div").with_class("fitem row"), Some(form))
        .unwrap();
    doc.insert(
        ElementData::new("label")
            .with_class("col-form-label")
            .with_text(text),
        Some(row),
    )
    .unwrap();
    doc.insert(ElementData::new("input"), Some(row)).unwrap();
    let service = pass();

    // Act
    let decision = service.assess_row(&doc, row);

    // Assert
    assert_eq!(decision.has_required_text, expected);
}

// ============================================================
// Scope and configuration
// ============================================================

#[test]
fn given_subtree_scope_when_running_then_outside_rows_untouched() {
    // Arrange - two independent forms; only the second is in scope
    let mut doc = Document::new();
    let body = doc.insert(ElementData::new("body"), None).unwrap();

    let first_form = doc
        .insert(ElementData::new("form").with_class("mform"), Some(body))
        .unwrap();
    let first_row = doc
        .insert(
            ElementData::new("div").with_class("fitem row"),
            Some(first_form),
        )
        .unwrap();
    let first_control = doc
        .insert(
            ElementData::new("input").with_attr("required", ""),
            Some(first_row),
        )
        .unwrap();

    let second_form = doc
        .insert(ElementData::new("form").with_class("mform"), Some(body))
        .unwrap();
    let second_row = doc
        .insert(
            ElementData::new("div").with_class("fitem row"),
            Some(second_form),
        )
        .unwrap();
    let second_control = doc
        .insert(
            ElementData::new("input").with_attr("required", ""),
            Some(second_row),
        )
        .unwrap();

    let service = pass();

    // Act
    let report = service
        .run(&mut doc, Scope::Subtree(second_form))
        .unwrap();

    // Assert
    assert_eq!(report.rows(), 1);
    assert_eq!(doc.attr(second_control, "aria-required"), Some("true"));
    assert_eq!(doc.attr(first_control, "aria-required"), None);
}

#[test]
fn given_extra_row_selectors_when_configured_then_custom_rows_scanned() {
    // Arrange - a non-standard form markup only the config knows about
    let mut doc = Document::new();
    let body = doc.insert(ElementData::new("body"), None).unwrap();
    let form = doc
        .insert(ElementData::new("div").with_class("custom-form"), Some(body))
        .unwrap();
    let row = doc
        .insert(ElementData::new("div").with_class("field-row"), Some(form))
        .unwrap();
    doc.insert(
        ElementData::new("input").with_attr("required", ""),
        Some(row),
    )
    .unwrap();

    let config = FormsConfig {
        extra_row_selectors: vec![".custom-form .field-row".to_string()],
    };
    let service = RequiredFieldService::new(&config).unwrap();

    // Act
    let report = service.run(&mut doc, Scope::Document).unwrap();

    // Assert
    assert_eq!(report.rows(), 1);
    assert_eq!(report.marked, 1);
}
