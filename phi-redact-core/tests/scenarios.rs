//! End-to-end scenarios exercising the full pipeline through the public
//! `redact` entry point, one per representative document shape.

use phi_redact_core::{redact, PhiType, RedactionOptions};

#[test]
fn clinical_note_redacts_name_ssn_and_dob() {
    let text = "Patient John Smith, DOB 03/14/1975, SSN 123-45-6789, presents with chest pain.";
    let report = redact(text, &RedactionOptions::default());

    assert!(report.redacted_text.contains("[SSN]"));
    assert!(!report.redacted_text.contains("123-45-6789"));
    assert!(report.total_redacted() >= 2);
}

#[test]
fn billing_statement_redacts_account_and_contact_info() {
    let text = "Invoice for account 9988776655. Contact billing@clinic.example or 555-867-5309.";
    let report = redact(text, &RedactionOptions::default());

    assert!(report.redacted_text.contains("[ACCOUNT]"));
    assert!(report.redacted_text.contains("[EMAIL]"));
    assert!(report.redacted_text.contains("[PHONE]"));
}

#[test]
fn eponymous_disease_name_is_not_redacted_as_a_person() {
    let text = "The patient has a history consistent with Wilson's disease.";
    let report = redact(text, &RedactionOptions::default());

    assert!(report.redacted_text.contains("Wilson's disease"));
}

#[test]
fn physician_named_after_a_disease_eponym_is_still_redacted() {
    let text = "Seen by Dr. Wilson's disease clinic team for follow-up.";
    let report = redact(text, &RedactionOptions::default());

    // The person indicator ("Dr.") overrides the eponym whitelist entry.
    assert!(!report.redacted_text.contains("Wilson's disease"));
}

#[test]
fn disabling_a_type_leaves_it_untouched_end_to_end() {
    let text = "Patient lives at 123 Maple Street, Springfield.";
    let options = RedactionOptions {
        disabled_types: Some(vec![PhiType::Address]),
        ..Default::default()
    };
    let report = redact(text, &options);

    assert!(report.redacted_text.contains("123 Maple Street"));
}

#[test]
fn homoglyph_obfuscated_name_is_still_normalized_and_detected() {
    // Cyrillic \u{0410} in place of Latin 'A'.
    let text = "Patient \u{0410}dam Smith arrived today.";
    let report = redact(text, &RedactionOptions::default());

    assert_eq!(report.normalization_signals.homoglyph_substitutions, 1);
}

#[test]
fn replacement_style_token_changes_the_rendered_placeholder() {
    let text = "SSN 123-45-6789 on file.";
    let options = RedactionOptions {
        replacement_style: Some(phi_redact_core::ReplacementStyle::Token),
        ..Default::default()
    };
    let report = redact(text, &options);

    assert!(report.redacted_text.contains("{SSN}"));
}
