use tenfi::analyzer::parser::{
    extract_json_payload, parse_clause_findings, parse_metadata, parse_price_comparison,
    parse_rewrite, parse_summary, unreviewed_clauses,
};
use tenfi::models::{PriceAssessment, RewriteTarget, Severity};

#[test]
fn test_clauses_wrapped_in_object_and_fence() {
    let raw = "```json\n{\"clauses\": [{\"clause\": \"Rent due on the 1st\", \"severity\": \"low\"}]}\n```";
    let parsed = parse_clause_findings(raw).unwrap();

    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.value.len(), 1);
    assert_eq!(parsed.value[0].severity, Severity::Low);
}

#[test]
fn test_clause_severity_outside_allowed_set() {
    let raw = r#"[{"clause": "Tenant pays landlord's legal fees", "severity": "Critical"}]"#;
    let parsed = parse_clause_findings(raw).unwrap();

    assert_eq!(parsed.value[0].severity, Severity::Unknown);
    assert!(!parsed.value[0].warrants_rewrite());
    assert!(parsed.warning().unwrap().contains("'Critical'"));
}

#[test]
fn test_clause_entries_without_text_are_skipped() {
    let raw = r#"[{"severity": "High"}, {"clause": "No subletting", "severity": "Medium", "illegal": "yes"}]"#;
    let parsed = parse_clause_findings(raw).unwrap();

    assert_eq!(parsed.value.len(), 1);
    assert!(parsed.value[0].potentially_illegal);
    assert!(parsed.warning().unwrap().contains("skipped 1"));
}

#[test]
fn test_empty_clause_array_is_clean() {
    let parsed = parse_clause_findings("[]").unwrap();
    assert!(parsed.value.is_empty());
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_clause_fallback_keeps_model_answer() {
    let raw = "  The deposit clause looks unlawful.  ";
    assert!(parse_clause_findings(raw).is_err());

    let fallback = unreviewed_clauses(raw);
    assert_eq!(fallback.len(), 1);
    assert!(fallback[0].needs_manual_review);
    assert_eq!(fallback[0].clause_text, "The deposit clause looks unlawful.");

    assert_eq!(unreviewed_clauses("").len(), 1);
}

#[test]
fn test_summary_markdown_headings() {
    let raw = "Here is the summary:\n\n## Basic Terms\nRent $1800.\n\n**Key Obligations:** Pay on time.\n\n3. TERMINATION TERMS: 60 days notice.";
    let summary = parse_summary(raw).unwrap().value;

    let headings: Vec<&str> = summary.sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, vec!["Basic Terms", "Key Obligations", "Termination Terms"]);
    assert_eq!(summary.obligations(), Some("Pay on time."));
    assert_eq!(summary.section("termination"), Some("60 days notice."));
}

#[test]
fn test_summary_keeps_intro_as_overview() {
    let raw = "A standard one-year lease.\nBASIC TERMS: Rent $900.";
    let summary = parse_summary(raw).unwrap().value;

    assert_eq!(summary.sections[0].heading, "Overview");
    assert_eq!(summary.sections[0].body, "A standard one-year lease.");
    assert_eq!(summary.basic_terms(), Some("Rent $900."));
}

#[test]
fn test_price_rationale_spans_lines() {
    let raw = "ASSESSMENT: at market\nRATIONALE:\nSimilar units rent for $1750.\nSources: Zillow";
    let parsed = parse_price_comparison(raw, true).unwrap();

    assert_eq!(parsed.value.assessment, PriceAssessment::AtMarket);
    assert_eq!(parsed.value.rationale, "Similar units rent for $1750.\nSources: Zillow");
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_price_without_any_assessment() {
    let parsed = parse_price_comparison("Hard to say without more data.", false).unwrap();

    assert_eq!(parsed.value.assessment, PriceAssessment::Unknown);
    assert!(parsed.value.location_caveat);
    assert_eq!(parsed.value.rationale, "Hard to say without more data.");
    assert!(parsed.warning().is_some());
}

#[test]
fn test_rewrite_with_markdown_labels() {
    let target = RewriteTarget::new("Landlord may enter at any time.");
    let raw = "**Rewrite:** Landlord may enter with 24 hours written notice.\n\
               **Negotiation Tips:**\n- Cite privacy norms\n- Offer flexible scheduling\n\
               **Legal Basis:** Most states require reasonable notice.";

    let rewrite = parse_rewrite(raw, &target).unwrap().value;

    assert_eq!(rewrite.original, "Landlord may enter at any time.");
    assert_eq!(rewrite.rewrite, "Landlord may enter with 24 hours written notice.");
    assert!(rewrite.negotiation_tips.contains("Offer flexible scheduling"));
    assert_eq!(rewrite.legal_basis, "Most states require reasonable notice.");
}

#[test]
fn test_metadata_from_prose_wrapped_json() {
    let raw = "Sure! {\"property_address\": \"N/A\", \"monthly_rent\": \"$2,150.00\", \"number_of_bathrooms\": 1.5, \"zip_code\": 97201}";
    let metadata = parse_metadata(raw).unwrap().value;

    assert!(metadata.property_address.is_none());
    assert_eq!(metadata.monthly_rent, Some(2150.0));
    assert_eq!(metadata.bathrooms, Some(1.5));
    assert_eq!(metadata.zip_code.as_deref(), Some("97201"));
}

#[test]
fn test_json_payload_prefers_first_container() {
    let value = extract_json_payload("Result: {\"items\": [1, 2]} and [3]").unwrap();
    assert!(value.is_object());

    assert!(extract_json_payload("no json here").is_none());
}
