#[path = "../support/mod.rs"]
mod support;

use std::sync::{Arc, Mutex};
use support::StubClient;
use tenfi::analyzer::{analysis_summary, LeaseAnalysisOrchestrator};
use tenfi::cli::ReportFormatter;
use tenfi::config::AnalyzerConfig;
use tenfi::error::{CompletionErrorKind, TenfiError};
use tenfi::loader::FileLoader;
use tenfi::models::{
    DocumentSource, Facet, FacetSlot, LeaseDocument, LeaseMetadata, PriceAssessment, Severity,
};

const LEASE: &str = "Rent is $1800/month. Tenant forfeits the entire deposit for any late payment. \
Landlord may enter at any time.";

fn orchestrator(stub: &Arc<StubClient>) -> LeaseAnalysisOrchestrator {
    LeaseAnalysisOrchestrator::new(stub.clone(), &AnalyzerConfig::default())
}

fn document() -> LeaseDocument {
    LeaseDocument::from_text(LEASE)
        .with_metadata(LeaseMetadata::default().with_location("Portland, OR"))
}

#[tokio::test]
async fn test_full_analysis_fills_all_five_slots() {
    let stub = Arc::new(StubClient::new());
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    assert!(report.is_complete());
    assert!(report.degraded_facets().is_empty());
    assert_eq!(report.model, "stub-model");

    let order: Vec<Facet> = report.slots.keys().copied().collect();
    assert_eq!(order, Facet::ALL.to_vec());

    // summary, clauses, price, two rewrites, rights
    assert_eq!(stub.call_count(), 6);
}

#[tokio::test]
async fn test_rent_scenario_end_to_end() {
    let stub = Arc::new(StubClient::new());
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    let summary = report.result(Facet::Summary).and_then(|r| r.summary()).unwrap();
    assert!(summary.basic_terms().unwrap().contains("$1800"));

    let findings = report.clause_findings();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].severity, Severity::High);
    assert!(findings[0].potentially_illegal);
    assert_eq!(findings[1].severity, Severity::Medium);
    assert_eq!(report.highest_severity(), Some(Severity::High));

    let price = report.result(Facet::Price).and_then(|r| r.price()).unwrap();
    assert_eq!(price.assessment, PriceAssessment::AboveMarket);
    assert!(!price.location_caveat);
    assert!(price.rationale.contains("$1500-$1700"));

    let rewrites = report.result(Facet::Rewrite).and_then(|r| r.rewrites()).unwrap();
    assert_eq!(rewrites.len(), 2);
    assert_eq!(rewrites[0].original, findings[0].clause_text);
    assert_eq!(rewrites[0].rewrite, "Late payments incur a fee of $50.");
    assert!(rewrites[0].legal_basis.contains("cap late fees"));

    let rights = report.result(Facet::Rights).and_then(|r| r.rights()).unwrap();
    assert!(rights.contains("habitable"));
}

#[tokio::test]
async fn test_rewrite_prompts_carry_clause_text_in_order() {
    let stub = Arc::new(StubClient::new());
    orchestrator(&stub).run_full_analysis(&document()).await;

    let rewrite_prompts = stub.calls_for(Facet::Rewrite);
    assert_eq!(rewrite_prompts.len(), 2);
    assert!(rewrite_prompts[0].contains("Tenant forfeits the entire deposit for any late payment."));
    assert!(rewrite_prompts[0].contains("HIGH severity"));
    assert!(rewrite_prompts[1].contains("Landlord may enter at any time."));
    assert!(rewrite_prompts[1].contains("MEDIUM severity"));
}

#[tokio::test]
async fn test_price_failure_degrades_only_price() {
    let stub = Arc::new(StubClient::new().failing(Facet::Price, CompletionErrorKind::Timeout));
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    assert!(report.is_complete());
    assert_eq!(report.degraded_facets(), vec![Facet::Price]);

    match report.slot(Facet::Price) {
        Some(FacetSlot::Degraded(degraded)) => {
            assert_eq!(degraded.kind, Some(CompletionErrorKind::Timeout));
            assert!(degraded.message.contains("stub failure for price"));
        }
        other => panic!("expected degraded price slot, got {:?}", other),
    }

    // Facets after the failure still ran
    assert!(report.result(Facet::Rewrite).is_some());
    assert!(report.result(Facet::Rights).is_some());
    assert!(report.warnings.iter().any(|w| w.starts_with("price")));
}

#[tokio::test]
async fn test_clause_failure_marks_rewrite_unavailable_without_calling_it() {
    let stub = Arc::new(StubClient::new().failing(Facet::Clauses, CompletionErrorKind::RateLimited));
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    assert_eq!(report.degraded_facets(), vec![Facet::Clauses, Facet::Rewrite]);
    assert!(stub.calls_for(Facet::Rewrite).is_empty());
    assert!(report.result(Facet::Rights).is_some());
}

#[tokio::test]
async fn test_prose_clause_answer_is_flagged_for_manual_review() {
    let prose = "1. HIGH: 'Landlord may enter at any time' - no notice before entry.";
    let stub = Arc::new(StubClient::new().with_response(Facet::Clauses, prose));
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    assert!(report.clauses_need_manual_review());
    assert_eq!(report.degraded_facets(), vec![Facet::Rewrite]);
    assert!(stub.calls_for(Facet::Rewrite).is_empty());
    assert_eq!(
        analysis_summary(&report),
        "Clause review could not be parsed; manual review required; \
         Rent assessed ABOVE MARKET; Unavailable: rewrite"
    );

    let text = ReportFormatter::plain().format_report(&report);
    assert!(text.contains("MANUAL REVIEW REQUIRED"));
    assert!(text.contains("no notice before entry"));
    assert!(!text.contains("No significant issues identified."));
    assert!(!text.contains("No problematic clauses identified"));
}

#[tokio::test]
async fn test_no_rewrite_calls_when_only_low_findings() {
    let low_only = r#"[{"clause": "Tenant waters the lawn.", "severity": "Low", "issue": "Minor chore"}]"#;
    let stub = Arc::new(StubClient::new().with_response(Facet::Clauses, low_only));
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    let rewrites = report.result(Facet::Rewrite).and_then(|r| r.rewrites()).unwrap();
    assert!(rewrites.is_empty());
    assert!(stub.calls_for(Facet::Rewrite).is_empty());
    assert_eq!(stub.call_count(), 4);
}

#[tokio::test]
async fn test_rewrites_capped_by_config() {
    let many = (1..=7)
        .map(|i| format!(r#"{{"clause": "Clause number {}", "severity": "High", "issue": "x"}}"#, i))
        .collect::<Vec<_>>()
        .join(",");
    let stub = Arc::new(StubClient::new().with_response(Facet::Clauses, format!("[{}]", many)));
    let config = AnalyzerConfig::default().with_max_rewrites(3);
    let orchestrator = LeaseAnalysisOrchestrator::new(stub.clone(), &config);

    let report = orchestrator.run_full_analysis(&document()).await;

    let prompts = stub.calls_for(Facet::Rewrite);
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains("Clause number 3"));
    assert_eq!(report.result(Facet::Rewrite).and_then(|r| r.rewrites()).unwrap().len(), 3);
}

#[tokio::test]
async fn test_authentication_failure_is_visible_on_report() {
    let stub = Arc::new(
        StubClient::new()
            .failing(Facet::Summary, CompletionErrorKind::Authentication)
            .failing(Facet::Rights, CompletionErrorKind::Authentication),
    );
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    assert!(report.has_authentication_failure());
    assert_eq!(report.degraded_facets(), vec![Facet::Summary, Facet::Rights]);
}

#[tokio::test]
async fn test_progress_hook_sees_facets_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let stub = Arc::new(StubClient::new());
    let orchestrator = orchestrator(&stub).with_progress(Arc::new(move |facet: Facet| {
        recorder.lock().unwrap().push(facet);
    }));

    orchestrator.run_full_analysis(&document()).await;

    assert_eq!(*seen.lock().unwrap(), Facet::ALL.to_vec());
}

#[tokio::test]
async fn test_analyze_source_stops_before_any_call_on_extraction_failure() {
    let stub = Arc::new(StubClient::new());
    let loader = FileLoader::new();
    let source = DocumentSource::Bytes {
        name: "scan.pdf".to_string(),
        bytes: b"not really a pdf".to_vec(),
    };

    let result = orchestrator(&stub)
        .analyze_source(&loader, source, LeaseMetadata::default())
        .await;

    let err = result.unwrap_err();
    assert!(err.is_extraction_error());
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_source_with_blank_text() {
    let stub = Arc::new(StubClient::new());
    let result = orchestrator(&stub)
        .analyze_source(
            &FileLoader::new(),
            DocumentSource::Text("   ".to_string()),
            LeaseMetadata::default(),
        )
        .await;

    assert!(matches!(result, Err(TenfiError::NoExtractableText)));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_source_runs_full_analysis_for_text() {
    let stub = Arc::new(StubClient::new());
    let report = orchestrator(&stub)
        .analyze_source(
            &FileLoader::new(),
            DocumentSource::Text(LEASE.to_string()),
            LeaseMetadata::default().with_monthly_rent(1800.0),
        )
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.metadata.monthly_rent, Some(1800.0));
    assert_eq!(report.document_chars, LEASE.chars().count());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let stub = Arc::new(StubClient::new().failing(Facet::Rights, CompletionErrorKind::Transport));
    let report = orchestrator(&stub).run_full_analysis(&document()).await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["slots"]["rights"]["status"], "degraded");
    assert_eq!(json["slots"]["summary"]["status"], "complete");
    assert_eq!(json["slots"]["clauses"]["output"]["kind"], "clauses");
}
