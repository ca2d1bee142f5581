use crate::error::TenfiError;
use crate::models::{
    DegradedFacet, Facet, FacetResult, FacetSlot, LeaseAnalysisReport, LeaseDocument,
    PriceAssessment, Severity,
};
use tracing::warn;

/// Collects facet outcomes into a report. Failures become degraded slots,
/// parse warnings and degraded facets are copied into `report.warnings`.
pub struct ReportAggregator {
    report: LeaseAnalysisReport,
}

impl ReportAggregator {
    pub fn new(document: &LeaseDocument, model: &str) -> Self {
        let report = LeaseAnalysisReport::new(
            document.source.display_name(),
            document.char_count(),
            document.metadata.clone(),
        )
        .with_model(model);

        Self { report }
    }

    pub fn record(&mut self, facet: Facet, outcome: Result<FacetResult, TenfiError>) {
        match outcome {
            Ok(result) => {
                if let Some(ref warning) = result.parse_warning {
                    self.report
                        .add_warning(format!("{}: {}", facet.as_str(), warning));
                }
                self.report.insert(FacetSlot::Complete(result));
            }
            Err(error) => {
                warn!(facet = %facet, error = %error, "facet degraded");
                self.report
                    .add_warning(format!("{} unavailable: {}", facet.as_str(), error));
                self.report
                    .insert(FacetSlot::Degraded(DegradedFacet::from_error(facet, &error)));
            }
        }
    }

    /// Mark a facet degraded without having called the model for it.
    pub fn record_unavailable<S: Into<String>>(&mut self, facet: Facet, reason: S) {
        let reason = reason.into();
        warn!(facet = %facet, reason = %reason, "facet not run");
        self.report
            .add_warning(format!("{} unavailable: {}", facet.as_str(), reason));
        self.report
            .insert(FacetSlot::Degraded(DegradedFacet::unavailable(facet, reason)));
    }

    pub fn add_warning<S: Into<String>>(&mut self, warning: S) {
        self.report.add_warning(warning.into());
    }

    pub fn report(&self) -> &LeaseAnalysisReport {
        &self.report
    }

    pub fn finish(self) -> LeaseAnalysisReport {
        self.report
    }
}

/// Short overview of a report: findings by severity, rent assessment and
/// anything that could not be analyzed.
pub fn analysis_summary(report: &LeaseAnalysisReport) -> String {
    let mut parts = Vec::new();

    if report.result(Facet::Clauses).is_some() {
        let total = report.clause_findings().len();
        if report.clauses_need_manual_review() {
            parts.push("Clause review could not be parsed; manual review required".to_string());
        } else if total == 0 {
            parts.push("No problematic clauses identified".to_string());
        } else {
            let counts: Vec<String> = [Severity::High, Severity::Medium, Severity::Low, Severity::Unknown]
                .iter()
                .filter_map(|severity| {
                    let count = report.count_by_severity(*severity);
                    (count > 0).then(|| format!("{} {}", count, severity.as_str()))
                })
                .collect();

            parts.push(format!(
                "{} problematic clause{} ({})",
                total,
                if total == 1 { "" } else { "s" },
                counts.join(", ")
            ));
        }

        let illegal = report
            .clause_findings()
            .iter()
            .filter(|finding| finding.potentially_illegal)
            .count();
        if illegal > 0 {
            parts.push(format!("{} potentially illegal", illegal));
        }
    }

    if let Some(price) = report.result(Facet::Price).and_then(|r| r.price()) {
        if price.assessment != PriceAssessment::Unknown {
            parts.push(format!("Rent assessed {}", price.assessment.as_str()));
        }
    }

    let degraded = report.degraded_facets();
    if !degraded.is_empty() {
        let names: Vec<&str> = degraded.iter().map(|f| f.as_str()).collect();
        parts.push(format!("Unavailable: {}", names.join(", ")));
    }

    if parts.is_empty() {
        "No analysis results".to_string()
    } else {
        parts.join("; ")
    }
}
