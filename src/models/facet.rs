use crate::error::TenfiError;
use crate::models::LeaseMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One analysis question asked of the completion service.
///
/// Variant order is the order `run_full_analysis` executes them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Summary,
    Clauses,
    Price,
    Rewrite,
    Rights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRequest {
    pub facet: Facet,
    pub lease_text: String,
    pub location: Option<String>,
    pub metadata: LeaseMetadata,
    pub target: Option<RewriteTarget>,
}

/// A clause handed to the rewrite facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteTarget {
    pub clause_text: String,
    pub issue: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub facet: Facet,
    pub output: FacetOutput,
    pub raw_response: String,
    pub parse_warning: Option<String>,
    pub model_used: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FacetOutput {
    Summary(LeaseSummary),
    Clauses(Vec<ClauseFinding>),
    Price(PriceComparison),
    Rewrites(Vec<RewriteSuggestion>),
    Rights(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaseSummary {
    pub sections: Vec<SummarySection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseFinding {
    pub clause_text: String,
    pub severity: Severity,
    pub issue: String,
    pub recommendation: String,
    #[serde(default)]
    pub potentially_illegal: bool,
    /// The model answered but no finding could be parsed; `clause_text` holds its answer.
    #[serde(default)]
    pub needs_manual_review: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub assessment: PriceAssessment,
    pub rationale: String,
    /// Set when no location was available and the answer is generic.
    pub location_caveat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAssessment {
    AboveMarket,
    AtMarket,
    BelowMarket,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteSuggestion {
    pub original: String,
    pub severity: Severity,
    pub rewrite: String,
    pub negotiation_tips: String,
    pub legal_basis: String,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Summary,
        Facet::Clauses,
        Facet::Price,
        Facet::Rewrite,
        Facet::Rights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Summary => "summary",
            Facet::Clauses => "clauses",
            Facet::Price => "price",
            Facet::Rewrite => "rewrite",
            Facet::Rights => "rights",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Facet::Summary => "LEASE SUMMARY",
            Facet::Clauses => "PROBLEMATIC CLAUSES IDENTIFIED",
            Facet::Price => "RENTAL PRICE ANALYSIS",
            Facet::Rewrite => "SUGGESTED LEASE REWRITES",
            Facet::Rights => "YOUR TENANT RIGHTS",
        }
    }

    pub fn progress_message(&self) -> &'static str {
        match self {
            Facet::Summary => "Summarizing lease...",
            Facet::Clauses => "Identifying problematic clauses...",
            Facet::Price => "Analyzing rental price...",
            Facet::Rewrite => "Generating rewrite suggestions...",
            Facet::Rights => "Researching tenant rights...",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, TenfiError> {
        match s.trim().to_lowercase().as_str() {
            "summary" | "summarize" => Ok(Facet::Summary),
            "clauses" | "clause" | "problems" => Ok(Facet::Clauses),
            "price" | "rent" => Ok(Facet::Price),
            "rewrite" | "rewrites" => Ok(Facet::Rewrite),
            "rights" | "tenant-rights" => Ok(Facet::Rights),
            other => Err(TenfiError::InvalidArguments(format!(
                "Unknown facet '{}'. Use summary, clauses, price, rewrite or rights",
                other
            ))),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FacetRequest {
    pub fn new<S: Into<String>>(facet: Facet, lease_text: S) -> Self {
        Self {
            facet,
            lease_text: lease_text.into(),
            location: None,
            metadata: LeaseMetadata::default(),
            target: None,
        }
    }

    pub fn for_rewrite(target: RewriteTarget) -> Self {
        Self {
            target: Some(target),
            ..Self::new(Facet::Rewrite, String::new())
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_metadata(mut self, metadata: LeaseMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl RewriteTarget {
    pub fn new<S: Into<String>>(clause_text: S) -> Self {
        Self {
            clause_text: clause_text.into(),
            issue: None,
            severity: Severity::Unknown,
        }
    }

    pub fn with_issue<S: Into<String>>(mut self, issue: S) -> Self {
        self.issue = Some(issue.into());
        self
    }
}

impl From<&ClauseFinding> for RewriteTarget {
    fn from(finding: &ClauseFinding) -> Self {
        Self {
            clause_text: finding.clause_text.clone(),
            issue: Some(finding.issue.clone()).filter(|i| !i.is_empty()),
            severity: finding.severity,
        }
    }
}

impl FacetResult {
    pub fn new(facet: Facet, output: FacetOutput, raw_response: String) -> Self {
        Self {
            facet,
            output,
            raw_response,
            parse_warning: None,
            model_used: String::new(),
            duration_ms: 0,
        }
    }

    pub fn with_parse_warning(mut self, warning: Option<String>) -> Self {
        self.parse_warning = warning;
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S, duration_ms: u64) -> Self {
        self.model_used = model.into();
        self.duration_ms = duration_ms;
        self
    }

    pub fn summary(&self) -> Option<&LeaseSummary> {
        match self.output {
            FacetOutput::Summary(ref summary) => Some(summary),
            _ => None,
        }
    }

    pub fn clauses(&self) -> Option<&[ClauseFinding]> {
        match self.output {
            FacetOutput::Clauses(ref findings) => Some(findings),
            _ => None,
        }
    }

    pub fn price(&self) -> Option<&PriceComparison> {
        match self.output {
            FacetOutput::Price(ref price) => Some(price),
            _ => None,
        }
    }

    pub fn rewrites(&self) -> Option<&[RewriteSuggestion]> {
        match self.output {
            FacetOutput::Rewrites(ref rewrites) => Some(rewrites),
            _ => None,
        }
    }

    pub fn rights(&self) -> Option<&str> {
        match self.output {
            FacetOutput::Rights(ref text) => Some(text),
            _ => None,
        }
    }

    pub fn is_best_effort(&self) -> bool {
        self.parse_warning.is_some()
    }
}

impl LeaseSummary {
    pub fn section(&self, keyword: &str) -> Option<&str> {
        let keyword = keyword.to_lowercase();
        self.sections
            .iter()
            .find(|s| s.heading.to_lowercase().contains(&keyword))
            .map(|s| s.body.as_str())
    }

    pub fn basic_terms(&self) -> Option<&str> {
        self.section("basic terms")
    }

    pub fn obligations(&self) -> Option<&str> {
        self.section("obligation")
    }

    pub fn restrictions(&self) -> Option<&str> {
        self.section("restriction")
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl ClauseFinding {
    pub fn new<S: Into<String>>(clause_text: S, severity: Severity) -> Self {
        Self {
            clause_text: clause_text.into(),
            severity,
            issue: String::new(),
            recommendation: String::new(),
            potentially_illegal: false,
            needs_manual_review: false,
        }
    }

    /// Stand-in finding for a clause response that could not be parsed.
    pub fn manual_review<S: Into<String>>(response: S) -> Self {
        Self {
            issue: "The clause review could not be read as a list of findings".to_string(),
            recommendation: "Manual review required".to_string(),
            needs_manual_review: true,
            ..Self::new(response, Severity::Unknown)
        }
    }

    pub fn with_issue<S: Into<String>>(mut self, issue: S) -> Self {
        self.issue = issue.into();
        self
    }

    pub fn with_recommendation<S: Into<String>>(mut self, recommendation: S) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    /// High and medium findings are worth negotiating over.
    pub fn warrants_rewrite(&self) -> bool {
        matches!(self.severity, Severity::High | Severity::Medium)
    }
}

impl Severity {
    /// Only the three allowed labels are recognised.
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        match cleaned.as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "UNKNOWN",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }

    pub fn numeric_value(&self) -> u8 {
        match self {
            Severity::Unknown => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.numeric_value().cmp(&other.numeric_value())
    }
}

impl PriceAssessment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceAssessment::AboveMarket => "ABOVE MARKET",
            PriceAssessment::AtMarket => "AT MARKET",
            PriceAssessment::BelowMarket => "BELOW MARKET",
            PriceAssessment::Unknown => "UNKNOWN",
        }
    }
}
