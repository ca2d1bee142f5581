pub mod lease;
pub mod facet;
pub mod report;

pub use lease::{LeaseDocument, LeaseMetadata, DocumentSource};
pub use facet::{
    ClauseFinding, Facet, FacetOutput, FacetRequest, FacetResult, LeaseSummary, PriceAssessment,
    PriceComparison, RewriteSuggestion, RewriteTarget, Severity, SummarySection,
};
pub use report::{DegradedFacet, FacetSlot, LeaseAnalysisReport};
