use crate::error::{CompletionErrorKind, TenfiError};
use crate::models::facet::{ClauseFinding, Facet, FacetResult, Severity};
use crate::models::lease::LeaseMetadata;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseAnalysisReport {
    pub document_name: String,
    pub document_chars: usize,
    pub metadata: LeaseMetadata,
    pub model: String,
    pub generated_at: DateTime<Local>,
    /// Keyed by facet; `Facet`'s ordering keeps iteration in execution order.
    pub slots: BTreeMap<Facet, FacetSlot>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FacetSlot {
    Complete(FacetResult),
    Degraded(DegradedFacet),
}

/// Error marker stored in place of a facet result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedFacet {
    pub facet: Facet,
    pub kind: Option<CompletionErrorKind>,
    pub message: String,
}

impl LeaseAnalysisReport {
    pub fn new<S: Into<String>>(document_name: S, document_chars: usize, metadata: LeaseMetadata) -> Self {
        Self {
            document_name: document_name.into(),
            document_chars,
            metadata,
            model: String::new(),
            generated_at: Local::now(),
            slots: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn insert(&mut self, slot: FacetSlot) {
        self.slots.insert(slot.facet(), slot);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn slot(&self, facet: Facet) -> Option<&FacetSlot> {
        self.slots.get(&facet)
    }

    pub fn result(&self, facet: Facet) -> Option<&FacetResult> {
        match self.slots.get(&facet) {
            Some(FacetSlot::Complete(result)) => Some(result),
            _ => None,
        }
    }

    /// All five facets hold a slot, populated or degraded.
    pub fn is_complete(&self) -> bool {
        Facet::ALL.iter().all(|f| self.slots.contains_key(f))
    }

    pub fn degraded_facets(&self) -> Vec<Facet> {
        self.slots
            .values()
            .filter_map(|slot| match slot {
                FacetSlot::Degraded(d) => Some(d.facet),
                FacetSlot::Complete(_) => None,
            })
            .collect()
    }

    pub fn has_authentication_failure(&self) -> bool {
        self.slots.values().any(|slot| {
            matches!(
                slot,
                FacetSlot::Degraded(DegradedFacet {
                    kind: Some(CompletionErrorKind::Authentication),
                    ..
                })
            )
        })
    }

    pub fn clause_findings(&self) -> &[ClauseFinding] {
        self.result(Facet::Clauses)
            .and_then(|r| r.clauses())
            .unwrap_or(&[])
    }

    /// The clause facet answered but its findings could not be parsed.
    pub fn clauses_need_manual_review(&self) -> bool {
        self.clause_findings().iter().any(|c| c.needs_manual_review)
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.clause_findings().iter().map(|c| c.severity).max()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.clause_findings()
            .iter()
            .filter(|c| c.severity == severity)
            .count()
    }
}

impl FacetSlot {
    pub fn facet(&self) -> Facet {
        match self {
            FacetSlot::Complete(result) => result.facet,
            FacetSlot::Degraded(degraded) => degraded.facet,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FacetSlot::Degraded(_))
    }
}

impl DegradedFacet {
    pub fn from_error(facet: Facet, error: &TenfiError) -> Self {
        Self {
            facet,
            kind: error.completion_kind(),
            message: error.to_string(),
        }
    }

    pub fn unavailable<S: Into<String>>(facet: Facet, reason: S) -> Self {
        Self {
            facet,
            kind: None,
            message: reason.into(),
        }
    }
}
