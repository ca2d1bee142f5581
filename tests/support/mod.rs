#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use tenfi::analyzer::{CompletionClient, CompletionFuture};
use tenfi::error::{CompletionErrorKind, TenfiError};
use tenfi::models::Facet;

pub const SUMMARY_RESPONSE: &str = "BASIC TERMS: Rent is $1800 per month for 12 months.\n\
KEY OBLIGATIONS: Pay rent on the 1st and keep the unit clean.\n\
IMPORTANT RESTRICTIONS: No pets without written consent.";

pub const CLAUSES_RESPONSE: &str = r#"[
  {"clause": "Tenant forfeits the entire deposit for any late payment.", "severity": "High",
   "issue": "Deposit forfeiture is punitive", "recommendation": "Strike the clause", "potentially_illegal": true},
  {"clause": "Landlord may enter at any time.", "severity": "Medium",
   "issue": "No notice before entry", "recommendation": "Ask for 24 hours notice", "potentially_illegal": false}
]"#;

pub const PRICE_RESPONSE: &str = "ASSESSMENT: ABOVE MARKET\n\
RATIONALE: Comparable two-bedroom units rent for $1500-$1700.\n\
Check Zillow for current listings.";

pub const REWRITE_RESPONSE: &str = "REWRITE: Late payments incur a fee of $50.\n\
NEGOTIATION TIPS: Point out that deposit forfeiture is unusual.\n\
LEGAL BASIS: Most states cap late fees.";

pub const RIGHTS_RESPONSE: &str = "You have the right to a habitable home and to notice before entry.";

pub const METADATA_RESPONSE: &str = r#"{"property_address": "12 Elm St", "city": "Portland", "state": "OR",
"monthly_rent": 1800, "number_of_bedrooms": 2}"#;

/// Which facet a rendered prompt belongs to, judged by text unique to each template.
pub fn prompt_facet(prompt: &str) -> Option<Facet> {
    if prompt.contains("Return ONLY the JSON array") {
        Some(Facet::Clauses)
    } else if prompt.contains("Original problematic clause") {
        Some(Facet::Rewrite)
    } else if prompt.contains("real estate market analyst") {
        Some(Facet::Price)
    } else if prompt.contains("You are a tenant rights expert") {
        Some(Facet::Rights)
    } else if prompt.contains("comprehensive summary") {
        Some(Facet::Summary)
    } else {
        None
    }
}

pub fn is_metadata_prompt(prompt: &str) -> bool {
    prompt.contains("Extract the following information")
}

/// Completion client that answers from canned responses and records every prompt.
pub struct StubClient {
    responses: HashMap<Facet, String>,
    metadata_response: String,
    failures: HashMap<Facet, CompletionErrorKind>,
    fail_metadata: bool,
    prompts: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn new() -> Self {
        let responses = [
            (Facet::Summary, SUMMARY_RESPONSE),
            (Facet::Clauses, CLAUSES_RESPONSE),
            (Facet::Price, PRICE_RESPONSE),
            (Facet::Rewrite, REWRITE_RESPONSE),
            (Facet::Rights, RIGHTS_RESPONSE),
        ]
        .into_iter()
        .map(|(facet, response)| (facet, response.to_string()))
        .collect();

        Self {
            responses,
            metadata_response: METADATA_RESPONSE.to_string(),
            failures: HashMap::new(),
            fail_metadata: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response<S: Into<String>>(mut self, facet: Facet, response: S) -> Self {
        self.responses.insert(facet, response.into());
        self
    }

    pub fn with_metadata_response<S: Into<String>>(mut self, response: S) -> Self {
        self.metadata_response = response.into();
        self
    }

    pub fn failing(mut self, facet: Facet, kind: CompletionErrorKind) -> Self {
        self.failures.insert(facet, kind);
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn calls_for(&self, facet: Facet) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|prompt| prompt_facet(prompt) == Some(facet))
            .collect()
    }

    fn answer(&self, prompt: &str) -> Result<String, TenfiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if is_metadata_prompt(prompt) {
            if self.fail_metadata {
                return Err(TenfiError::completion(CompletionErrorKind::Transport, "connection reset"));
            }
            return Ok(self.metadata_response.clone());
        }

        let facet = prompt_facet(prompt).ok_or_else(|| {
            TenfiError::completion(CompletionErrorKind::Rejected, "stub does not recognise prompt")
        })?;

        if let Some(kind) = self.failures.get(&facet) {
            return Err(TenfiError::completion(*kind, format!("stub failure for {}", facet)));
        }

        Ok(self.responses.get(&facet).cloned().unwrap_or_default())
    }
}

impl CompletionClient for StubClient {
    fn complete<'a>(&'a self, prompt: &'a str, _temperature: f32) -> CompletionFuture<'a> {
        Box::pin(async move { self.answer(prompt) })
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}
