use crate::models::{Facet, FacetRequest, Severity};
use std::collections::HashMap;

/// Prompt template per facet, plus one for metadata extraction.
///
/// Placeholders are substituted verbatim:
/// `{lease_text}`, `{location}`, `{metadata}`, `{clause}`, `{issue}`, `{severity}`.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: HashMap<Facet, String>,
    metadata_template: String,
}

impl PromptTemplates {
    pub fn new() -> Self {
        let templates = Facet::ALL
            .iter()
            .map(|facet| (*facet, default_template(*facet).to_string()))
            .collect();

        Self {
            templates,
            metadata_template: METADATA_TEMPLATE.to_string(),
        }
    }

    /// Replace the template for one facet.
    pub fn with_template<S: Into<String>>(mut self, facet: Facet, template: S) -> Self {
        self.templates.insert(facet, template.into());
        self
    }

    pub fn with_metadata_template<S: Into<String>>(mut self, template: S) -> Self {
        self.metadata_template = template.into();
        self
    }

    pub fn template(&self, facet: Facet) -> &str {
        self.templates
            .get(&facet)
            .map(String::as_str)
            .unwrap_or_else(|| default_template(facet))
    }

    pub fn render(&self, request: &FacetRequest) -> String {
        let location = match request.location {
            Some(ref location) => location.clone(),
            None => NO_LOCATION.to_string(),
        };

        let (clause, issue, severity) = match request.target {
            Some(ref target) => (
                target.clause_text.as_str(),
                target.issue.as_deref().unwrap_or("Not specified; judge fairness yourself."),
                target.severity,
            ),
            None => ("", "", Severity::Unknown),
        };

        fill(
            self.template(request.facet),
            &[
                ("{lease_text}", request.lease_text.as_str()),
                ("{location}", location.as_str()),
                ("{metadata}", request.metadata.describe().as_str()),
                ("{clause}", clause),
                ("{issue}", issue),
                ("{severity}", severity.as_str()),
            ],
        )
    }

    pub fn render_metadata(&self, lease_text: &str) -> String {
        fill(&self.metadata_template, &[("{lease_text}", lease_text)])
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::new()
    }
}

pub const NO_LOCATION: &str = "Not provided";

/// Single pass over `template`: inserted values are never scanned for placeholders.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        rest = &rest[open..];

        match values.iter().find(|(placeholder, _)| rest.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                rendered.push_str(value);
                rest = &rest[placeholder.len()..];
            }
            None => {
                rendered.push('{');
                rest = &rest[1..];
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

pub fn default_template(facet: Facet) -> &'static str {
    match facet {
        Facet::Summary => SUMMARY_TEMPLATE,
        Facet::Clauses => CLAUSES_TEMPLATE,
        Facet::Price => PRICE_TEMPLATE,
        Facet::Rewrite => REWRITE_TEMPLATE,
        Facet::Rights => RIGHTS_TEMPLATE,
    }
}

const SUMMARY_TEMPLATE: &str = r#"You are a tenant rights advocate helping renters understand their leases.

Provide a clear, comprehensive summary of this lease in plain English.
Use exactly these section headings, each on its own line followed by a colon:

BASIC TERMS: rent amount, security deposit, lease duration, property address
KEY OBLIGATIONS: what the tenant must do (pay rent, maintain property, etc.)
KEY RIGHTS: what the tenant is entitled to (repairs, privacy, quiet enjoyment, etc.)
IMPORTANT RESTRICTIONS: pets, subletting, guests, noise
FINANCIAL TERMS: late fees, utilities included/excluded, renewal terms
MAINTENANCE & REPAIRS: who is responsible for what
TERMINATION TERMS: notice requirements, early termination clauses, penalties

Keep the summary under 500 words and use clear, accessible language.

Lease text:
{lease_text}

Summary:"#;

const CLAUSES_TEMPLATE: &str = r#"You are a tenant rights attorney reviewing a lease for potential problems.

Identify clauses that are:
1. Unusually restrictive or punitive
2. Potentially illegal or unenforceable
3. Heavily in favor of the landlord over the tenant
4. Common predatory practices (excessive fees, unfair penalties, etc.)
5. Vague or ambiguous terms that could be exploited

Return a JSON array. Each element is an object with:
- "clause": the exact text from the lease (quote it)
- "severity": exactly one of "High", "Medium", "Low"
- "issue": why it is problematic
- "recommendation": what the tenant should do
- "potentially_illegal": true or false

List the clauses in the order they appear in the lease. Return [] if nothing is problematic.

Lease text:
{lease_text}

Return ONLY the JSON array:"#;

const PRICE_TEMPLATE: &str = r#"You are a real estate market analyst. Assess whether the rent in this lease is reasonable.

Location: {location}
Known property details:
{metadata}

If the location is "Not provided", give a generic assessment and say clearly that it cannot be
checked against a specific market.

Respond in this format:
ASSESSMENT: one of ABOVE MARKET, AT MARKET, BELOW MARKET, UNKNOWN
RATIONALE: typical rent ranges for comparable units, factors that justify higher or lower rent,
and resources to verify current rates (Zillow, Apartments.com, etc.)

Your knowledge may be outdated. Always recommend checking current listings.

Lease text:
{lease_text}"#;

const REWRITE_TEMPLATE: &str = r#"You are a tenant rights attorney helping to negotiate fair lease terms.

Original problematic clause:
{clause}

Issue identified ({severity} severity):
{issue}

Respond in this format:
REWRITE: a rewritten version of the clause that is fair to both parties
NEGOTIATION TIPS: talking points the tenant can use when negotiating
LEGAL BASIS: laws, norms or standard practice supporting the change

Keep suggestions practical and reasonable."#;

const RIGHTS_TEMPLATE: &str = r#"You are a tenant rights expert. Provide important tenant rights information.

Location: {location}

Based on this lease and general tenant rights in this location, explain:
1. Key tenant rights (habitability, privacy, repairs, etc.)
2. Landlord obligations
3. Security deposit rules
4. Notice requirements for entry and termination
5. Protections against unfair practices
6. Where to get help (legal aid, tenant unions, etc.)

If the location is "Not provided", describe rights that commonly apply and say that local law varies.
Recommend checking current local laws as they may have changed.

Lease excerpt (for context):
{lease_text}

Tenant rights information:"#;

const METADATA_TEMPLATE: &str = r#"You are a lease analysis expert. Extract the following information from this lease document.
Return ONLY valid JSON with no additional text. Use null for anything not found.

Fields:
- property_address: full address
- city
- state
- zip_code
- monthly_rent: number only
- security_deposit: number only
- lease_start_date: YYYY-MM-DD
- lease_end_date: YYYY-MM-DD
- landlord_name: landlord or property management company
- number_of_bedrooms: number only
- number_of_bathrooms: number only

Lease text:
{lease_text}

Return JSON only:"#;
