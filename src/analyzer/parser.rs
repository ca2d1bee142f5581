//! Best-effort parsing of model responses.
//!
//! Every parser returns `MalformedResponse` when nothing usable could be
//! recovered. Partial recoveries succeed but carry warnings. `recover` turns an
//! error into a fallback value plus a warning so a malformed answer never
//! fails a facet on its own.

use crate::error::TenfiError;
use crate::models::{
    ClauseFinding, LeaseMetadata, LeaseSummary, PriceAssessment, PriceComparison,
    RewriteSuggestion, RewriteTarget, Severity, SummarySection,
};
use serde_json::{Map, Value};

/// A parsed value and whatever had to be patched up to get it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Parsed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning<S: Into<String>>(mut self, warning: S) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// All warnings joined into one line, if any.
    pub fn warning(&self) -> Option<String> {
        if self.warnings.is_empty() {
            None
        } else {
            Some(self.warnings.join("; "))
        }
    }
}

/// Swap a parse failure for `fallback()` and keep the failure as a warning.
pub fn recover<T, F>(result: Result<Parsed<T>, TenfiError>, fallback: F) -> Parsed<T>
where
    F: FnOnce() -> T,
{
    match result {
        Ok(parsed) => parsed,
        Err(TenfiError::MalformedResponse(reason)) => Parsed::clean(fallback()).with_warning(reason),
        Err(other) => Parsed::clean(fallback()).with_warning(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON recovery
// ---------------------------------------------------------------------------

/// Find a JSON value in a response that may wrap it in prose or a code fence.
pub fn extract_json_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(stripped) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
            return Some(value);
        }
    }

    // Try whichever container opens first
    let brackets = match (trimmed.find('['), trimmed.find('{')) {
        (Some(a), Some(o)) if o < a => [('{', '}'), ('[', ']')],
        _ => [('[', ']'), ('{', '}')],
    };

    for (open, close) in brackets {
        if let Some(fragment) = extract_balanced_fragment(trimmed, open, close) {
            if let Ok(value) = serde_json::from_str::<Value>(fragment) {
                return Some(value);
            }
        }
    }

    None
}

pub fn strip_code_fence(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_open = &text[start + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// First balanced `open`..`close` span, ignoring delimiters inside JSON strings.
pub fn extract_balanced_fragment(text: &str, open: char, close: char) -> Option<&str> {
    balanced_fragments(text, open, close).into_iter().next()
}

fn balanced_fragments(text: &str, open: char, close: char) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' && depth > 0 {
            in_string = true;
        } else if ch == open {
            if depth == 0 {
                start = Some(idx);
            }
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(begin) = start.take() {
                    fragments.push(&text[begin..idx + close.len_utf8()]);
                }
            }
        }
    }

    fragments
}

// ---------------------------------------------------------------------------
// Clauses
// ---------------------------------------------------------------------------

/// Parse the clause facet's JSON array, salvaging individual objects when the
/// array as a whole is broken.
pub fn parse_clause_findings(raw: &str) -> Result<Parsed<Vec<ClauseFinding>>, TenfiError> {
    if let Some(value) = extract_json_payload(raw) {
        if let Some(items) = finding_items(&value) {
            return Ok(findings_from_values(items.iter()));
        }
    }

    // The array is broken; pick out whatever objects still parse on their own
    let objects: Vec<Value> = balanced_fragments(raw, '{', '}')
        .into_iter()
        .filter_map(|fragment| serde_json::from_str::<Value>(fragment).ok())
        .filter(|value| value.is_object())
        .collect();

    let parsed = findings_from_values(objects.iter());
    if parsed.value.is_empty() {
        return Err(TenfiError::MalformedResponse(
            "clause response contained no parseable findings".to_string(),
        ));
    }

    let count = parsed.value.len();
    Ok(parsed.with_warning(format!(
        "clause response was not a valid JSON array; recovered {} finding(s)",
        count
    )))
}

/// Fallback when `parse_clause_findings` fails: keep the model's answer as a
/// single finding flagged for manual review, never an empty list.
pub fn unreviewed_clauses(raw: &str) -> Vec<ClauseFinding> {
    let answer = raw.trim();
    let answer = if answer.is_empty() { "(empty response)" } else { answer };
    vec![ClauseFinding::manual_review(answer)]
}

fn finding_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["clauses", "findings", "problematic_clauses"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn findings_from_values<'a, I>(values: I) -> Parsed<Vec<ClauseFinding>>
where
    I: Iterator<Item = &'a Value>,
{
    let mut parsed = Parsed::clean(Vec::new());
    let mut skipped = 0usize;

    for value in values {
        let Some(object) = value.as_object() else {
            skipped += 1;
            continue;
        };

        match finding_from_object(object) {
            Some((finding, warning)) => {
                if let Some(warning) = warning {
                    parsed.warnings.push(warning);
                }
                parsed.value.push(finding);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        parsed
            .warnings
            .push(format!("skipped {} clause entries without clause text", skipped));
    }

    parsed
}

fn finding_from_object(object: &Map<String, Value>) -> Option<(ClauseFinding, Option<String>)> {
    let clause_text = string_field(object, &["clause", "clause_text", "text", "quote"])?;

    let (severity, warning) = match string_field(object, &["severity", "risk", "level"]) {
        Some(label) => match Severity::from_label(&label) {
            Some(severity) => (severity, None),
            None => (
                Severity::Unknown,
                Some(format!("unrecognised severity '{}' treated as UNKNOWN", label)),
            ),
        },
        None => (
            Severity::Unknown,
            Some("clause finding without severity treated as UNKNOWN".to_string()),
        ),
    };

    let finding = ClauseFinding {
        clause_text,
        severity,
        issue: string_field(object, &["issue", "explanation", "problem", "reason"]).unwrap_or_default(),
        recommendation: string_field(object, &["recommendation", "advice", "action"]).unwrap_or_default(),
        potentially_illegal: bool_field(object, &["potentially_illegal", "illegal"]),
        needs_manual_review: false,
    };

    Some((finding, warning))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

const SUMMARY_HEADINGS: &[&str] = &[
    "basic terms",
    "key obligations",
    "obligations",
    "key rights",
    "rights",
    "important restrictions",
    "restrictions",
    "financial terms",
    "maintenance & repairs",
    "maintenance and repairs",
    "maintenance",
    "termination terms",
    "termination",
];

pub fn parse_summary(raw: &str) -> Result<Parsed<LeaseSummary>, TenfiError> {
    if raw.trim().is_empty() {
        return Err(TenfiError::MalformedResponse("summary response was empty".to_string()));
    }

    let mut sections: Vec<SummarySection> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in raw.lines() {
        if let Some((heading, remainder)) = summary_heading(line) {
            if let Some((heading, body)) = current.take() {
                sections.push(section(heading, &body));
            }
            let mut body = Vec::new();
            if !remainder.is_empty() {
                body.push(remainder);
            }
            current = Some((heading, body));
        } else if let Some((_, ref mut body)) = current {
            body.push(line.to_string());
        } else {
            preamble.push(line);
        }
    }

    if let Some((heading, body)) = current.take() {
        sections.push(section(heading, &body));
    }

    if sections.is_empty() {
        return Err(TenfiError::MalformedResponse(
            "summary had no recognisable section headings".to_string(),
        ));
    }

    let intro = preamble.join("\n").trim().to_string();
    if !intro.is_empty() && !intro.ends_with(':') {
        sections.insert(
            0,
            SummarySection {
                heading: "Overview".to_string(),
                body: intro,
            },
        );
    }

    Ok(Parsed::clean(LeaseSummary { sections }))
}

/// The fallback summary: the whole response as a single section.
pub fn unstructured_summary(raw: &str) -> LeaseSummary {
    let body = raw.trim();
    if body.is_empty() {
        return LeaseSummary::default();
    }

    LeaseSummary {
        sections: vec![SummarySection {
            heading: "Summary".to_string(),
            body: body.to_string(),
        }],
    }
}

fn section(heading: String, body: &[String]) -> SummarySection {
    SummarySection {
        heading,
        body: body.join("\n").trim().to_string(),
    }
}

fn summary_heading(line: &str) -> Option<(String, String)> {
    let (label, remainder, marked) = split_label(line)?;
    let lower = label.to_lowercase();

    let known = SUMMARY_HEADINGS.contains(&lower.as_str());
    let shouting = label.chars().any(char::is_alphabetic)
        && label == label.to_uppercase()
        && label.split_whitespace().count() <= 5;

    if marked || known || shouting {
        Some((title_case(&label), remainder))
    } else {
        None
    }
}

/// Split `## Heading`, `**Heading:** text`, `1. HEADING: text` or `HEADING: text`
/// into (label, remainder, had_markdown_marker).
fn split_label(line: &str) -> Option<(String, String, bool)> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('#') {
        let label = trimmed.trim_start_matches('#').trim().trim_end_matches(':').trim();
        let label = label.trim_matches('*').trim().trim_end_matches(':').trim();
        return (!label.is_empty() && label.len() <= 60)
            .then(|| (label.to_string(), String::new(), true));
    }

    let unnumbered = strip_numbering(trimmed);

    if let Some(rest) = unnumbered.strip_prefix("**") {
        let close = rest.find("**")?;
        let label = rest[..close].trim().trim_end_matches(':').trim();
        let remainder = rest[close + 2..].trim().trim_start_matches(':').trim();
        return (!label.is_empty() && label.len() <= 60)
            .then(|| (label.to_string(), remainder.to_string(), true));
    }

    let colon = unnumbered.find(':')?;
    let label = unnumbered[..colon].trim();
    if label.is_empty() || label.len() > 40 {
        return None;
    }
    let remainder = unnumbered[colon + 1..].trim();
    Some((label.to_string(), remainder.to_string(), false))
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("• "))
            .map(str::trim_start)
            .unwrap_or(line);
    }
    let rest = &line[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

fn title_case(label: &str) -> String {
    if label != label.to_uppercase() {
        return label.to_string();
    }

    label
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

pub fn parse_price_comparison(
    raw: &str,
    location_known: bool,
) -> Result<Parsed<PriceComparison>, TenfiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TenfiError::MalformedResponse("price response was empty".to_string()));
    }

    let mut explicit = None;
    let mut rationale_lines = Vec::new();
    let mut in_rationale = false;

    for line in trimmed.lines() {
        match split_label(line) {
            Some((label, remainder, _)) if label.eq_ignore_ascii_case("assessment") => {
                explicit = Some(assessment_from_text(&remainder));
                in_rationale = false;
            }
            Some((label, remainder, _)) if label.eq_ignore_ascii_case("rationale") => {
                in_rationale = true;
                if !remainder.is_empty() {
                    rationale_lines.push(remainder);
                }
            }
            _ if in_rationale => rationale_lines.push(line.to_string()),
            _ => {}
        }
    }

    let rationale = if rationale_lines.is_empty() {
        trimmed.to_string()
    } else {
        rationale_lines.join("\n").trim().to_string()
    };

    let (assessment, warning) = match explicit.flatten() {
        Some(assessment) => (assessment, None),
        None => match assessment_from_text(trimmed) {
            Some(assessment) => (
                assessment,
                Some("no explicit ASSESSMENT line; assessment inferred from prose".to_string()),
            ),
            None => (
                PriceAssessment::Unknown,
                Some("price response did not state an assessment".to_string()),
            ),
        },
    };

    let parsed = Parsed::clean(PriceComparison {
        assessment,
        rationale,
        location_caveat: !location_known,
    });

    Ok(match warning {
        Some(warning) => parsed.with_warning(warning),
        None => parsed,
    })
}

fn assessment_from_text(text: &str) -> Option<PriceAssessment> {
    let lower = text.to_lowercase().replace('-', " ");

    let above = lower.contains("above market") || lower.contains("overpriced");
    let below = lower.contains("below market") || lower.contains("underpriced");
    let at = lower.contains("at market")
        || lower.contains("in line with")
        || lower.contains("within market")
        || lower.contains("fair market");

    match (above, below, at) {
        (true, false, false) => Some(PriceAssessment::AboveMarket),
        (false, true, false) => Some(PriceAssessment::BelowMarket),
        (false, false, true) => Some(PriceAssessment::AtMarket),
        (false, false, false) if lower.trim().starts_with("unknown") => Some(PriceAssessment::Unknown),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Rewrites
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum RewritePart {
    Rewrite,
    Tips,
    LegalBasis,
}

fn rewrite_part(label: &str) -> Option<RewritePart> {
    match label.to_lowercase().as_str() {
        "rewrite" | "rewritten clause" | "suggested rewrite" | "revised clause" | "fair version" => {
            Some(RewritePart::Rewrite)
        }
        "negotiation tips" | "negotiation" | "talking points" => Some(RewritePart::Tips),
        "legal basis" | "legal support" | "supporting law" => Some(RewritePart::LegalBasis),
        _ => None,
    }
}

pub fn parse_rewrite(raw: &str, target: &RewriteTarget) -> Result<Parsed<RewriteSuggestion>, TenfiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TenfiError::MalformedResponse("rewrite response was empty".to_string()));
    }

    let mut rewrite = Vec::new();
    let mut tips = Vec::new();
    let mut legal = Vec::new();
    let mut current = None;

    for line in trimmed.lines() {
        if let Some((label, remainder, _)) = split_label(line) {
            if let Some(part) = rewrite_part(&label) {
                current = Some(part);
                if !remainder.is_empty() {
                    push_part(part, remainder, &mut rewrite, &mut tips, &mut legal);
                }
                continue;
            }
        }

        if let Some(part) = current {
            push_part(part, line.to_string(), &mut rewrite, &mut tips, &mut legal);
        }
    }

    if rewrite.is_empty() {
        return Err(TenfiError::MalformedResponse(
            "rewrite response had no REWRITE section".to_string(),
        ));
    }

    Ok(Parsed::clean(RewriteSuggestion {
        original: target.clause_text.clone(),
        severity: target.severity,
        rewrite: join_lines(&rewrite),
        negotiation_tips: join_lines(&tips),
        legal_basis: join_lines(&legal),
    }))
}

/// The fallback rewrite: the whole response as the suggested text.
pub fn unstructured_rewrite(raw: &str, target: &RewriteTarget) -> RewriteSuggestion {
    RewriteSuggestion {
        original: target.clause_text.clone(),
        severity: target.severity,
        rewrite: raw.trim().to_string(),
        negotiation_tips: String::new(),
        legal_basis: String::new(),
    }
}

fn push_part(
    part: RewritePart,
    line: String,
    rewrite: &mut Vec<String>,
    tips: &mut Vec<String>,
    legal: &mut Vec<String>,
) {
    match part {
        RewritePart::Rewrite => rewrite.push(line),
        RewritePart::Tips => tips.push(line),
        RewritePart::LegalBasis => legal.push(line),
    }
}

fn join_lines(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

pub fn parse_metadata(raw: &str) -> Result<Parsed<LeaseMetadata>, TenfiError> {
    let value = extract_json_payload(raw).ok_or_else(|| {
        TenfiError::MalformedResponse("metadata response contained no JSON".to_string())
    })?;

    let object = value.as_object().ok_or_else(|| {
        TenfiError::MalformedResponse("metadata response was not a JSON object".to_string())
    })?;

    let metadata = LeaseMetadata {
        property_address: string_field(object, &["property_address", "address"]),
        city: string_field(object, &["city"]),
        state: string_field(object, &["state"]),
        zip_code: string_field(object, &["zip_code", "zip"]),
        monthly_rent: number_field(object, &["monthly_rent", "rent"]),
        security_deposit: number_field(object, &["security_deposit", "deposit"]),
        lease_start_date: string_field(object, &["lease_start_date", "start_date"]),
        lease_end_date: string_field(object, &["lease_end_date", "end_date"]),
        landlord_name: string_field(object, &["landlord_name", "landlord"]),
        bedrooms: number_field(object, &["number_of_bedrooms", "bedrooms"])
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32),
        bathrooms: number_field(object, &["number_of_bathrooms", "bathrooms"]).map(|n| n as f32),
        location: None,
    };

    Ok(Parsed::clean(metadata))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::String(s)) => {
            let s = s.trim();
            let placeholder = matches!(s.to_lowercase().as_str(), "" | "null" | "n/a" | "none" | "unknown");
            (!placeholder).then(|| s.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn number_field(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    })
}

fn bool_field(object: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| match object.get(*key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    })
}
