use crate::analyzer::analysis_summary;
use crate::cli::args::Cli;
use crate::error::TenfiError;
use crate::models::{
    ClauseFinding, Facet, FacetResult, FacetSlot, LeaseAnalysisReport, LeaseMetadata,
    PriceComparison, RewriteSuggestion, Severity,
};
use std::path::Path;

const RULE_WIDTH: usize = 80;

pub struct ReportFormatter {
    use_colors: bool,
    verbose: bool,
}

impl ReportFormatter {
    pub fn new(cli: &Cli) -> Self {
        Self {
            use_colors: cli.should_use_color(),
            verbose: cli.is_verbose(),
        }
    }

    /// No colors, no verbose extras. Used for saved files.
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            verbose: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn format_report(&self, report: &LeaseAnalysisReport) -> String {
        let mut output = String::new();

        output.push_str(&self.format_header(report));
        output.push_str("\n\n");

        output.push_str(&self.format_section(
            "📍 PROPERTY INFORMATION",
            &format_property(&report.metadata),
        ));
        output.push_str("\n\n");

        for (facet, slot) in report.slots.iter() {
            let body = match slot {
                FacetSlot::Complete(result) => self.format_facet_body(result),
                FacetSlot::Degraded(degraded) => {
                    self.paint("\x1b[33m", &format!("⚠️ Unavailable: {}", degraded.message))
                }
            };
            output.push_str(&self.format_section(&facet_title(*facet), &body));
            output.push_str("\n\n");
        }

        if !report.warnings.is_empty() {
            let warnings = report
                .warnings
                .iter()
                .map(|w| format!("- {}", w))
                .collect::<Vec<_>>()
                .join("\n");
            output.push_str(&self.format_section("⚠️ ANALYSIS WARNINGS", &warnings));
            output.push_str("\n\n");
        }

        output.push_str(&"=".repeat(RULE_WIDTH));
        output.push_str("\nEND OF REPORT\n");
        output.push_str(&"=".repeat(RULE_WIDTH));
        output.push('\n');

        output
    }

    pub fn format_json(&self, report: &LeaseAnalysisReport) -> Result<String, TenfiError> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// One facet on its own, as printed in step mode.
    pub fn format_facet_result(&self, result: &FacetResult) -> String {
        let mut output = self.format_section(&facet_title(result.facet), &self.format_facet_body(result));

        if let Some(ref warning) = result.parse_warning {
            output.push_str("\n\n");
            output.push_str(&self.paint("\x1b[33m", &format!("⚠️ Best-effort parse: {}", warning)));
        }

        output
    }

    fn format_header(&self, report: &LeaseAnalysisReport) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let title = if self.use_colors {
            "\x1b[1m\x1b[36mLEASE ANALYSIS REPORT\x1b[0m".to_string()
        } else {
            "LEASE ANALYSIS REPORT".to_string()
        };

        format!(
            "{rule}\n{title}\n{rule}\n\
             Document: {} ({} characters)\n\
             Model: {}\n\
             Generated: {}\n\
             Overview: {}",
            report.document_name,
            report.document_chars,
            report.model,
            report.generated_at.format("%Y-%m-%d %H:%M:%S"),
            analysis_summary(report),
        )
    }

    fn format_facet_body(&self, result: &FacetResult) -> String {
        let mut body = match result.facet {
            Facet::Summary => match result.summary() {
                Some(summary) if !summary.is_empty() => summary
                    .sections
                    .iter()
                    .map(|s| format!("{}:\n{}", self.bold(&s.heading), s.body))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
                _ => "N/A".to_string(),
            },
            Facet::Clauses => self.format_clauses(result.clauses().unwrap_or(&[])),
            Facet::Price => match result.price() {
                Some(price) => self.format_price(price),
                None => "N/A".to_string(),
            },
            Facet::Rewrite => self.format_rewrites(result.rewrites().unwrap_or(&[])),
            Facet::Rights => result
                .rights()
                .filter(|text| !text.is_empty())
                .unwrap_or("N/A")
                .to_string(),
        };

        if self.verbose {
            body.push_str(&format!(
                "\n\n(model {} in {}ms)",
                result.model_used, result.duration_ms
            ));
        }

        body
    }

    fn format_clauses(&self, findings: &[ClauseFinding]) -> String {
        if findings.is_empty() {
            return "No significant issues identified.".to_string();
        }

        findings
            .iter()
            .enumerate()
            .map(|(i, finding)| {
                if finding.needs_manual_review {
                    return format!(
                        "{}. ⚠️ MANUAL REVIEW REQUIRED\n   Issue: {}\n   Model response:\n{}",
                        i + 1,
                        finding.issue,
                        finding.clause_text
                    );
                }

                let mut entry = format!("{}. {}", i + 1, self.format_severity(finding.severity));
                if finding.potentially_illegal {
                    entry.push_str(" ⚠️ POTENTIALLY ILLEGAL");
                }
                entry.push_str(&format!("\n   Clause: {}", finding.clause_text));
                entry.push_str(&format!("\n   Issue: {}", or_na(&finding.issue)));
                entry.push_str(&format!("\n   Recommendation: {}", or_na(&finding.recommendation)));
                entry
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_price(&self, price: &PriceComparison) -> String {
        let mut output = format!("Assessment: {}", self.bold(price.assessment.as_str()));
        if price.location_caveat {
            output.push_str(
                "\nNote: no location was provided, so this is a generic assessment \
                 rather than a comparison with a specific rental market.",
            );
        }
        output.push_str("\n\n");
        output.push_str(&price.rationale);
        output
    }

    fn format_rewrites(&self, rewrites: &[RewriteSuggestion]) -> String {
        if rewrites.is_empty() {
            return "No rewrites suggested.".to_string();
        }

        rewrites
            .iter()
            .enumerate()
            .map(|(i, rewrite)| {
                let mut entry = format!(
                    "{}. {} Severity Issue\n   Original Clause: {}\n   Suggested Changes:\n   {}",
                    i + 1,
                    self.format_severity(rewrite.severity),
                    rewrite.original,
                    indent(&rewrite.rewrite)
                );
                if !rewrite.negotiation_tips.is_empty() {
                    entry.push_str(&format!("\n   Negotiation Tips:\n   {}", indent(&rewrite.negotiation_tips)));
                }
                if !rewrite.legal_basis.is_empty() {
                    entry.push_str(&format!("\n   Legal Basis:\n   {}", indent(&rewrite.legal_basis)));
                }
                entry
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_severity(&self, severity: Severity) -> String {
        let label = format!("[{}]", severity.as_str());
        let color = match severity {
            Severity::High => "\x1b[1m\x1b[31m",   // Bold red
            Severity::Medium => "\x1b[1m\x1b[33m", // Bold yellow
            Severity::Low => "\x1b[1m\x1b[32m",    // Bold green
            Severity::Unknown => "\x1b[1m\x1b[34m",
        };
        self.paint(color, &label)
    }

    fn format_section(&self, title: &str, content: &str) -> String {
        let title = if self.use_colors {
            format!("\x1b[1m\x1b[37m{}\x1b[0m", title)
        } else {
            title.to_string()
        };
        format!("{}\n{}\n{}", title, "-".repeat(RULE_WIDTH), content)
    }

    pub fn format_error(&self, error: &TenfiError) -> String {
        let hint = match error {
            e if e.is_extraction_error() => {
                "Could not read text from the lease. Scanned documents need OCR before analysis."
            }
            e if e.is_authentication_error() => {
                "Check that the API key for the selected model is set (ANTHROPIC_API_KEY, OPENAI_API_KEY or GEMINI_API_KEY)."
            }
            TenfiError::Completion { .. } => "The model call failed. Try again later or with a longer --timeout.",
            TenfiError::Config(_) => "Check the --model, --timeout and --temperature values.",
            _ => "Run with --debug for more detail.",
        };

        format!(
            "{}\n\n{}",
            self.paint("\x1b[1m\x1b[31m", &format!("🚨 ANALYSIS ERROR: {}", error)),
            hint
        )
    }

    pub fn format_progress(&self, message: &str) -> String {
        if self.use_colors {
            format!("\x1b[36m🏠 {}\x1b[0m", message)
        } else {
            format!("🏠 {}", message)
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint("\x1b[1m", text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }
}

/// Write a rendered report, creating parent directories as needed.
pub fn save_report(contents: &str, path: &Path) -> Result<(), TenfiError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn facet_title(facet: Facet) -> String {
    let icon = match facet {
        Facet::Summary => "📋",
        Facet::Clauses => "🚨",
        Facet::Price => "💰",
        Facet::Rewrite => "✏️",
        Facet::Rights => "⚖️",
    };
    format!("{} {}", icon, facet.title())
}

fn format_property(metadata: &LeaseMetadata) -> String {
    fn text(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("N/A")
    }
    fn money(value: Option<f64>) -> String {
        value.map(|v| format!("${:.2}", v)).unwrap_or_else(|| "N/A".to_string())
    }

    let mut lines = vec![format!("Address: {}", text(&metadata.property_address))];

    match metadata.location.as_deref().filter(|l| !l.trim().is_empty()) {
        Some(location) => lines.push(format!("Location: {}", location)),
        None => lines.push(format!(
            "City: {}, {} {}",
            text(&metadata.city),
            text(&metadata.state),
            text(&metadata.zip_code)
        )),
    }

    lines.push(format!("Monthly Rent: {}", money(metadata.monthly_rent)));
    lines.push(format!("Security Deposit: {}", money(metadata.security_deposit)));
    lines.push(format!(
        "Lease Term: {} to {}",
        text(&metadata.lease_start_date),
        text(&metadata.lease_end_date)
    ));
    lines.push(format!(
        "Bedrooms: {}, Bathrooms: {}",
        metadata.bedrooms.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string()),
        metadata.bathrooms.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string())
    ));

    lines.join("\n")
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

fn indent(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n   ")
}
