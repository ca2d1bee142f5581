use crate::analyzer::aggregator::ReportAggregator;
use crate::analyzer::llm_client::{create_completion_client, CompletionClient};
use crate::analyzer::parser::{self, Parsed};
use crate::analyzer::prompts::PromptTemplates;
use crate::config::AnalyzerConfig;
use crate::error::TenfiError;
use crate::loader::DocumentLoader;
use crate::models::{
    ClauseFinding, DocumentSource, Facet, FacetOutput, FacetRequest, FacetResult,
    LeaseAnalysisReport, LeaseDocument, LeaseMetadata, PriceAssessment, PriceComparison,
    RewriteTarget,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Called before each facet starts so a front end can show progress.
pub type ProgressHook = Arc<dyn Fn(Facet) + Send + Sync>;

/// Runs lease facets against a completion client, one call at a time.
///
/// Holds no per-run state: the same orchestrator can analyze any number of
/// documents, and each `run_full_analysis` builds a fresh report.
pub struct LeaseAnalysisOrchestrator {
    client: Arc<dyn CompletionClient>,
    templates: PromptTemplates,
    temperature: f32,
    max_rewrites: usize,
    rights_excerpt_chars: usize,
    metadata_excerpt_chars: usize,
    progress: Option<ProgressHook>,
}

impl LeaseAnalysisOrchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, config: &AnalyzerConfig) -> Self {
        Self {
            client,
            templates: PromptTemplates::new(),
            temperature: config.temperature,
            max_rewrites: config.max_rewrites,
            rights_excerpt_chars: config.rights_excerpt_chars,
            metadata_excerpt_chars: config.metadata_excerpt_chars,
            progress: None,
        }
    }

    /// Build the production completion client from `config` and wrap it.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, TenfiError> {
        let client = create_completion_client(config)?;
        Ok(Self::new(client, config))
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn max_rewrites(&self) -> usize {
        self.max_rewrites
    }

    pub async fn summarize(&self, lease_text: &str) -> Result<FacetResult, TenfiError> {
        let request = FacetRequest::new(Facet::Summary, lease_text);
        let (raw, duration_ms) = self.call(&request).await?;

        let parsed = parser::recover(parser::parse_summary(&raw), || {
            parser::unstructured_summary(&raw)
        });
        Ok(self.finish(Facet::Summary, parsed.map(FacetOutput::Summary), raw, duration_ms))
    }

    pub async fn find_problematic_clauses(&self, lease_text: &str) -> Result<FacetResult, TenfiError> {
        let request = FacetRequest::new(Facet::Clauses, lease_text);
        let (raw, duration_ms) = self.call(&request).await?;

        let parsed = parser::recover(parser::parse_clause_findings(&raw), || {
            parser::unreviewed_clauses(&raw)
        });
        info!(findings = parsed.value.len(), "clause identification finished");
        Ok(self.finish(Facet::Clauses, parsed.map(FacetOutput::Clauses), raw, duration_ms))
    }

    /// Without a location the answer is generic and flagged with `location_caveat`.
    pub async fn compare_rental_price(
        &self,
        lease_text: &str,
        location: Option<&str>,
        metadata: &LeaseMetadata,
    ) -> Result<FacetResult, TenfiError> {
        let request = FacetRequest::new(Facet::Price, lease_text)
            .with_location(location.map(str::to_string))
            .with_metadata(metadata.clone());
        let location_known = request.location.is_some();
        let (raw, duration_ms) = self.call(&request).await?;

        let parsed = parser::recover(
            parser::parse_price_comparison(&raw, location_known),
            || PriceComparison {
                assessment: PriceAssessment::Unknown,
                rationale: raw.trim().to_string(),
                location_caveat: !location_known,
            },
        );
        Ok(self.finish(Facet::Price, parsed.map(FacetOutput::Price), raw, duration_ms))
    }

    /// One completion call per target, in the order given.
    pub async fn suggest_rewrites(&self, targets: &[RewriteTarget]) -> Result<FacetResult, TenfiError> {
        if targets.is_empty() {
            return Err(TenfiError::InvalidArguments(
                "suggest_rewrites needs at least one target clause".to_string(),
            ));
        }

        let mut suggestions = Vec::with_capacity(targets.len());
        let mut raw_responses = Vec::with_capacity(targets.len());
        let mut warnings = Vec::new();
        let mut total_ms = 0u64;

        for (index, target) in targets.iter().enumerate() {
            debug!(index, severity = target.severity.as_str(), "rewriting clause");
            let request = FacetRequest::for_rewrite(target.clone());
            let (raw, duration_ms) = self.call(&request).await?;
            total_ms += duration_ms;

            let parsed = parser::recover(parser::parse_rewrite(&raw, target), || {
                parser::unstructured_rewrite(&raw, target)
            });
            if let Some(warning) = parsed.warning() {
                warnings.push(format!("clause {}: {}", index + 1, warning));
            }
            suggestions.push(parsed.value);
            raw_responses.push(raw);
        }

        let parsed = Parsed {
            value: FacetOutput::Rewrites(suggestions),
            warnings,
        };
        Ok(self.finish(Facet::Rewrite, parsed, raw_responses.join("\n\n---\n\n"), total_ms))
    }

    pub async fn explain_tenant_rights(
        &self,
        lease_text: &str,
        location: Option<&str>,
    ) -> Result<FacetResult, TenfiError> {
        let request = FacetRequest::new(Facet::Rights, excerpt(lease_text, self.rights_excerpt_chars))
            .with_location(location.map(str::to_string));
        let (raw, duration_ms) = self.call(&request).await?;

        let text = raw.trim().to_string();
        let parsed = if text.is_empty() {
            Parsed::clean(FacetOutput::Rights(text)).with_warning("rights response was empty")
        } else {
            Parsed::clean(FacetOutput::Rights(text))
        };
        Ok(self.finish(Facet::Rights, parsed, raw, duration_ms))
    }

    /// Ask the model for property details. Malformed JSON yields empty metadata and a warning.
    pub async fn extract_metadata(&self, lease_text: &str) -> Result<Parsed<LeaseMetadata>, TenfiError> {
        let prompt = self
            .templates
            .render_metadata(excerpt(lease_text, self.metadata_excerpt_chars));

        let raw = self.client.complete(&prompt, self.temperature).await?;
        let parsed = parser::recover(parser::parse_metadata(&raw), LeaseMetadata::default);

        if let Some(warning) = parsed.warning() {
            warn!(warning = %warning, "metadata extraction fell back to empty metadata");
        }
        Ok(parsed)
    }

    /// Run all five facets in order. A failing facet becomes a degraded slot
    /// and never stops the ones after it.
    pub async fn run_full_analysis(&self, document: &LeaseDocument) -> LeaseAnalysisReport {
        let text = document.text.as_str();
        let location = document.location();
        let mut aggregator = ReportAggregator::new(document, self.client.model_name());

        info!(
            document = %document.source,
            chars = document.char_count(),
            model = self.client.model_name(),
            "starting full lease analysis"
        );

        self.notify(Facet::Summary);
        aggregator.record(Facet::Summary, self.summarize(text).await);

        self.notify(Facet::Clauses);
        let clauses = self.find_problematic_clauses(text).await;
        let findings = clauses.as_ref().ok().map(|result| result.clauses().unwrap_or(&[]));
        let needs_review = findings.is_some_and(|f| f.iter().any(|c| c.needs_manual_review));
        let targets = findings.map(|f| rewrite_targets(f, self.max_rewrites));
        aggregator.record(Facet::Clauses, clauses);

        self.notify(Facet::Price);
        aggregator.record(
            Facet::Price,
            self.compare_rental_price(text, location.as_deref(), &document.metadata)
                .await,
        );

        self.notify(Facet::Rewrite);
        match targets {
            None => aggregator.record_unavailable(
                Facet::Rewrite,
                "skipped because clause identification failed",
            ),
            Some(_) if needs_review => aggregator.record_unavailable(
                Facet::Rewrite,
                "skipped because the clause review needs manual review",
            ),
            Some(targets) if targets.is_empty() => {
                aggregator.record(Facet::Rewrite, Ok(self.no_rewrites_needed()))
            }
            Some(targets) => aggregator.record(Facet::Rewrite, self.suggest_rewrites(&targets).await),
        }

        self.notify(Facet::Rights);
        aggregator.record(
            Facet::Rights,
            self.explain_tenant_rights(text, location.as_deref()).await,
        );

        let report = aggregator.finish();
        info!(
            degraded = report.degraded_facets().len(),
            warnings = report.warnings.len(),
            "lease analysis finished"
        );
        report
    }

    /// Load `source` and run the full analysis. Extraction failures return
    /// before any completion call is made.
    pub async fn analyze_source(
        &self,
        loader: &dyn DocumentLoader,
        source: DocumentSource,
        metadata: LeaseMetadata,
    ) -> Result<LeaseAnalysisReport, TenfiError> {
        let text = loader.load(&source)?;
        let document = LeaseDocument::new(text, source).with_metadata(metadata);
        Ok(self.run_full_analysis(&document).await)
    }

    async fn call(&self, request: &FacetRequest) -> Result<(String, u64), TenfiError> {
        let prompt = self.templates.render(request);
        let start_time = Instant::now();

        debug!(facet = %request.facet, prompt_chars = prompt.len(), "sending facet prompt");
        let raw = self.client.complete(&prompt, self.temperature).await.map_err(|e| {
            warn!(facet = %request.facet, error = %e, "facet completion failed");
            e
        })?;

        Ok((raw, start_time.elapsed().as_millis() as u64))
    }

    fn finish(&self, facet: Facet, parsed: Parsed<FacetOutput>, raw: String, duration_ms: u64) -> FacetResult {
        let warning = parsed.warning();
        if let Some(ref warning) = warning {
            warn!(facet = %facet, warning = %warning, "best-effort parse");
        }

        FacetResult::new(facet, parsed.value, raw)
            .with_parse_warning(warning)
            .with_model(self.client.model_name(), duration_ms)
    }

    fn no_rewrites_needed(&self) -> FacetResult {
        FacetResult::new(Facet::Rewrite, FacetOutput::Rewrites(Vec::new()), String::new())
            .with_model(self.client.model_name(), 0)
    }

    fn notify(&self, facet: Facet) {
        if let Some(ref hook) = self.progress {
            hook(facet);
        }
    }
}

/// High and medium findings, in lease order, capped at `max`.
pub fn rewrite_targets(findings: &[ClauseFinding], max: usize) -> Vec<RewriteTarget> {
    findings
        .iter()
        .filter(|finding| finding.warrants_rewrite())
        .take(max)
        .map(RewriteTarget::from)
        .collect()
}

/// Leading `max_chars` characters of `text`, cut on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
