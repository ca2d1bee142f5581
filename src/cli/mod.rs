pub mod args;
pub mod reporter;

pub use args::{Cli, Mode, OutputFormat};
pub use reporter::{save_report, ReportFormatter};

use crate::analyzer::{CompletionClient, LeaseAnalysisOrchestrator, ReportAggregator};
use crate::config::AnalyzerConfig;
use crate::error::{CompletionErrorKind, TenfiError};
use crate::loader::FileLoader;
use crate::models::{
    ClauseFinding, DocumentSource, Facet, LeaseAnalysisReport, LeaseDocument, RewriteTarget,
};
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CliHandler {
    cli: Cli,
    client: Option<Arc<dyn CompletionClient>>,
}

impl CliHandler {
    pub fn new(cli: Cli) -> Self {
        Self { cli, client: None }
    }

    /// Use `client` instead of building one from the resolved configuration.
    pub fn with_completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn formatter(&self) -> ReportFormatter {
        ReportFormatter::new(&self.cli)
    }

    /// Run the command and return the process exit code.
    pub async fn run(&self) -> Result<i32, TenfiError> {
        let config = self.resolve_config()?;
        let formatter = self.formatter();

        if self.cli.is_verbose() {
            eprintln!("{}", formatter.format_progress(&config.describe()));
        }

        let orchestrator = self.build_orchestrator(&config)?;

        eprintln!("{}", formatter.format_progress("Loading lease..."));
        let loader = FileLoader::new();
        let document = loader.load_document(
            DocumentSource::File(self.cli.lease.clone()),
            self.cli.metadata_overrides(),
        )?;

        if self.cli.is_verbose() {
            eprintln!(
                "{}",
                formatter.format_progress(&format!(
                    "Extracted {} characters from {}",
                    document.char_count(),
                    document.source
                ))
            );
        }

        let (document, metadata_warning) = if self.cli.extract_metadata {
            self.extract_metadata(&orchestrator, document, &formatter).await
        } else {
            (document, None)
        };

        let mut report = if self.cli.is_step_mode() {
            self.run_steps(&orchestrator, &document, &formatter).await?
        } else {
            let report = orchestrator.run_full_analysis(&document).await;
            eprintln!("{}", formatter.format_progress("Full analysis complete!"));
            report
        };

        if let Some(warning) = metadata_warning {
            report.warnings.insert(0, format!("metadata: {}", warning));
        }

        self.emit(&report, &formatter)?;

        if report.has_authentication_failure() {
            return Ok(5);
        }

        Ok(0)
    }

    fn resolve_config(&self) -> Result<AnalyzerConfig, TenfiError> {
        let config = self
            .cli
            .apply_to(AnalyzerConfig::from_env())
            .with_api_key_from_env();
        config.validate()?;
        Ok(config)
    }

    fn build_orchestrator(&self, config: &AnalyzerConfig) -> Result<LeaseAnalysisOrchestrator, TenfiError> {
        let orchestrator = match self.client {
            Some(ref client) => LeaseAnalysisOrchestrator::new(Arc::clone(client), config),
            None => LeaseAnalysisOrchestrator::from_config(config)?,
        };

        if self.cli.is_step_mode() {
            return Ok(orchestrator);
        }

        let formatter = self.formatter();
        Ok(orchestrator.with_progress(Arc::new(move |facet: Facet| {
            eprintln!("{}", formatter.format_progress(facet.progress_message()));
        })))
    }

    async fn extract_metadata(
        &self,
        orchestrator: &LeaseAnalysisOrchestrator,
        document: LeaseDocument,
        formatter: &ReportFormatter,
    ) -> (LeaseDocument, Option<String>) {
        eprintln!("{}", formatter.format_progress("Extracting property details..."));

        match orchestrator.extract_metadata(&document.text).await {
            Ok(parsed) => {
                let warning = parsed.warning();
                let merged = document.metadata.clone().merge_missing(parsed.value);
                (document.with_metadata(merged), warning)
            }
            Err(e) => {
                warn!(error = %e, "metadata extraction failed; continuing with supplied details");
                (document, Some(format!("extraction failed: {}", e)))
            }
        }
    }

    /// Step mode: run the selected facets directly. The first failure aborts.
    async fn run_steps(
        &self,
        orchestrator: &LeaseAnalysisOrchestrator,
        document: &LeaseDocument,
        formatter: &ReportFormatter,
    ) -> Result<LeaseAnalysisReport, TenfiError> {
        let text = document.text.as_str();
        let location = document.location();
        let print_facets = self.cli.format == OutputFormat::Text;

        let mut aggregator = ReportAggregator::new(document, orchestrator.model_name());
        let mut findings: Option<Vec<ClauseFinding>> = None;

        for facet in self.cli.selected_facets() {
            eprintln!("{}", formatter.format_progress(facet.progress_message()));

            let result = match facet {
                Facet::Summary => orchestrator.summarize(text).await?,
                Facet::Clauses => orchestrator.find_problematic_clauses(text).await?,
                Facet::Price => {
                    orchestrator
                        .compare_rental_price(text, location.as_deref(), &document.metadata)
                        .await?
                }
                Facet::Rewrite => {
                    let targets = self.step_rewrite_targets(findings.as_deref(), orchestrator)?;
                    if targets.is_empty() {
                        eprintln!(
                            "{}",
                            formatter.format_progress("No high or medium severity clauses to rewrite")
                        );
                        continue;
                    }
                    orchestrator.suggest_rewrites(&targets).await?
                }
                Facet::Rights => {
                    orchestrator
                        .explain_tenant_rights(text, location.as_deref())
                        .await?
                }
            };

            if facet == Facet::Clauses {
                findings = result.clauses().map(<[ClauseFinding]>::to_vec);
            }

            if print_facets {
                println!("{}\n", formatter.format_facet_result(&result));
            }
            aggregator.record(facet, Ok(result));
        }

        Ok(aggregator.finish())
    }

    /// Explicit `--clause` targets win; otherwise use this run's clause findings.
    fn step_rewrite_targets(
        &self,
        findings: Option<&[ClauseFinding]>,
        orchestrator: &LeaseAnalysisOrchestrator,
    ) -> Result<Vec<RewriteTarget>, TenfiError> {
        if !self.cli.clauses.is_empty() {
            return Ok(self
                .cli
                .clauses
                .iter()
                .map(|clause| RewriteTarget::new(clause.trim()))
                .collect());
        }

        match findings {
            Some(findings) => Ok(crate::analyzer::rewrite_targets(
                findings,
                orchestrator.max_rewrites(),
            )),
            None => Err(TenfiError::InvalidArguments(
                "the rewrite facet needs --clause or the clauses facet in the same run".to_string(),
            )),
        }
    }

    fn emit(&self, report: &LeaseAnalysisReport, formatter: &ReportFormatter) -> Result<(), TenfiError> {
        match self.cli.format {
            OutputFormat::Json => println!("{}", formatter.format_json(report)?),
            OutputFormat::Text if !self.cli.is_step_mode() => println!("{}", formatter.format_report(report)),
            OutputFormat::Text => {}
        }

        if let Some(path) = self.cli.report_path(Local::now()) {
            let contents = match self.cli.format {
                OutputFormat::Json => formatter.format_json(report)?,
                OutputFormat::Text => ReportFormatter::plain().format_report(report),
            };
            save_report(&contents, &path)?;
            info!(path = %path.display(), "report saved");
            eprintln!(
                "{}",
                formatter.format_progress(&format!("Report saved to {}", path.display()))
            );
        }

        Ok(())
    }
}

/// Process exit code for an error that escaped `CliHandler::run`.
pub fn exit_code_for(error: &TenfiError) -> i32 {
    match error {
        TenfiError::InvalidArguments(_) => 2,
        e if e.is_extraction_error() => 3,
        TenfiError::Config(_) => 4,
        TenfiError::Completion {
            kind: CompletionErrorKind::Authentication,
            ..
        } => 5,
        TenfiError::Completion { .. } => 6,
        _ => 1,
    }
}
