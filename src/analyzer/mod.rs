// Analyzer module - prompts, completion calls, parsing and report assembly

pub mod aggregator;
pub mod llm_client;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

pub use aggregator::{analysis_summary, ReportAggregator};
pub use llm_client::{create_completion_client, CompletionClient, CompletionFuture, RigCompletionClient};
pub use orchestrator::{rewrite_targets, LeaseAnalysisOrchestrator, ProgressHook};
pub use parser::Parsed;
pub use prompts::PromptTemplates;
