pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;

pub use error::{CompletionErrorKind, TenfiError};

// Re-export commonly used types
pub use analyzer::{CompletionClient, LeaseAnalysisOrchestrator, PromptTemplates};
pub use config::AnalyzerConfig;
pub use loader::{DocumentLoader, FileLoader};
pub use models::{
    ClauseFinding, DocumentSource, Facet, FacetResult, FacetSlot, LeaseAnalysisReport,
    LeaseDocument, LeaseMetadata, Severity,
};

pub use cli::CliHandler;
