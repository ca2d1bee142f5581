use crate::config::AnalyzerConfig;
use crate::error::TenfiError;
use crate::models::{Facet, LeaseMetadata};
use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tenfi")]
#[command(about = "Tenant lease analyzer - plain-English summaries, problem clauses and tenant rights using LLMs")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Lease document to analyze (PDF or plain text)
    pub lease: PathBuf,

    /// Where the property is, e.g. "Portland, OR"
    #[arg(short = 'l', long)]
    pub location: Option<String>,

    /// Property address
    #[arg(long)]
    pub address: Option<String>,

    /// Monthly rent in dollars
    #[arg(long, value_parser = validate_rent)]
    pub rent: Option<f64>,

    /// Number of bedrooms
    #[arg(long)]
    pub bedrooms: Option<u32>,

    /// Ask the model to extract property details before analyzing
    #[arg(long)]
    pub extract_metadata: bool,

    /// Run every facet into one report, or run selected facets one by one
    #[arg(long, value_enum, default_value_t = Mode::Full)]
    pub mode: Mode,

    /// Facet to run in step mode (summary, clauses, price, rewrite, rights); repeatable
    #[arg(short = 'f', long = "facet", value_parser = parse_facet)]
    pub facets: Vec<Facet>,

    /// Clause text to rewrite in step mode; repeatable
    #[arg(long = "clause")]
    pub clauses: Vec<String>,

    /// LLM model to use (default: claude-sonnet-4-20250514, or TENFI_MODEL)
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Maximum time per LLM call in seconds (10-300, default 120)
    #[arg(short = 't', long, value_parser = validate_timeout)]
    pub timeout: Option<u64>,

    /// Sampling temperature (0.0-1.0)
    #[arg(long, default_value = "0.2", value_parser = validate_temperature)]
    pub temperature: f32,

    /// Report format for stdout and the saved file
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Save the report to this path instead of a timestamped file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Do not save the report to disk
    #[arg(long, conflicts_with = "output")]
    pub no_save: bool,

    /// Enable verbose output to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable debug output including LLM communications
    #[arg(short = 'd', long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Full,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Result<Self, TenfiError> {
        let cli = Self::try_parse().map_err(|e| match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => e.exit(),
            _ => TenfiError::InvalidArguments(e.to_string()),
        })?;

        cli.validate()?;

        Ok(cli)
    }

    pub fn validate(&self) -> Result<(), TenfiError> {
        if let Some(timeout) = self.timeout {
            if !(10..=300).contains(&timeout) {
                return Err(TenfiError::InvalidArguments(
                    "Timeout must be between 10 and 300 seconds".to_string(),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(TenfiError::InvalidArguments(
                "Temperature must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.mode == Mode::Full && !self.facets.is_empty() {
            return Err(TenfiError::InvalidArguments(
                "--facet only applies with --mode step".to_string(),
            ));
        }

        if self.mode == Mode::Full && !self.clauses.is_empty() {
            return Err(TenfiError::InvalidArguments(
                "--clause only applies with --mode step".to_string(),
            ));
        }

        if self.clauses.iter().any(|c| c.trim().is_empty()) {
            return Err(TenfiError::InvalidArguments(
                "--clause text cannot be empty".to_string(),
            ));
        }

        if let Some(ref model) = self.model {
            if model.trim().is_empty() {
                return Err(TenfiError::InvalidArguments(
                    "Model name cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Facets to run in step mode, in execution order. Defaults to all five.
    pub fn selected_facets(&self) -> Vec<Facet> {
        if self.facets.is_empty() {
            return Facet::ALL.to_vec();
        }

        let mut facets = self.facets.clone();
        facets.sort();
        facets.dedup();
        facets
    }

    /// Property details given on the command line.
    pub fn metadata_overrides(&self) -> LeaseMetadata {
        LeaseMetadata {
            property_address: self.address.clone(),
            monthly_rent: self.rent,
            bedrooms: self.bedrooms,
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
            ..LeaseMetadata::default()
        }
    }

    /// Apply command-line overrides on top of an environment-derived config.
    pub fn apply_to(&self, config: AnalyzerConfig) -> AnalyzerConfig {
        let mut config = config.with_temperature(self.temperature);

        if let Some(ref model) = self.model {
            config = config.with_model(model.trim());
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }

    /// Where to save the report, or `None` with `--no-save`.
    pub fn report_path(&self, now: DateTime<Local>) -> Option<PathBuf> {
        if self.no_save {
            return None;
        }

        Some(match self.output {
            Some(ref path) => path.clone(),
            None => PathBuf::from(default_report_filename(now, self.format)),
        })
    }

    pub fn is_step_mode(&self) -> bool {
        self.mode == Mode::Step
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose || self.debug
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn should_use_color(&self) -> bool {
        // Disable color if NO_COLOR environment variable is set
        std::env::var("NO_COLOR").is_err()
    }

    /// Default log level when `RUST_LOG` is not set.
    pub fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

/// `lease_analysis_YYYYMMDD_HHMMSS.txt` (or `.json`).
pub fn default_report_filename(now: DateTime<Local>, format: OutputFormat) -> String {
    format!(
        "lease_analysis_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn validate_timeout(s: &str) -> Result<u64, String> {
    let timeout: u64 = s.parse().map_err(|_| "Timeout must be a number")?;

    if (10..=300).contains(&timeout) {
        Ok(timeout)
    } else {
        Err("Timeout must be between 10 and 300 seconds".to_string())
    }
}

fn validate_temperature(s: &str) -> Result<f32, String> {
    let temperature: f32 = s.parse().map_err(|_| "Temperature must be a number")?;

    if (0.0..=1.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err("Temperature must be between 0.0 and 1.0".to_string())
    }
}

fn validate_rent(s: &str) -> Result<f64, String> {
    let rent: f64 = s
        .trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .map_err(|_| "Rent must be a number, e.g. 1800 or $1,800")?;

    if rent.is_finite() && rent >= 0.0 {
        Ok(rent)
    } else {
        Err("Rent cannot be negative".to_string())
    }
}

fn parse_facet(s: &str) -> Result<Facet, String> {
    Facet::from_str(s).map_err(|e| e.to_string())
}
