use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenfiError {
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Extraction error: document is encrypted or password protected")]
    EncryptedDocument,

    #[error("Extraction error: no extractable text (scanned or image-only document?)")]
    NoExtractableText,

    #[error("Extraction error: unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Completion failed ({kind}): {message}")]
    Completion {
        kind: CompletionErrorKind,
        message: String,
    },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid command line arguments: {0}")]
    InvalidArguments(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a completion call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionErrorKind {
    Transport,
    Authentication,
    Rejected,
    RateLimited,
    Timeout,
}

impl TenfiError {
    pub fn completion<S: Into<String>>(kind: CompletionErrorKind, message: S) -> Self {
        TenfiError::Completion {
            kind,
            message: message.into(),
        }
    }

    /// Errors that leave nothing to analyze.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            TenfiError::Extraction(_)
                | TenfiError::EncryptedDocument
                | TenfiError::NoExtractableText
                | TenfiError::UnsupportedDocument(_)
        )
    }

    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            TenfiError::Completion {
                kind: CompletionErrorKind::Authentication,
                ..
            }
        )
    }

    pub fn completion_kind(&self) -> Option<CompletionErrorKind> {
        match self {
            TenfiError::Completion { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl CompletionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionErrorKind::Transport => "transport",
            CompletionErrorKind::Authentication => "authentication",
            CompletionErrorKind::Rejected => "rejected",
            CompletionErrorKind::RateLimited => "rate limited",
            CompletionErrorKind::Timeout => "timeout",
        }
    }

    /// Best-effort classification of a provider error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("authentication")
            || lower.contains("invalid x-api-key")
            || lower.contains("invalid api key")
            || lower.contains("incorrect api key")
        {
            CompletionErrorKind::Authentication
        } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("rate_limit") {
            CompletionErrorKind::RateLimited
        } else if lower.contains("content policy")
            || lower.contains("content_filter")
            || lower.contains("safety")
            || lower.contains("blocked")
            || lower.contains("refus")
        {
            CompletionErrorKind::Rejected
        } else if lower.contains("timed out") || lower.contains("timeout") {
            CompletionErrorKind::Timeout
        } else {
            CompletionErrorKind::Transport
        }
    }
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
