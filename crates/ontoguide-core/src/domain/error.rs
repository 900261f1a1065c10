//! Error taxonomy for metric classification and module extraction.

use std::path::PathBuf;

/// Failure of a single external tool invocation.
///
/// Every variant moves the extraction cascade to its next state; none of
/// them is fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolInvocationFailure {
    #[error("failed to spawn tool: {0}")]
    Spawn(String),

    #[error("tool exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("tool reported success but produced no output at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("tool produced an empty output file at {}", path.display())]
    EmptyOutput { path: PathBuf },

    #[error("tool timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("request deadline expired")]
    DeadlineExceeded,

    #[error("tool returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl ToolInvocationFailure {
    /// Deadline expiry ends the cascade instead of advancing it.
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// Ontoguide domain errors.
#[derive(Debug, thiserror::Error)]
pub enum OntoGuideError {
    #[error("unparsable worst range {text:?} for metric {metric}: {reason}")]
    Parse {
        metric: String,
        text: String,
        reason: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid identifier {iri:?}: {reason}")]
    InvalidIdentifier { iri: String, reason: String },

    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolInvocationFailure),

    #[error("extraction cascade exhausted for metric {metric}: {reason}")]
    ExhaustedCascade { metric: String, reason: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed document: {0}")]
    Document(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ontoguide operations.
pub type Result<T> = std::result::Result<T, OntoGuideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = OntoGuideError::Parse {
            metric: "LCOMOnto".to_string(),
            text: "between 1 and 2".to_string(),
            reason: "no comparator".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("LCOMOnto"));
        assert!(msg.contains("between 1 and 2"));
    }

    #[test]
    fn test_tool_failure_converts() {
        let err: OntoGuideError = ToolInvocationFailure::NonZeroExit {
            code: 1,
            stderr: "boom".to_string(),
        }
        .into();
        assert!(err.to_string().contains("status 1"));
    }

    #[test]
    fn test_deadline_is_flagged() {
        assert!(ToolInvocationFailure::DeadlineExceeded.is_deadline());
        assert!(!ToolInvocationFailure::Timeout { secs: 3 }.is_deadline());
    }
}
