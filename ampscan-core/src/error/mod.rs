//! Core error types for ampscan

use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Classify,
    Search,
    Metadata,
    Annotate,
    Output,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Classify => "classify",
            Stage::Search => "search",
            Stage::Metadata => "metadata",
            Stage::Annotate => "annotate",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type for ampscan operations
///
/// Ambiguous joins are not an error: the annotation engine resolves them
/// with a fixed tie-break, so there is no variant for them.
#[derive(Error, Debug)]
pub enum AmpscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input ({stage}): {message}")]
    MalformedInput { stage: Stage, message: String },

    #[error("Scorer unavailable: {0}")]
    ScorerUnavailable(String),

    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<AmpscanError>,
    },
}

/// Result type alias for ampscan operations
pub type AmpscanResult<T> = Result<T, AmpscanError>;

impl AmpscanError {
    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        AmpscanError::MalformedInput {
            stage,
            message: message.into(),
        }
    }

    /// Stage the error is attributed to, when known
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AmpscanError::MalformedInput { stage, .. } => Some(*stage),
            AmpscanError::ScorerUnavailable(_) => Some(Stage::Classify),
            AmpscanError::SearchUnavailable(_) => Some(Stage::Search),
            AmpscanError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Attribute an error to `stage` unless it already names one
    pub fn at_stage(self, stage: Stage) -> Self {
        if self.stage().is_some() {
            return self;
        }
        AmpscanError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying error with any stage attribution removed
    pub fn root_cause(&self) -> &AmpscanError {
        match self {
            AmpscanError::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// External tool failures and bad input are never worth retrying
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root_cause(),
            AmpscanError::MalformedInput { .. }
                | AmpscanError::ScorerUnavailable(_)
                | AmpscanError::SearchUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for AmpscanError {
    fn from(err: serde_json::Error) -> Self {
        AmpscanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let io_error = AmpscanError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(format!("{}", io_error).contains("IO error"));

        let malformed = AmpscanError::malformed(Stage::Ingest, "record 'P1' has no residues");
        assert_eq!(
            format!("{}", malformed),
            "Malformed input (ingest): record 'P1' has no residues"
        );

        let scorer = AmpscanError::ScorerUnavailable("amp-scorer not found".to_string());
        assert_eq!(format!("{}", scorer), "Scorer unavailable: amp-scorer not found");

        let search = AmpscanError::SearchUnavailable("blastp exited with 2".to_string());
        assert_eq!(format!("{}", search), "Search unavailable: blastp exited with 2");

        let config = AmpscanError::Configuration("missing threshold".to_string());
        assert_eq!(format!("{}", config), "Configuration error: missing threshold");
    }

    #[test]
    fn test_stage_attribution() {
        assert_eq!(
            AmpscanError::malformed(Stage::Search, "bad row").stage(),
            Some(Stage::Search)
        );
        assert_eq!(
            AmpscanError::ScorerUnavailable(String::new()).stage(),
            Some(Stage::Classify)
        );
        assert_eq!(
            AmpscanError::SearchUnavailable(String::new()).stage(),
            Some(Stage::Search)
        );
        assert_eq!(AmpscanError::InvalidInput(String::new()).stage(), None);
    }

    #[test]
    fn test_at_stage_keeps_existing_attribution() {
        let err = AmpscanError::Io(io::Error::new(io::ErrorKind::NotFound, "reference.fa"));
        let err = err.at_stage(Stage::Ingest);
        assert_eq!(err.stage(), Some(Stage::Ingest));
        assert!(err.to_string().starts_with("ingest stage failed: IO error"));
        assert!(matches!(err.root_cause(), AmpscanError::Io(_)));

        let err = AmpscanError::malformed(Stage::Search, "bad row").at_stage(Stage::Annotate);
        assert_eq!(err.stage(), Some(Stage::Search));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AmpscanError::malformed(Stage::Ingest, "x").is_fatal());
        assert!(AmpscanError::ScorerUnavailable("x".into()).is_fatal());
        assert!(AmpscanError::SearchUnavailable("x".into()).is_fatal());
        assert!(!AmpscanError::Configuration("x".into()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: AmpscanError = io_err.into();

        match err {
            AmpscanError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");
        let err: AmpscanError = parse_result.unwrap_err().into();

        match err {
            AmpscanError::Serialization(msg) => assert!(msg.contains("key must be a string")),
            _ => panic!("Expected Serialization error variant"),
        }
    }
}
