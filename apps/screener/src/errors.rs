use thiserror::Error;

/// Application-level error type.
///
/// Only these errors are allowed to abort an analysis run. Failures of individual
/// LLM or index calls are recovered inside the pipeline and never surface here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, printed alongside the message by the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Validation(_) => 2,
            AppError::Configuration(_) => 3,
            AppError::Extraction(_) | AppError::UnsupportedFormat(_) => 4,
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                5
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_fatal_kinds() {
        let extraction = AppError::Extraction("empty".to_string());
        let config = AppError::Configuration("no key".to_string());
        assert_eq!(extraction.code(), "EXTRACTION_ERROR");
        assert_eq!(config.code(), "CONFIGURATION_ERROR");
        assert_ne!(extraction.exit_code(), config.exit_code());
    }

    #[test]
    fn test_unsupported_format_shares_extraction_exit_code() {
        let unsupported = AppError::UnsupportedFormat("resume.docx".to_string());
        assert_eq!(
            unsupported.exit_code(),
            AppError::Extraction(String::new()).exit_code()
        );
        assert!(unsupported.to_string().contains("resume.docx"));
    }
}
