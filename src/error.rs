//! Error types for the analysis engine
//!
//! Only genuinely invalid input and cancellation surface as errors. Silence,
//! short clips and ambiguous material are resolved inside each feature and
//! reported as "unknown" values on the result types.

use std::fmt;

/// Errors that can occur during audio analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters (empty buffer, bad sample rate, bad config, ...)
    InvalidInput(String),

    /// Numerical error (non-finite intermediate values, etc.)
    NumericalError(String),

    /// The host cancelled the analysis through its cancellation token
    Cancelled(String),
}

impl AnalysisError {
    /// True if this error was caused by host cancellation rather than bad input
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled(_))
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            AnalysisError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = AnalysisError::InvalidInput("Empty audio samples".to_string());
        assert_eq!(err.to_string(), "Invalid input: Empty audio samples");

        let err = AnalysisError::Cancelled("vocal range scan".to_string());
        assert!(err.is_cancelled());
        assert!(err.to_string().starts_with("Cancelled"));
    }
}
