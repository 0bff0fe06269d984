//! Error types for the recommendation core and its collaborators.

/// Failure raised by a crop classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("non-finite value for feature '{0}'")]
    NonFiniteFeature(&'static str),

    #[error("classifier not loaded")]
    NotLoaded,

    #[error("numeric fault: {0}")]
    Numeric(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Classifier invocation failed. Always surfaced to the caller, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("prediction failed: {0}")]
pub struct PredictionError(#[from] pub ClassifierError);

impl PredictionError {
    pub fn cause(&self) -> &ClassifierError {
        &self.0
    }
}

/// One or more of N/P/K was not supplied. Raised by front-end glue before
/// the engine is invoked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required soil input(s): {}", .fields.join(", "))]
pub struct MissingInputError {
    pub fields: Vec<&'static str>,
}

/// Weather lookup failures. Front-ends turn these into warnings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("weather API returned status {status}")]
    Status { status: u16 },

    #[error("weather response is missing {0}")]
    Incomplete(&'static str),

    #[error("could not decode weather response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = MissingInputError {
            fields: vec!["N", "K"],
        };
        assert_eq!(err.to_string(), "missing required soil input(s): N, K");
    }

    #[test]
    fn test_prediction_error_carries_cause() {
        let err = PredictionError::from(ClassifierError::FeatureCount {
            expected: 5,
            actual: 7,
        });
        assert!(matches!(err.cause(), ClassifierError::FeatureCount { .. }));
        assert!(err.to_string().contains("model expects 5, got 7"));
    }
}
