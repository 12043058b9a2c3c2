use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("No input message found")]
    MissingInput,

    #[error("Invalid model: {model}. Allowed models: {}", allowed.join(", "))]
    UnknownModel { model: String, allowed: Vec<String> },

    #[error("{0}")]
    Provider(String),

    #[error("Prompt rendering failed: {0}")]
    Template(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl RelayError {
    /// Errors caused by the caller's payload rather than by this service or its collaborators
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::Validation(_) | RelayError::MissingInput | RelayError::UnknownModel { .. }
        )
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_lists_allowed_set() {
        let err = RelayError::UnknownModel {
            model: "gpt-x".to_string(),
            allowed: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid model: gpt-x. Allowed models: a, b");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_provider_error_is_not_client_error() {
        assert!(!RelayError::Provider("boom".to_string()).is_client_error());
        assert!(!RelayError::Cancelled.is_client_error());
    }
}
