use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValorizeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scoring service error: {0}")]
    Transport(String),

    #[error("Scoring service returned no prior art for this submission")]
    EmptyResult,

    #[error("Request superseded by a newer submission")]
    Superseded,

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl ValorizeError {
    /// Short message suitable for showing to the person who submitted the request.
    pub fn user_message(&self) -> String {
        match self {
            ValorizeError::Validation(msg) => msg.clone(),
            ValorizeError::Transport(_) => {
                "Could not reach the analysis service. Please try again.".to_string()
            }
            ValorizeError::EmptyResult => {
                "No related patents or publications were found for this abstract.".to_string()
            }
            ValorizeError::Superseded => "Request replaced by a newer one.".to_string(),
            ValorizeError::Database(_) | ValorizeError::Json(_) => {
                "Your analyses could not be saved.".to_string()
            }
            ValorizeError::UrlParse(_) => "The analysis service URL is invalid.".to_string(),
        }
    }

    /// Errors a caller may reasonably retry without changing the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ValorizeError::Transport(_) | ValorizeError::Database(_))
    }
}

impl From<validator::ValidationErrors> for ValorizeError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        if fields.is_empty() {
            ValorizeError::Validation(errors.to_string())
        } else {
            ValorizeError::Validation(format!("{} must not be empty", fields.join(" and ")))
        }
    }
}

pub type Result<T> = std::result::Result<T, ValorizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_is_retryable() {
        assert!(ValorizeError::Transport("502".to_string()).is_retryable());
        assert!(!ValorizeError::EmptyResult.is_retryable());
        assert!(!ValorizeError::Validation("title".to_string()).is_retryable());
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let error = ValorizeError::Transport("connection refused at 10.0.0.1".to_string());
        assert!(!error.user_message().contains("10.0.0.1"));
    }
}
