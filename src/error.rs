use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while extracting recipes or talking to collaborators
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The caller supplied something that is not an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Upstream site answered with a non-2xx status
    #[error("Failed to fetch page: {status} {status_text}")]
    Fetch { status: u16, status_text: String },

    /// Transport-level HTTP failure (DNS, TLS, connection reset, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Page fetch exceeded its deadline
    #[error("Page fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// The LLM provider could not be reached or returned an error payload
    #[error("LLM transport error: {0}")]
    LlmTransport(String),

    /// The LLM completion exceeded its deadline
    #[error("LLM completion timed out after {0:?}")]
    LlmTimeout(Duration),

    /// Markdown or JSON did not follow the recipe contract
    #[error("Failed to parse recipe: {0}")]
    Parse(String),

    /// Page was fetched but no ingredients or instructions could be found
    #[error("No recipe content found on this page")]
    NoRecipeContent,

    /// Storage collaborator failure, surfaced to the caller unchanged
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Error parsing HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl ExtractError {
    /// True for the deadline family, which degrades to `timeout-fallback`
    pub fn is_timeout(&self) -> bool {
        match self {
            ExtractError::FetchTimeout(_) | ExtractError::LlmTimeout(_) => true,
            ExtractError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(ExtractError::FetchTimeout(Duration::from_secs(1)).is_timeout());
        assert!(ExtractError::LlmTimeout(Duration::from_secs(1)).is_timeout());
        assert!(!ExtractError::NoRecipeContent.is_timeout());
        assert!(!ExtractError::Fetch {
            status: 404,
            status_text: "Not Found".to_string()
        }
        .is_timeout());
    }

    #[test]
    fn test_fetch_error_message() {
        let err = ExtractError::Fetch {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to fetch page: 503 Service Unavailable");
    }
}
