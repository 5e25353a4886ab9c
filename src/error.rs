use thiserror::Error;

/// Errors raised by the Keepa API layer.
///
/// Callers in the export pipeline never surface these directly: a failed
/// deal fetch degrades to an empty list and a failed product fetch to the
/// placeholder product.
#[derive(Debug, Error)]
pub enum KeepaError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Keepa API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited by Keepa after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ASIN format: {0:?}")]
    InvalidAsin(String),

    #[error("Incomplete product data for ASIN {asin}: {reason}")]
    IncompleteProduct { asin: String, reason: String },

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl KeepaError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            KeepaError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            KeepaError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeepaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = KeepaError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        let err = KeepaError::Status {
            status: 400,
            body: "bad key".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!KeepaError::InvalidAsin("123".to_string()).is_transient());
    }
}
