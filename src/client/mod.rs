//! REST façade over the rules / parametric backend.
//!
//! Every service shares one [`HttpClient`]; failures surface as [`ApiError`]
//! except where a service documents a fallback value.

pub mod entities;
pub mod http;
pub mod parametricas;
pub mod rules;

use std::fmt;

use crate::config::ApiConfig;

// Re-export key types
pub use entities::EntityClient;
pub use http::HttpClient;
pub use parametricas::ParametricasClient;
pub use rules::RulesClient;

/// Error type for backend calls
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout.
    Unavailable(String),
    /// The server answered with a non-2xx status.
    Status { code: u16, body: String },
    /// A 2xx response whose body is a bare JSON string: the server's own
    /// error message.
    Domain(String),
    /// The body could not be decoded into the expected shape.
    Decode(String),
    /// Rejected before reaching the network.
    Invalid(String),
}

impl ApiError {
    /// True when the backend could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::Unavailable(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unavailable(reason) => write!(f, "Backend unavailable: {}", reason),
            ApiError::Status { code, body } if body.is_empty() => {
                write!(f, "Backend returned HTTP {}", code)
            }
            ApiError::Status { code, body } => {
                write!(f, "Backend returned HTTP {}: {}", code, body)
            }
            ApiError::Domain(msg) => write!(f, "{}", msg),
            ApiError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            ApiError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

/// All backend services built over one configured transport.
#[derive(Clone)]
pub struct Backend {
    pub entities: EntityClient,
    pub rules: RulesClient,
    pub parametricas: ParametricasClient,
}

impl Backend {
    pub fn new(config: &ApiConfig) -> Self {
        let http = HttpClient::new(&config.base_url);
        tracing::debug!("Backend client targeting {}", http.base_url());
        Self {
            entities: EntityClient::new(http.clone()),
            rules: RulesClient::new(http.clone(), config.execute_timeout()),
            parametricas: ParametricasClient::new(http, config.evaluate_timeout()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend unavailable: connection refused");
        assert!(err.is_unavailable());

        let err = ApiError::Status {
            code: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Backend returned HTTP 404");

        let err = ApiError::Domain("UIT not found for year 2019".to_string());
        assert_eq!(err.to_string(), "UIT not found for year 2019");
        assert!(!err.is_unavailable());
    }
}
