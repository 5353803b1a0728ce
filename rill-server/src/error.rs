//! Error types for the dashboard endpoint.

use thiserror::Error;

/// Errors raised while serving a dashboard request.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request line, headers, or body were malformed.
    #[error("bad request: {reason}")]
    BadRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The request body was not the JSON the route expects.
    #[error("cannot parse request body: {0}")]
    Json(#[from] serde_json::Error),

    /// A query named a series that is not registered.
    #[error("unknown series: {0}")]
    UnknownSeries(#[from] rill::RillError),

    /// No route matches the method and path.
    #[error("not found: {method} {path}")]
    RouteNotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Reading from or writing to the client socket failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Returns the HTTP status code reported to the client.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest { .. } | Self::Json(_) | Self::UnknownSeries(_) => 400,
            Self::RouteNotFound { .. } => 404,
            Self::Io(_) => 500,
        }
    }

    /// Renders the error as the `{"error": "..."}` body dashboards display.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}

/// Type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;
