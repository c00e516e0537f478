use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response, StatusCode};
use thiserror::Error;

/// Errors surfaced while forwarding a request to a resolved backend.
///
/// All variants are per-request failures: they are turned into a 5xx response
/// at the request boundary and never stop the server.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ForwardError {
    /// Connection refused, reset, DNS failure or a broken upstream exchange
    #[error("Backend {authority} unavailable: {message}")]
    BackendUnavailable { authority: String, message: String },

    /// No connection or response within the configured bound
    #[error("Backend {authority} did not respond within {timeout:?}")]
    Timeout { authority: String, timeout: Duration },

    /// The outbound request could not be sent as built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ForwardError {
    /// Status code the caller should see for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::BackendUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::InvalidRequest(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Result type alias for forwarding operations
pub type ForwardResult<T> = Result<T, ForwardError>;

/// HttpClient defines the port (interface) for forwarding requests to backends
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an already directed request and return the backend's response
    /// with its body still streaming.
    ///
    /// # Arguments
    /// * `req` - Outbound request whose URI carries the backend authority
    async fn send_request(&self, req: Request<AxumBody>) -> ForwardResult<Response<AxumBody>>;
}
