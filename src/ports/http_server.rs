use std::net::SocketAddr;

use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, StatusCode, header};
use thiserror::Error;

/// Error type for request handling, converted to a response at the boundary
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    #[error("Internal server error: {0}")]
    InternalError(String),
    #[error("Bad gateway: {0}")]
    BadGateway(String),
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),
}

impl HandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HandlerError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Plain text error response; backend details stay in the logs.
    pub fn into_response(self) -> Response<AxumBody> {
        let status = self.status_code();
        let body = format!(
            "{} {}\n",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        );
        let mut response = Response::new(AxumBody::from(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// HttpServer defines the port (interface) for serving HTTP traffic
pub trait HttpServer: Send + Sync + 'static {
    /// Run the HTTP server
    ///
    /// # Returns
    /// A future that resolves when the server shuts down or encounters an error
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// RequestHandler defines the port for handling a single HTTP request
pub trait RequestHandler: Send + Sync + 'static {
    /// Handle an incoming HTTP request
    ///
    /// # Arguments
    /// * `req` - The HTTP request to handle
    /// * `client_addr` - Peer address when the listener knows it
    ///
    /// # Returns
    /// A future that resolves to an HTTP response or an error
    fn handle_request(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> impl std::future::Future<Output = Result<Response<AxumBody>, HandlerError>> + Send;
}
