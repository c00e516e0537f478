use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body as AxumBody,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use hyper::{Request, Response};
use tracing::Instrument;

use crate::{
    core::{IngressSpec, RouteSource, direct, resolve_route},
    metrics::{RequestOutcome, RequestTimer, increment_request_total},
    ports::{
        http_client::{ForwardError, HttpClient},
        http_server::{HandlerError, RequestHandler},
    },
    tracing_setup::create_request_span,
};

/// Fixed body returned when no rule and no default backend match.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Whether the handler can route anything at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// No rules and no default backend; every request gets 404
    Unconfigured,
    /// At least one rule or a default backend is loaded
    Ready,
}

/// Single request entry point for the ingress router.
///
/// Holds the rule set as an immutable `Arc<IngressSpec>` fixed at
/// construction; requests read it concurrently without locking.
pub struct IngressHandler {
    spec: Arc<IngressSpec>,
    http_client: Arc<dyn HttpClient>,
    state: HandlerState,
}

impl IngressHandler {
    pub fn new(spec: Arc<IngressSpec>, http_client: Arc<dyn HttpClient>) -> Self {
        let state = if spec.is_empty() {
            tracing::warn!("Ingress has no rules and no default backend, every request gets 404");
            HandlerState::Unconfigured
        } else {
            tracing::info!(
                ingress = spec.name().unwrap_or("<unnamed>"),
                rules = spec.rules().len(),
                default_backend = ?spec.default_backend().map(|b| b.authority().to_string()),
                "Ingress handler ready"
            );
            HandlerState::Ready
        };

        Self {
            spec,
            http_client,
            state,
        }
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn spec(&self) -> &IngressSpec {
        &self.spec
    }

    /// Route, rewrite and forward one request.
    pub async fn handle(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        let method = req.method().clone();
        let host = request_host(&req).to_string();
        let path = req.uri().path().to_string();

        let span = create_request_span(method.as_str(), &host, &path);
        let mut timer = RequestTimer::new(method.as_str());

        let result = async {
            let Some(route) = resolve_route(&self.spec, &host, &path) else {
                tracing::debug!("No ingress rule matched");
                timer.set_outcome(RequestOutcome::NoMatch);
                return not_found();
            };

            tracing::Span::current().record("route.backend", route.authority.as_str());
            match route.source {
                RouteSource::Rule {
                    rule_index,
                    path_index,
                } => tracing::debug!(rule_index, path_index, "Matched ingress rule"),
                RouteSource::DefaultBackend => tracing::debug!("Using default backend"),
            }

            let mut outbound = match direct(req, &route.authority) {
                Ok(outbound) => outbound,
                Err(e) => return Err(HandlerError::InternalError(e.to_string())),
            };
            if let Some(addr) = client_addr {
                append_forwarded_for(outbound.headers_mut(), addr);
            }

            match self.http_client.send_request(outbound).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    timer.set_outcome(RequestOutcome::BackendError);
                    Err(match &e {
                        ForwardError::Timeout { .. } => HandlerError::GatewayTimeout(e.to_string()),
                        _ => HandlerError::BadGateway(e.to_string()),
                    })
                }
            }
        }
        .instrument(span.clone())
        .await;

        let status = match &result {
            Ok(response) => response.status(),
            Err(e) => e.status_code(),
        };
        span.record("http.status_code", status.as_u16());
        increment_request_total(method.as_str(), status.as_u16(), timer.outcome());

        result
    }
}

impl RequestHandler for IngressHandler {
    fn handle_request(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> impl std::future::Future<Output = Result<Response<AxumBody>, HandlerError>> + Send {
        self.handle(req, client_addr)
    }
}

/// Host as the client sent it: the `Host` header, else the URI authority
/// (HTTP/2). No port stripping or case folding.
fn request_host<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

fn not_found() -> Result<Response<AxumBody>, HandlerError> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-content-type-options", "nosniff")
        .body(AxumBody::from(NOT_FOUND_BODY))
        .map_err(|e| HandlerError::InternalError(e.to_string()))
}

/// Append the client IP to `X-Forwarded-For`, joining any prior values.
fn append_forwarded_for(headers: &mut HeaderMap, client_addr: SocketAddr) {
    let client_ip = client_addr.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client_ip
    } else {
        format!("{}, {client_ip}", prior.join(", "))
    };

    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert("x-forwarded-for", value);
        }
        Err(e) => tracing::warn!("Skipping X-Forwarded-For: {}", e),
    }
}
