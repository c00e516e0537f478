use std::{error::Error as StdError, time::Duration};

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{HeaderMap, Request, Response, Version, header};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    config::UpstreamConfig,
    metrics::{BackendRequestTimer, increment_backend_request_total},
    ports::http_client::{ForwardError, ForwardResult, HttpClient},
    tracing_setup::create_backend_span,
};

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP_HEADERS: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any extra ones named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<header::HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| header::HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}

/// Plain HTTP forwarding client built on the hyper-util pooled client.
///
/// Responsibilities:
/// * Bounds connection setup (connector timeout) and response head arrival
/// * Sends HTTP/1.1 upstream, dropping hop-by-hop headers both ways
/// * Streams response bodies back without buffering
///
/// Request bodies and headers are otherwise passed through as-is; no default
/// headers are injected. Dropping the returned response body (e.g. because
/// the client went away) drops the upstream connection with it.
pub struct HttpClientAdapter {
    client: Client<HttpConnector, AxumBody>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut http_connector = HttpConnector::new();
        http_connector.set_connect_timeout(Some(config.connect_timeout()));
        http_connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout())
            .build::<_, AxumBody>(http_connector);

        tracing::info!(
            connect_timeout = ?config.connect_timeout(),
            response_timeout = ?config.response_timeout(),
            "Created upstream HTTP client"
        );
        Ok(Self {
            client,
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
        })
    }

    /// Map a hyper client error to the forwarding taxonomy.
    fn classify_error(&self, authority: &str, err: hyper_util::client::legacy::Error) -> ForwardError {
        if err.is_connect() && Self::is_timeout(&err) {
            return ForwardError::Timeout {
                authority: authority.to_string(),
                timeout: self.connect_timeout,
            };
        }

        let mut message = err.to_string();
        if let Some(source) = err.source() {
            message = format!("{message}: {source}");
        }
        ForwardError::BackendUnavailable {
            authority: authority.to_string(),
            message,
        }
    }

    fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
        let mut current = Some(err);
        while let Some(e) = current {
            if e
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
            {
                return true;
            }
            current = e.source();
        }
        false
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(&self, req: Request<AxumBody>) -> ForwardResult<Response<AxumBody>> {
        let authority = req
            .uri()
            .authority()
            .map(|a| a.to_string())
            .ok_or_else(|| ForwardError::InvalidRequest("Outgoing URI has no authority".to_string()))?;

        let span = create_backend_span(&authority, req.method().as_str(), req.uri().path());

        let (mut parts, body) = req.into_parts();
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        let outgoing_request = Request::from_parts(parts, body);

        async move {
            tracing::debug!(
                "Forwarding {} {}",
                outgoing_request.method(),
                outgoing_request.uri()
            );

            let _timer = BackendRequestTimer::new(&authority);
            let result = timeout(self.response_timeout, self.client.request(outgoing_request)).await;

            let response = match result {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    let err = self.classify_error(&authority, e);
                    tracing::error!("Backend request failed: {}", err);
                    increment_backend_request_total(&authority, 0);
                    return Err(err);
                }
                Err(_) => {
                    tracing::warn!(
                        "Backend {} sent no response within {:?}",
                        authority,
                        self.response_timeout
                    );
                    increment_backend_request_total(&authority, 0);
                    return Err(ForwardError::Timeout {
                        authority: authority.clone(),
                        timeout: self.response_timeout,
                    });
                }
            };

            let status_code = response.status().as_u16();
            tracing::Span::current().record("http.status_code", status_code);
            increment_backend_request_total(&authority, status_code);

            let (mut parts, hyper_body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);

            Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
        }
        .instrument(span)
        .await
    }
}
