//! Lightweight metrics helpers for the ingress router.
//!
//! Thin wrappers around the `metrics` crate macros. No exporter is bundled;
//! the embedding application installs whichever recorder it wants and these
//! calls become no-ops otherwise.
//!
//! Provided metrics:
//! * `ingress_requests_total` (counter; method, status, outcome)
//! * `ingress_request_duration_seconds` (histogram; method, outcome)
//! * `ingress_backend_requests_total` (counter; backend, status)
//! * `ingress_backend_request_duration_seconds` (histogram; backend)
//!
//! The `*Timer` structs record on `Drop` so early returns are still measured.
use std::time::Instant;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const INGRESS_REQUESTS_TOTAL: &str = "ingress_requests_total";
pub const INGRESS_REQUEST_DURATION_SECONDS: &str = "ingress_request_duration_seconds";
pub const INGRESS_BACKEND_REQUESTS_TOTAL: &str = "ingress_backend_requests_total";
pub const INGRESS_BACKEND_REQUEST_DURATION_SECONDS: &str =
    "ingress_backend_request_duration_seconds";

/// How a request left the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Forwarded and the backend answered
    Proxied,
    /// No rule and no default backend
    NoMatch,
    /// Backend refused, timed out or broke the exchange
    BackendError,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Proxied => "proxied",
            RequestOutcome::NoMatch => "no_match",
            RequestOutcome::BackendError => "backend_error",
        }
    }
}

static DESCRIPTIONS: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        INGRESS_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests handled by the ingress router."
    );
    describe_histogram!(
        INGRESS_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Time until the response head was produced for inbound requests."
    );
    describe_counter!(
        INGRESS_BACKEND_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of requests forwarded to backends."
    );
    describe_histogram!(
        INGRESS_BACKEND_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Time until the backend returned a response head."
    );
});

/// Register metric descriptions with the installed recorder (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    Lazy::force(&DESCRIPTIONS);
    tracing::debug!("Ingress metric descriptions registered");
    Ok(())
}

/// Count a handled inbound request.
pub fn increment_request_total(method: &str, status: u16, outcome: RequestOutcome) {
    counter!(
        INGRESS_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Count a request forwarded to `backend`; status 0 means no response.
pub fn increment_backend_request_total(backend: &str, status: u16) {
    counter!(
        INGRESS_BACKEND_REQUESTS_TOTAL,
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// RAII helper measuring inbound request duration.
pub struct RequestTimer {
    start: Instant,
    method: String,
    outcome: RequestOutcome,
}

impl RequestTimer {
    pub fn new(method: &str) -> Self {
        Self {
            start: Instant::now(),
            method: method.to_string(),
            outcome: RequestOutcome::Proxied,
        }
    }

    pub fn set_outcome(&mut self, outcome: RequestOutcome) {
        self.outcome = outcome;
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.outcome
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        histogram!(
            INGRESS_REQUEST_DURATION_SECONDS,
            "method" => self.method.clone(),
            "outcome" => self.outcome.as_str()
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}

/// RAII helper measuring backend request duration.
pub struct BackendRequestTimer {
    start: Instant,
    backend: String,
}

impl BackendRequestTimer {
    pub fn new(backend: &str) -> Self {
        Self {
            start: Instant::now(),
            backend: backend.to_string(),
        }
    }
}

impl Drop for BackendRequestTimer {
    fn drop(&mut self) {
        histogram!(
            INGRESS_BACKEND_REQUEST_DURATION_SECONDS,
            "backend" => self.backend.clone()
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
