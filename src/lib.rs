//! Ingress router - a declarative host/path router and streaming HTTP reverse proxy.
//!
//! Routing is driven by a Kubernetes-style Ingress object: an ordered list of
//! host rules, each holding ordered path-prefix rules, plus an optional
//! default backend. Every inbound request is resolved against that rule set
//! and either forwarded to `http://<service>:<port>` with its method, path,
//! query, headers and body intact, or answered with a fixed 404.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use ingress_router::{
//!     HttpClientAdapter, IngressHandler, IngressServer,
//!     config::UpstreamConfig,
//!     core::IngressSpec,
//!     utils::GracefulShutdown,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let spec = IngressSpec::from_yaml_str(&std::fs::read_to_string("ingress.yaml")?)?;
//! let client = Arc::new(HttpClientAdapter::new(&UpstreamConfig::default())?);
//! let handler = Arc::new(IngressHandler::new(Arc::new(spec), client));
//! let server = IngressServer::new(
//!     "127.0.0.1:8080".parse()?,
//!     handler,
//!     Arc::new(GracefulShutdown::new()),
//! );
//! server.serve().await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! Routing decisions and request rewriting live in `core` and are pure.
//! `ports` holds the traits for the forwarding client and the request
//! handler, and `adapters` implements them on hyper-util and axum.
//!
//! # Error Handling
//! Rule loading fails with [`core::IngressError`]; forwarding failures are
//! [`ports::http_client::ForwardError`] and surface to clients as 502 or 504.
//! Startup paths return `eyre::Result<T>` with context attached via `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpClientAdapter, IngressHandler, IngressServer},
    core::{IngressSpec, resolve},
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
