use std::{future::IntoFuture, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{ConnectInfo, Request},
    routing::any,
};
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    ports::http_server::{HttpServer, RequestHandler},
    utils::GracefulShutdown,
};

/// Build the axum router sending every method and path to `handler`.
///
/// Handler errors become plain-text 5xx responses here. The peer address is
/// read from `ConnectInfo` when the router is served with it.
pub fn router<H: RequestHandler>(handler: Arc<H>) -> Router {
    let make_request_route = |handler: Arc<H>| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move {
                let client_addr = req
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| *addr);

                match handler.handle_request(req, client_addr).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!("Request failed: {}", e);
                        e.into_response()
                    }
                }
            }
        })
    };

    Router::new()
        .route("/", make_request_route(handler.clone()))
        .route("/{*path}", make_request_route(handler))
        .layer(TraceLayer::new_for_http())
}

/// Plain HTTP listener for the ingress router.
pub struct IngressServer<H> {
    listen_addr: SocketAddr,
    handler: Arc<H>,
    shutdown: Arc<GracefulShutdown>,
}

impl<H: RequestHandler> IngressServer<H> {
    pub fn new(listen_addr: SocketAddr, handler: Arc<H>, shutdown: Arc<GracefulShutdown>) -> Self {
        Self {
            listen_addr,
            handler,
            shutdown,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to {}", self.listen_addr))?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// After shutdown is triggered no new connections are accepted and
    /// in-flight requests get the drain timeout to finish.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .wrap_err("Failed to read listener address")?;
        tracing::info!("Ingress router listening on {}", local_addr);

        let app = router(self.handler.clone());
        let stop_accepting = {
            let shutdown = self.shutdown.clone();
            async move {
                let reason = shutdown.wait_for_shutdown_signal().await;
                tracing::info!("Stopping listener ({:?}), draining in-flight requests", reason);
            }
        };
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(stop_accepting)
        .into_future();

        let drain_deadline = async {
            self.shutdown.wait_for_shutdown_signal().await;
            tokio::time::sleep(self.shutdown.drain_timeout()).await;
        };

        tokio::select! {
            result = server => {
                result.wrap_err("Ingress server error")?;
                tracing::info!("Graceful shutdown completed");
            }
            _ = drain_deadline => {
                tracing::warn!(
                    "Drain timeout of {:?} exceeded, closing remaining connections",
                    self.shutdown.drain_timeout()
                );
            }
        }
        Ok(())
    }
}

impl<H: RequestHandler> HttpServer for IngressServer<H> {
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send {
        self.serve()
    }
}
