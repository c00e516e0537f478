pub mod http_client;
pub mod http_handler;
pub mod http_server;

/// Re-export commonly used types from adapters
pub use http_client::{HttpClientAdapter, strip_hop_by_hop};
pub use http_handler::{HandlerState, IngressHandler, NOT_FOUND_BODY};
pub use http_server::{IngressServer, router};
