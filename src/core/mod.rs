pub mod director;
pub mod ingress;
pub mod manifest;
pub mod resolver;

pub use director::{DirectorError, direct};
pub use ingress::{
    Authority, Backend, IngressError, IngressResult, IngressSpec, IngressSpecBuilder, PathRule,
    Rule,
};
pub use resolver::{RouteMatch, RouteSource, resolve, resolve_route};
