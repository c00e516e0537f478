//! Outbound request rewriting.
//!
//! The director turns an inbound request into the request sent upstream. It
//! only touches routing fields: the URI scheme becomes `http` and the URI
//! authority becomes the resolved target. Method, path, query, body and every
//! header (`Host` included) are carried over untouched, with two additions:
//! a request without a `Host` header (HTTP/2 carries it in `:authority`) gets
//! one holding the inbound URI authority, and a request without a
//! `User-Agent` gets an explicitly empty one so no client library default
//! reaches the backend.
use http::{
    HeaderValue, Request, Uri,
    header::{HOST, USER_AGENT},
    uri::{PathAndQuery, Scheme},
};
use thiserror::Error;

use crate::core::ingress::Authority;

/// Error raised when the outbound URI cannot be assembled
#[derive(Error, Debug)]
#[error("Failed to build upstream URI for {authority}: {source}")]
pub struct DirectorError {
    pub authority: String,
    #[source]
    pub source: http::Error,
}

/// Rewrite `req` so that it targets `target` over plain HTTP.
pub fn direct<B>(mut req: Request<B>, target: &Authority) -> Result<Request<B>, DirectorError> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    // Keep the client's host once the URI authority is replaced
    if !req.headers().contains_key(HOST) {
        let inbound_host = req
            .uri()
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok());
        if let Some(host) = inbound_host {
            req.headers_mut().insert(HOST, host);
        }
    }

    *req.uri_mut() = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(target.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|source| DirectorError {
            authority: target.to_string(),
            source,
        })?;

    let headers = req.headers_mut();
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(""));
    }

    Ok(req)
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::core::ingress::Backend;

    fn target() -> Authority {
        Backend::new("backend-a", 8080).unwrap().authority()
    }

    #[test]
    fn test_rewrites_scheme_and_authority_only() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/foo/bar?x=1&y=2")
            .header(HOST, "foo.bar.com")
            .header(USER_AGENT, "curl/8.0")
            .header("x-custom", "kept")
            .body("payload")
            .unwrap();

        let out = direct(req, &target()).unwrap();

        assert_eq!(out.uri().to_string(), "http://backend-a:8080/foo/bar?x=1&y=2");
        assert_eq!(out.method(), Method::POST);
        assert_eq!(out.headers()[HOST], "foo.bar.com");
        assert_eq!(out.headers()[USER_AGENT], "curl/8.0");
        assert_eq!(out.headers()["x-custom"], "kept");
        assert_eq!(*out.body(), "payload");
    }

    #[test]
    fn test_absolute_inbound_uri_is_retargeted() {
        let req = Request::builder()
            .uri("https://foo.bar.com/path")
            .body(())
            .unwrap();
        let out = direct(req, &target()).unwrap();
        assert_eq!(out.uri().scheme(), Some(&Scheme::HTTP));
        assert_eq!(out.uri().to_string(), "http://backend-a:8080/path");
    }

    #[test]
    fn test_uri_authority_becomes_host_header() {
        // HTTP/2 style: host only in the URI authority
        let req = Request::builder()
            .uri("http://foo.bar.com:8443/x?y=1")
            .body(())
            .unwrap();
        let out = direct(req, &target()).unwrap();
        assert_eq!(out.uri().to_string(), "http://backend-a:8080/x?y=1");
        assert_eq!(out.headers()[HOST], "foo.bar.com:8443");
        assert_eq!(out.headers().get_all(HOST).iter().count(), 1);

        // an explicit Host header wins over the URI authority
        let req = Request::builder()
            .uri("http://authority.example/x")
            .header(HOST, "header.example")
            .body(())
            .unwrap();
        let out = direct(req, &target()).unwrap();
        assert_eq!(out.headers()[HOST], "header.example");

        // origin-form without Host stays without Host
        let req = Request::builder().uri("/x").body(()).unwrap();
        let out = direct(req, &target()).unwrap();
        assert!(!out.headers().contains_key(HOST));
    }

    #[test]
    fn test_missing_user_agent_is_set_empty() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let out = direct(req, &target()).unwrap();
        assert_eq!(out.headers()[USER_AGENT], "");
        assert_eq!(out.headers().get_all(USER_AGENT).iter().count(), 1);
    }

    #[test]
    fn test_existing_empty_user_agent_is_untouched() {
        let req = Request::builder()
            .uri("/")
            .header(USER_AGENT, "")
            .body(())
            .unwrap();
        let out = direct(req, &target()).unwrap();
        assert_eq!(out.headers()[USER_AGENT], "");
    }
}
