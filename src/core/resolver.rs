//! Host/path route resolution.
//!
//! Resolution is a pure function of the rule set and the request host and
//! path. Rules and paths are scanned linearly in declaration order because
//! the order is part of the routing contract:
//!
//! 1. The default backend, if any, seeds the result.
//! 2. The first rule whose host matches (empty host matches anything) is the
//!    only rule consulted. Later rules are never evaluated, even when none of
//!    its paths match.
//! 3. The first path of that rule whose prefix starts the request path wins.
//! 4. Otherwise the seed stands; `None` means "respond 404".
use crate::core::ingress::{Authority, IngressSpec};

/// Which part of the rule set produced a resolved authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Matched `rules[rule_index].paths[path_index]`
    Rule {
        rule_index: usize,
        path_index: usize,
    },
    /// Fell back to the default backend
    DefaultBackend,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub authority: Authority,
    pub source: RouteSource,
}

/// Resolve the upstream authority for a request.
pub fn resolve(spec: &IngressSpec, host: &str, path: &str) -> Option<Authority> {
    resolve_route(spec, host, path).map(|route| route.authority)
}

/// Like [`resolve`] but also reports which rule or fallback matched.
pub fn resolve_route(spec: &IngressSpec, host: &str, path: &str) -> Option<RouteMatch> {
    let fallback = spec.default_backend().map(|backend| RouteMatch {
        authority: backend.authority(),
        source: RouteSource::DefaultBackend,
    });

    let Some((rule_index, rule)) = spec
        .rules()
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches_host(host))
    else {
        return fallback;
    };

    rule.paths()
        .iter()
        .position(|path_rule| path_rule.matches(path))
        .map(|path_index| RouteMatch {
            authority: rule.paths()[path_index].backend().authority(),
            source: RouteSource::Rule {
                rule_index,
                path_index,
            },
        })
        .or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingress::{Backend, Rule};

    fn backend(name: &str, port: u16) -> Backend {
        Backend::new(name, port).unwrap()
    }

    fn path_based() -> IngressSpec {
        IngressSpec::builder()
            .rule(
                Rule::new("foo.bar.com")
                    .path("/foo", backend("backend-a", 8080))
                    .path("/bar", backend("backend-b", 8081)),
            )
            .build()
    }

    fn authority(spec: &IngressSpec, host: &str, path: &str) -> Option<String> {
        resolve(spec, host, path).map(|a| a.to_string())
    }

    #[test]
    fn test_path_based_routing() {
        let spec = path_based();
        assert_eq!(
            authority(&spec, "foo.bar.com", "/foo").as_deref(),
            Some("backend-a:8080")
        );
        assert_eq!(
            authority(&spec, "foo.bar.com", "/bar/baz").as_deref(),
            Some("backend-b:8081")
        );
        assert_eq!(authority(&spec, "foo.bar.com", "/other"), None);
        assert_eq!(authority(&spec, "other.com", "/foo"), None);
    }

    #[test]
    fn test_first_path_in_rule_wins() {
        let spec = IngressSpec::builder()
            .rule(
                Rule::new("foo.bar.com")
                    .path("/", backend("root", 1))
                    .path("/api", backend("api", 2)),
            )
            .build();
        assert_eq!(
            resolve_route(&spec, "foo.bar.com", "/api/users"),
            Some(RouteMatch {
                authority: backend("root", 1).authority(),
                source: RouteSource::Rule {
                    rule_index: 0,
                    path_index: 0
                },
            })
        );
    }

    #[test]
    fn test_host_based_routing() {
        let spec = IngressSpec::builder()
            .rule(Rule::new("foo.bar.com").path("", backend("one", 80)))
            .rule(Rule::new("bar.foo.com").path("", backend("two", 80)))
            .build();
        assert_eq!(authority(&spec, "foo.bar.com", "/").as_deref(), Some("one:80"));
        assert_eq!(authority(&spec, "bar.foo.com", "/").as_deref(), Some("two:80"));
        assert_eq!(authority(&spec, "example.org", "/"), None);
    }

    #[test]
    fn test_unrelated_rules_do_not_affect_match() {
        let spec = IngressSpec::builder()
            .rule(Rule::new("a.com").path("/", backend("a", 80)))
            .rule(Rule::new("b.com").path("/", backend("b", 80)))
            .rule(Rule::new("target.com").path("/x", backend("target", 80)))
            .build();
        assert_eq!(
            resolve_route(&spec, "target.com", "/x/y").map(|r| r.source),
            Some(RouteSource::Rule {
                rule_index: 2,
                path_index: 0
            })
        );
    }

    #[test]
    fn test_first_host_match_is_only_rule_consulted() {
        let spec = IngressSpec::builder()
            .rule(Rule::new("foo.bar.com").path("/foo", backend("first", 80)))
            .rule(Rule::new("foo.bar.com").path("/bar", backend("second", 80)))
            .build();
        assert_eq!(authority(&spec, "foo.bar.com", "/foo").as_deref(), Some("first:80"));
        assert_eq!(authority(&spec, "foo.bar.com", "/bar"), None);
    }

    #[test]
    fn test_first_host_match_falls_back_to_default() {
        let spec = IngressSpec::builder()
            .default_backend(backend("default", 80))
            .rule(Rule::new("foo.bar.com").path("/foo", backend("first", 80)))
            .rule(Rule::new("foo.bar.com").path("/bar", backend("second", 80)))
            .build();
        assert_eq!(
            resolve_route(&spec, "foo.bar.com", "/bar"),
            Some(RouteMatch {
                authority: backend("default", 80).authority(),
                source: RouteSource::DefaultBackend,
            })
        );
    }

    #[test]
    fn test_empty_host_rule_matches_any_host() {
        let spec = IngressSpec::builder()
            .rule(Rule::new("").path("/", backend("any", 80)))
            .rule(Rule::new("foo.bar.com").path("/", backend("shadowed", 80)))
            .build();
        assert_eq!(authority(&spec, "foo.bar.com", "/").as_deref(), Some("any:80"));
        assert_eq!(authority(&spec, "whatever", "/x").as_deref(), Some("any:80"));
    }

    #[test]
    fn test_host_is_compared_verbatim() {
        let spec = path_based();
        assert_eq!(authority(&spec, "foo.bar.com:80", "/foo"), None);
        assert_eq!(authority(&spec, "Foo.Bar.Com", "/foo"), None);
    }

    #[test]
    fn test_default_backend_only() {
        let spec = IngressSpec::builder()
            .default_backend(backend("default", 8080))
            .build();
        for (host, path) in [("a.com", "/"), ("", ""), ("foo.bar.com", "/deep/path?q=1")] {
            assert_eq!(authority(&spec, host, path).as_deref(), Some("default:8080"));
        }
    }

    #[test]
    fn test_default_backend_with_rules() {
        let spec = IngressSpec::builder()
            .default_backend(backend("default", 80))
            .rule(Rule::new("foo.bar.com").path("", backend("rule", 80)))
            .build();
        assert_eq!(authority(&spec, "anything.com", "/whatever").as_deref(), Some("default:80"));
        assert_eq!(authority(&spec, "foo.bar.com", "/whatever").as_deref(), Some("rule:80"));
    }

    #[test]
    fn test_empty_spec_never_matches() {
        let spec = IngressSpec::default();
        assert_eq!(resolve(&spec, "foo.bar.com", "/"), None);
        assert_eq!(resolve(&spec, "", ""), None);
    }

    #[test]
    fn test_zero_path_rule_is_inert() {
        let spec = IngressSpec::builder()
            .rule(Rule::new("foo.bar.com"))
            .build();
        assert_eq!(resolve(&spec, "foo.bar.com", "/"), None);
        assert_eq!(resolve(&spec, "foo.bar.com", ""), None);

        let with_default = IngressSpec::builder()
            .default_backend(backend("default", 80))
            .rule(Rule::new("foo.bar.com"))
            .build();
        assert_eq!(
            resolve_route(&with_default, "foo.bar.com", "/").map(|r| r.source),
            Some(RouteSource::DefaultBackend)
        );
    }
}
