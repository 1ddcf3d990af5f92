//! Reverse-proxy descriptor (nginx.conf) builder and patcher.
//!
//! The file keeps a fixed skeleton: one `http { }` block holding the
//! `upstream` blocks and one `server { }` block holding the `location`
//! blocks. Insertion points are found by walking the brace structure, not
//! by raw substring offsets, and patching is idempotent: asking for a
//! service that already has its blocks is a no-op.

use crate::error::{PersistenceError, Result};
use crate::topology::service_name;
use std::collections::HashSet;

/// One routed service: the URL prefix `/<name>/` maps to
/// `<name>-service:<port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub name: String,
    pub port: u16,
}

impl ProxyRoute {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

/// The fixed skeleton written at project initialization. Everything the
/// patcher ever does is add blocks inside it.
pub fn skeleton() -> String {
    "\
worker_processes auto;

events {
    worker_connections 1024;
}

http {
    server {
        listen 80;

        location / {
            return 404;
        }
    }
}
"
    .to_string()
}

/// Builds a fresh proxy descriptor routing the given services, in order.
/// Goes through [`patch`] so first-time generation and incremental updates
/// cannot drift apart.
pub fn build(routes: &[ProxyRoute]) -> Result<String> {
    patch(&skeleton(), routes)
}

/// Ensures one upstream and one location block per route. Routes whose
/// blocks are already present are skipped; new upstream blocks go right
/// after the `http` opening brace, new location blocks right after the
/// first `server` opening brace inside it.
pub fn patch(existing: &str, routes: &[ProxyRoute]) -> Result<String> {
    let doc = parse(existing)?;

    let missing_upstreams: Vec<&ProxyRoute> = routes
        .iter()
        .filter(|r| !doc.upstreams.contains(&r.name))
        .collect();
    let missing_locations: Vec<&ProxyRoute> = routes
        .iter()
        .filter(|r| !doc.locations.contains(&r.name))
        .collect();

    let lines: Vec<&str> = existing.lines().collect();
    let mut out = String::with_capacity(existing.len() + routes.len() * 128);
    for (idx, line) in lines.iter().enumerate() {
        out.push_str(line);
        out.push('\n');
        if idx == doc.http_open {
            for route in &missing_upstreams {
                out.push_str(&upstream_block(route));
            }
        }
        if idx == doc.server_open {
            for route in &missing_locations {
                out.push_str(&location_block(route));
            }
        }
    }
    Ok(out)
}

fn upstream_block(route: &ProxyRoute) -> String {
    format!(
        "    upstream {name} {{\n        server {instance}:{port};\n    }}\n",
        name = route.name,
        instance = service_name(&route.name),
        port = route.port,
    )
}

fn location_block(route: &ProxyRoute) -> String {
    format!(
        "        location /{name}/ {{\n            proxy_pass http://{name}/;\n        }}\n",
        name = route.name,
    )
}

struct ProxyDoc {
    /// Line index of the `http` block's opening brace.
    http_open: usize,
    /// Line index of the first `server` block's opening brace inside `http`.
    server_open: usize,
    upstreams: HashSet<String>,
    locations: HashSet<String>,
}

/// Walks the brace structure once, recording the two insertion points and
/// which services already have blocks.
fn parse(text: &str) -> std::result::Result<ProxyDoc, PersistenceError> {
    let mut depth = 0usize;
    let mut http_open = None;
    let mut http_depth = 0usize;
    let mut server_open = None;
    let mut upstreams = HashSet::new();
    let mut locations = HashSet::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.ends_with('{') {
            let keyword = trimmed.trim_end_matches('{').trim();
            match keyword.split_whitespace().collect::<Vec<_>>().as_slice() {
                ["http"] if depth == 0 && http_open.is_none() => {
                    http_open = Some(idx);
                    http_depth = depth;
                }
                ["server"]
                    if server_open.is_none()
                        && http_open.is_some()
                        && depth == http_depth + 1 =>
                {
                    server_open = Some(idx);
                }
                ["upstream", name] => {
                    upstreams.insert((*name).to_string());
                }
                ["location", path] => {
                    if let Some(name) = path
                        .strip_prefix('/')
                        .map(|p| p.trim_end_matches('/'))
                        .filter(|p| !p.is_empty())
                    {
                        locations.insert(name.to_string());
                    }
                }
                _ => {}
            }
        }

        depth += line.matches('{').count();
        depth = depth.saturating_sub(line.matches('}').count());
    }

    let http_open = http_open.ok_or_else(|| PersistenceError::MalformedProxy {
        reason: "no http block".to_string(),
    })?;
    let server_open = server_open.ok_or_else(|| PersistenceError::MalformedProxy {
        reason: "no server block inside http".to_string(),
    })?;

    Ok(ProxyDoc {
        http_open,
        server_open,
        upstreams,
        locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> ProxyRoute {
        ProxyRoute::new("auth", 3000)
    }

    #[test]
    fn build_emits_one_upstream_and_one_location_per_route() {
        let text = build(&[auth(), ProxyRoute::new("billing", 50051)]).unwrap();

        assert_eq!(text.matches("upstream auth {").count(), 1);
        assert_eq!(text.matches("location /auth/ {").count(), 1);
        assert!(text.contains("server auth-service:3000;"));
        assert!(text.contains("server billing-service:50051;"));
        assert!(text.contains("proxy_pass http://billing/;"));
    }

    #[test]
    fn upstreams_sit_in_http_and_locations_in_server() {
        let text = build(&[auth()]).unwrap();
        let http_at = text.find("http {").unwrap();
        let upstream_at = text.find("upstream auth {").unwrap();
        let server_at = text.find("server {").unwrap();
        let location_at = text.find("location /auth/ {").unwrap();
        assert!(http_at < upstream_at && upstream_at < server_at);
        assert!(server_at < location_at);
    }

    #[test]
    fn patch_is_idempotent() {
        let once = patch(&skeleton(), &[auth()]).unwrap();
        let twice = patch(&once, &[auth()]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn patch_adds_only_missing_blocks() {
        let with_auth = patch(&skeleton(), &[auth()]).unwrap();
        let both = patch(&with_auth, &[auth(), ProxyRoute::new("orders", 3000)]).unwrap();

        assert_eq!(both.matches("upstream auth {").count(), 1);
        assert_eq!(both.matches("upstream orders {").count(), 1);
        assert_eq!(both.matches("location /orders/ {").count(), 1);
    }

    #[test]
    fn patch_preserves_unrelated_text() {
        let seeded = skeleton().replace("worker_connections 1024", "worker_connections 4096");
        let patched = patch(&seeded, &[auth()]).unwrap();
        assert!(patched.contains("worker_connections 4096"));
        assert!(patched.contains("location / {"));
    }

    #[test]
    fn text_without_http_block_is_rejected() {
        let err = patch("events {\n}\n", &[auth()]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ScaffoldError::Persistence(PersistenceError::MalformedProxy { .. })
        ));
    }

    #[test]
    fn text_without_server_block_is_rejected() {
        let err = patch("http {\n}\n", &[auth()]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ScaffoldError::Persistence(PersistenceError::MalformedProxy { .. })
        ));
    }
}
