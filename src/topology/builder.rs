//! First-time generation: descriptor set + global options to a complete
//! Deployment Graph.

use super::{DeploymentGraph, GATEWAY_SERVICE, PROXY_SERVICE};
use crate::descriptor::ServiceDescriptor;
use crate::error::{Result, ValidationError};
use crate::versions::VersionSet;
use std::collections::HashSet;

/// Global choices made once, at project initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub include_gateway: bool,
    pub include_proxy: bool,
}

/// Builds a complete graph from scratch. Pure: the caller persists the
/// result. Which entries exist depends only on the descriptor set, not its
/// order; order only decides where entries land in the mappings.
pub fn build(
    descriptors: &[ServiceDescriptor],
    options: BuildOptions,
    versions: &VersionSet,
) -> Result<DeploymentGraph> {
    let mut seen = HashSet::new();
    for d in descriptors {
        if !seen.insert(d.name.as_str()) {
            return Err(ValidationError::DuplicateName(d.name.clone()).into());
        }
        if d.name == GATEWAY_SERVICE || d.name == PROXY_SERVICE {
            return Err(ValidationError::ReservedName(d.name.clone()).into());
        }
    }

    let mut graph = DeploymentGraph::new("3.8");
    for d in descriptors {
        super::synthesize(&mut graph, d, versions);
    }
    if options.include_gateway {
        super::add_gateway(&mut graph);
    }
    if options.include_proxy {
        super::add_proxy(&mut graph, versions);
    }
    if !graph.services.is_empty() {
        super::ensure_networks(&mut graph);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Database, Protocol};
    use crate::error::ScaffoldError;
    use crate::topology::{GATEWAY_NETWORK, INTERNAL_NETWORK};

    fn auth_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::new("auth", Protocol::Rest, Some(Database::Mongo), true, vec![]).unwrap()
    }

    fn versions() -> VersionSet {
        VersionSet::fallback()
    }

    #[test]
    fn auth_with_gateway_scenario() {
        let graph = build(
            &[auth_descriptor()],
            BuildOptions {
                include_gateway: true,
                include_proxy: false,
            },
            &versions(),
        )
        .unwrap();

        let keys: Vec<_> = graph.services.keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        for key in ["auth-service", "auth-db", "auth-redis", "api-gateway"] {
            assert!(graph.services.contains_key(key), "missing {key}");
        }

        assert_eq!(graph.networks.len(), 2);
        assert!(!graph.networks[GATEWAY_NETWORK].internal);
        assert!(graph.networks[INTERNAL_NETWORK].internal);

        assert_eq!(graph.volumes.len(), 1);
        assert!(graph.volumes.contains_key("auth-db-data"));

        let auth = &graph.services["auth-service"];
        assert_eq!(auth.depends_on, vec!["auth-db", "auth-redis"]);
        assert_eq!(auth.networks, vec![INTERNAL_NETWORK]);
        assert!(auth
            .environment
            .iter()
            .any(|e| e == "REDIS_HOST=auth-redis"));
        assert!(auth.environment.iter().any(|e| e == "REDIS_PORT=6379"));

        let gateway = &graph.services["api-gateway"];
        assert!(gateway.depends_on.is_empty());
        assert_eq!(gateway.networks, vec![GATEWAY_NETWORK, INTERNAL_NETWORK]);
    }

    #[test]
    fn proxy_depends_on_gateway_and_stays_external() {
        let graph = build(
            &[],
            BuildOptions {
                include_gateway: true,
                include_proxy: true,
            },
            &versions(),
        )
        .unwrap();

        let proxy = &graph.services["nginx-proxy"];
        assert_eq!(proxy.depends_on, vec!["api-gateway"]);
        assert_eq!(proxy.networks, vec![GATEWAY_NETWORK]);
        assert!(proxy
            .volumes
            .iter()
            .any(|v| v.ends_with("/etc/nginx/nginx.conf:ro")));
    }

    #[test]
    fn entry_set_is_order_independent() {
        let a = auth_descriptor();
        let b =
            ServiceDescriptor::new("billing", Protocol::Grpc, Some(Database::Postgres), false, vec![])
                .unwrap();
        let opts = BuildOptions::default();

        let forward = build(&[a.clone(), b.clone()], opts, &versions()).unwrap();
        let reverse = build(&[b, a], opts, &versions()).unwrap();

        let mut fwd: Vec<_> = forward.services.keys().collect();
        let mut rev: Vec<_> = reverse.services.keys().collect();
        fwd.sort();
        rev.sort();
        assert_eq!(fwd, rev);
        for (name, spec) in &forward.services {
            assert_eq!(spec, &reverse.services[name]);
        }
    }

    #[test]
    fn duplicate_descriptor_names_are_rejected() {
        let err = build(
            &[auth_descriptor(), auth_descriptor()],
            BuildOptions::default(),
            &versions(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::Validation(ValidationError::DuplicateName(_))
        ));
    }

    #[test]
    fn empty_build_has_no_networks() {
        let graph = build(&[], BuildOptions::default(), &versions()).unwrap();
        assert!(graph.services.is_empty());
        assert!(graph.networks.is_empty());
        assert!(graph.volumes.is_empty());
    }

    #[test]
    fn database_entry_gets_image_volume_and_internal_network() {
        let d = ServiceDescriptor::new(
            "orders",
            Protocol::Grpc,
            Some(Database::Postgres),
            false,
            vec!["8081:50051".to_string()],
        )
        .unwrap();
        let graph = build(&[d], BuildOptions::default(), &versions()).unwrap();

        let db = &graph.services["orders-db"];
        assert!(db.image.as_deref().unwrap().starts_with("postgres:"));
        assert_eq!(
            db.volumes,
            vec!["orders-db-data:/var/lib/postgresql/data"]
        );
        assert_eq!(db.networks, vec![INTERNAL_NETWORK]);

        let svc = &graph.services["orders-service"];
        assert_eq!(svc.ports, vec!["8081:50051"]);
        assert!(svc.environment.iter().any(|e| e == "PORT=50051"));
        assert!(svc
            .environment
            .iter()
            .any(|e| e.starts_with("DATABASE_URL=postgres://")));
    }
}
