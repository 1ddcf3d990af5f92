//! Incremental add: one new descriptor appended to an already persisted
//! Deployment Graph.
//!
//! Unlike the proxy patcher this path is deliberately not idempotent:
//! re-adding a name that already owns entries is a user error and is
//! rejected, never merged.

use super::DeploymentGraph;
use crate::descriptor::ServiceDescriptor;
use crate::error::{ConflictError, Result};
use crate::versions::VersionSet;

/// Appends the entries for one new descriptor to a copy of `existing`.
/// Pure copy-and-append: no prior entry is removed, renamed, or rewritten,
/// so a read-patch-write cycle leaves untouched keys equal by value.
pub fn patch(
    existing: &DeploymentGraph,
    descriptor: &ServiceDescriptor,
    versions: &VersionSet,
) -> Result<DeploymentGraph> {
    let base = descriptor.name.as_str();

    // The base name owns its whole derived suffix space; a collision on
    // any derived instance name means the service is already there.
    let derived = [
        super::service_name(base),
        super::db_name(base),
        super::cache_name(base),
    ];
    if derived.iter().any(|k| existing.services.contains_key(k))
        || existing.services.contains_key(base)
    {
        return Err(ConflictError::ServiceExists(base.to_string()).into());
    }

    let mut graph = existing.clone();
    super::synthesize(&mut graph, descriptor, versions);
    super::ensure_networks(&mut graph);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Database, Protocol};
    use crate::error::ScaffoldError;
    use crate::topology::builder::{build, BuildOptions};

    fn versions() -> VersionSet {
        VersionSet::fallback()
    }

    fn seeded_graph() -> DeploymentGraph {
        let auth =
            ServiceDescriptor::new("auth", Protocol::Rest, Some(Database::Mongo), true, vec![])
                .unwrap();
        build(
            &[auth],
            BuildOptions {
                include_gateway: true,
                include_proxy: false,
            },
            &versions(),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_name_is_a_conflict_and_input_is_unchanged() {
        let existing = seeded_graph();
        let snapshot = existing.clone();

        let duplicate =
            ServiceDescriptor::new("auth", Protocol::Grpc, None, false, vec![]).unwrap();
        let err = patch(&existing, &duplicate, &versions()).unwrap_err();

        assert!(matches!(
            err,
            ScaffoldError::Conflict(ConflictError::ServiceExists(_))
        ));
        assert_eq!(existing, snapshot);
        assert_eq!(existing.services.len(), 4);
    }

    #[test]
    fn new_service_yields_a_superset() {
        let existing = seeded_graph();
        let billing = ServiceDescriptor::new(
            "billing",
            Protocol::Grpc,
            Some(Database::Postgres),
            false,
            vec![],
        )
        .unwrap();

        let patched = patch(&existing, &billing, &versions()).unwrap();

        for (name, spec) in &existing.services {
            assert_eq!(Some(spec), patched.services.get(name), "{name} changed");
        }
        for (name, spec) in &existing.volumes {
            assert_eq!(Some(spec), patched.volumes.get(name));
        }

        let added: Vec<_> = patched
            .services
            .keys()
            .filter(|k| !existing.services.contains_key(*k))
            .cloned()
            .collect();
        let mut added_sorted = added.clone();
        added_sorted.sort();
        assert_eq!(added_sorted, vec!["billing-db", "billing-service"]);
        assert!(patched.volumes.contains_key("billing-db-data"));

        let svc = &patched.services["billing-service"];
        assert_eq!(svc.depends_on, vec!["billing-db"]);
    }

    #[test]
    fn patch_without_database_adds_only_the_service() {
        let existing = seeded_graph();
        let ping = ServiceDescriptor::new("ping", Protocol::Rest, None, false, vec![]).unwrap();

        let patched = patch(&existing, &ping, &versions()).unwrap();

        assert_eq!(patched.services.len(), existing.services.len() + 1);
        assert_eq!(patched.volumes.len(), existing.volumes.len());
        assert!(patched.services["ping-service"].depends_on.is_empty());
    }

    #[test]
    fn patch_into_gateway_only_graph_still_rejects_second_add() {
        // After a gateway-only init the very first add goes through the
        // same conflict check as any later one.
        let existing = build(
            &[],
            BuildOptions {
                include_gateway: true,
                include_proxy: false,
            },
            &versions(),
        )
        .unwrap();

        let auth = ServiceDescriptor::new("auth", Protocol::Rest, None, false, vec![]).unwrap();
        let once = patch(&existing, &auth, &versions()).unwrap();
        let err = patch(&once, &auth, &versions()).unwrap_err();
        assert!(matches!(err, ScaffoldError::Conflict(_)));
    }

    #[test]
    fn networks_are_ensured_on_patch() {
        let existing = DeploymentGraph::new("3.8");
        let auth = ServiceDescriptor::new("auth", Protocol::Rest, None, false, vec![]).unwrap();
        let patched = patch(&existing, &auth, &versions()).unwrap();
        assert_eq!(patched.networks.len(), 2);
        assert!(patched.networks["internal_network"].internal);
    }
}
