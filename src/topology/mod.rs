//! # Topology Module
//!
//! The Deployment Graph model and its two mutation paths:
//! - [`builder`] synthesizes a complete graph from a descriptor set
//!   (first-time generation),
//! - [`patcher`] appends one service's entries to an existing graph
//!   (incremental `add`).
//!
//! Both go through the same per-descriptor synthesis so REST and gRPC
//! services, and the build/patch paths, cannot drift apart.

use crate::descriptor::{Database, ServiceDescriptor};
use crate::versions::VersionSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod patcher;

pub use builder::{build, BuildOptions};
pub use patcher::patch;

/// Externally reachable network the gateway and proxy sit on.
pub const GATEWAY_NETWORK: &str = "gateway_network";
/// Isolated network carrying service-to-datastore traffic.
pub const INTERNAL_NETWORK: &str = "internal_network";
/// Instance name of the API gateway entry.
pub const GATEWAY_SERVICE: &str = "api-gateway";
/// Instance name of the reverse proxy entry.
pub const PROXY_SERVICE: &str = "nginx-proxy";

/// Suffixes minting the per-descriptor instance names. This suffix space
/// belongs to the synthesizer alone.
pub const SERVICE_SUFFIX: &str = "-service";
pub const DB_SUFFIX: &str = "-db";
pub const CACHE_SUFFIX: &str = "-redis";
pub const VOLUME_SUFFIX: &str = "-db-data";

const RESTART_POLICY: &str = "unless-stopped";

/// The persisted services/networks/volumes document driving container
/// orchestration (docker-compose.yml). Mappings are insertion-ordered so a
/// read-patch-write cycle leaves untouched entries where they were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGraph {
    pub version: String,
    pub services: IndexMap<String, ServiceSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub networks: IndexMap<String, NetworkSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, serde_yaml::Value>,
}

impl DeploymentGraph {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            services: IndexMap::new(),
            networks: IndexMap::new(),
            volumes: IndexMap::new(),
        }
    }
}

/// One compose service entry. Every field the synthesizer does not set is
/// skipped on write so foreign entries round-trip by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,
}

/// Instance name of the service entry derived from a descriptor name.
pub fn service_name(base: &str) -> String {
    format!("{base}{SERVICE_SUFFIX}")
}

/// Instance name of the datastore entry derived from a descriptor name.
pub fn db_name(base: &str) -> String {
    format!("{base}{DB_SUFFIX}")
}

/// Instance name of the cache entry derived from a descriptor name.
pub fn cache_name(base: &str) -> String {
    format!("{base}{CACHE_SUFFIX}")
}

/// Name of the datastore volume derived from a descriptor name.
pub fn volume_name(base: &str) -> String {
    format!("{base}{VOLUME_SUFFIX}")
}

/// Appends the entries one descriptor expands to: the service itself, its
/// datastore (if any), its cache (if requested), the datastore volume, and
/// the dependency edges between them. Shared by the builder and the
/// patcher; callers have already checked for name conflicts.
pub(crate) fn synthesize(graph: &mut DeploymentGraph, d: &ServiceDescriptor, versions: &VersionSet) {
    let base = d.name.as_str();
    let mut depends_on = Vec::new();
    let mut environment = vec![format!("SERVICE_NAME={base}"), format!("PORT={}", d.container_port())];

    if let Some(db) = d.database {
        let db_instance = db_name(base);
        environment.push(database_url(base, &db_instance, db));
        depends_on.push(db_instance.clone());

        graph.services.insert(
            db_instance,
            ServiceSpec {
                image: Some(format!("{}:{}", db.repository(), versions.database_tag(db))),
                environment: database_environment(base, db),
                volumes: vec![format!("{}:{}", volume_name(base), db.data_path())],
                networks: vec![INTERNAL_NETWORK.to_string()],
                restart: Some(RESTART_POLICY.to_string()),
                ..Default::default()
            },
        );
        graph
            .volumes
            .insert(volume_name(base), serde_yaml::Value::Null);
    }

    if d.include_redis {
        let cache_instance = cache_name(base);
        environment.push(format!("REDIS_HOST={cache_instance}"));
        environment.push("REDIS_PORT=6379".to_string());
        depends_on.push(cache_instance.clone());

        graph.services.insert(
            cache_instance,
            ServiceSpec {
                image: Some(format!("redis:{}", versions.redis)),
                networks: vec![INTERNAL_NETWORK.to_string()],
                restart: Some(RESTART_POLICY.to_string()),
                ..Default::default()
            },
        );
    }

    // The service itself goes in after its dependencies so the file reads
    // bottom-up per descriptor, matching first-time generation order.
    graph.services.insert(
        service_name(base),
        ServiceSpec {
            build: Some(format!("./services/{base}")),
            environment,
            ports: d.ports.clone(),
            networks: vec![INTERNAL_NETWORK.to_string()],
            depends_on,
            restart: Some(RESTART_POLICY.to_string()),
            ..Default::default()
        },
    );
}

/// Makes sure the two fixed networks exist. Called whenever any entry is
/// added; idempotent.
pub(crate) fn ensure_networks(graph: &mut DeploymentGraph) {
    graph
        .networks
        .entry(GATEWAY_NETWORK.to_string())
        .or_insert_with(NetworkSpec::default);
    graph
        .networks
        .entry(INTERNAL_NETWORK.to_string())
        .or_insert_with(|| NetworkSpec { internal: true });
}

/// Appends the API gateway entry: reachable from outside, member of both
/// networks, no static dependency edges (routed services are discovered at
/// request time).
pub(crate) fn add_gateway(graph: &mut DeploymentGraph) {
    graph.services.insert(
        GATEWAY_SERVICE.to_string(),
        ServiceSpec {
            build: Some("./gateway".to_string()),
            ports: vec!["8080:8080".to_string()],
            networks: vec![GATEWAY_NETWORK.to_string(), INTERNAL_NETWORK.to_string()],
            restart: Some(RESTART_POLICY.to_string()),
            ..Default::default()
        },
    );
}

/// Appends the reverse proxy entry: gateway network only, depends on the
/// gateway when one is present, mounts the proxy descriptor read-only.
pub(crate) fn add_proxy(graph: &mut DeploymentGraph, versions: &VersionSet) {
    let depends_on = if graph.services.contains_key(GATEWAY_SERVICE) {
        vec![GATEWAY_SERVICE.to_string()]
    } else {
        Vec::new()
    };
    graph.services.insert(
        PROXY_SERVICE.to_string(),
        ServiceSpec {
            image: Some(format!("nginx:{}", versions.nginx)),
            ports: vec!["80:80".to_string()],
            volumes: vec!["./nginx.conf:/etc/nginx/nginx.conf:ro".to_string()],
            networks: vec![GATEWAY_NETWORK.to_string()],
            depends_on,
            restart: Some(RESTART_POLICY.to_string()),
            ..Default::default()
        },
    );
}

fn database_url(base: &str, db_instance: &str, db: Database) -> String {
    match db {
        Database::Mongo => format!("MONGO_URL=mongodb://{db_instance}:27017/{base}"),
        Database::Postgres => {
            format!("DATABASE_URL=postgres://postgres:postgres@{db_instance}:5432/{base}")
        }
        Database::MySql => format!("DATABASE_URL=mysql://root:root@{db_instance}:3306/{base}"),
    }
}

fn database_environment(base: &str, db: Database) -> Vec<String> {
    match db {
        Database::Mongo => vec![format!("MONGO_INITDB_DATABASE={base}")],
        Database::Postgres => vec![
            "POSTGRES_USER=postgres".to_string(),
            "POSTGRES_PASSWORD=postgres".to_string(),
            format!("POSTGRES_DB={base}"),
        ],
        Database::MySql => vec![
            "MYSQL_ROOT_PASSWORD=root".to_string(),
            format!("MYSQL_DATABASE={base}"),
        ],
    }
}
