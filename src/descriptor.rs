//! Service Descriptor: the validated unit of input to the topology
//! synthesizer. One descriptor describes one microservice to generate.

use crate::error::{Result, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Names that scaffolded services may not take, either because the
/// synthesizer mints them itself or because they collide with common
/// infrastructure entries.
pub const RESERVED_NAMES: &[&str] = &[
    "api", "app", "admin", "gateway", "proxy", "nginx", "redis", "db", "www", "root",
];

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]{1,29}$").unwrap());
static PORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,5}:\d{1,5}$").unwrap());

/// Transport protocol a generated service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Request/response HTTP service.
    Rest,
    /// Contract-based RPC service (bidirectional streaming capable).
    Grpc,
}

impl Protocol {
    /// Container-side port a service listens on when the descriptor does
    /// not bind ports explicitly.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Rest => 3000,
            Protocol::Grpc => 50051,
        }
    }
}

/// Datastore provisioned next to a generated service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Mongo,
    Postgres,
    MySql,
}

impl Database {
    /// Docker Hub repository for this datastore.
    pub fn repository(self) -> &'static str {
        match self {
            Database::Mongo => "mongo",
            Database::Postgres => "postgres",
            Database::MySql => "mysql",
        }
    }

    /// Path inside the container where the datastore keeps its files;
    /// this is where the per-service volume gets mounted.
    pub fn data_path(self) -> &'static str {
        match self {
            Database::Mongo => "/data/db",
            Database::Postgres => "/var/lib/postgresql/data",
            Database::MySql => "/var/lib/mysql",
        }
    }
}

/// Generation parameters for one microservice, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub protocol: Protocol,
    pub database: Option<Database>,
    pub include_redis: bool,
    #[serde(default)]
    pub ports: Vec<String>,
}

impl ServiceDescriptor {
    /// Validates and builds a descriptor. Name constraints and port syntax
    /// are checked here so nothing downstream ever sees a bad descriptor.
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        database: Option<Database>,
        include_redis: bool,
        ports: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        for port in &ports {
            validate_port(port)?;
        }
        Ok(Self {
            name,
            protocol,
            database,
            include_redis,
            ports,
        })
    }

    /// Container-side port the reverse proxy and gateway route to: the
    /// container half of the first explicit binding, else the protocol
    /// default.
    pub fn container_port(&self) -> u16 {
        self.ports
            .first()
            .and_then(|p| p.split(':').nth(1))
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(|| self.protocol.default_port())
    }
}

/// A binding is two non-zero port numbers, each within u16 range.
fn validate_port(port: &str) -> Result<()> {
    let invalid = || ValidationError::InvalidPort(port.to_string());
    if !PORT_RE.is_match(port) {
        return Err(invalid().into());
    }
    for half in port.split(':') {
        match half.parse::<u32>() {
            Ok(n) if (1..=65535).contains(&n) => {}
            _ => return Err(invalid().into()),
        }
    }
    Ok(())
}

/// Checks the descriptor name against the naming rules: lowercase
/// letters/digits/hyphen/underscore, 2-30 chars, leading letter, not a
/// reserved name.
pub fn validate_name(name: &str) -> Result<()> {
    if !NAME_RE.is_match(name) {
        let reason = if name.len() < 2 || name.len() > 30 {
            "must be 2-30 characters".to_string()
        } else {
            "must be lowercase letters, digits, '-' or '_', starting with a letter".to_string()
        };
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason,
        }
        .into());
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ValidationError::ReservedName(name.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScaffoldError;

    fn descriptor(name: &str) -> Result<ServiceDescriptor> {
        ServiceDescriptor::new(name, Protocol::Rest, None, false, vec![])
    }

    #[test]
    fn accepts_well_formed_names() {
        for name in ["auth", "user-profile", "orders_v2", "ab"] {
            assert!(descriptor(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["A", "Auth", "1auth", "a", "", "has space", "verylongname-that-goes-past-thirty"] {
            let err = descriptor(name).unwrap_err();
            assert!(
                matches!(
                    err,
                    ScaffoldError::Validation(ValidationError::InvalidName { .. })
                ),
                "{name} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn rejects_reserved_names() {
        for name in ["api", "app", "admin", "gateway", "nginx"] {
            let err = descriptor(name).unwrap_err();
            assert!(matches!(
                err,
                ScaffoldError::Validation(ValidationError::ReservedName(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_port_mappings() {
        for binding in ["3000", "99999:99999", "8080:70000", "0:3000", "8080:0"] {
            let err = ServiceDescriptor::new(
                "auth",
                Protocol::Rest,
                None,
                false,
                vec![binding.to_string()],
            )
            .unwrap_err();
            assert!(
                matches!(
                    err,
                    ScaffoldError::Validation(ValidationError::InvalidPort(_))
                ),
                "{binding} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_in_range_port_mappings() {
        let d = ServiceDescriptor::new(
            "auth",
            Protocol::Rest,
            None,
            false,
            vec!["80:3000".to_string(), "65535:65535".to_string()],
        )
        .unwrap();
        assert_eq!(d.container_port(), 3000);
    }

    #[test]
    fn container_port_prefers_explicit_binding() {
        let d = ServiceDescriptor::new(
            "auth",
            Protocol::Grpc,
            None,
            false,
            vec!["8081:9090".to_string()],
        )
        .unwrap();
        assert_eq!(d.container_port(), 9090);

        let d = descriptor("auth").unwrap();
        assert_eq!(d.container_port(), 3000);
    }
}
