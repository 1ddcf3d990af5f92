//! Image version resolution.
//!
//! One resolver instance owns its HTTP client and its TTL cache; nothing
//! here is process-global. Each image lookup has its own bounded timeout
//! and its own fixed fallback, so one unreachable registry entry degrades
//! only that field and never aborts a run.

use crate::descriptor::Database;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Tags considered stable: plain dotted numerics, optionally `-alpine`.
static STABLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*(-alpine)?$").unwrap());

/// Resolved tag for every image the synthesizer may emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSet {
    pub runtime: String,
    pub mongo: String,
    pub postgres: String,
    pub mysql: String,
    pub redis: String,
    pub nginx: String,
}

impl VersionSet {
    /// Fixed versions used whenever a registry lookup fails or the
    /// resolver runs offline.
    pub fn fallback() -> Self {
        Self {
            runtime: "20-alpine".to_string(),
            mongo: "7.0".to_string(),
            postgres: "16-alpine".to_string(),
            mysql: "8.4".to_string(),
            redis: "7.2-alpine".to_string(),
            nginx: "1.27-alpine".to_string(),
        }
    }

    pub fn database_tag(&self, db: Database) -> &str {
        match db {
            Database::Mongo => &self.mongo,
            Database::Postgres => &self.postgres,
            Database::MySql => &self.mysql,
        }
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no stable tag published for '{0}'")]
    NoStableTag(String),
}

/// Seam between the resolver and the registry, so tests run without a
/// network.
pub trait TagLookup {
    fn latest_tag(&self, repository: &str) -> Result<String, LookupError>;
}

/// Docker Hub tag listing, newest first.
pub struct RegistryClient {
    http: reqwest::blocking::Client,
    timeout: Duration,
}

#[derive(Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl RegistryClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            timeout,
        }
    }
}

impl TagLookup for RegistryClient {
    fn latest_tag(&self, repository: &str) -> Result<String, LookupError> {
        let url = format!(
            "https://hub.docker.com/v2/repositories/library/{repository}/tags?page_size=25&ordering=last_updated"
        );
        let page: TagPage = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()?
            .error_for_status()?
            .json()?;
        page.results
            .into_iter()
            .map(|t| t.name)
            .find(|name| STABLE_TAG_RE.is_match(name))
            .ok_or_else(|| LookupError::NoStableTag(repository.to_string()))
    }
}

/// Resolves the version set once per TTL window. A cache hit and a fresh
/// lookup are interchangeable; nothing downstream depends on freshness.
pub struct VersionResolver<L = RegistryClient> {
    lookup: L,
    runtime_repository: String,
    ttl: Duration,
    offline: bool,
    cached: Option<(Instant, VersionSet)>,
}

impl VersionResolver<RegistryClient> {
    pub fn new(runtime_repository: impl Into<String>, timeout: Duration, ttl: Duration) -> Self {
        Self::with_lookup(RegistryClient::new(timeout), runtime_repository, ttl)
    }

    /// A resolver that never touches the network and always answers with
    /// the fixed fallback set.
    pub fn offline(runtime_repository: impl Into<String>) -> Self {
        let mut resolver = Self::new(runtime_repository, Duration::ZERO, Duration::ZERO);
        resolver.offline = true;
        resolver
    }
}

impl<L: TagLookup> VersionResolver<L> {
    pub fn with_lookup(lookup: L, runtime_repository: impl Into<String>, ttl: Duration) -> Self {
        Self {
            lookup,
            runtime_repository: runtime_repository.into(),
            ttl,
            offline: false,
            cached: None,
        }
    }

    /// Resolves every image tag, substituting the fallback for any image
    /// whose lookup fails. Infallible by design: partial registry failure
    /// is a warning, not an error.
    pub fn resolve(&mut self) -> VersionSet {
        if self.offline {
            return VersionSet::fallback();
        }
        if let Some((at, set)) = &self.cached {
            if at.elapsed() < self.ttl {
                log::debug!("version cache hit");
                return set.clone();
            }
        }

        let fallback = VersionSet::fallback();
        let runtime_repository = self.runtime_repository.clone();
        let set = VersionSet {
            runtime: self.tag_or(&runtime_repository, fallback.runtime),
            mongo: self.tag_or("mongo", fallback.mongo),
            postgres: self.tag_or("postgres", fallback.postgres),
            mysql: self.tag_or("mysql", fallback.mysql),
            redis: self.tag_or("redis", fallback.redis),
            nginx: self.tag_or("nginx", fallback.nginx),
        };
        self.cached = Some((Instant::now(), set.clone()));
        set
    }

    fn tag_or(&self, repository: &str, fallback: String) -> String {
        match self.lookup.latest_tag(repository) {
            Ok(tag) => tag,
            Err(e) => {
                log::warn!("version lookup for '{repository}' failed ({e}); using {fallback}");
                fallback
            }
        }
    }
}
