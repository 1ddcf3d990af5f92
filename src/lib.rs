//! # Stackforge
//!
//! A Rust command-line tool that scaffolds multi-service projects: one
//! source tree and Dockerfile per service, a shared `docker-compose.yml`
//! deployment graph, and an optional nginx reverse-proxy configuration.
//!
//! ## Features
//!
//! - **Incremental topology**: services are added one at a time across
//!   independent runs; the persisted deployment graph is only ever
//!   appended to, never corrupted
//! - **One synthesis path**: REST and gRPC services go through the same
//!   descriptor-driven builder, so the two variants cannot drift
//! - **Idempotent proxy wiring**: re-asking for a service's upstream and
//!   location blocks is a safe no-op
//! - **Pinned image versions**: current tags are looked up per image with
//!   a bounded timeout and fall back to fixed versions on failure
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackforge::descriptor::{Database, Protocol, ServiceDescriptor};
//! use stackforge::topology::{build, BuildOptions};
//! use stackforge::versions::VersionSet;
//!
//! # fn main() -> stackforge::Result<()> {
//! let auth = ServiceDescriptor::new(
//!     "auth",
//!     Protocol::Rest,
//!     Some(Database::Mongo),
//!     true,
//!     vec![],
//! )?;
//! let graph = build(
//!     &[auth],
//!     BuildOptions { include_gateway: true, include_proxy: false },
//!     &VersionSet::fallback(),
//! )?;
//! println!("{}", serde_yaml::to_string(&graph)?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod persistence;
pub mod proxy;
pub mod scaffold;
pub mod topology;
pub mod versions;

// Re-export commonly used types and functions
pub use descriptor::ServiceDescriptor;
pub use error::{Result, ScaffoldError};
pub use topology::{DeploymentGraph, build as build_topology, patch as patch_topology};
pub use versions::{VersionResolver, VersionSet};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
