//! Straight-line file and directory emission. No invariants live here;
//! everything interesting happens in [`crate::topology`] and
//! [`crate::proxy`] before these run.

use crate::config::Config;
use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::versions::VersionSet;
use std::fs;
use std::path::Path;

/// Creates the project root and its fixed directories.
pub fn init_project(
    root: &Path,
    config: &Config,
    include_gateway: bool,
    versions: &VersionSet,
) -> Result<()> {
    fs::create_dir_all(root.join(&config.project.services_dir))?;
    if include_gateway {
        scaffold_gateway(root, config, versions)?;
    }
    Ok(())
}

/// Emits the gateway build context, pinned to the same resolved runtime
/// tag as the service Dockerfiles.
pub fn scaffold_gateway(root: &Path, config: &Config, versions: &VersionSet) -> Result<()> {
    let dir = root.join(&config.project.gateway_dir);
    fs::create_dir_all(dir.join("src"))?;
    fs::write(
        dir.join("Dockerfile"),
        dockerfile(&config.compose.runtime_repository, &versions.runtime, 8080),
    )?;
    fs::write(dir.join(".dockerignore"), DOCKERIGNORE)?;
    Ok(())
}

/// Emits one service's build context: source tree stub, Dockerfile pinned
/// to the resolved runtime tag, and a .dockerignore.
pub fn scaffold_service(
    root: &Path,
    config: &Config,
    descriptor: &ServiceDescriptor,
    versions: &VersionSet,
) -> Result<()> {
    let dir = root
        .join(&config.project.services_dir)
        .join(&descriptor.name);
    fs::create_dir_all(dir.join("src"))?;
    fs::write(
        dir.join("Dockerfile"),
        dockerfile(
            &config.compose.runtime_repository,
            &versions.runtime,
            descriptor.container_port(),
        ),
    )?;
    fs::write(dir.join(".dockerignore"), DOCKERIGNORE)?;
    Ok(())
}

fn dockerfile(repository: &str, tag: &str, port: u16) -> String {
    format!(
        "FROM {repository}:{tag}\n\
         WORKDIR /app\n\
         COPY . .\n\
         EXPOSE {port}\n\
         CMD [\"npm\", \"start\"]\n"
    )
}

const DOCKERIGNORE: &str = "node_modules\n.git\n*.log\n";
