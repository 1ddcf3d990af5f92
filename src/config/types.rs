use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub compose: ComposeConfig,
    pub registry: RegistryConfig,
}

/// Where generated trees land, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub services_dir: String,
    pub gateway_dir: String,
}

/// Defaults baked into generated compose entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub file_name: String,
    pub proxy_file_name: String,
    /// Docker Hub repository of the service runtime base image.
    pub runtime_repository: String,
}

/// Registry lookup behavior for the version resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub lookup_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// Skip lookups entirely and use the fixed fallback versions.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            compose: ComposeConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            services_dir: "services".to_string(),
            gateway_dir: "gateway".to_string(),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            file_name: "docker-compose.yml".to_string(),
            proxy_file_name: "nginx.conf".to_string(),
            runtime_repository: "node".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: 3,
            cache_ttl_secs: 600,
            offline: false,
        }
    }
}
