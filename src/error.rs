use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid service name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("'{0}' is a reserved name")]
    ReservedName(String),

    #[error("duplicate service name '{0}' in descriptor set")]
    DuplicateName(String),

    #[error("invalid port mapping '{0}', expected HOST:CONTAINER")]
    InvalidPort(String),
}

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("service '{0}' already exists in the deployment graph")]
    ServiceExists(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed descriptor file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("malformed proxy descriptor: {reason}")]
    MalformedProxy { reason: String },

    #[error("no deployment graph at {}; run `forge-ctl init` first", .path.display())]
    MissingGraph { path: PathBuf },

    #[error("deployment graph already exists at {}; refusing to overwrite it", .path.display())]
    AlreadyInitialized { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("configuration parsing failed: {0}")]
    ParsingFailed(String),
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
