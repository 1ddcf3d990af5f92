use clap::Parser;
use stackforge::{
    cli::{Cli, Commands, DatabaseArg, ProtocolArg},
    config::{self, Config},
    descriptor::ServiceDescriptor,
    persistence, proxy, scaffold,
    topology::{self, builder::BuildOptions, PROXY_SERVICE},
    versions::VersionResolver,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> stackforge::Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init {
            path,
            gateway,
            proxy,
        } => handle_init(&path, gateway, proxy, &config),
        Commands::Add {
            path,
            name,
            protocol,
            database,
            redis,
            ports,
        } => handle_add(&path, name, protocol, database, redis, ports, &config),
        Commands::Versions { json } => handle_versions(json, &config),
    }
}

fn resolver_from(config: &Config) -> VersionResolver {
    if config.registry.offline {
        VersionResolver::offline(config.compose.runtime_repository.clone())
    } else {
        VersionResolver::new(
            config.compose.runtime_repository.clone(),
            Duration::from_secs(config.registry.lookup_timeout_secs),
            Duration::from_secs(config.registry.cache_ttl_secs),
        )
    }
}

fn handle_init(
    path: &Path,
    include_gateway: bool,
    include_proxy: bool,
    config: &Config,
) -> stackforge::Result<()> {
    let mut resolver = resolver_from(config);
    let versions = resolver.resolve();

    // Everything is computed in memory before the first write so a failed
    // init leaves nothing half-generated behind.
    let graph = topology::build(
        &[],
        BuildOptions {
            include_gateway,
            include_proxy,
        },
        &versions,
    )?;
    let proxy_text = if include_proxy {
        Some(proxy::build(&[])?)
    } else {
        None
    };

    // The graph is created exactly once; a second init is refused before
    // anything is written so an existing project is never clobbered.
    persistence::init_graph(&graph_path(path, config), &graph)?;
    if let Some(text) = proxy_text {
        persistence::store_text(&proxy_path(path, config), &text)?;
    }
    scaffold::init_project(path, config, include_gateway, &versions)?;

    log::info!("initialized project at {}", path.display());
    println!("Initialized project at {}", path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_add(
    path: &Path,
    name: String,
    protocol: ProtocolArg,
    database: Option<DatabaseArg>,
    redis: bool,
    ports: Vec<String>,
    config: &Config,
) -> stackforge::Result<()> {
    let descriptor = ServiceDescriptor::new(
        name,
        protocol.into(),
        database.map(Into::into),
        redis,
        ports,
    )?;

    let graph_file = graph_path(path, config);
    let existing = persistence::load_graph(&graph_file)?;

    let mut resolver = resolver_from(config);
    let versions = resolver.resolve();

    // Compute both updated descriptors fully before writing either.
    let patched = topology::patch(&existing, &descriptor, &versions)?;
    let proxy_update = if patched.services.contains_key(PROXY_SERVICE) {
        let proxy_file = proxy_path(path, config);
        let route = proxy::ProxyRoute::new(&descriptor.name, descriptor.container_port());
        let text = persistence::load_text(&proxy_file)?;
        Some((proxy_file, proxy::patch(&text, &[route])?))
    } else {
        None
    };

    // Proxy first: if the graph write then fails, the leftover proxy
    // blocks are absorbed by the idempotent proxy patcher on retry,
    // whereas a graph-first ordering would strand a service with no route
    // behind the patcher's duplicate rejection.
    if let Some((proxy_file, text)) = proxy_update {
        persistence::store_text(&proxy_file, &text)?;
    }
    persistence::store_graph(&graph_file, &patched)?;
    scaffold::scaffold_service(path, config, &descriptor, &versions)?;

    log::info!("added service '{}'", descriptor.name);
    println!("Added service '{}'", descriptor.name);
    Ok(())
}

fn handle_versions(json: bool, config: &Config) -> stackforge::Result<()> {
    let mut resolver = resolver_from(config);
    let versions = resolver.resolve();

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    } else {
        println!("runtime ({}): {}", config.compose.runtime_repository, versions.runtime);
        println!("mongo:    {}", versions.mongo);
        println!("postgres: {}", versions.postgres);
        println!("mysql:    {}", versions.mysql);
        println!("redis:    {}", versions.redis);
        println!("nginx:    {}", versions.nginx);
    }
    Ok(())
}

fn graph_path(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.compose.file_name)
}

fn proxy_path(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.compose.proxy_file_name)
}
