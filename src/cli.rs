use crate::descriptor::{Database, Protocol};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "forge-ctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scaffold multi-service projects with Docker Compose and Nginx wiring")]
#[command(
    long_about = "Generates a multi-service project skeleton: per-service source trees and Dockerfiles, a shared docker-compose.yml, and an optional nginx reverse-proxy configuration. Services can be added incrementally across runs without corrupting the persisted descriptors."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a project: directories, deployment graph, optional proxy
    Init {
        /// Project root directory to create
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        /// Include an API gateway entry point
        #[arg(long)]
        gateway: bool,

        /// Include an nginx reverse proxy in front of the gateway
        #[arg(long)]
        proxy: bool,
    },

    /// Add one service to an initialized project
    Add {
        /// Project root directory
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        /// Service name (lowercase, 2-30 chars, letters/digits/-/_)
        #[arg(value_name = "NAME")]
        name: String,

        /// Transport protocol the service speaks
        #[arg(long, value_enum, default_value = "rest")]
        protocol: ProtocolArg,

        /// Provision a database next to the service
        #[arg(long, value_enum)]
        database: Option<DatabaseArg>,

        /// Provision a co-located Redis instance
        #[arg(long)]
        redis: bool,

        /// Host:container port bindings (repeatable)
        #[arg(long = "port", value_name = "HOST:CONTAINER")]
        ports: Vec<String>,
    },

    /// Show the image versions the generator would use
    Versions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    /// Request/response HTTP service
    Rest,
    /// Contract-based RPC service
    Grpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatabaseArg {
    Mongo,
    Postgres,
    Mysql,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Rest => Protocol::Rest,
            ProtocolArg::Grpc => Protocol::Grpc,
        }
    }
}

impl From<DatabaseArg> for Database {
    fn from(arg: DatabaseArg) -> Self {
        match arg {
            DatabaseArg::Mongo => Database::Mongo,
            DatabaseArg::Postgres => Database::Postgres,
            DatabaseArg::Mysql => Database::MySql,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
