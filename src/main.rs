use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use novella::config::ServerConfig;
use novella::server::{AppState, create_router};
use novella::store::{MemoryStore, snapshot};

#[derive(Parser)]
#[command(name = "novella")]
#[command(about = "A serialized-fiction data store and API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// TOML config file. Flags and environment variables override it.
        #[arg(long, env = "NOVELLA_CONFIG")]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long, env = "NOVELLA_HOST")]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short, env = "NOVELLA_PORT")]
        port: Option<u16>,

        /// Snapshot file. An empty value keeps everything in memory.
        #[arg(long, env = "NOVELLA_SNAPSHOT_PATH")]
        snapshot_path: Option<PathBuf>,

        /// Session lifetime in seconds. Sessions never expire when unset.
        #[arg(long, env = "NOVELLA_SESSION_TTL_SECS")]
        session_ttl_secs: Option<u64>,
    },

    /// Snapshot maintenance
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// Load a snapshot file and report what it contains
    Check {
        /// Snapshot file to inspect
        #[arg(long, env = "NOVELLA_SNAPSHOT_PATH")]
        path: PathBuf,
    },
}

fn run_check(path: PathBuf) -> anyhow::Result<()> {
    let Some(tables) = snapshot::load(&path)? else {
        bail!("No snapshot at {}", path.display());
    };

    let counts = tables.counts();
    println!("Snapshot {} is valid", path.display());
    println!("  users:     {}", counts.users);
    println!("  sessions:  {}", counts.sessions);
    println!("  novels:    {}", counts.novels);
    println!("  chapters:  {}", counts.chapters);
    println!("  comments:  {}", counts.comments);
    println!("  bookmarks: {}", counts.bookmarks);

    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = MemoryStore::open(config.store_config()?)?;
    match store.snapshot_path() {
        Some(path) => info!("Persisting to {}", path.display()),
        None => info!("No snapshot path configured, state is kept in memory only"),
    }

    let state = Arc::new(AppState::new(Arc::new(store)));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("novella=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            snapshot_path,
            session_ttl_secs,
        } => {
            let mut server_config = match config {
                Some(path) => ServerConfig::from_toml_file(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            if let Some(snapshot_path) = snapshot_path {
                server_config.snapshot_path = snapshot_path;
            }
            if session_ttl_secs.is_some() {
                server_config.session_ttl_secs = session_ttl_secs;
            }

            run_serve(server_config).await?;
        }
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Check { path } => run_check(path)?,
        },
    }

    Ok(())
}
