use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopdesk::cli::{
    ADMIN_PASSWORD_FILE, AdminCommands, ImportArgs, UserCommands, run_import, run_info, run_init,
    run_user_add,
};
use shopdesk::config::{FileConfig, ServerConfig};
use shopdesk::server::{AppState, create_router};
use shopdesk::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Inventory, supplier and invoicing back office", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Import a stock CSV file without going through the server
    Import(ImportArgs),

    /// Start the server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Config file; defaults to <data-dir>/shopdesk.toml when present
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

async fn serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: String,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let data_dir = PathBuf::from(data_dir);
    let file = FileConfig::discover(&data_dir, config_path.as_deref())?;

    let mut config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    }
    .with_file(file);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate()?;

    let not_initialized =
        "Not initialized. Run 'shopdesk admin init' first to create the database and admin account.";
    if !config.db_path().exists() {
        bail!(not_initialized);
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    if !store.has_admin_account()? {
        bail!(not_initialized);
    }

    let purged = store.delete_expired_sessions()?;
    if purged > 0 {
        info!("Removed {purged} expired sessions");
    }
    info!(
        "Admin password available at {}",
        config.data_dir.join(ADMIN_PASSWORD_FILE).display()
    );

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(Arc::new(store), config));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shopdesk=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => run_init(data_dir, non_interactive)?,
            AdminCommands::User { command } => match command {
                UserCommands::Add {
                    data_dir,
                    username,
                    role,
                    password,
                    non_interactive,
                } => run_user_add(data_dir, username, role, password, non_interactive)?,
            },
            AdminCommands::Info { data_dir, json } => run_info(data_dir, json)?,
        },
        Commands::Import(args) => run_import(args)?,
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => serve(host, port, data_dir, config).await?,
    }

    Ok(())
}
