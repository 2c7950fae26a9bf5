//! Memoria - Persistent Memory Manager over MCP
//!
//! Main entry point for the Memoria MCP server: CLI parsing, tracing
//! setup, and wiring of the record store into the stdio server.

use clap::{Parser, Subcommand};
use memoria_core::{
    config::{self, Settings},
    error::Result,
    ConnectionMode, LibsqlStorage, McpServer, MemoryStore, ToolHandler,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memoria")]
#[command(about = "Persistent memory manager served over the Model Context Protocol", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database path (overrides MEMORIA_DB_PATH env var and settings)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (stdio mode); this is the default
    Serve,

    /// Initialize the database
    Init {
        /// Database path
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Show database path and record count
    Status,
}

async fn start_mcp_server(db_path: String) -> Result<()> {
    debug!("Starting MCP server...");
    debug!("Using database: {}", db_path);

    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // The MCP server creates the database on first use so a fresh install
    // works without a separate init step.
    let storage =
        LibsqlStorage::new_with_validation(ConnectionMode::Local(db_path), true).await?;

    let tool_handler = ToolHandler::new(Arc::new(storage));
    let server = McpServer::new(tool_handler);

    // Run the server with graceful shutdown on signals
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping MCP server gracefully...");
        }
    }

    info!("MCP server shut down complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: stdout is reserved for JSON-RPC frames.
    let level = cli.log_level.to_lowercase();
    let filter = EnvFilter::new(format!("memoria={},memoria_core={}", level, level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Memoria v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let db_path = config::resolve_db_path(cli.db_path, &settings);
            start_mcp_server(db_path).await
        }

        Some(Commands::Init { database }) => {
            debug!("Initializing database...");

            let db_path = database
                .or(cli.db_path)
                .unwrap_or_else(|| config::resolve_db_path(None, &settings));

            if let Some(parent) = PathBuf::from(&db_path).parent() {
                std::fs::create_dir_all(parent)?;
                debug!("Created directory: {}", parent.display());
            }

            // Construction creates the database file and runs migrations.
            let _storage =
                LibsqlStorage::new_with_validation(ConnectionMode::Local(db_path.clone()), true)
                    .await?;

            println!("✓ Database initialized: {}", db_path);
            Ok(())
        }

        Some(Commands::Status) => {
            let db_path = config::resolve_db_path(cli.db_path, &settings);
            let storage = LibsqlStorage::new(ConnectionMode::Local(db_path.clone())).await?;
            let count = storage.count().await?;

            println!("Database: {}", db_path);
            println!("Memories: {}", count);
            Ok(())
        }
    }
}
