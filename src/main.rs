//! MCP server for Swiss health-insurance premium data.
//!
//! Run with `SUPABASE_URL` and `SUPABASE_KEY` set, or `premium-mcp --fixture data.json`
//! to serve from a local file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use premium_mcp::{McpServer, McpSession, MemoryStore, SupabaseStore};

/// MCP server for Swiss health-insurance premium data.
///
/// Exposes premium queries as MCP tools for AI assistants.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "premium-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Serve premiums from a JSON fixture file instead of the remote store.
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Timeout for each request to the remote store, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("premium_mcp={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let session = match &args.fixture {
        Some(path) => match MemoryStore::from_file(path) {
            Ok(store) => {
                tracing::info!("Serving premiums from {}", path.display());
                McpSession::new(store)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        // Credentials are read on first store access
        None => McpSession::new(SupabaseStore::from_env(Duration::from_secs(
            args.timeout_secs,
        ))),
    };

    let mut server = McpServer::new(session);

    if let Err(e) = server.run().await {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
