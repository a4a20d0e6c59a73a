//! # premium-mcp
//!
//! MCP (Model Context Protocol) server for Swiss mandatory health-insurance premiums.
//!
//! This crate exposes read-only premium queries as tools for AI assistants. It
//! implements the MCP protocol over stdin/stdout using JSON-RPC 2.0 and reads
//! premium data from a Supabase (PostgREST) project.
//!
//! ## Features
//!
//! - **4 tools**: cheapest insurers, insurer comparison, price history, database statistics
//! - **Insurer resolution**: free-text names are matched against a static registry in which
//!   several historical insurer codes can belong to one brand
//! - **Offline mode**: serve from a JSON fixture instead of the remote store
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "premiums": {
//!       "command": "/path/to/premium-mcp",
//!       "env": {
//!         "SUPABASE_URL": "https://<project>.supabase.co",
//!         "SUPABASE_KEY": "<key>"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use premium_mcp::{McpServer, McpSession, MemoryStore};
//!
//! # async fn example() -> premium_mcp::Result<()> {
//! let store = MemoryStore::from_file("premiums.json")?;
//! let mut server = McpServer::new(McpSession::new(store));
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod convert;
mod error;
pub mod format;
pub mod insurers;
pub mod profile;
mod server;
mod session;
pub mod store;
pub mod tools;

pub use convert::PremiumRecord;
pub use error::{McpError, Result};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::McpSession;
pub use store::{MemoryStore, PremiumStore, Query, StoreConfig, SupabaseStore, Table};
pub use tools::{ToolDef, ToolRegistry};
