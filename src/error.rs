//! Error types for the MCP server.
//!
//! Store failures and argument problems are mapped to MCP-friendly errors.

/// MCP server errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum McpError {
    /// Store credentials are missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error reported by the remote premium store.
    #[error("store error: {message}")]
    Store {
        /// Error code reported by the store (HTTP status or PostgREST code)
        code: String,
        /// Human-readable error message
        message: String,
    },

    /// Unknown tool requested.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Shorthand for an [`McpError::InvalidArg`].
    pub fn invalid_arg(name: &str, reason: impl Into<String>) -> Self {
        McpError::InvalidArg {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error came back from the remote store itself.
    pub fn is_store_error(&self) -> bool {
        matches!(self, McpError::Store { .. })
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        let code = err
            .status()
            .map(|s| s.as_u16().to_string())
            .unwrap_or_else(|| "REQUEST_FAILED".to_string());
        McpError::Store {
            code,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;
