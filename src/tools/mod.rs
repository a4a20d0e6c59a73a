//! Tool registry and shared query helpers.
//!
//! Provides the infrastructure for registering and dispatching MCP tools.

pub mod cheapest;
pub mod compare;
pub mod history;
pub mod stats;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::format::with_disclaimer;
use crate::insurers::known_names;
use crate::profile::Profile;
use crate::session::McpSession;
use crate::store::Query;

/// Columns fetched for premium rows.
pub(crate) const PREMIUM_COLUMNS: &[&str] = &[
    "canton",
    "year",
    "age_band",
    "franchise",
    "model",
    "accident",
    "insurer_id",
    "monthly_premium",
    "tariff_name",
];

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "find_cheapest_insurers")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        tools.extend(cheapest::tools());
        tools.extend(compare::tools());
        tools.extend(history::tools());
        tools.extend(stats::tools());

        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Returns the text block shown to the assistant.
    pub async fn dispatch(
        &self,
        session: &McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<String> {
        tracing::debug!(tool = name, "dispatching tool call");
        match name {
            cheapest::NAME => cheapest::dispatch(session, name, args).await,
            compare::NAME => compare::dispatch(session, name, args).await,
            history::NAME => history::dispatch(session, name, args).await,
            stats::NAME => stats::dispatch(session, name, args).await,
            _ => Err(McpError::UnknownTool(name.to_string())),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact-match filter on every profile dimension. Year filters are added by the caller.
pub(crate) fn profile_query(profile: &Profile) -> Query {
    Query::new()
        .select(PREMIUM_COLUMNS)
        .eq("canton", &profile.canton)
        .eq("age_band", profile.age_band)
        .eq("franchise", profile.franchise)
        .eq("model", profile.model)
        .eq("accident", profile.accident)
}

/// Text answer for a failed store request.
pub(crate) fn store_failure(action: &str, err: &McpError) -> String {
    tracing::warn!(error = %err, "{} failed", action);
    with_disclaimer(&format!("Database error while {}: {}", action, err))
}

/// Text answer for insurer names that match nothing in the registry.
pub(crate) fn unknown_insurers(names: &[String]) -> String {
    format!(
        "No insurer found for: {}.\nKnown insurers: {}",
        names.join(", "),
        known_names().join(", ")
    )
}

/// Helper macro for creating JSON Schema for tool input parameters.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@type $req_type));)*
        $(props.insert($opt_name.to_string(), $crate::schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Empty object (no parameters)
    (object {}) => {{
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type array_string) => { serde_json::json!({"type": "array", "items": {"type": "string"}, "minItems": 1}) };
    (@type year) => {
        serde_json::json!({
            "type": "integer",
            "minimum": $crate::profile::FIRST_YEAR,
            "maximum": $crate::profile::LAST_YEAR
        })
    };
    (@type canton) => {
        serde_json::json!({"type": "string", "enum": $crate::profile::CANTONS})
    };
    (@type age_band) => {
        serde_json::json!({
            "type": "string",
            "enum": $crate::profile::AgeBand::ALL.map(|b| b.as_str())
        })
    };
    (@type franchise) => {
        serde_json::json!({"type": "integer", "enum": $crate::profile::DEDUCTIBLES})
    };
    (@type model) => {
        serde_json::json!({
            "type": "string",
            "enum": $crate::profile::Model::ALL.map(|m| m.as_str()),
            "default": "standard"
        })
    };
    (@type accident) => {
        serde_json::json!({"type": "boolean", "default": true})
    };
}
