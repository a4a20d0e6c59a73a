//! Integration tests for the MCP server.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use premium_mcp::{
    McpError, McpServer, McpSession, MemoryStore, PremiumStore, Query, SupabaseStore, Table,
    ToolRegistry,
};

const DISCLAIMER_START: &str = "Note: Monthly premiums in CHF";

fn premium(code: &str, year: i64, canton: &str, franchise: i64, model: &str, premium: f64) -> JsonValue {
    json!({
        "canton": canton,
        "year": year,
        "age_band": "26+",
        "franchise": franchise,
        "model": model,
        "accident": true,
        "insurer_id": code,
        "monthly_premium": premium,
        "tariff_name": format!("{}-{}", model.to_uppercase(), code)
    })
}

/// Create a test session over a small in-memory data set.
fn test_session() -> McpSession {
    let premiums = vec![
        premium("0008", 2025, "ZH", 300, "standard", 455.10),
        premium("1507", 2025, "ZH", 300, "standard", 441.80),
        premium("1562", 2025, "ZH", 300, "standard", 472.35),
        premium("1322", 2025, "ZH", 300, "standard", 468.00),
        premium("1542", 2025, "ZH", 300, "standard", 430.25),
        premium("1384", 2025, "ZH", 300, "standard", 480.00),
        premium("1509", 2025, "ZH", 300, "standard", 490.40),
        premium("1555", 2025, "ZH", 300, "standard", 499.99),
        premium("1542", 2025, "ZH", 300, "hmo", 370.00),
        premium("0008", 2024, "ZH", 300, "standard", 430.00),
        premium("0008", 2023, "ZH", 300, "standard", 401.00),
        premium("0008", 2016, "ZH", 300, "standard", 360.00),
        premium("0008", 2025, "BE", 300, "standard", 420.00),
    ];
    let store = MemoryStore::new()
        .with_rows(Table::Premiums, premiums)
        .with_rows(
            Table::Insurers,
            vec![json!({"id": "0008"}), json!({"id": "1542"})],
        )
        .with_rows(
            Table::Locations,
            vec![json!({"zip": 8001}), json!({"zip": 3011}), json!({"zip": 1201})],
        );
    McpSession::new(store)
}

fn args(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(m) => m,
        _ => Map::new(),
    }
}

/// Helper to dispatch a tool call.
async fn call_tool(session: &McpSession, name: &str, arguments: JsonValue) -> String {
    ToolRegistry::new()
        .dispatch(session, name, args(arguments))
        .await
        .unwrap_or_else(|e| panic!("Tool {} failed: {}", name, e))
}

/// Helper to dispatch a tool call and expect an error.
async fn call_tool_err(session: &McpSession, name: &str, arguments: JsonValue) -> McpError {
    match ToolRegistry::new()
        .dispatch(session, name, args(arguments))
        .await
    {
        Ok(text) => panic!("Expected tool {} to fail, got: {}", name, text),
        Err(e) => e,
    }
}

fn zh_adult() -> JsonValue {
    json!({"canton": "zh", "year": 2025, "age_band": "26+", "franchise": 300})
}

// =============================================================================
// Cheapest insurers
// =============================================================================

#[tokio::test]
async fn test_cheapest_top_five() {
    let session = test_session();
    let text = call_tool(&session, "find_cheapest_insurers", zh_adult()).await;

    assert!(text.contains("1. Assura: CHF 430.25 per month (tariff STANDARD-1542)"));
    assert!(text.contains("2. CSS: CHF 441.80"));
    assert!(text.contains("3. Helsana: CHF 468.00"));
    assert!(text.contains("4. SWICA: CHF 480.00"));
    assert!(text.contains("5. Sanitas: CHF 490.40"));
    assert!(!text.contains("Visana"));
    assert!(text.contains(DISCLAIMER_START));
}

#[tokio::test]
async fn test_cheapest_respects_model() {
    let session = test_session();
    let mut a = zh_adult();
    a["model"] = json!("hmo");
    let text = call_tool(&session, "find_cheapest_insurers", a).await;
    assert!(text.contains("1. Assura: CHF 370.00"));
    assert!(!text.contains("2."));
}

#[tokio::test]
async fn test_cheapest_no_match_echoes_profile() {
    let session = test_session();
    let text = call_tool(
        &session,
        "find_cheapest_insurers",
        json!({"canton": "TI", "year": 2021, "age_band": "19-25", "franchise": 2500, "accident": false}),
    )
    .await;

    assert!(text.starts_with("No premiums found"));
    for needle in ["TI", "2021", "19-25", "CHF 2500", "standard", "excluded"] {
        assert!(text.contains(needle), "missing {}", needle);
    }
}

#[tokio::test]
async fn test_cheapest_validation() {
    let session = test_session();

    let err = call_tool_err(
        &session,
        "find_cheapest_insurers",
        json!({"canton": "ZH", "year": 2025, "age_band": "26+"}),
    )
    .await;
    assert!(matches!(err, McpError::MissingArg(ref n) if n == "franchise"));

    let err = call_tool_err(
        &session,
        "find_cheapest_insurers",
        json!({"canton": "XY", "year": 2025, "age_band": "26+", "franchise": 300}),
    )
    .await;
    assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "canton"));

    let err = call_tool_err(
        &session,
        "find_cheapest_insurers",
        json!({"canton": "ZH", "year": 2025, "age_band": "0-18", "franchise": 2500}),
    )
    .await;
    assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "franchise"));
}

// =============================================================================
// Comparison
// =============================================================================

#[tokio::test]
async fn test_compare_merges_historical_codes() {
    let session = test_session();
    let mut a = zh_adult();
    a["insurers"] = json!(["Helsana", "CSS", "Assura"]);
    let text = call_tool(&session, "compare_insurers", a).await;

    assert!(text.contains("1. Assura: CHF 430.25"));
    assert!(text.contains("2. CSS: CHF 441.80"));
    assert!(text.contains("3. Helsana: CHF 468.00"));
    assert!(text.contains("Spread: CHF 37.75"));
}

#[tokio::test]
async fn test_compare_with_unknown_name() {
    let session = test_session();
    let mut a = zh_adult();
    a["insurers"] = json!(["CSS", "Imaginary Mutual"]);
    let text = call_tool(&session, "compare_insurers", a).await;

    assert!(text.contains("1. CSS: CHF 441.80"));
    assert!(text.contains("Not found: Imaginary Mutual."));
}

#[tokio::test]
async fn test_compare_requires_names() {
    let session = test_session();
    let err = call_tool_err(&session, "compare_insurers", zh_adult()).await;
    assert!(matches!(err, McpError::MissingArg(ref n) if n == "insurers"));
}

// =============================================================================
// Price history
// =============================================================================

#[tokio::test]
async fn test_price_history_defaults() {
    let session = test_session();
    let text = call_tool(
        &session,
        "get_price_history",
        json!({"insurer": "css", "canton": "ZH", "age_band": "26+", "franchise": 300}),
    )
    .await;

    assert!(text.starts_with("Price history for CSS"));
    let years: Vec<usize> = ["2016:", "2023:", "2024:", "2025:"]
        .iter()
        .map(|y| text.find(y).expect("year missing"))
        .collect();
    assert!(years.windows(2).all(|w| w[0] < w[1]));
    assert!(text.contains("2025: CHF 441.80"));
    assert!(text.contains("Change from 2016 to 2025: +22.7%"));
}

#[tokio::test]
async fn test_price_history_bounded_range() {
    let session = test_session();
    let text = call_tool(
        &session,
        "get_price_history",
        json!({
            "insurer": "CSS", "canton": "ZH", "age_band": "26+", "franchise": 300,
            "start_year": 2023, "end_year": "2024"
        }),
    )
    .await;
    assert!(!text.contains("2016:"));
    assert!(text.contains("Change from 2023 to 2024: +7.2%"));
}

#[tokio::test]
async fn test_price_history_inverted_range() {
    let session = test_session();
    let text = call_tool(
        &session,
        "get_price_history",
        json!({
            "insurer": "CSS", "canton": "ZH", "age_band": "26+", "franchise": 300,
            "start_year": 2025, "end_year": 2016
        }),
    )
    .await;
    assert!(text.starts_with("No price history found"));
}

#[tokio::test]
async fn test_price_history_unknown_insurer() {
    let session = test_session();
    let text = call_tool(
        &session,
        "get_price_history",
        json!({"insurer": "Imaginary", "canton": "ZH", "age_band": "26+", "franchise": 300}),
    )
    .await;
    assert!(text.starts_with("No insurer found for: Imaginary."));
    assert!(text.contains("Known insurers:"));
    assert!(!text.contains(DISCLAIMER_START));
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_database_stats() {
    let session = test_session();
    let text = call_tool(&session, "get_database_stats", json!({})).await;

    assert!(text.contains("Premium records: 13"));
    assert!(text.contains("Insurers: 2"));
    assert!(text.contains("Locations: 3"));
    assert!(text.contains("~8"));
    assert!(text.contains("Years with data: 2016, 2023, 2024, 2025"));
}

// =============================================================================
// Registry and server
// =============================================================================

#[tokio::test]
async fn test_unknown_tool() {
    let session = test_session();
    let err = call_tool_err(&session, "delete_premiums", json!({})).await;
    assert!(matches!(err, McpError::UnknownTool(_)));
}

#[test]
fn test_tool_count() {
    assert_eq!(ToolRegistry::new().tools().len(), 4);
}

#[test]
fn test_all_tools_have_required_fields() {
    let registry = ToolRegistry::new();
    for tool in registry.tools() {
        assert!(!tool.name.is_empty());
        assert!(!tool.description.is_empty());
        assert_eq!(tool.input_schema["type"], "object");
        assert!(tool.input_schema["required"].is_array());
    }
}

#[test]
fn test_no_duplicate_tool_names() {
    let registry = ToolRegistry::new();
    let mut names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), registry.tools().len());
}

#[tokio::test]
async fn test_store_failure_keeps_serving() {
    let session = McpSession::new(MemoryStore::new().failing("upstream unavailable"));
    let mut server = McpServer::new(session);

    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"get_database_stats\"}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"find_cheapest_insurers\",\"arguments\":{\"canton\":\"ZH\"}}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
    );
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<JsonValue> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);

    let stats = &responses[0]["result"];
    assert_eq!(stats["isError"], false);
    assert!(stats["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("upstream unavailable"));

    let cheapest = &responses[1]["result"];
    assert_eq!(cheapest["isError"], true);
    assert!(cheapest["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("missing required argument"));

    assert_eq!(responses[2]["id"], 3);
}

/// Feed newline-delimited requests through a server and collect its responses.
async fn serve_lines(session: McpSession, input: &str) -> Vec<JsonValue> {
    let mut server = McpServer::new(session);
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_missing_credentials_keep_serving() {
    let store = SupabaseStore::from_lookup(|_: &str| None, Duration::from_secs(1));
    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"find_cheapest_insurers\",",
        "\"arguments\":{\"canton\":\"ZH\",\"year\":2025,\"age_band\":\"26+\",\"franchise\":300}}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"get_database_stats\"}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
    );
    let responses = serve_lines(McpSession::new(store), input).await;
    assert_eq!(responses.len(), 3);

    for response in &responses[..2] {
        assert!(response.get("error").is_none());
        let result = &response["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("configuration error"), "unexpected text: {}", text);
        assert!(text.contains("SUPABASE_URL"));
    }

    assert_eq!(responses[2]["id"], 3);
    assert_eq!(responses[2]["result"], json!({}));
}

/// Store whose every call panics.
struct PanickingStore;

#[async_trait]
impl PremiumStore for PanickingStore {
    async fn select(&self, _table: Table, _query: &Query) -> premium_mcp::Result<Vec<JsonValue>> {
        panic!("select exploded");
    }

    async fn count(&self, _table: Table, _query: &Query) -> premium_mcp::Result<u64> {
        panic!("count exploded");
    }
}

#[tokio::test]
async fn test_panicking_tool_keeps_serving() {
    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"get_database_stats\"}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
    );
    let responses = serve_lines(McpSession::new(PanickingStore), input).await;
    assert_eq!(responses.len(), 2);

    let result = &responses[0]["result"];
    assert_eq!(result["isError"], true);
    assert_eq!(
        result["content"][0]["text"],
        "Error: internal error: tool 'get_database_stats' panicked"
    );
    assert_eq!(responses[1]["id"], 2);
}

#[tokio::test]
async fn test_fixture_file_session() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let fixture = json!({
        "premiums": [premium("1542", 2025, "GE", 300, "standard", 510.0)],
        "locations": [{"zip": 1201}]
    });
    write!(file, "{}", fixture).unwrap();

    let session = McpSession::new(MemoryStore::from_file(file.path()).expect("Failed to load fixture"));
    let text = call_tool(
        &session,
        "find_cheapest_insurers",
        json!({"canton": "GE", "year": 2025, "age_band": "26+", "franchise": 300}),
    )
    .await;
    assert!(text.contains("1. Assura: CHF 510.00"));
}
