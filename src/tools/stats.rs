//! Database overview.
//!
//! Tools: get_database_stats

use std::collections::BTreeSet;
use std::fmt::Write as _;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::format::{thousands, with_disclaimer};
use crate::insurers::normalize_code;
use crate::profile::{FIRST_YEAR, LAST_YEAR};
use crate::schema;
use crate::session::McpSession;
use crate::store::{PremiumStore, Query, Table};
use crate::tools::{store_failure, ToolDef};

/// Tool name.
pub const NAME: &str = "get_database_stats";

/// Premium rows sampled for the distinct-insurer estimate.
pub const INSURER_SAMPLE: usize = 1000;

/// Get the statistics tool definition.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        NAME,
        "Get an overview of the premium database: number of premium records, insurers and \
         locations, and the years for which premium data is available.",
        schema!(object {}),
    )]
}

/// Dispatch a statistics tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    _args: Map<String, JsonValue>,
) -> Result<String> {
    match name {
        NAME => database_stats(session.store()).await,
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Aggregate counts reported by the statistics tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Rows in `premiums`
    pub premiums: u64,
    /// Rows in `insurers`
    pub insurers: u64,
    /// Rows in `locations`
    pub locations: u64,
    /// Distinct insurer codes among the sampled premium rows
    pub sampled_insurers: usize,
    /// Premium rows actually sampled
    pub sample_size: usize,
    /// Candidate years with at least one premium row
    pub years: Vec<i32>,
}

#[derive(Deserialize)]
struct InsurerRef {
    #[serde(default)]
    insurer_id: JsonValue,
}

/// Collect the counts. Independent requests are issued concurrently.
///
/// The distinct-insurer figure comes from a bounded sample of premium rows,
/// not from a full scan, and is reported as an approximation.
pub async fn collect_stats(store: &dyn PremiumStore) -> Result<DatabaseStats> {
    let all = Query::new();
    let counts = futures::future::try_join3(
        store.count(Table::Premiums, &all),
        store.count(Table::Insurers, &all),
        store.count(Table::Locations, &all),
    );

    let probes: Vec<Query> = (FIRST_YEAR..=LAST_YEAR)
        .map(|year| Query::new().eq("year", year))
        .collect();
    let year_counts = try_join_all(
        probes
            .iter()
            .map(|probe| store.count(Table::Premiums, probe)),
    );

    let sample_query = Query::new().select(&["insurer_id"]).limit(INSURER_SAMPLE);
    let sample = store.select(Table::Premiums, &sample_query);

    let ((premiums, insurers, locations), year_counts, sample) =
        futures::try_join!(counts, year_counts, sample)?;

    let years = (FIRST_YEAR..=LAST_YEAR)
        .zip(year_counts)
        .filter(|(_, count)| *count > 0)
        .map(|(year, _)| year)
        .collect();

    let sample_size = sample.len();
    let distinct: BTreeSet<String> = sample
        .into_iter()
        .filter_map(|row| serde_json::from_value::<InsurerRef>(row).ok())
        .filter_map(|r| match r.insurer_id {
            JsonValue::String(s) => Some(normalize_code(&s)),
            JsonValue::Number(n) => Some(normalize_code(&n.to_string())),
            _ => None,
        })
        .collect();

    Ok(DatabaseStats {
        premiums,
        insurers,
        locations,
        sampled_insurers: distinct.len(),
        sample_size,
        years,
    })
}

/// Render the statistics text.
pub async fn database_stats(store: &dyn PremiumStore) -> Result<String> {
    let stats = match collect_stats(store).await {
        Ok(stats) => stats,
        Err(err) if err.is_store_error() => {
            return Ok(store_failure("collecting statistics", &err));
        }
        Err(err) => return Err(err),
    };

    let mut out = String::from("Premium database statistics:\n");
    let _ = write!(out, "\nPremium records: {}", thousands(stats.premiums));
    let _ = write!(out, "\nInsurers: {}", thousands(stats.insurers));
    let _ = write!(out, "\nLocations: {}", thousands(stats.locations));
    let _ = write!(
        out,
        "\nInsurers with premium data: ~{} (estimated from a sample of {} premium rows)",
        stats.sampled_insurers,
        thousands(stats.sample_size as u64)
    );

    let years = if stats.years.is_empty() {
        "none".to_string()
    } else {
        stats
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = write!(out, "\nYears with data: {}", years);

    Ok(with_disclaimer(&out))
}
