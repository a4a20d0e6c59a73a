//! Cheapest insurers for a premium profile.
//!
//! Tools: find_cheapest_insurers

use std::fmt::Write as _;

use serde_json::{Map, Value as JsonValue};

use crate::aggregate::{min_per_group, sort_by_premium};
use crate::convert::{get_profile, get_year_arg, rows_to_records};
use crate::error::{McpError, Result};
use crate::format::{chf, with_disclaimer};
use crate::insurers::name_of;
use crate::profile::Profile;
use crate::schema;
use crate::session::McpSession;
use crate::store::{PremiumStore, Table};
use crate::tools::{profile_query, store_failure, ToolDef};

/// Tool name.
pub const NAME: &str = "find_cheapest_insurers";

/// Rows fetched before grouping.
const PREFETCH: usize = 10;
/// Insurers shown.
const TOP: usize = 5;

/// Get the cheapest-insurers tool definition.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        NAME,
        "Find the five cheapest health insurers for a canton, year, age band and deductible. \
         Premiums of merged insurer entities are combined under one brand name. \
         Model defaults to 'standard' and accident coverage to included.",
        schema!(object {
            required: { "canton": canton, "year": year, "age_band": age_band, "franchise": franchise },
            optional: { "model": model, "accident": accident }
        }),
    )]
}

/// Dispatch a cheapest-insurers tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<String> {
    match name {
        NAME => {
            let profile = get_profile(&args)?;
            let year = get_year_arg(&args, "year")?;
            find_cheapest(session.store(), &profile, year).await
        }
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Rank the cheapest brands for `profile` in `year`.
pub async fn find_cheapest(
    store: &dyn PremiumStore,
    profile: &Profile,
    year: i32,
) -> Result<String> {
    let query = profile_query(profile)
        .eq("year", year)
        .order("monthly_premium", true)
        .limit(PREFETCH);

    let rows = match store.select(Table::Premiums, &query).await {
        Ok(rows) => rows,
        Err(err) if err.is_store_error() => {
            return Ok(store_failure("loading premiums", &err));
        }
        Err(err) => return Err(err),
    };
    let records = rows_to_records(rows)?;

    if records.is_empty() {
        return Ok(with_disclaimer(&format!(
            "No premiums found for {} in {}.",
            profile, year
        )));
    }

    // rows arrive price-ascending, so a tie keeps the cheaper-listed entity
    let mut groups = min_per_group(records, |r| name_of(&r.insurer_id));
    sort_by_premium(&mut groups);
    groups.truncate(TOP);

    let mut out = format!("Cheapest insurers for {} in {}:\n", profile, year);
    for (rank, (name, record)) in groups.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {}: {} per month",
            rank + 1,
            name,
            chf(record.monthly_premium)
        );
        if let Some(tariff) = record.tariff_name.as_deref().filter(|t| !t.is_empty()) {
            let _ = write!(out, " (tariff {})", tariff);
        }
    }

    Ok(with_disclaimer(&out))
}
