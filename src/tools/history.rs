//! Premium history of one insurer over several years.
//!
//! Tools: get_price_history

use std::fmt::Write as _;

use serde_json::{Map, Value as JsonValue};

use crate::aggregate::min_per_group;
use crate::convert::{get_optional_year, get_profile, get_string_arg, rows_to_records};
use crate::error::{McpError, Result};
use crate::format::{chf, percent_change, signed_percent, with_disclaimer};
use crate::insurers::{all_codes_for, name_of, primary_code_for};
use crate::profile::{Profile, FIRST_YEAR, LAST_YEAR};
use crate::schema;
use crate::session::McpSession;
use crate::store::{PremiumStore, Table};
use crate::tools::{profile_query, store_failure, unknown_insurers, ToolDef};

/// Tool name.
pub const NAME: &str = "get_price_history";

/// Upper bound on rows fetched for one history.
const MAX_ROWS: usize = 1000;

/// Get the price history tool definition.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        NAME,
        "Show how an insurer's cheapest monthly premium developed over the years for a canton, \
         age band and deductible, with the overall change in percent. \
         Defaults to the years 2016 to 2026.",
        schema!(object {
            required: {
                "insurer": string,
                "canton": canton,
                "age_band": age_band,
                "franchise": franchise
            },
            optional: {
                "start_year": year,
                "end_year": year,
                "model": model,
                "accident": accident
            }
        }),
    )]
}

/// Dispatch a price history tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<String> {
    match name {
        NAME => {
            let insurer = get_string_arg(&args, "insurer")?;
            let profile = get_profile(&args)?;
            let start = get_optional_year(&args, "start_year")?.unwrap_or(FIRST_YEAR);
            let end = get_optional_year(&args, "end_year")?.unwrap_or(LAST_YEAR);
            price_history(session.store(), &insurer, &profile, start, end).await
        }
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Cheapest premium per year for every code of `insurer`, `start..=end`.
pub async fn price_history(
    store: &dyn PremiumStore,
    insurer: &str,
    profile: &Profile,
    start: i32,
    end: i32,
) -> Result<String> {
    let codes = all_codes_for(insurer);
    if codes.is_empty() {
        return Ok(unknown_insurers(&[insurer.trim().to_string()]));
    }
    let label = primary_code_for(insurer)
        .map(|code| name_of(&code))
        .unwrap_or_else(|| insurer.trim().to_string());

    let not_found = || {
        with_disclaimer(&format!(
            "No price history found for {} ({}) between {} and {}.",
            label, profile, start, end
        ))
    };
    if start > end {
        return Ok(not_found());
    }

    let query = profile_query(profile)
        .gte("year", start)
        .lte("year", end)
        .is_in("insurer_id", &codes)
        .order("year", false)
        .limit(MAX_ROWS);

    let rows = match store.select(Table::Premiums, &query).await {
        Ok(rows) => rows,
        Err(err) if err.is_store_error() => {
            return Ok(store_failure("loading price history", &err));
        }
        Err(err) => return Err(err),
    };
    // newest first, so a truncated fetch loses the oldest years
    if rows.len() == MAX_ROWS {
        tracing::warn!(insurer = %label, start, end, "price history hit the {} row cap", MAX_ROWS);
    }
    let records = rows_to_records(rows)?;

    let mut years = min_per_group(records, |r| r.year);
    years.sort_by_key(|(year, _)| *year);
    if years.is_empty() {
        return Ok(not_found());
    }

    let mut out = format!("Price history for {} ({}):\n", label, profile);
    for (year, record) in &years {
        let _ = write!(out, "\n{}: {} per month", year, chf(record.monthly_premium));
    }

    if years.len() >= 2 {
        let (first_year, first) = &years[0];
        let (last_year, last) = &years[years.len() - 1];
        if let Some(pct) = percent_change(first.monthly_premium, last.monthly_premium) {
            let _ = write!(
                out,
                "\n\nChange from {} to {}: {}",
                first_year,
                last_year,
                signed_percent(pct)
            );
        }
    }

    Ok(with_disclaimer(&out))
}
