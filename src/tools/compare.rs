//! Side-by-side comparison of named insurers.
//!
//! Tools: compare_insurers

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::{Map, Value as JsonValue};

use crate::aggregate::{min_per_key, sort_by_premium};
use crate::convert::{get_profile, get_string_array_arg, get_year_arg, rows_to_records};
use crate::error::{McpError, Result};
use crate::format::{chf, percent_change, with_disclaimer};
use crate::insurers::{all_codes_for, name_of};
use crate::profile::Profile;
use crate::schema;
use crate::session::McpSession;
use crate::store::{PremiumStore, Table};
use crate::tools::{profile_query, store_failure, unknown_insurers, ToolDef};

/// Tool name.
pub const NAME: &str = "compare_insurers";

/// Upper bound on rows fetched for one comparison.
const MAX_ROWS: usize = 1000;

/// Get the comparison tool definition.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        NAME,
        "Compare the monthly premiums of several insurers (by name, e.g. 'CSS', 'Helsana') \
         for one canton, year, age band and deductible. Names are matched loosely; \
         unknown names are reported without failing the comparison.",
        schema!(object {
            required: {
                "insurers": array_string,
                "canton": canton,
                "year": year,
                "age_band": age_band,
                "franchise": franchise
            },
            optional: { "model": model, "accident": accident }
        }),
    )]
}

/// Dispatch a comparison tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<String> {
    match name {
        NAME => {
            let names = get_string_array_arg(&args, "insurers")?;
            let profile = get_profile(&args)?;
            let year = get_year_arg(&args, "year")?;
            compare_insurers(session.store(), &names, &profile, year).await
        }
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Compare the cheapest premium of each named insurer.
pub async fn compare_insurers(
    store: &dyn PremiumStore,
    names: &[String],
    profile: &Profile,
    year: i32,
) -> Result<String> {
    let mut resolved: Vec<(&str, BTreeSet<String>)> = Vec::new();
    let mut not_found: Vec<String> = Vec::new();
    for name in names {
        let codes = all_codes_for(name);
        if codes.is_empty() {
            not_found.push(name.clone());
        } else {
            resolved.push((name.as_str(), codes));
        }
    }

    if resolved.is_empty() {
        return Ok(unknown_insurers(&not_found));
    }

    let union: BTreeSet<&String> = resolved.iter().flat_map(|(_, codes)| codes).collect();
    let query = profile_query(profile)
        .eq("year", year)
        .is_in("insurer_id", union)
        .order("monthly_premium", true)
        .limit(MAX_ROWS);

    let rows = match store.select(Table::Premiums, &query).await {
        Ok(rows) => rows,
        Err(err) if err.is_store_error() => {
            return Ok(store_failure("loading premiums", &err));
        }
        Err(err) => return Err(err),
    };
    if rows.len() == MAX_ROWS {
        tracing::warn!(year, "insurer comparison hit the {} row cap", MAX_ROWS);
    }
    let records = rows_to_records(rows)?;

    // a code may belong to more than one search name; it counts for each
    let tagged = records.iter().flat_map(|record| {
        resolved
            .iter()
            .filter(move |(_, codes)| codes.contains(&record.insurer_id))
            .map(move |(name, _)| (*name, record.clone()))
    });
    let mut groups = min_per_key(tagged);
    sort_by_premium(&mut groups);

    let mut out = String::new();
    if groups.is_empty() {
        let _ = write!(out, "No premiums found for {} in {}.", profile, year);
    } else {
        let _ = write!(out, "Premium comparison for {} in {}:\n", profile, year);
        for (rank, (name, record)) in groups.iter().enumerate() {
            let _ = write!(
                out,
                "\n{}. {}: {} per month",
                rank + 1,
                name,
                chf(record.monthly_premium)
            );
            let brand = name_of(&record.insurer_id);
            if !brand.eq_ignore_ascii_case(name) {
                let _ = write!(out, " ({})", brand);
            }
        }

        if groups.len() >= 2 {
            let cheapest = groups[0].1.monthly_premium;
            let priciest = groups[groups.len() - 1].1.monthly_premium;
            let _ = write!(
                out,
                "\n\nSpread: {} per month between cheapest and most expensive",
                chf(priciest - cheapest)
            );
            if let Some(pct) = percent_change(cheapest, priciest) {
                let _ = write!(out, " ({:.1}% more)", pct);
            }
            out.push('.');
        }
    }

    let without_data: Vec<&str> = resolved
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !groups.iter().any(|(g, _)| g == name))
        .collect();
    if !groups.is_empty() && !without_data.is_empty() {
        let _ = write!(
            out,
            "\n\nNo premiums for this profile: {}.",
            without_data.join(", ")
        );
    }
    if !not_found.is_empty() {
        let _ = write!(out, "\n\nNot found: {}.", not_found.join(", "));
    }

    Ok(with_disclaimer(&out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DISCLAIMER;
    use crate::profile::{AgeBand, Model};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn profile() -> Profile {
        Profile {
            canton: "BE".into(),
            age_band: AgeBand::Adult,
            franchise: 2500,
            model: Model::Standard,
            accident: true,
        }
    }

    fn row(code: &str, premium: f64) -> JsonValue {
        json!({
            "canton": "BE", "year": 2025, "age_band": "26+", "franchise": 2500,
            "model": "standard", "accident": true,
            "insurer_id": code, "monthly_premium": premium
        })
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_rows(
            Table::Premiums,
            vec![
                row("0008", 330.0),
                row("1507", 310.0),
                row("1562", 350.0),
                row("1322", 340.0),
                row("1542", 300.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_groups_by_search_name() {
        let text = compare_insurers(&store(), &names(&["Helsana", "CSS"]), &profile(), 2025)
            .await
            .unwrap();

        assert!(text.contains("1. CSS: CHF 310.00"));
        assert!(text.contains("2. Helsana: CHF 340.00"));
        assert!(text.contains("Spread: CHF 30.00"));
        assert!(text.contains("9.7% more"));
        assert!(text.ends_with(DISCLAIMER));
    }

    #[tokio::test]
    async fn test_partial_not_found() {
        let text = compare_insurers(&store(), &names(&["CSS", "Acme Health"]), &profile(), 2025)
            .await
            .unwrap();

        assert!(text.contains("1. CSS: CHF 310.00"));
        assert!(!text.contains("Spread"));
        assert!(text.contains("Not found: Acme Health."));
    }

    #[tokio::test]
    async fn test_all_unknown_lists_known_names() {
        let text = compare_insurers(&store(), &names(&["Acme", "Foo"]), &profile(), 2025)
            .await
            .unwrap();
        assert!(text.starts_with("No insurer found for: Acme, Foo."));
        assert!(text.contains("Known insurers:"));
        assert!(!text.contains(DISCLAIMER));
    }

    #[tokio::test]
    async fn test_resolved_without_rows() {
        let text = compare_insurers(&store(), &names(&["CSS", "SWICA"]), &profile(), 2025)
            .await
            .unwrap();
        assert!(text.contains("1. CSS"));
        assert!(text.contains("No premiums for this profile: SWICA."));

        let text = compare_insurers(&store(), &names(&["SWICA"]), &profile(), 2020)
            .await
            .unwrap();
        assert!(text.starts_with("No premiums found for canton BE"));
    }

    #[tokio::test]
    async fn test_brand_shown_when_search_name_differs() {
        let text = compare_insurers(&store(), &names(&["css"]), &profile(), 2025)
            .await
            .unwrap();
        assert!(text.contains("1. css: CHF 310.00"));
        assert!(!text.contains("(CSS)"));

        let text = compare_insurers(&store(), &names(&["Assu"]), &profile(), 2025)
            .await
            .unwrap();
        assert!(text.contains("1. Assu: CHF 300.00 per month (Assura)"));
    }
}
