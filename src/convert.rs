//! Conversion utilities between JSON tool arguments and typed values.
//!
//! Also decodes premium rows returned by the store.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::insurers::normalize_code;
use crate::profile::{
    check_deductible, parse_canton, AgeBand, Model, Profile, FIRST_YEAR, LAST_YEAR,
};

/// One row of the `premiums` table. Columns not selected are left at their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct PremiumRecord {
    /// Canton code
    pub canton: String,
    /// Premium year
    pub year: i32,
    /// Age band column value
    pub age_band: String,
    /// Deductible in CHF
    pub franchise: u32,
    /// Model column value
    pub model: String,
    /// Accident coverage flag
    pub accident: bool,
    /// Normalized 4-digit insurer code
    #[serde(deserialize_with = "code_from_any")]
    pub insurer_id: String,
    /// Monthly premium in CHF
    pub monthly_premium: f64,
    /// Tariff name, when published
    pub tariff_name: Option<String>,
}

/// Insurer codes arrive as text or as integers depending on the column type.
fn code_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::String(s) => normalize_code(&s),
        JsonValue::Number(n) => normalize_code(&n.to_string()),
        _ => String::new(),
    })
}

/// Decode raw store rows into premium records.
pub fn rows_to_records(rows: Vec<JsonValue>) -> Result<Vec<PremiumRecord>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| McpError::Internal(format!("Unexpected premium row: {}", e)))
        })
        .collect()
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get an optional string argument; present but not a string is an error.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Result<Option<String>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(McpError::invalid_arg(name, "Expected a string")),
    }
}

/// Integers may be sent as numbers or numeric strings.
fn as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Helper to get a required integer argument.
pub fn get_i64_arg(args: &Map<String, JsonValue>, name: &str) -> Result<i64> {
    let value = args
        .get(name)
        .ok_or_else(|| McpError::MissingArg(name.to_string()))?;
    as_i64(value).ok_or_else(|| McpError::invalid_arg(name, "Expected an integer"))
}

/// Helper to get an optional integer argument; present but malformed is an error.
pub fn get_optional_i64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<i64>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => as_i64(value)
            .map(Some)
            .ok_or_else(|| McpError::invalid_arg(name, "Expected an integer")),
    }
}

/// Helper to get an optional boolean argument; present but not a boolean is an error.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Result<Option<bool>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(McpError::invalid_arg(name, "Expected true or false")),
    }
}

/// Helper to get a required, non-empty array of strings.
pub fn get_string_array_arg(args: &Map<String, JsonValue>, name: &str) -> Result<Vec<String>> {
    let arr = args
        .get(name)
        .and_then(|v| v.as_array())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))?;

    let items = arr
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| McpError::invalid_arg(name, "Expected array of strings"))
        })
        .collect::<Result<Vec<_>>>()?;

    let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        return Err(McpError::invalid_arg(name, "At least one entry is required"));
    }
    Ok(items)
}

/// Helper to get a year argument as `i32`.
pub fn get_year_arg(args: &Map<String, JsonValue>, name: &str) -> Result<i32> {
    to_year(name, get_i64_arg(args, name)?)
}

/// Helper to get an optional year argument as `i32`.
pub fn get_optional_year(args: &Map<String, JsonValue>, name: &str) -> Result<Option<i32>> {
    get_optional_i64(args, name)?
        .map(|y| to_year(name, y))
        .transpose()
}

fn to_year(name: &str, year: i64) -> Result<i32> {
    i32::try_from(year)
        .ok()
        .filter(|y| (FIRST_YEAR..=LAST_YEAR).contains(y))
        .ok_or_else(|| {
            McpError::invalid_arg(
                name,
                format!("{} is outside {}-{}", year, FIRST_YEAR, LAST_YEAR),
            )
        })
}

/// Build the profile filter from `canton`, `age_band`, `franchise`, `model` and `accident`.
pub fn get_profile(args: &Map<String, JsonValue>) -> Result<Profile> {
    let canton = parse_canton(&get_string_arg(args, "canton")?)?;
    let age_band: AgeBand = get_string_arg(args, "age_band")?.parse()?;

    let franchise = get_i64_arg(args, "franchise")?;
    let franchise = u32::try_from(franchise)
        .map_err(|_| McpError::invalid_arg("franchise", "Deductible must not be negative"))?;
    let franchise = check_deductible(age_band, franchise)?;

    let model = match get_optional_string(args, "model")? {
        Some(raw) => raw.parse::<Model>()?,
        None => Model::default(),
    };
    let accident = get_optional_bool(args, "accident")?.unwrap_or(true);

    Ok(Profile {
        canton,
        age_band,
        franchise,
        model,
        accident,
    })
}
