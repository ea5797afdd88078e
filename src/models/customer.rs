//! Loyalty API Payload Types
//!
//! The upstream payload is loosely typed: numbers arrive as strings or numbers,
//! booleans as `"true"`/`"false"`, and single-element lists sometimes as a bare
//! object. These types accept all of those shapes and keep unknown fields in a
//! flattened extension map so failed lookups can carry the record through.
//! A section of the wrong shape decodes as its default and a list element that
//! cannot be read is dropped, so decoding the envelope itself never fails on
//! one bad record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Top-level body of a customer details response
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CustomerDetailsResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub response: ResponseBody,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseBody {
    #[serde(default, deserialize_with = "lenient")]
    pub status: ResponseStatus,

    #[serde(default, deserialize_with = "lenient")]
    pub customers: CustomerList,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub code: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseStatus {
    /// Numeric status code, if the payload carried one
    pub fn code(&self) -> Option<i64> {
        loose_number(&self.code).map(|code| code as i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CustomerList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub customer: Vec<Customer>,
}

/// One matched customer record
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "loose_string")]
    pub external_id: String,

    #[serde(default, deserialize_with = "loose_optional_string")]
    pub firstname: Option<String>,

    #[serde(default, deserialize_with = "loose_optional_string")]
    pub lastname: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub item_status: ItemStatus,

    #[serde(default, deserialize_with = "lenient")]
    pub points_summaries: PointsSummaries,

    #[serde(default, deserialize_with = "one_or_many")]
    pub expiry_schedule: Vec<ExpirySchedule>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// First points summary entry, the only one used for balances
    pub fn primary_summary(&self) -> Option<&PointsSummary> {
        self.points_summaries.points_summary.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub success: Value,

    #[serde(default)]
    pub code: Value,

    #[serde(default, deserialize_with = "loose_optional_string")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemStatus {
    pub fn is_success(&self) -> bool {
        match &self.success {
            Value::Bool(success) => *success,
            Value::String(success) => success.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PointsSummaries {
    #[serde(default, deserialize_with = "one_or_many")]
    pub points_summary: Vec<PointsSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PointsSummary {
    #[serde(rename = "loyaltyPoints", default)]
    pub loyalty_points: Value,

    #[serde(rename = "lifetimePoints", default)]
    pub lifetime_points: Value,

    #[serde(default)]
    pub expired: Value,

    #[serde(default)]
    pub redeemed: Value,

    #[serde(default)]
    pub returned: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One expiring tranche of points
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExpirySchedule {
    #[serde(default, deserialize_with = "loose_string")]
    pub expiry_date: String,

    #[serde(default)]
    pub points: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Interpret a loosely typed value as a finite number
///
/// Numbers pass through, numeric strings are parsed (an empty string counts
/// as zero), anything else is `None`.
pub fn loose_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// A section that is null, blank or the wrong shape reads as its default
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A list, a bare single element, or nothing
///
/// Elements that do not fit `T` are dropped so one malformed sibling cannot
/// spoil the rest of the list.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn loose_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
