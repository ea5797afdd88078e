//! Raw User Record
//!
//! One row of the source export. The identity columns are named fields; any
//! other column is kept verbatim in `extra` so nothing in the export is lost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::columns;
use crate::error::{MigrationError, Result};

/// A source row, immutable once read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserRecord {
    /// External identifier used to look the user up in the loyalty API
    pub loyalty_user_id: String,

    #[serde(default)]
    pub current_tier: String,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,

    /// Remaining columns, keyed by header name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl RawUserRecord {
    pub fn new(loyalty_user_id: impl Into<String>) -> Self {
        Self {
            loyalty_user_id: loyalty_user_id.into(),
            current_tier: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Build a record from a column map, validating the identifier column
    pub fn from_columns(mut columns: BTreeMap<String, String>) -> Result<Self> {
        let loyalty_user_id = columns
            .remove(columns::LOYALTY_USER_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                MigrationError::invalid_input(format!(
                    "record is missing a value for '{}'",
                    columns::LOYALTY_USER_ID
                ))
            })?;

        Ok(Self {
            loyalty_user_id,
            current_tier: columns.remove(columns::CURRENT_TIER).unwrap_or_default(),
            created_at: columns.remove(columns::CREATED_AT).unwrap_or_default(),
            updated_at: columns.remove(columns::UPDATED_AT).unwrap_or_default(),
            extra: columns,
        })
    }

    /// Look up any column by its header name
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            columns::LOYALTY_USER_ID => Some(self.loyalty_user_id.as_str()),
            columns::CURRENT_TIER => Some(self.current_tier.as_str()),
            columns::CREATED_AT => Some(self.created_at.as_str()),
            columns::UPDATED_AT => Some(self.updated_at.as_str()),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
