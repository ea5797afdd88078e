//! User Results and Derived Wallet Data
//!
//! A [`UserResult`] is the outcome of processing one source record. Successful
//! results carry balances and point allocations derived from the loyalty API;
//! failed results carry zeroed balances and an error description.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::record::RawUserRecord;

/// Point balance fields of a wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointBalances {
    pub current_balance: f64,
    pub lifetime_earned_points: f64,
    pub lifetime_expired_points: f64,
    pub lifetime_redeemed_points: f64,
    pub lifetime_returned_points: f64,
}

impl PointBalances {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of processing one [`RawUserRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResult {
    /// Wallet id, generated once per processing attempt
    pub id: Uuid,
    pub loyalty_user_id: String,
    pub current_tier_id: String,
    pub loyalty_programme_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
    pub updated_by: String,
    pub name: String,

    #[serde(flatten)]
    pub balances: PointBalances,

    pub is_multiple_points_expiry: bool,

    #[serde(default)]
    pub point_allocations: Vec<PointAllocation>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Customer record returned for a lookup that did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Value>,
}

impl UserResult {
    /// Result skeleton carrying the record's identity and a fresh wallet id
    pub fn pending(record: &RawUserRecord, loyalty_programme_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            loyalty_user_id: record.loyalty_user_id.clone(),
            current_tier_id: record.current_tier.clone(),
            loyalty_programme_id: loyalty_programme_id.to_string(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
            created_by: record.loyalty_user_id.clone(),
            updated_by: record.loyalty_user_id.clone(),
            name: String::new(),
            balances: PointBalances::default(),
            is_multiple_points_expiry: false,
            point_allocations: Vec::new(),
            success: false,
            error: None,
            customer: None,
        }
    }

    /// Failed result with zeroed balances
    pub fn failed(
        record: &RawUserRecord,
        loyalty_programme_id: &str,
        error: impl Into<String>,
    ) -> Self {
        let mut result = Self::pending(record, loyalty_programme_id);
        result.error = Some(error.into());
        result
    }

    /// Attach the customer record returned for a failed lookup
    pub fn with_customer(mut self, customer: Option<Value>) -> Self {
        self.customer = customer;
        self
    }

    pub fn wallet(&self) -> UserWallet {
        UserWallet::from(self)
    }
}

/// One expiring tranche of migrated points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAllocation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub allocation_type: String,
    pub points: f64,
    pub remaining_points: f64,
    pub expires_at: String,
    pub wallet_id: Uuid,
    /// Id of the embedded audit record
    pub loyalty_rule_engine_transaction_id: Uuid,
    pub created_by: String,
    pub audit: TransactionAudit,
}

/// Audit trail entry owned by exactly one [`PointAllocation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAudit {
    pub id: Uuid,
    pub loyalty_user_id: String,
    pub transaction_reference_id: Uuid,
    pub created_by: String,
    pub request_payload: Value,
}

/// Wallet projection of a successful [`UserResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWallet {
    pub id: Uuid,
    pub loyalty_user_id: String,
    pub current_tier_id: String,
    pub loyalty_programme_id: String,
    pub name: String,
    #[serde(flatten)]
    pub balances: PointBalances,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
    pub updated_by: String,
}

impl From<&UserResult> for UserWallet {
    fn from(result: &UserResult) -> Self {
        Self {
            id: result.id,
            loyalty_user_id: result.loyalty_user_id.clone(),
            current_tier_id: result.current_tier_id.clone(),
            loyalty_programme_id: result.loyalty_programme_id.clone(),
            name: result.name.clone(),
            balances: result.balances,
            created_at: result.created_at.clone(),
            updated_at: result.updated_at.clone(),
            created_by: result.created_by.clone(),
            updated_by: result.updated_by.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAllocationRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub allocation_type: String,
    pub points: f64,
    pub remaining_points: f64,
    pub expires_at: String,
    pub wallet_id: Uuid,
    pub loyalty_rule_engine_transaction_id: Uuid,
    pub created_by: String,
}

impl From<&PointAllocation> for PointAllocationRecord {
    fn from(allocation: &PointAllocation) -> Self {
        Self {
            id: allocation.id,
            allocation_type: allocation.allocation_type.clone(),
            points: allocation.points,
            remaining_points: allocation.remaining_points,
            expires_at: allocation.expires_at.clone(),
            wallet_id: allocation.wallet_id,
            loyalty_rule_engine_transaction_id: allocation.loyalty_rule_engine_transaction_id,
            created_by: allocation.created_by.clone(),
        }
    }
}
