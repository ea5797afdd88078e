//! Derivation of wallet data from a matched customer record.
//!
//! Pure functions: given the same customer twice they derive identical
//! balances and allocation amounts. Only the generated ids differ.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::constants::allocation::{POINTS_ADDED, POINTS_TO_MIGRATE};
use crate::models::{
    loose_number, Customer, PointAllocation, PointBalances, TransactionAudit, UserResult,
};

/// `"first last"`, or empty when both name parts are blank
pub fn display_name(customer: &Customer) -> String {
    let first = customer.firstname.as_deref().unwrap_or("").trim();
    let last = customer.lastname.as_deref().unwrap_or("").trim();
    if first.is_empty() && last.is_empty() {
        String::new()
    } else {
        format!("{first} {last}").trim().to_string()
    }
}

/// Balances from the first points summary; missing or non-numeric values are 0
pub fn point_balances(customer: &Customer) -> PointBalances {
    let Some(summary) = customer.primary_summary() else {
        return PointBalances::default();
    };
    let number = |value: &Value| loose_number(value).unwrap_or(0.0);

    PointBalances {
        current_balance: number(&summary.loyalty_points),
        lifetime_earned_points: number(&summary.lifetime_points),
        lifetime_expired_points: number(&summary.expired),
        lifetime_redeemed_points: number(&summary.redeemed),
        lifetime_returned_points: number(&summary.returned),
    }
}

pub fn transaction_audit(loyalty_user_id: &str) -> TransactionAudit {
    TransactionAudit {
        id: Uuid::new_v4(),
        loyalty_user_id: loyalty_user_id.to_string(),
        transaction_reference_id: Uuid::new_v4(),
        created_by: loyalty_user_id.to_string(),
        request_payload: json!({
            "loyalty_user_id": loyalty_user_id,
            "points_to_migrate": POINTS_TO_MIGRATE,
        }),
    }
}

/// One allocation, each with its own audit, per expiry-schedule entry
///
/// Every allocation carries the full current balance; the entry contributes
/// only its expiry date.
pub fn point_allocations(
    customer: &Customer,
    wallet_id: Uuid,
    current_balance: f64,
) -> Vec<PointAllocation> {
    customer
        .expiry_schedule
        .iter()
        .map(|entry| {
            let audit = transaction_audit(&customer.external_id);
            PointAllocation {
                id: Uuid::new_v4(),
                allocation_type: POINTS_ADDED.to_string(),
                points: current_balance,
                remaining_points: current_balance,
                expires_at: entry.expiry_date.clone(),
                wallet_id,
                loyalty_rule_engine_transaction_id: audit.id,
                created_by: customer.external_id.clone(),
                audit,
            }
        })
        .collect()
}

/// Fill a pending result from a successful customer match
pub fn apply_customer(mut result: UserResult, customer: &Customer) -> UserResult {
    let balances = point_balances(customer);
    result.name = display_name(customer);
    result.balances = balances;
    result.is_multiple_points_expiry = !customer.expiry_schedule.is_empty();
    result.point_allocations = point_allocations(customer, result.id, balances.current_balance);
    result.success = true;
    result.error = None;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawUserRecord;
    use proptest::prelude::*;

    fn customer(value: Value) -> Customer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_display_name() {
        let c = customer(json!({"external_id": "u1", "firstname": "Ada", "lastname": "Lovelace"}));
        assert_eq!(display_name(&c), "Ada Lovelace");

        let c = customer(json!({"external_id": "u1", "firstname": " ", "lastname": ""}));
        assert_eq!(display_name(&c), "");

        let c = customer(json!({"external_id": "u1", "firstname": "Ada"}));
        assert_eq!(display_name(&c), "Ada");
    }

    #[test]
    fn test_point_balances_default_to_zero() {
        let c = customer(json!({
            "external_id": "u1",
            "points_summaries": {"points_summary": [{
                "loyaltyPoints": "120.5",
                "lifetimePoints": 300,
                "expired": "abc",
                "redeemed": null
            }]}
        }));

        let balances = point_balances(&c);
        assert_eq!(balances.current_balance, 120.5);
        assert_eq!(balances.lifetime_earned_points, 300.0);
        assert_eq!(balances.lifetime_expired_points, 0.0);
        assert_eq!(balances.lifetime_redeemed_points, 0.0);
        assert_eq!(balances.lifetime_returned_points, 0.0);

        assert!(point_balances(&customer(json!({"external_id": "u2"}))).is_zero());
    }

    #[test]
    fn test_allocations_follow_expiry_schedule() {
        let c = customer(json!({
            "external_id": "u1",
            "points_summaries": {"points_summary": {"loyaltyPoints": "50"}},
            "expiry_schedule": [
                {"expiry_date": "2025-01-01 00:00:00", "points": "30"},
                {"expiry_date": "2025-06-01 00:00:00"}
            ]
        }));
        let wallet_id = Uuid::new_v4();

        let allocations = point_allocations(&c, wallet_id, 50.0);
        assert_eq!(allocations.len(), 2);

        for allocation in &allocations {
            assert_eq!(allocation.allocation_type, "POINTS_ADDED");
            assert_eq!(allocation.points, 50.0);
            assert_eq!(allocation.remaining_points, 50.0);
            assert_eq!(allocation.wallet_id, wallet_id);
            assert_eq!(allocation.loyalty_rule_engine_transaction_id, allocation.audit.id);
            assert_eq!(allocation.created_by, "u1");
            assert_eq!(allocation.audit.request_payload["points_to_migrate"], "loyalty_points");
        }
        assert_ne!(allocations[0].audit.id, allocations[1].audit.id);
        assert_eq!(allocations[1].expires_at, "2025-06-01 00:00:00");
    }

    #[test]
    fn test_apply_customer_marks_success() {
        let record = RawUserRecord::new("u1");
        let c = customer(json!({
            "external_id": "u1",
            "firstname": "Ada",
            "lastname": "Lovelace",
            "points_summaries": {"points_summary": [{"loyaltyPoints": 10}]},
            "expiry_schedule": {"expiry_date": "2025-01-01", "points": 10}
        }));

        let result = apply_customer(UserResult::pending(&record, "prog"), &c);
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(result.is_multiple_points_expiry);
        assert_eq!(result.name, "Ada Lovelace");
        assert_eq!(result.point_allocations.len(), 1);
        assert_eq!(result.point_allocations[0].wallet_id, result.id);
    }

    proptest! {
        #[test]
        fn prop_derivation_is_idempotent(
            points in prop::collection::vec(0u32..100_000, 0..8),
            balance in 0u32..1_000_000,
        ) {
            let schedule: Vec<Value> = points
                .iter()
                .map(|p| json!({"expiry_date": "2030-01-01", "points": p.to_string()}))
                .collect();
            let c = customer(json!({
                "external_id": "u1",
                "points_summaries": {"points_summary": [{"loyaltyPoints": balance}]},
                "expiry_schedule": schedule,
            }));
            let record = RawUserRecord::new("u1");

            let first = apply_customer(UserResult::pending(&record, ""), &c);
            let second = apply_customer(UserResult::pending(&record, ""), &c);

            prop_assert_eq!(first.balances, second.balances);
            prop_assert_eq!(first.point_allocations.len(), points.len());
            prop_assert_eq!(first.is_multiple_points_expiry, !points.is_empty());
            let amounts = |r: &UserResult| r.point_allocations.iter().map(|a| a.points).collect::<Vec<_>>();
            prop_assert_eq!(amounts(&first), amounts(&second));
            prop_assert!(amounts(&first).iter().all(|a| *a == f64::from(balance)));
            prop_assert_ne!(first.id, second.id);
        }
    }
}
