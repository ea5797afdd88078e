//! # System Constants
//!
//! Fixed tags, protocol values and default knobs that define the operational
//! boundaries of a migration run.

/// Loyalty details API protocol values
pub mod api {
    /// Path of the customer details endpoint
    pub const CUSTOMER_DETAILS_PATH: &str = "/v1.1/customer/get";

    /// Top-level response codes that indicate a usable payload
    pub const SUCCESS_STATUS_CODES: &[i64] = &[200, 201];

    /// HTTP status used by the upstream to signal rate limiting
    pub const RATE_LIMIT_STATUS: u16 = 429;

    /// Header carrying the server-provided backoff hint (seconds)
    pub const RETRY_AFTER_HEADER: &str = "retry-after";

    /// Fixed query flags sent with every details request
    pub const DETAIL_QUERY_FLAGS: &[(&str, &str)] = &[
        ("format", "json"),
        ("user_id", "true"),
        ("segments", "true"),
        ("tier_upgrade_criteria", "true"),
        ("slab_history", "true"),
        ("transactions", "false"),
        ("notes", "false"),
        ("mlp", "true"),
        ("expiry_schedule", "true"),
        ("expired_points", "true"),
        ("point_summary", "true"),
    ];
}

/// Source record column names
pub mod columns {
    pub const LOYALTY_USER_ID: &str = "loyalty_user_id";
    pub const CURRENT_TIER: &str = "current_tier";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";

    /// Columns that must be present in the header row
    pub const REQUIRED: &[&str] = &[LOYALTY_USER_ID];
}

/// Point allocation and audit values
pub mod allocation {
    /// Type tag of every migrated allocation
    pub const POINTS_ADDED: &str = "POINTS_ADDED";

    /// Value recorded in the audit payload's `points_to_migrate` field
    pub const POINTS_TO_MIGRATE: &str = "loyalty_points";
}

/// Human-readable failure messages attached to failed user results
pub mod messages {
    pub const RETRIES_EXHAUSTED: &str = "Request failed after all retry attempts";
    pub const UNEXPECTED_END_OF_RETRY_LOOP: &str = "Unexpected end of retry loop";
    pub const CUSTOMER_NOT_FOUND: &str = "Customer not found in loyalty API response";
    pub const CUSTOMER_LOOKUP_UNSUCCESSFUL: &str = "Customer lookup unsuccessful";
    pub const BATCH_REQUEST_FAILED: &str = "Batch request failed";
}

/// Default operational knobs
pub mod defaults {
    pub const API_HOST: &str = "apac.api.capillarytech.com";
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

    pub const CONCURRENCY: usize = 5;
    pub const BATCH_SIZE: usize = 500;
    pub const BATCH_CONCURRENT_LIMIT: usize = 100;
    pub const BATCH_PAUSE_MS: u64 = 1_000;

    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 1_000;

    pub const OUTPUT_DIR: &str = "output";
    pub const ERROR_LOG_DIR: &str = "error_logs";
    pub const LOG_DIR: &str = "log";

    /// Environment variable prefix for configuration overrides
    pub const ENV_PREFIX: &str = "LOYALTY_MIGRATOR";
}

/// Output artifact file names
pub mod output {
    pub const FAILED_USERS: &str = "failed_users_logs.json";
    pub const SUCCESSFUL_USERS: &str = "successful_users_logs.json";
    pub const WALLETS: &str = "wallets.json";
    pub const POINT_ALLOCATIONS: &str = "point_allocations.json";
    pub const TRANSACTION_AUDITS: &str = "transaction_audits.json";
}
