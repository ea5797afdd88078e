pub mod customer;
pub mod processing_result;
pub mod record;
pub mod user_result;

// Re-export core models for easy access
pub use customer::{
    loose_number, Customer, CustomerDetailsResponse, CustomerList, ExpirySchedule, ItemStatus,
    PointsSummaries, PointsSummary, ResponseBody, ResponseStatus,
};
pub use processing_result::ProcessingResult;
pub use record::RawUserRecord;
pub use user_result::{
    PointAllocation, PointAllocationRecord, PointBalances, TransactionAudit, UserResult,
    UserWallet,
};
