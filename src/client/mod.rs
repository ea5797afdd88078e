//! # Loyalty API Client
//!
//! The upstream boundary of the migration: the [`LoyaltyApi`] trait, its
//! reqwest implementation and the error type that feeds the retry executor.

pub mod error;
pub mod loyalty_client;
pub mod traits;

pub use error::ApiError;
pub use loyalty_client::LoyaltyApiClient;
pub use traits::LoyaltyApi;
