//! Record validation and deduplication
//!
//! Turns raw API rows into [`crate::types::Record`]s. A row is accepted only
//! if every required field is a non-empty string, the ticker matches the
//! configured syntax and the ticker has not been accepted before. Anything
//! else becomes a [`Rejection`] with one of three reason codes.

mod types;
mod validator;

pub use types::{RejectReason, Rejection, RejectionCounts, Validation, ValidationStats};
pub use validator::Validator;
