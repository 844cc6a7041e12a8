//! Matching logic module
//!
//! Price compatibility checks and trade pricing

pub mod crossing;
pub mod executor;

pub use crossing::can_match;
pub use executor::MatchExecutor;
