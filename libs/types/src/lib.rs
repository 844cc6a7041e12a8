//! Types library for the ESOP exchange
//!
//! Core type definitions shared by the matching engine and its callers:
//! arbitrary-precision numerics, orders and their state machine, per-user
//! ledger entries, fee rates and the error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (UserId, OrderId)
//! - `numeric`: Arbitrary-precision non-negative numbers (Quantity, Price, Amount)
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution record
//! - `account`: Wallet, inventory and vesting lot types
//! - `fee`: Fee rates
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod account;
pub mod fee;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::account::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
