//! Error types for the exchange
//!
//! Business-rule failures are `ExchangeError`s. Public operations collect
//! them into a `Rejection`, which carries every violated rule rather than
//! only the first one.

use crate::ids::{OrderId, UserId};
use crate::order::{EsopClass, OrderStatus};
use thiserror::Error;

/// Top-level exchange error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("user does not exist: {username}")]
    UserNotFound { username: String },

    #[error("{field} already exists")]
    DuplicateUser { field: String },

    #[error("insufficient wallet funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("insufficient {class} inventory: required {required}, available {available}")]
    InsufficientInventory {
        class: EsopClass,
        required: String,
        available: String,
    },

    #[error("wallet limit ({limit}) exceeded")]
    WalletLimitExceeded { limit: String },

    #[error("inventory limit ({limit}) exceeded")]
    InventoryLimitExceeded { limit: String },

    #[error("invalid {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ExchangeError {
    pub fn user_not_found(user: &UserId) -> Self {
        ExchangeError::UserNotFound {
            username: user.to_string(),
        }
    }

    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        ExchangeError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_amount(field: &str, reason: impl Into<String>) -> Self {
        ExchangeError::InvalidAmount {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Order state-machine violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("fill quantity must be positive for order {order_id}")]
    ZeroFill { order_id: OrderId },

    #[error("fill of {requested} exceeds remaining {remaining} on order {order_id}")]
    OverFill {
        order_id: OrderId,
        requested: String,
        remaining: String,
    },

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// Ledger bookkeeping failures
///
/// These indicate a broken internal invariant (for example settling more
/// than was reserved). The ledger refuses the mutation and leaves balances
/// as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {username}")]
    UnknownAccount { username: String },

    #[error("Balance invariant violated for {username}: {bucket}")]
    InvariantViolation { username: String, bucket: String },
}

/// Structured list of reasons an operation was refused
///
/// A rejection for a business rule (funds, limits, validation) leaves all
/// state untouched. One carrying a `Ledger` or `Order` error reports a
/// broken internal invariant; see `is_internal`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("request rejected: {}", join_reasons(.errors))]
pub struct Rejection {
    pub errors: Vec<ExchangeError>,
}

fn join_reasons(errors: &[ExchangeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Rejection {
    pub fn new(errors: Vec<ExchangeError>) -> Self {
        Self { errors }
    }

    /// Human-readable reasons, one per violated rule
    pub fn reasons(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Whether any reason is an internal invariant breach rather than a
    /// refused request
    pub fn is_internal(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, ExchangeError::Ledger(_) | ExchangeError::Order(_)))
    }

    /// `Ok(())` when no errors were collected
    pub fn check(errors: Vec<ExchangeError>) -> Result<(), Rejection> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Rejection { errors })
        }
    }
}

impl From<ExchangeError> for Rejection {
    fn from(error: ExchangeError) -> Self {
        Rejection {
            errors: vec![error],
        }
    }
}

impl From<LedgerError> for Rejection {
    fn from(error: LedgerError) -> Self {
        ExchangeError::from(error).into()
    }
}

impl From<OrderError> for Rejection {
    fn from(error: OrderError) -> Self {
        ExchangeError::from(error).into()
    }
}
