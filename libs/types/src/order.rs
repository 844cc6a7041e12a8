//! Order lifecycle types
//!
//! An order is created `Placed`, moves to `Partial` on its first fill that
//! leaves quantity outstanding, and ends `Complete` once nothing remains.
//! Status never moves backward and `remaining_quantity` never grows.

use crate::errors::OrderError;
use crate::ids::{OrderId, UserId};
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

/// ESOP class
///
/// Only NORMAL units go through vesting. Units bought on the exchange are
/// always credited as NORMAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EsopClass {
    #[serde(alias = "NON_PERFORMANCE")]
    NORMAL,
    PERFORMANCE,
}

impl EsopClass {
    /// Sell-side priority rank: PERFORMANCE units are offered first
    pub fn sell_priority(&self) -> u8 {
        match self {
            EsopClass::PERFORMANCE => 0,
            EsopClass::NORMAL => 1,
        }
    }
}

impl fmt::Display for EsopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsopClass::NORMAL => write!(f, "NORMAL"),
            EsopClass::PERFORMANCE => write!(f, "PERFORMANCE"),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, nothing filled yet
    #[serde(rename = "PLACED")]
    Placed,

    /// Some quantity filled, some outstanding
    #[serde(rename = "PARTIAL")]
    Partial,

    /// Fully filled (terminal)
    #[serde(rename = "COMPLETE")]
    Complete,
}

impl OrderStatus {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Placed, OrderStatus::Partial)
                | (OrderStatus::Placed, OrderStatus::Complete)
                | (OrderStatus::Partial, OrderStatus::Partial)
                | (OrderStatus::Partial, OrderStatus::Complete)
        )
    }
}

/// One match event as seen from one side of the trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub counterparty_order_id: OrderId,
    pub quantity: Quantity,
    pub price: Price,
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner: UserId,
    pub side: Side,
    /// Class being sold; BUY orders carry NORMAL implicitly
    pub esop_class: EsopClass,
    pub quantity: Quantity,
    pub price: Price,
    /// Logical arrival sequence used for time priority
    pub sequence: u64,
    pub placed_at: DateTime<Utc>,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub fills: Vec<Fill>,
}

impl Order {
    /// Create a new order in the `Placed` state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        owner: UserId,
        side: Side,
        esop_class: EsopClass,
        quantity: Quantity,
        price: Price,
        sequence: u64,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            owner,
            side,
            esop_class,
            remaining_quantity: quantity.clone(),
            quantity,
            price,
            sequence,
            placed_at,
            status: OrderStatus::Placed,
            fills: Vec::new(),
        }
    }

    /// Check quantity invariant: sum of fills + remaining = total
    pub fn check_invariant(&self) -> bool {
        let filled: Quantity = self.fills.iter().map(|f| &f.quantity).sum();
        &filled + &self.remaining_quantity == self.quantity
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Verify that `quantity` could be filled without mutating anything
    pub fn check_fill(&self, quantity: &Quantity) -> Result<(), OrderError> {
        if quantity.is_zero() {
            return Err(OrderError::ZeroFill {
                order_id: self.order_id,
            });
        }
        if quantity > &self.remaining_quantity {
            return Err(OrderError::OverFill {
                order_id: self.order_id,
                requested: quantity.to_string(),
                remaining: self.remaining_quantity.to_string(),
            });
        }
        Ok(())
    }

    /// Record a fill against `counterparty` and advance the status
    pub fn apply_fill(
        &mut self,
        counterparty: OrderId,
        quantity: Quantity,
        price: Price,
    ) -> Result<(), OrderError> {
        self.check_fill(&quantity)?;

        let remaining = self
            .remaining_quantity
            .checked_sub(&quantity)
            .unwrap_or_else(Quantity::zero);
        let next = if remaining.is_zero() {
            OrderStatus::Complete
        } else {
            OrderStatus::Partial
        };
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.fills.push(Fill {
            counterparty_order_id: counterparty,
            quantity,
            price,
        });
        self.remaining_quantity = remaining;
        self.status = next;
        Ok(())
    }
}
