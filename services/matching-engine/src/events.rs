//! Event structures for the exchange engine
//!
//! Every state change the engine commits is appended to an in-memory event
//! log that callers drain with `ExchangeEngine::take_events`. The log is
//! bounded: once full, the oldest event is discarded for each new one.

use std::collections::VecDeque;

use esop_types::ids::{OrderId, UserId};
use esop_types::numeric::{Amount, Price, Quantity};
use esop_types::order::{EsopClass, OrderStatus, Side};
use esop_types::trade::Trade;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Order accepted into the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order_id: OrderId,
    pub owner: UserId,
    pub side: Side,
    pub esop_class: EsopClass,
    pub quantity: Quantity,
    pub price: Price,
    pub sequence: u64,
}

/// Order status changed by a fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub remaining_quantity: Quantity,
}

/// Matured vesting cycles moved to free NORMAL inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingReleasedEvent {
    pub user: UserId,
    pub quantity: Quantity,
}

/// Balance-changing deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deposit {
    Funds { amount: Amount },
    Inventory { esop_class: EsopClass, quantity: Quantity },
}

/// Engine event taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    UserRegistered { user: UserId },
    Deposited { user: UserId, deposit: Deposit },
    OrderPlaced(OrderPlacedEvent),
    TradeExecuted(Trade),
    OrderStatusChanged(OrderStatusChangedEvent),
    VestingReleased(VestingReleasedEvent),
}

/// Bounded FIFO of undrained events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: VecDeque<EngineEvent>,
    capacity: usize,
    /// Events discarded since the last drain
    dropped: u64,
}

impl EventLog {
    /// Log keeping at most `capacity` events; zero disables recording
    pub fn bounded(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Take every retained event, oldest first
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        if self.dropped > 0 {
            warn!(
                dropped = self.dropped,
                capacity = self.capacity,
                "Event log overflowed, oldest events discarded"
            );
            self.dropped = 0;
        }
        self.events.drain(..).collect()
    }
}
