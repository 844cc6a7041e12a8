//! Price level implementation with FIFO queue
//!
//! A price level holds the ids of all resting orders at one price point.
//! Ids are kept in arrival order, which enforces time priority.

use esop_types::ids::OrderId;
use std::collections::VecDeque;

/// Orders resting at a single price, earliest first
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<OrderId>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn insert(&mut self, order_id: OrderId) {
        self.orders.push_back(order_id);
    }

    /// Keep only the orders for which `keep` returns true, preserving order
    pub fn retain<F: FnMut(&OrderId) -> bool>(&mut self, keep: F) {
        self.orders.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderId> + '_ {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
