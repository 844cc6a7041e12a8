//! Order book infrastructure module
//!
//! Contains price levels, the bid and ask books, and `OrderBook`, which
//! owns every order ever placed. The two side books only index the orders
//! that still have quantity outstanding.

pub mod price_level;
pub mod bid_book;
pub mod ask_book;

pub use price_level::PriceLevel;
pub use bid_book::BidBook;
pub use ask_book::AskBook;

use esop_types::ids::{OrderId, UserId};
use esop_types::order::{Order, Side};
use std::collections::{BTreeMap, HashMap};

/// Active orders per side plus the full order history
#[derive(Debug)]
pub struct OrderBook {
    bids: BidBook,
    asks: AskBook,
    /// Every order, keyed (and therefore ordered) by id
    orders: BTreeMap<OrderId, Order>,
    by_owner: HashMap<UserId, Vec<OrderId>>,
    next_order_id: OrderId,
    next_sequence: u64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self {
            bids: BidBook::new(),
            asks: AskBook::new(),
            orders: BTreeMap::new(),
            by_owner: HashMap::new(),
            next_order_id: OrderId::new(1),
            next_sequence: 1,
        }
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id and arrival sequence for the next order
    pub fn allocate(&mut self) -> (OrderId, u64) {
        let id = self.next_order_id;
        let sequence = self.next_sequence;
        self.next_order_id = id.next();
        self.next_sequence += 1;
        (id, sequence)
    }

    /// Record `order` in history and index it on its side
    pub fn push(&mut self, order: Order) -> OrderId {
        let id = order.order_id;
        if !order.is_complete() {
            match order.side {
                Side::BUY => self.bids.insert(&order),
                Side::SELL => self.asks.insert(&order),
            }
        }
        self.by_owner.entry(order.owner.clone()).or_default().push(id);
        self.orders.insert(id, order);
        id
    }

    /// Resting buy orders with quantity left, best first
    pub fn active_buys(&self) -> Vec<OrderId> {
        self.active(self.bids.priority_ids())
    }

    /// Resting sell orders with quantity left, best first
    pub fn active_sells(&self) -> Vec<OrderId> {
        self.active(self.asks.priority_ids())
    }

    fn active(&self, ids: Vec<OrderId>) -> Vec<OrderId> {
        ids.into_iter()
            .filter(|id| self.orders.get(id).is_some_and(|o| !o.is_complete()))
            .collect()
    }

    /// Drop filled orders from both sides
    pub fn compact(&mut self) {
        let orders = &self.orders;
        let has_remaining = |id: &OrderId| orders.get(id).is_some_and(|o| !o.is_complete());
        self.bids.retain(has_remaining);
        self.asks.retain(has_remaining);
    }

    /// Every order placed by `user`, oldest first
    pub fn history_for(&self, user: &UserId) -> Vec<&Order> {
        self.by_owner
            .get(user)
            .map(|ids| ids.iter().filter_map(|id| self.orders.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.get_mut(id)
    }

    /// Resting (buy, sell) order counts
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.order_count(), self.asks.order_count())
    }
}
