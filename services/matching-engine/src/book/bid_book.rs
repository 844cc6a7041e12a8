//! Bid (buy-side) order book
//!
//! Maintains buy orders sorted by price descending (best bid first).
//! Uses BTreeMap for deterministic iteration order.

use esop_types::ids::OrderId;
use esop_types::numeric::Price;
use esop_types::order::Order;
use std::collections::BTreeMap;

use super::price_level::PriceLevel;

/// Bid (buy) side order book
///
/// Orders are sorted by price descending, so the highest bid is first.
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    /// Price levels keyed ascending; iterated in reverse
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of its price level
    pub fn insert(&mut self, order: &Order) {
        self.levels
            .entry(order.price.clone())
            .or_default()
            .insert(order.order_id);
    }

    /// Order ids in priority order: highest price first, then FIFO
    pub fn priority_ids(&self) -> Vec<OrderId> {
        self.levels
            .values()
            .rev()
            .flat_map(|level| level.iter().copied())
            .collect()
    }

    /// Drop every order `keep` rejects, then any level left empty
    pub fn retain<F: FnMut(&OrderId) -> bool>(&mut self, mut keep: F) {
        self.levels.retain(|_, level| {
            level.retain(&mut keep);
            !level.is_empty()
        });
    }

    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use esop_types::ids::UserId;
    use esop_types::numeric::Quantity;
    use esop_types::order::{EsopClass, Side};

    fn create_test_order(id: u64, price: u64) -> Order {
        Order::new(
            OrderId::new(id),
            UserId::from("alice"),
            Side::BUY,
            EsopClass::NORMAL,
            Quantity::from_u64(10),
            Price::from_u64(price),
            id,
            DateTime::from_timestamp(1_708_123_456, 0).unwrap(),
        )
    }

    #[test]
    fn test_bid_book_price_time_priority() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, 50));
        book.insert(&create_test_order(2, 60));
        book.insert(&create_test_order(3, 50));
        book.insert(&create_test_order(4, 40));

        let ids: Vec<_> = book.priority_ids().iter().map(OrderId::value).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_bid_book_retain_drops_empty_levels() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, 50));
        book.insert(&create_test_order(2, 60));
        book.insert(&create_test_order(3, 60));

        book.retain(|id| id.value() != 1);
        assert_eq!(book.order_count(), 2);
        assert_eq!(book.priority_ids(), vec![OrderId::new(2), OrderId::new(3)]);

        book.retain(|_| false);
        assert_eq!(book.order_count(), 0);
    }
}
