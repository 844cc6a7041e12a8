//! Ask (sell-side) order book
//!
//! Sell orders are grouped by ESOP class first, PERFORMANCE ahead of
//! NORMAL, then by price ascending. Within a level, arrival order wins.

use esop_types::ids::OrderId;
use esop_types::numeric::Price;
use esop_types::order::{EsopClass, Order};
use std::collections::BTreeMap;

use super::price_level::PriceLevel;

/// Level key: (class sell priority, price)
type AskKey = (u8, Price);

fn key_for(class: EsopClass, price: &Price) -> AskKey {
    (class.sell_priority(), price.clone())
}

/// Ask (sell) side order book
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<AskKey, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: &Order) {
        self.levels
            .entry(key_for(order.esop_class, &order.price))
            .or_default()
            .insert(order.order_id);
    }

    /// Order ids in priority order
    pub fn priority_ids(&self) -> Vec<OrderId> {
        self.levels
            .values()
            .flat_map(|level| level.iter().copied())
            .collect()
    }

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
