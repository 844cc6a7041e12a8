//! Trade execution types
//!
//! A `Trade` records one match between a buy and a sell order together
//! with the currency movements it caused.

use crate::ids::{OrderId, UserId};
use crate::numeric::{Amount, Price, Quantity};
use crate::order::EsopClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete trade structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Global monotonic trade sequence
    pub sequence: u64,

    // Order references
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,

    // Participants
    pub buyer: UserId,
    pub seller: UserId,

    /// Class the seller delivered (the buyer always receives NORMAL)
    pub esop_class: EsopClass,
    pub quantity: Quantity,
    /// Execution price (the resting order's price)
    pub price: Price,

    /// Value reserved by the buyer for this quantity (buy price x quantity)
    pub buy_value: Amount,
    /// Value paid by the buyer and earned by the seller (sell price x quantity)
    pub sell_value: Amount,
    /// Platform fee withheld from the seller
    pub fee: Amount,

    pub executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_trade(buy_price: u64, sell_price: u64, qty: u64, fee: u64) -> Trade {
        let quantity = Quantity::from_u64(qty);
        Trade {
            sequence: 1,
            buy_order_id: OrderId::new(1),
            sell_order_id: OrderId::new(2),
            buyer: UserId::from("alice"),
            seller: UserId::from("bob"),
            esop_class: EsopClass::NORMAL,
            buy_value: Price::from_u64(buy_price).value_of(&quantity),
            sell_value: Price::from_u64(sell_price).value_of(&quantity),
            quantity,
            price: Price::from_u64(sell_price),
            fee: Amount::from_u64(fee),
            executed_at: DateTime::from_timestamp(1_708_123_456, 0).unwrap(),
        }
    }

    #[test]
    fn test_trade_serializes_amounts_as_strings() {
        let trade = create_trade(60, 50, 10, 15);
        let json: serde_json::Value = serde_json::to_value(&trade).unwrap();

        assert_eq!(json["buy_value"], "600");
        assert_eq!(json["sell_value"], "500");
        assert_eq!(json["fee"], "15");
        assert_eq!(json["esop_class"], "NORMAL");
    }
}
