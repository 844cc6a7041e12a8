//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on price compatibility

use esop_types::numeric::Price;

/// A buy at `bid_price` can trade with a sell at `ask_price`
pub fn can_match(bid_price: &Price, ask_price: &Price) -> bool {
    bid_price >= ask_price
}
