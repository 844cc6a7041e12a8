//! Trade execution logic
//!
//! Turns a (buy, sell, quantity) match into a `Trade`: assigns the trade
//! sequence and computes buy value, sell value and the seller's fee.

use chrono::{DateTime, Utc};
use esop_types::errors::OrderError;
use esop_types::fee::FeeSchedule;
use esop_types::numeric::{Price, Quantity};
use esop_types::order::Order;
use esop_types::trade::Trade;

/// Match executor for handling trade generation
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
    fees: FeeSchedule,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64, fees: FeeSchedule) -> Self {
        Self {
            sequence_counter: starting_sequence,
            fees,
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Price a fill of `quantity` between `buy` and `sell`
    ///
    /// `price` is the execution price recorded on the fill. Currency moves
    /// at the two limit prices: the buyer reserved `buy.price * quantity`
    /// and pays `sell.price * quantity`. Neither order is mutated.
    pub fn execute_trade(
        &mut self,
        buy: &Order,
        sell: &Order,
        quantity: Quantity,
        price: Price,
        executed_at: DateTime<Utc>,
    ) -> Result<Trade, OrderError> {
        buy.check_fill(&quantity)?;
        sell.check_fill(&quantity)?;

        let buy_value = buy.price.value_of(&quantity);
        let sell_value = sell.price.value_of(&quantity);
        let fee = self.fees.rate_for(sell.esop_class).fee_on(&sell_value);

        Ok(Trade {
            sequence: self.next_sequence(),
            buy_order_id: buy.order_id,
            sell_order_id: sell.order_id,
            buyer: buy.owner.clone(),
            seller: sell.owner.clone(),
            esop_class: sell.esop_class,
            quantity,
            price,
            buy_value,
            sell_value,
            fee,
            executed_at,
        })
    }
}
