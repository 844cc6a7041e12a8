//! Exchange engine core
//!
//! Main coordinator for the ledger, the order book and matching. Every
//! public operation either completes or returns a `Rejection` listing the
//! violated rules, in which case nothing was changed. The exception is an
//! internal invariant breach during matching (`Rejection::is_internal`):
//! fills settled before it stay applied and the book is still compacted.
//!
//! Placement runs in five steps: pre-check (after releasing matured
//! vesting), reserve, create and push, match against the opposite side,
//! compact. The engine is single-writer; wrap it in `ExchangeService` to
//! share it between threads.

use esop_types::account::AccountSnapshot;
use esop_types::errors::{ExchangeError, LedgerError, Rejection};
use esop_types::ids::{OrderId, UserId};
use esop_types::numeric::{Amount, Quantity};
use esop_types::order::{EsopClass, Order, Side};
use esop_types::trade::Trade;
use tracing::{debug, error, info};

use crate::book::OrderBook;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::events::{
    Deposit, EngineEvent, EventLog, OrderPlacedEvent, OrderStatusChangedEvent, VestingReleasedEvent,
};
use crate::ledger::Ledger;
use crate::matching::{crossing, MatchExecutor};
use crate::registration::UserRegistration;
use crate::request::{InventoryRequest, OrderRequest};
use crate::vesting::VestingSchedule;

/// Outcome of a successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The new order as it stands after matching
    pub order: Order,
    /// Fills produced by this placement, in execution order
    pub trades: Vec<Trade>,
}

/// Ledger, book and matching state of one exchange
pub struct ExchangeEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    ledger: Ledger,
    book: OrderBook,
    executor: MatchExecutor,
    vesting: VestingSchedule,
    events: EventLog,
}

impl ExchangeEngine<SystemClock> {
    /// Engine on wall-clock time
    pub fn with_system_clock(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config, SystemClock)
    }
}

impl<C: Clock> ExchangeEngine<C> {
    /// Create an engine, validating `config` first
    pub fn new(config: EngineConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let fees = config.fee_schedule()?;
        let vesting = VestingSchedule::new(config.vesting.breakup.clone(), config.vesting.cycle_duration());
        let events = EventLog::bounded(config.event_log_capacity);

        info!(
            normal_fee_bps = fees.normal.basis_points(),
            performance_fee_bps = fees.performance.basis_points(),
            vesting_cycles = config.vesting.breakup.len(),
            cycle_duration_secs = config.vesting.cycle_duration_secs,
            "Exchange engine initialized"
        );

        Ok(Self {
            config,
            clock,
            ledger: Ledger::new(),
            book: OrderBook::new(),
            executor: MatchExecutor::new(1, fees),
            vesting,
            events,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validate and register a new user
    pub fn register_user(&mut self, registration: &UserRegistration) -> Result<UserId, Rejection> {
        let profile = registration.validate()?;
        let user = self.ledger.register(profile).inspect_err(|rejection| {
            debug!(reasons = ?rejection.reasons(), "Registration rejected");
        })?;

        info!(user = %user, "User registered");
        self.events.push(EngineEvent::UserRegistered { user: user.clone() });
        Ok(user)
    }

    /// Credit currency to a user's free wallet
    ///
    /// Rejected if the wallet total would exceed the configured maximum.
    pub fn add_wallet_funds(&mut self, user: &UserId, amount: Amount) -> Result<(), Rejection> {
        self.require_user(user)?;

        let wallet = &self.ledger.account(user)?.wallet;
        let limit = &self.config.wallet_limit.max;
        if &(&wallet.total() + &amount) > limit {
            return Err(ExchangeError::WalletLimitExceeded {
                limit: limit.to_string(),
            }
            .into());
        }

        self.ledger.add_funds(user, &amount)?;
        info!(user = %user, amount = %amount, "Wallet funded");
        self.events.push(EngineEvent::Deposited {
            user: user.clone(),
            deposit: Deposit::Funds { amount },
        });
        Ok(())
    }

    /// Add ESOP units to a user
    ///
    /// NORMAL units enter a vesting lot; PERFORMANCE units are free at once.
    /// Rejected if total holdings (free, locked and unvested, both classes)
    /// would exceed the inventory maximum.
    pub fn add_inventory(&mut self, user: &UserId, request: InventoryRequest) -> Result<(), Rejection> {
        self.require_user(user)?;
        self.release_vesting(user)?;

        let limit = &self.config.inventory_limit.max;
        let total = self.ledger.account(user)?.total_inventory();
        if &(&total + &request.quantity) > limit {
            return Err(ExchangeError::InventoryLimitExceeded {
                limit: limit.to_string(),
            }
            .into());
        }

        match request.esop_class {
            EsopClass::PERFORMANCE => self.ledger.credit_performance(user, &request.quantity)?,
            EsopClass::NORMAL if request.quantity.is_zero() => {}
            EsopClass::NORMAL => {
                let lot = self.vesting.allocate(&request.quantity, self.clock.now());
                debug!(user = %user, cycles = ?lot.cycles, "Vesting lot created");
                self.ledger.add_vesting_lot(user, lot)?;
            }
        }

        info!(
            user = %user,
            class = %request.esop_class,
            quantity = %request.quantity,
            "Inventory added"
        );
        self.events.push(EngineEvent::Deposited {
            user: user.clone(),
            deposit: Deposit::Inventory {
                esop_class: request.esop_class,
                quantity: request.quantity,
            },
        });
        Ok(())
    }

    /// Validate, reserve, book and match a new order
    pub fn place_order(&mut self, user: &UserId, request: OrderRequest) -> Result<Placement, Rejection> {
        self.require_user(user)?;
        self.release_vesting(user)?;

        let result = match request.side {
            Side::BUY => self.place_buy(user, request),
            Side::SELL => self.place_sell(user, request),
        };
        match &result {
            Err(rejection) if rejection.is_internal() => {
                error!(user = %user, reasons = ?rejection.reasons(), "Placement aborted by invariant breach");
            }
            Err(rejection) => debug!(user = %user, reasons = ?rejection.reasons(), "Order rejected"),
            Ok(_) => {}
        }
        result
    }

    fn place_buy(&mut self, user: &UserId, request: OrderRequest) -> Result<Placement, Rejection> {
        let account = self.ledger.account(user)?;
        let value = request.price.value_of(&request.quantity);

        if account.wallet.free < value {
            return Err(ExchangeError::InsufficientFunds {
                required: value.to_string(),
                available: account.wallet.free.to_string(),
            }
            .into());
        }
        let limit = &self.config.inventory_limit.max;
        if &(&account.total_inventory() + &request.quantity) > limit {
            return Err(ExchangeError::InventoryLimitExceeded {
                limit: limit.to_string(),
            }
            .into());
        }

        self.ledger.reserve_for_buy(user, &value)?;
        self.submit(user, request)
    }

    fn place_sell(&mut self, user: &UserId, request: OrderRequest) -> Result<Placement, Rejection> {
        let account = self.ledger.account(user)?;
        let class = request.esop_class;
        let free = &account.inventory(class).free;

        if free < &request.quantity {
            return Err(ExchangeError::InsufficientInventory {
                class,
                required: request.quantity.to_string(),
                available: free.to_string(),
            }
            .into());
        }
        let value = request.price.value_of(&request.quantity);
        let limit = &self.config.wallet_limit.max;
        if &(&account.wallet.total() + &value) > limit {
            return Err(ExchangeError::WalletLimitExceeded {
                limit: limit.to_string(),
            }
            .into());
        }

        self.ledger.reserve_for_sell(user, class, &request.quantity)?;
        self.submit(user, request)
    }

    /// Create the order, push it and run one matching pass
    fn submit(&mut self, user: &UserId, request: OrderRequest) -> Result<Placement, Rejection> {
        let (order_id, sequence) = self.book.allocate();
        let order = Order::new(
            order_id,
            user.clone(),
            request.side,
            request.esop_class,
            request.quantity,
            request.price,
            sequence,
            self.clock.now(),
        );

        info!(
            order_id = %order_id,
            user = %user,
            side = ?order.side,
            class = %order.esop_class,
            quantity = %order.quantity,
            price = %order.price,
            "Order placed"
        );
        self.events.push(EngineEvent::OrderPlaced(OrderPlacedEvent {
            order_id,
            owner: user.clone(),
            side: order.side,
            esop_class: order.esop_class,
            quantity: order.quantity.clone(),
            price: order.price.clone(),
            sequence,
        }));
        self.book.push(order);

        let trades = self.match_against(order_id)?;
        let order = self.order_snapshot(&order_id)?;
        Ok(Placement { order, trades })
    }

    /// Scan the side opposite to `incoming_id` in priority order
    ///
    /// Incompatible prices are skipped, not treated as the end of the book.
    /// Each fill trades `min(remaining)` at the resting order's price and is
    /// settled in the ledger before both orders are updated. The book is
    /// compacted whether or not every fill succeeded.
    fn match_against(&mut self, incoming_id: OrderId) -> Result<Vec<Trade>, Rejection> {
        let side = self.order_snapshot(&incoming_id)?.side;
        let candidates = match side {
            Side::BUY => self.book.active_sells(),
            Side::SELL => self.book.active_buys(),
        };
        let mut trades = Vec::new();
        let outcome = self.fill_against(incoming_id, side, candidates, &mut trades);
        self.book.compact();
        outcome.map(|()| trades)
    }

    fn fill_against(
        &mut self,
        incoming_id: OrderId,
        side: Side,
        candidates: Vec<OrderId>,
        trades: &mut Vec<Trade>,
    ) -> Result<(), Rejection> {
        let now = self.clock.now();
        for candidate_id in candidates {
            let incoming = self.book.order(&incoming_id).ok_or_else(|| missing(incoming_id))?;
            if incoming.is_complete() {
                break;
            }
            let candidate = self.book.order(&candidate_id).ok_or_else(|| missing(candidate_id))?;
            let (buy, sell) = match side {
                Side::BUY => (incoming, candidate),
                Side::SELL => (candidate, incoming),
            };
            if !crossing::can_match(&buy.price, &sell.price) {
                continue;
            }
            let quantity = incoming.remaining_quantity.clone().min(candidate.remaining_quantity.clone());
            if quantity.is_zero() {
                continue;
            }

            let trade = self
                .executor
                .execute_trade(buy, sell, quantity, candidate.price.clone(), now)?;
            self.ledger.settle_fill(&trade)?;
            self.apply_fill(&trade.buy_order_id, &trade.sell_order_id, &trade)?;
            self.apply_fill(&trade.sell_order_id, &trade.buy_order_id, &trade)?;

            info!(
                sequence = trade.sequence,
                buy_order = %trade.buy_order_id,
                sell_order = %trade.sell_order_id,
                quantity = %trade.quantity,
                price = %trade.price,
                fee = %trade.fee,
                "Trade executed"
            );
            self.events.push(EngineEvent::TradeExecuted(trade.clone()));
            trades.push(trade);
        }
        Ok(())
    }

    fn apply_fill(&mut self, order_id: &OrderId, counterparty: &OrderId, trade: &Trade) -> Result<(), Rejection> {
        let order = self.book.order_mut(order_id).ok_or_else(|| missing(*order_id))?;
        order.apply_fill(*counterparty, trade.quantity.clone(), trade.price.clone())?;
        self.events.push(EngineEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: *order_id,
            status: order.status,
            remaining_quantity: order.remaining_quantity.clone(),
        }));
        Ok(())
    }

    /// Every order `user` has placed, oldest first
    pub fn order_history(&self, user: &UserId) -> Result<Vec<Order>, Rejection> {
        self.require_user(user)?;
        Ok(self.book.history_for(user).into_iter().cloned().collect())
    }

    /// Current balances and outstanding vesting of `user`
    ///
    /// Releases matured vesting first, so this takes `&mut self`.
    pub fn account_snapshot(&mut self, user: &UserId) -> Result<AccountSnapshot, Rejection> {
        self.require_user(user)?;
        self.release_vesting(user)?;

        let account = self.ledger.account(user)?;
        let pending = self.vesting.pending_entries(&account.unvested);
        Ok(AccountSnapshot::new(account, pending))
    }

    /// Platform fees collected so far
    pub fn collected_fees(&self) -> Amount {
        self.ledger.collected_fees().clone()
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.book.order(order_id)
    }

    /// Resting (buy, sell) order counts
    pub fn depth(&self) -> (usize, usize) {
        self.book.depth()
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    fn require_user(&self, user: &UserId) -> Result<(), Rejection> {
        if self.ledger.contains(user) {
            Ok(())
        } else {
            Err(ExchangeError::user_not_found(user).into())
        }
    }

    fn order_snapshot(&self, order_id: &OrderId) -> Result<Order, Rejection> {
        self.book
            .order(order_id)
            .cloned()
            .ok_or_else(|| missing(*order_id).into())
    }

    /// Move matured vesting cycles of `user` into free NORMAL inventory
    fn release_vesting(&mut self, user: &UserId) -> Result<Quantity, Rejection> {
        let now = self.clock.now();
        let account = self.ledger.account_mut(user)?;
        let released = self.vesting.release_due(&mut account.unvested, now);
        if released.is_zero() {
            return Ok(released);
        }

        self.ledger.credit_vested(user, &released)?;
        info!(user = %user, quantity = %released, "Vesting released");
        self.events.push(EngineEvent::VestingReleased(VestingReleasedEvent {
            user: user.clone(),
            quantity: released.clone(),
        }));
        Ok(released)
    }
}

fn missing(order_id: OrderId) -> LedgerError {
    LedgerError::InvariantViolation {
        username: String::new(),
        bucket: format!("order {order_id} missing from book"),
    }
}
