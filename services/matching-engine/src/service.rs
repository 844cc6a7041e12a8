//! Thread-safe handle to one exchange engine
//!
//! A match touches the balances of two users, so per-user locking is not
//! enough. Every operation takes the same engine-wide lock and runs to
//! completion before the next one starts.

use std::sync::Arc;

use esop_types::account::AccountSnapshot;
use esop_types::errors::Rejection;
use esop_types::ids::UserId;
use esop_types::numeric::Amount;
use esop_types::order::Order;
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::engine::{ExchangeEngine, Placement};
use crate::events::EngineEvent;
use crate::registration::UserRegistration;
use crate::request::{InventoryRequest, OrderRequest};

/// Cloneable, shareable engine handle
pub struct ExchangeService<C: Clock = SystemClock> {
    engine: Arc<Mutex<ExchangeEngine<C>>>,
}

impl<C: Clock> Clone for ExchangeService<C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl ExchangeService<SystemClock> {
    pub fn with_system_clock(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config, SystemClock)
    }
}

impl<C: Clock> ExchangeService<C> {
    pub fn new(config: EngineConfig, clock: C) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(ExchangeEngine::new(config, clock)?))
    }

    pub fn from_engine(engine: ExchangeEngine<C>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn register_user(&self, registration: &UserRegistration) -> Result<UserId, Rejection> {
        self.engine.lock().register_user(registration)
    }

    pub fn add_wallet_funds(&self, user: &UserId, amount: Amount) -> Result<(), Rejection> {
        self.engine.lock().add_wallet_funds(user, amount)
    }

    pub fn add_inventory(&self, user: &UserId, request: InventoryRequest) -> Result<(), Rejection> {
        self.engine.lock().add_inventory(user, request)
    }

    /// Place and match an order as one indivisible step
    pub fn place_order(&self, user: &UserId, request: OrderRequest) -> Result<Placement, Rejection> {
        self.engine.lock().place_order(user, request)
    }

    pub fn order_history(&self, user: &UserId) -> Result<Vec<Order>, Rejection> {
        self.engine.lock().order_history(user)
    }

    pub fn account_snapshot(&self, user: &UserId) -> Result<AccountSnapshot, Rejection> {
        self.engine.lock().account_snapshot(user)
    }

    pub fn collected_fees(&self) -> Amount {
        self.engine.lock().collected_fees()
    }

    pub fn config(&self) -> EngineConfig {
        self.engine.lock().config().clone()
    }

    pub fn take_events(&self) -> Vec<EngineEvent> {
        self.engine.lock().take_events()
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut ExchangeEngine<C>) -> R) -> R {
        f(&mut self.engine.lock())
    }
}
