//! ESOP exchange engine
//!
//! Order matching and ledger for employee stock options held in two
//! classes (NORMAL and PERFORMANCE). Users deposit currency and units,
//! place limit orders, and are matched with price-time priority while a
//! platform fee is withheld from sellers. NORMAL units vest over
//! configured cycles before they can be sold.
//!
//! **Key Invariants:**
//! - Price-time priority; PERFORMANCE sells rank ahead of NORMAL ones
//! - No fill where the buy price is below the sell price
//! - Free plus locked balances only change through deposits and fills
//! - A placement is validated in full before anything is reserved

pub mod book;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod matching;
pub mod registration;
pub mod request;
pub mod service;
pub mod vesting;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use engine::{ExchangeEngine, Placement};
pub use service::ExchangeService;
