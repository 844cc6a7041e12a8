//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use esop_engine::registration::UserRegistration;
use esop_engine::request::InventoryRequest;
use esop_engine::{EngineConfig, ExchangeEngine, ManualClock};
use esop_types::ids::UserId;
use esop_types::numeric::Quantity;
use esop_types::order::EsopClass;

pub type TestEngine = ExchangeEngine<Arc<ManualClock>>;

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_708_123_456, 0).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn engine() -> (TestEngine, Arc<ManualClock>) {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> (TestEngine, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(start_time()));
    let engine = ExchangeEngine::new(config, clock.clone()).unwrap();
    (engine, clock)
}

/// Registration with a unique phone number derived from `index`
pub fn registration(name: &str, index: u32) -> UserRegistration {
    UserRegistration {
        first_name: name.to_string(),
        last_name: "Tester".to_string(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        phone_number: format!("9{:09}", index),
    }
}

pub fn register(engine: &mut TestEngine, name: &str, index: u32) -> UserId {
    engine.register_user(&registration(name, index)).unwrap()
}

/// Add NORMAL units and let the whole lot vest (default cycle length is zero)
pub fn add_vested_normal(engine: &mut TestEngine, clock: &ManualClock, user: &UserId, qty: u64) {
    engine
        .add_inventory(
            user,
            InventoryRequest {
                quantity: Quantity::from_u64(qty),
                esop_class: EsopClass::NORMAL,
            },
        )
        .unwrap();
    clock.advance(Duration::seconds(1));
}

pub fn add_performance(engine: &mut TestEngine, user: &UserId, qty: u64) {
    engine
        .add_inventory(
            user,
            InventoryRequest {
                quantity: Quantity::from_u64(qty),
                esop_class: EsopClass::PERFORMANCE,
            },
        )
        .unwrap();
}
