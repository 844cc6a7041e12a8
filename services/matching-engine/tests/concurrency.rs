//! Many threads sharing one service handle

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use esop_engine::request::{InventoryRequest, OrderRequest};
use esop_engine::{EngineConfig, ExchangeService, ManualClock};
use esop_types::ids::UserId;
use esop_types::numeric::{Amount, Price, Quantity};
use esop_types::order::{EsopClass, Side};

const TRADERS: u32 = 8;
const ROUNDS: u64 = 50;
const FUNDS: u64 = 100_000;
const UNITS: u64 = 500;

fn service() -> (ExchangeService<Arc<ManualClock>>, Vec<UserId>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = ExchangeService::new(EngineConfig::default(), clock).unwrap();
    let users = (0..TRADERS)
        .map(|i| {
            let user = service.register_user(&registration(&format!("trader{i}"), i)).unwrap();
            service.add_wallet_funds(&user, Amount::from_u64(FUNDS)).unwrap();
            service
                .add_inventory(
                    &user,
                    InventoryRequest {
                        quantity: Quantity::from_u64(UNITS),
                        esop_class: EsopClass::PERFORMANCE,
                    },
                )
                .unwrap();
            user
        })
        .collect();
    (service, users)
}

#[test]
fn test_concurrent_placements_conserve_balances() {
    let (service, users) = service();

    let handles: Vec<_> = users
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, user)| {
            let service = service.clone();
            thread::spawn(move || {
                let mut trades = 0usize;
                for round in 0..ROUNDS {
                    let price = Price::from_u64(10 + (round + i as u64) % 5);
                    let quantity = Quantity::from_u64(1 + round % 3);
                    let request = if (round + i as u64) % 2 == 0 {
                        OrderRequest::buy(quantity, price)
                    } else {
                        OrderRequest::sell(EsopClass::PERFORMANCE, quantity, price)
                    };
                    if let Ok(placement) = service.place_order(&user, request) {
                        trades += placement.trades.len();
                    }
                }
                trades
            })
        })
        .collect();

    let reported: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let mut wallets = Amount::zero();
    let mut units = Quantity::zero();
    let mut resting = 0usize;
    for user in &users {
        let snapshot = service.account_snapshot(user).unwrap();
        wallets += &snapshot.wallet.total();
        for inventory in &snapshot.inventory {
            units += &inventory.total();
        }
        resting += service
            .order_history(user)
            .unwrap()
            .iter()
            .filter(|o| !o.is_complete())
            .count();
    }

    assert_eq!(
        &wallets + &service.collected_fees(),
        Amount::from_u64(FUNDS * u64::from(TRADERS))
    );
    assert_eq!(units, Quantity::from_u64(UNITS * u64::from(TRADERS)));

    let (bids, asks) = service.with_engine(|engine| engine.depth());
    assert_eq!(bids + asks, resting);

    let executed = service
        .take_events()
        .iter()
        .filter(|e| matches!(e, esop_engine::events::EngineEvent::TradeExecuted(_)))
        .count();
    assert_eq!(executed, reported);
}

#[test]
fn test_resting_orders_never_cross_after_concurrent_load() {
    let (service, users) = service();

    let handles: Vec<_> = users
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, user)| {
            let service = service.clone();
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let price = Price::from_u64(20 + (round * 7 + i as u64) % 11);
                    let request = if i % 2 == 0 {
                        OrderRequest::buy(Quantity::from_u64(2), price)
                    } else {
                        OrderRequest::sell(EsopClass::PERFORMANCE, Quantity::from_u64(2), price)
                    };
                    let _ = service.place_order(&user, request);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let open: Vec<_> = users
        .iter()
        .flat_map(|u| service.order_history(u).unwrap())
        .filter(|o| !o.is_complete())
        .collect();
    let best_bid = open.iter().filter(|o| o.side == Side::BUY).map(|o| o.price.clone()).max();
    let best_ask = open.iter().filter(|o| o.side == Side::SELL).map(|o| o.price.clone()).min();

    if let (Some(bid), Some(ask)) = (best_bid, best_ask) {
        assert!(bid < ask, "book left crossed: bid {bid} ask {ask}");
    }
}
