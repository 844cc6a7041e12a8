//! Property tests over random placement sequences
//!
//! After any sequence of placements:
//! - currency across all wallets plus collected fees equals what was deposited
//! - units across all inventories equal what was deposited
//! - locked balances equal what the resting orders still reserve
//! - no fill has a buy price below its sell price
//! - order status matches the remaining quantity

mod common;

use common::*;
use esop_engine::request::OrderRequest;
use esop_types::prelude::*;
use proptest::prelude::*;

const USERS: u32 = 3;
const FUNDS: u64 = 5_000;
const UNITS_PER_CLASS: u64 = 60;

#[derive(Debug, Clone)]
struct Op {
    user: usize,
    side: Side,
    class: EsopClass,
    quantity: u64,
    price: u64,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (
        0..USERS as usize,
        prop_oneof![Just(Side::BUY), Just(Side::SELL)],
        prop_oneof![Just(EsopClass::NORMAL), Just(EsopClass::PERFORMANCE)],
        1u64..15,
        1u64..30,
    )
        .prop_map(|(user, side, class, quantity, price)| Op {
            user,
            side,
            class,
            quantity,
            price,
        })
}

fn sum_amounts<'a>(values: impl Iterator<Item = &'a Amount>) -> Amount {
    values.fold(Amount::zero(), |acc, v| &acc + v)
}

fn sum_quantities<'a>(values: impl Iterator<Item = &'a Quantity>) -> Quantity {
    values.fold(Quantity::zero(), |acc, v| &acc + v)
}

fn status_matches(order: &Order) -> bool {
    match order.status {
        OrderStatus::Placed => order.remaining_quantity == order.quantity,
        OrderStatus::Partial => !order.remaining_quantity.is_zero() && order.remaining_quantity < order.quantity,
        OrderStatus::Complete => order.remaining_quantity.is_zero(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_placements_conserve_balances(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (mut engine, clock) = engine();
        let users: Vec<UserId> = (0..USERS)
            .map(|i| register(&mut engine, &format!("user{i}"), i))
            .collect();
        for user in &users {
            engine.add_wallet_funds(user, Amount::from_u64(FUNDS)).unwrap();
            add_performance(&mut engine, user, UNITS_PER_CLASS);
            add_vested_normal(&mut engine, &clock, user, UNITS_PER_CLASS);
        }

        let mut trades: Vec<Trade> = Vec::new();
        for op in &ops {
            let request = match op.side {
                Side::BUY => OrderRequest::buy(Quantity::from_u64(op.quantity), Price::from_u64(op.price)),
                Side::SELL => OrderRequest::sell(op.class, Quantity::from_u64(op.quantity), Price::from_u64(op.price)),
            };
            if let Ok(placement) = engine.place_order(&users[op.user], request) {
                trades.extend(placement.trades);
            }
        }

        let snapshots: Vec<_> = users.iter().map(|u| engine.account_snapshot(u).unwrap()).collect();

        let wallets: Vec<Amount> = snapshots.iter().map(|s| s.wallet.total()).collect();
        let currency = &sum_amounts(wallets.iter()) + &engine.collected_fees();
        prop_assert_eq!(currency, Amount::from_u64(FUNDS * u64::from(USERS)));

        let units: Vec<Quantity> = snapshots
            .iter()
            .flat_map(|s| s.inventory.iter().map(|inv| inv.total()))
            .collect();
        prop_assert_eq!(
            sum_quantities(units.iter()),
            Quantity::from_u64(2 * UNITS_PER_CLASS * u64::from(USERS))
        );

        for (user, snapshot) in users.iter().zip(&snapshots) {
            let history = engine.order_history(user).unwrap();
            let open: Vec<&Order> = history.iter().filter(|o| !o.is_complete()).collect();

            let reserved: Vec<Amount> = open
                .iter()
                .filter(|o| o.side == Side::BUY)
                .map(|o| o.price.value_of(&o.remaining_quantity))
                .collect();
            prop_assert_eq!(&snapshot.wallet.locked, &sum_amounts(reserved.iter()));

            for class in [EsopClass::NORMAL, EsopClass::PERFORMANCE] {
                let offered = sum_quantities(
                    open.iter()
                        .filter(|o| o.side == Side::SELL && o.esop_class == class)
                        .map(|o| &o.remaining_quantity),
                );
                prop_assert_eq!(&snapshot.inventory(class).unwrap().locked, &offered);
            }

            for order in &history {
                prop_assert!(order.check_invariant());
                prop_assert!(status_matches(order), "{:?}", order);
            }
        }

        for trade in &trades {
            let buy = engine.order(&trade.buy_order_id).unwrap();
            let sell = engine.order(&trade.sell_order_id).unwrap();
            prop_assert!(buy.price >= sell.price);
            prop_assert!(trade.sell_value <= trade.buy_value);
            prop_assert!(!trade.quantity.is_zero());
        }
    }

    #[test]
    fn prop_remaining_never_grows(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let (mut engine, clock) = engine();
        let users: Vec<UserId> = (0..USERS)
            .map(|i| register(&mut engine, &format!("user{i}"), i))
            .collect();
        for user in &users {
            engine.add_wallet_funds(user, Amount::from_u64(FUNDS)).unwrap();
            add_performance(&mut engine, user, UNITS_PER_CLASS);
            add_vested_normal(&mut engine, &clock, user, UNITS_PER_CLASS);
        }

        let mut seen: Vec<Order> = Vec::new();
        for op in &ops {
            let request = match op.side {
                Side::BUY => OrderRequest::buy(Quantity::from_u64(op.quantity), Price::from_u64(op.price)),
                Side::SELL => OrderRequest::sell(op.class, Quantity::from_u64(op.quantity), Price::from_u64(op.price)),
            };
            let _ = engine.place_order(&users[op.user], request);

            for before in &seen {
                let now = engine.order(&before.order_id).unwrap();
                prop_assert!(now.remaining_quantity <= before.remaining_quantity);
                prop_assert!(now.status == before.status || before.status.can_transition_to(now.status));
            }
            seen = users
                .iter()
                .flat_map(|u| engine.order_history(u).unwrap())
                .collect();
        }
    }
}
