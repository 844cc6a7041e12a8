//! Vesting allocation and release
//!
//! NORMAL units added to an account are split into cycles according to the
//! configured breakup ratios. Each cycle becomes free once more than
//! `(i + 1) * cycle_duration` has elapsed since the lot was added.
//!
//! The split is computed exactly: ratios are turned into integer
//! numerators over a common power-of-ten denominator, and every cycle gets
//! `floor(q * C_i / D) - S`, where `C_i` is the cumulative numerator, `D`
//! the ratio total and `S` the amount already allocated. The last cycle
//! therefore always lands on `q`.

use chrono::{DateTime, Duration, Utc};
use esop_types::account::{UnvestedEntry, VestingLot};
use esop_types::numeric::Quantity;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rust_decimal::Decimal;

/// Split `quantity` into one allocation per ratio, summing exactly to it
///
/// Non-positive ratios receive nothing. If no ratio is positive every
/// allocation is zero.
pub fn split_into_vesting_cycles(quantity: &Quantity, ratios: &[Decimal]) -> Vec<Quantity> {
    let numerators = ratio_numerators(ratios);
    let denominator: BigUint = numerators.iter().sum();
    if denominator.is_zero() {
        return vec![Quantity::zero(); ratios.len()];
    }

    let q = quantity.as_biguint();
    let mut cumulative = BigUint::zero();
    let mut allocated = BigUint::zero();
    numerators
        .iter()
        .map(|numerator| {
            cumulative += numerator;
            let target = q * &cumulative / &denominator;
            // target is non-decreasing, so this never underflows
            let share = &target - &allocated;
            allocated = target;
            Quantity::from_biguint(share)
        })
        .collect()
}

/// Integer numerators of `ratios` over a shared `10^scale` denominator
fn ratio_numerators(ratios: &[Decimal]) -> Vec<BigUint> {
    let scale = ratios.iter().map(Decimal::scale).max().unwrap_or(0);
    ratios
        .iter()
        .map(|ratio| {
            if *ratio <= Decimal::ZERO {
                return BigUint::zero();
            }
            let mantissa = BigUint::try_from(ratio.mantissa()).unwrap_or_default();
            mantissa * pow10(scale - ratio.scale())
        })
        .collect()
}

fn pow10(exp: u32) -> BigUint {
    (0..exp).fold(BigUint::one(), |acc, _| acc * 10u32)
}

/// Whether cycle `index` of a lot added at `added_at` has matured by `now`
fn cycle_matured(index: usize, added_at: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> bool {
    let elapsed = (now - added_at).num_seconds();
    let Ok(cycles) = i64::try_from(index + 1) else {
        return false;
    };
    match duration.num_seconds().checked_mul(cycles) {
        Some(threshold) => elapsed > threshold,
        None => false,
    }
}

/// Zero every matured cycle of `lot`, returning the amount released
///
/// Idempotent: released cycles stay at zero and contribute nothing on
/// later calls.
pub fn release_matured(lot: &mut VestingLot, duration: Duration, now: DateTime<Utc>) -> Quantity {
    let added_at = lot.added_at;
    let mut released = Quantity::zero();
    for (index, cycle) in lot.cycles.iter_mut().enumerate() {
        if cycle.is_zero() || !cycle_matured(index, added_at, duration, now) {
            continue;
        }
        released += &*cycle;
        *cycle = Quantity::zero();
    }
    released
}

/// Configured vesting breakup and cycle length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingSchedule {
    breakup: Vec<Decimal>,
    cycle_duration: Duration,
}

impl VestingSchedule {
    pub fn new(breakup: Vec<Decimal>, cycle_duration: Duration) -> Self {
        Self {
            breakup,
            cycle_duration,
        }
    }

    /// Build a new lot for `quantity` units added at `now`
    pub fn allocate(&self, quantity: &Quantity, now: DateTime<Utc>) -> VestingLot {
        VestingLot {
            added_at: now,
            cycles: split_into_vesting_cycles(quantity, &self.breakup),
        }
    }

    /// Release matured cycles across `lots`, dropping lots that are empty
    pub fn release_due(&self, lots: &mut Vec<VestingLot>, now: DateTime<Utc>) -> Quantity {
        let mut released = Quantity::zero();
        for lot in lots.iter_mut() {
            released += &release_matured(lot, self.cycle_duration, now);
        }
        lots.retain(|lot| !lot.is_fully_released());
        released
    }

    /// Outstanding cycles with the time each one matures
    pub fn pending_entries(&self, lots: &[VestingLot]) -> Vec<UnvestedEntry> {
        let step = self.cycle_duration.num_seconds();
        lots.iter()
            .flat_map(|lot| {
                lot.cycles.iter().enumerate().filter_map(move |(index, amount)| {
                    if amount.is_zero() {
                        return None;
                    }
                    let offset = step.checked_mul(i64::try_from(index + 1).ok()?)?;
                    let matures_at = lot.added_at.checked_add_signed(Duration::try_seconds(offset)?)?;
                    Some(UnvestedEntry {
                        matures_at,
                        amount: amount.clone(),
                    })
                })
            })
            .collect()
    }
}
