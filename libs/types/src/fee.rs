//! Platform fee types
//!
//! Fees are configured as percentages with two implied decimal digits
//! (3.00% is stored as 300 basis points) and charged on the seller's side
//! of every fill: `fee = floor(sell_value * basis_points / 10000)`.

use crate::numeric::Amount;
use crate::order::EsopClass;
use num_bigint::BigUint;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Basis points in 100%
pub const BASIS_POINTS_SCALE: u32 = 10_000;

/// A fee percentage stored as integer basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u32);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0);

    /// Build a rate from a percentage such as `3.00`
    ///
    /// Digits beyond the second decimal place are truncated. Returns `None`
    /// for percentages outside `0..=100`.
    pub fn from_percent(percent: Decimal) -> Option<Self> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return None;
        }
        let basis_points = (percent * Decimal::ONE_HUNDRED).trunc().to_u32()?;
        Some(FeeRate(basis_points))
    }

    pub const fn from_basis_points(basis_points: u32) -> Self {
        FeeRate(basis_points)
    }

    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Fee withheld from a sale worth `value`, rounded down
    pub fn fee_on(&self, value: &Amount) -> Amount {
        let scaled = value.as_biguint() * BigUint::from(self.0);
        Amount::from_biguint(scaled / BigUint::from(BASIS_POINTS_SCALE))
    }
}

/// Fee rate per ESOP class, applied according to the seller's class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub normal: FeeRate,
    pub performance: FeeRate,
}

impl FeeSchedule {
    pub fn rate_for(&self, class: EsopClass) -> FeeRate {
        match class {
            EsopClass::NORMAL => self.normal,
            EsopClass::PERFORMANCE => self.performance,
        }
    }
}
