//! Arbitrary-precision numeric types for prices, quantities and amounts
//!
//! All three wrap `BigUint`, so values are non-negative by construction and
//! cannot overflow. Subtraction is always checked: `checked_sub` returns
//! `None` where a plain subtraction would go negative.
//!
//! Values serialize as decimal strings so that large balances survive JSON
//! round trips without precision loss.

use num_bigint::BigUint;
use num_traits::{CheckedSub, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

/// Error returned when text is not a plain non-negative decimal integer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a non-negative integer: {input:?}")]
pub struct ParseNumericError {
    pub input: String,
}

fn parse_digits(input: &str) -> Result<BigUint, ParseNumericError> {
    let malformed = || ParseNumericError {
        input: input.to_string(),
    };
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    BigUint::parse_bytes(input.as_bytes(), 10).ok_or_else(malformed)
}

macro_rules! unsigned_numeric {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(BigUint);

        impl $name {
            /// The zero value
            pub fn zero() -> Self {
                Self(BigUint::zero())
            }

            pub fn from_u64(value: u64) -> Self {
                Self(BigUint::from(value))
            }

            pub fn from_biguint(value: BigUint) -> Self {
                Self(value)
            }

            pub fn as_biguint(&self) -> &BigUint {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Subtract, returning `None` if the result would be negative
            pub fn checked_sub(&self, other: &Self) -> Option<Self> {
                self.0.checked_sub(&other.0).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::from_u64(value)
            }
        }

        impl Add for $name {
            type Output = $name;

            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl<'a> Add<&'a $name> for &'a $name {
            type Output = $name;

            fn add(self, rhs: &'a $name) -> $name {
                $name(&self.0 + &rhs.0)
            }
        }

        impl AddAssign<&$name> for $name {
            fn add_assign(&mut self, rhs: &$name) {
                self.0 += &rhs.0;
            }
        }

        impl<'a> Sum<&'a $name> for $name {
            fn sum<I: Iterator<Item = &'a $name>>(iter: I) -> Self {
                iter.fold($name::zero(), |acc, v| &acc + v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseNumericError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_digits(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

unsigned_numeric!(
    /// Number of ESOP units
    Quantity
);

unsigned_numeric!(
    /// Limit price per unit, in currency
    Price
);

unsigned_numeric!(
    /// Currency amount (wallet balances, order values, fees)
    Amount
);

impl Price {
    /// Total value of `quantity` units at this price
    pub fn value_of(&self, quantity: &Quantity) -> Amount {
        Amount(&self.0 * &quantity.0)
    }
}

impl<'a> Mul<&'a Quantity> for &'a Price {
    type Output = Amount;

    fn mul(self, rhs: &'a Quantity) -> Amount {
        self.value_of(rhs)
    }
}
