//! Account and balance types
//!
//! Each user owns one currency wallet and two ESOP inventories (NORMAL and
//! PERFORMANCE). Every bucket is split into a free part, usable for new
//! orders, and a locked part reserved against open orders. NORMAL units
//! additionally sit in vesting lots until their cycle matures.
//!
//! Invariant: for every class,
//! `total = free + locked + (unreleased vesting cycles of that class)`.

use crate::ids::UserId;
use crate::numeric::{Amount, Quantity};
use crate::order::EsopClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub free: Amount,
    pub locked: Amount,
}

impl Wallet {
    pub fn total(&self) -> Amount {
        &self.free + &self.locked
    }
}

/// ESOP inventory of one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "type")]
    pub class: EsopClass,
    pub free: Quantity,
    pub locked: Quantity,
}

impl Inventory {
    pub fn new(class: EsopClass) -> Self {
        Self {
            class,
            free: Quantity::zero(),
            locked: Quantity::zero(),
        }
    }

    pub fn total(&self) -> Quantity {
        &self.free + &self.locked
    }
}

/// A batch of NORMAL units added at one time, split into vesting cycles
///
/// `cycles[i]` matures once more than `(i + 1) * cycle_duration` has
/// elapsed since `added_at`. Released cycles are zeroed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingLot {
    pub added_at: DateTime<Utc>,
    pub cycles: Vec<Quantity>,
}

impl VestingLot {
    /// Units not yet released
    pub fn unreleased(&self) -> Quantity {
        self.cycles.iter().sum()
    }

    pub fn is_fully_released(&self) -> bool {
        self.cycles.iter().all(Quantity::is_zero)
    }
}

/// Unvested units reported in an account snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvestedEntry {
    /// When the cycle becomes free
    pub matures_at: DateTime<Utc>,
    pub amount: Quantity,
}

/// Registration details of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

impl UserProfile {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.username.clone())
    }
}

/// Per-user ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub profile: UserProfile,
    pub wallet: Wallet,
    pub normal: Inventory,
    pub performance: Inventory,
    pub unvested: Vec<VestingLot>,
}

impl UserAccount {
    /// Create an empty account
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            wallet: Wallet::default(),
            normal: Inventory::new(EsopClass::NORMAL),
            performance: Inventory::new(EsopClass::PERFORMANCE),
            unvested: Vec::new(),
        }
    }

    pub fn inventory(&self, class: EsopClass) -> &Inventory {
        match class {
            EsopClass::NORMAL => &self.normal,
            EsopClass::PERFORMANCE => &self.performance,
        }
    }

    pub fn inventory_mut(&mut self, class: EsopClass) -> &mut Inventory {
        match class {
            EsopClass::NORMAL => &mut self.normal,
            EsopClass::PERFORMANCE => &mut self.performance,
        }
    }

    /// Units still held in vesting lots
    pub fn unvested_total(&self) -> Quantity {
        self.unvested.iter().map(VestingLot::unreleased).fold(Quantity::zero(), |acc, q| acc + q)
    }

    /// Total holdings of one class including unvested units
    pub fn class_total(&self, class: EsopClass) -> Quantity {
        match class {
            EsopClass::NORMAL => &self.normal.total() + &self.unvested_total(),
            EsopClass::PERFORMANCE => self.performance.total(),
        }
    }

    /// Total holdings across both classes, vested or not
    pub fn total_inventory(&self) -> Quantity {
        &self.class_total(EsopClass::NORMAL) + &self.class_total(EsopClass::PERFORMANCE)
    }
}

/// Point-in-time view of one account returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub wallet: Wallet,
    pub inventory: Vec<Inventory>,
    pub unvested: Vec<UnvestedEntry>,
}

impl AccountSnapshot {
    pub fn new(account: &UserAccount, unvested: Vec<UnvestedEntry>) -> Self {
        let profile = &account.profile;
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
            phone_number: profile.phone_number.clone(),
            wallet: account.wallet.clone(),
            inventory: vec![account.normal.clone(), account.performance.clone()],
            unvested,
        }
    }

    pub fn inventory(&self, class: EsopClass) -> Option<&Inventory> {
        self.inventory.iter().find(|inv| inv.class == class)
    }
}
