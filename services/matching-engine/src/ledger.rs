//! Per-user balances and the platform fee accumulator
//!
//! The ledger owns every account. Callers validate business rules (enough
//! free funds, limits) before calling in; the ledger itself only refuses
//! mutations that would drive a bucket negative, and in that case leaves
//! every balance untouched.

use esop_types::account::{UserAccount, UserProfile, VestingLot};
use esop_types::errors::{ExchangeError, LedgerError, Rejection};
use esop_types::ids::UserId;
use esop_types::numeric::{Amount, Quantity};
use esop_types::order::EsopClass;
use esop_types::trade::Trade;
use std::collections::HashMap;
use tracing::debug;

fn violation(user: &UserId, bucket: &str) -> LedgerError {
    LedgerError::InvariantViolation {
        username: user.to_string(),
        bucket: bucket.to_string(),
    }
}

fn unknown(user: &UserId) -> LedgerError {
    LedgerError::UnknownAccount {
        username: user.to_string(),
    }
}

/// Buyer side of a fill: release the reservation, refund price improvement,
/// credit NORMAL units
fn apply_buy_fill(
    account: &mut UserAccount,
    user: &UserId,
    committed: &Amount,
    actual: &Amount,
    quantity: &Quantity,
) -> Result<(), LedgerError> {
    let locked = account
        .wallet
        .locked
        .checked_sub(committed)
        .ok_or_else(|| violation(user, "wallet.locked"))?;
    let refund = committed
        .checked_sub(actual)
        .ok_or_else(|| violation(user, "wallet.free"))?;

    account.wallet.locked = locked;
    account.wallet.free += &refund;
    account.normal.free += quantity;
    Ok(())
}

/// Seller side of a fill: consume locked units, credit proceeds net of fee
fn apply_sell_fill(
    account: &mut UserAccount,
    user: &UserId,
    class: EsopClass,
    quantity: &Quantity,
    gross: &Amount,
    fee: &Amount,
) -> Result<(), LedgerError> {
    let locked = account
        .inventory(class)
        .locked
        .checked_sub(quantity)
        .ok_or_else(|| violation(user, &format!("{class}.locked")))?;
    let proceeds = gross
        .checked_sub(fee)
        .ok_or_else(|| violation(user, "wallet.free"))?;

    account.inventory_mut(class).locked = locked;
    account.wallet.free += &proceeds;
    Ok(())
}

/// All user accounts plus collected platform fees
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<UserId, UserAccount>,
    platform_fees: Amount,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty account for `profile`
    ///
    /// Rejects with one `DuplicateUser` per colliding field (username, email,
    /// phone number).
    pub fn register(&mut self, profile: UserProfile) -> Result<UserId, Rejection> {
        let user = profile.user_id();
        let mut errors = Vec::new();
        let mut duplicate = |field: &str| {
            errors.push(ExchangeError::DuplicateUser {
                field: field.to_string(),
            })
        };

        if self.accounts.contains_key(&user) {
            duplicate("userName");
        }
        if self.accounts.values().any(|a| a.profile.email == profile.email) {
            duplicate("email");
        }
        if self
            .accounts
            .values()
            .any(|a| a.profile.phone_number == profile.phone_number)
        {
            duplicate("phoneNumber");
        }
        Rejection::check(errors)?;

        self.accounts.insert(user.clone(), UserAccount::new(profile));
        Ok(user)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.accounts.contains_key(user)
    }

    pub fn account(&self, user: &UserId) -> Result<&UserAccount, LedgerError> {
        self.accounts.get(user).ok_or_else(|| unknown(user))
    }

    pub fn account_mut(&mut self, user: &UserId) -> Result<&mut UserAccount, LedgerError> {
        self.accounts.get_mut(user).ok_or_else(|| unknown(user))
    }

    pub fn add_funds(&mut self, user: &UserId, amount: &Amount) -> Result<(), LedgerError> {
        self.account_mut(user)?.wallet.free += amount;
        Ok(())
    }

    pub fn credit_performance(&mut self, user: &UserId, quantity: &Quantity) -> Result<(), LedgerError> {
        self.account_mut(user)?.performance.free += quantity;
        Ok(())
    }

    pub fn add_vesting_lot(&mut self, user: &UserId, lot: VestingLot) -> Result<(), LedgerError> {
        self.account_mut(user)?.unvested.push(lot);
        Ok(())
    }

    /// Move released vesting units into free NORMAL inventory
    pub fn credit_vested(&mut self, user: &UserId, quantity: &Quantity) -> Result<(), LedgerError> {
        self.account_mut(user)?.normal.free += quantity;
        Ok(())
    }

    /// Move `amount` from free to locked currency
    pub fn reserve_for_buy(&mut self, user: &UserId, amount: &Amount) -> Result<(), LedgerError> {
        let wallet = &mut self.account_mut(user)?.wallet;
        let free = wallet
            .free
            .checked_sub(amount)
            .ok_or_else(|| violation(user, "wallet.free"))?;
        wallet.free = free;
        wallet.locked += amount;
        Ok(())
    }

    /// Move `quantity` units of `class` from free to locked
    pub fn reserve_for_sell(
        &mut self,
        user: &UserId,
        class: EsopClass,
        quantity: &Quantity,
    ) -> Result<(), LedgerError> {
        let inventory = self.account_mut(user)?.inventory_mut(class);
        let free = inventory
            .free
            .checked_sub(quantity)
            .ok_or_else(|| violation(user, &format!("{class}.free")))?;
        inventory.free = free;
        inventory.locked += quantity;
        Ok(())
    }

    /// Settle the buyer's side of one fill
    ///
    /// `committed` is what was reserved at the buy price, `actual` what the
    /// fill costs at the sell price. Bought units are always NORMAL.
    pub fn settle_buy_fill(
        &mut self,
        buyer: &UserId,
        committed: &Amount,
        actual: &Amount,
        quantity: &Quantity,
    ) -> Result<(), LedgerError> {
        let account = self.accounts.get_mut(buyer).ok_or_else(|| unknown(buyer))?;
        apply_buy_fill(account, buyer, committed, actual, quantity)
    }

    /// Settle the seller's side of one fill
    pub fn settle_sell_fill(
        &mut self,
        seller: &UserId,
        class: EsopClass,
        quantity: &Quantity,
        gross: &Amount,
        fee: &Amount,
    ) -> Result<(), LedgerError> {
        let account = self.accounts.get_mut(seller).ok_or_else(|| unknown(seller))?;
        apply_sell_fill(account, seller, class, quantity, gross, fee)
    }

    pub fn credit_platform_fee(&mut self, fee: &Amount) {
        self.platform_fees += fee;
    }

    pub fn collected_fees(&self) -> &Amount {
        &self.platform_fees
    }

    /// Apply both sides of a trade and its fee, or nothing at all
    ///
    /// Both accounts are updated on copies first; balances are only written
    /// back once every movement has been checked. Handles a user trading
    /// with themselves.
    pub fn settle_fill(&mut self, trade: &Trade) -> Result<(), LedgerError> {
        let mut buyer = self.account(&trade.buyer)?.clone();
        apply_buy_fill(
            &mut buyer,
            &trade.buyer,
            &trade.buy_value,
            &trade.sell_value,
            &trade.quantity,
        )?;

        let mut seller = if trade.seller == trade.buyer {
            None
        } else {
            Some(self.account(&trade.seller)?.clone())
        };
        apply_sell_fill(
            seller.as_mut().unwrap_or(&mut buyer),
            &trade.seller,
            trade.esop_class,
            &trade.quantity,
            &trade.sell_value,
            &trade.fee,
        )?;

        self.accounts.insert(trade.buyer.clone(), buyer);
        if let Some(seller) = seller {
            self.accounts.insert(trade.seller.clone(), seller);
        }
        self.credit_platform_fee(&trade.fee);

        debug!(
            sequence = trade.sequence,
            buyer = %trade.buyer,
            seller = %trade.seller,
            quantity = %trade.quantity,
            fee = %trade.fee,
            "Fill settled"
        );
        Ok(())
    }
}
