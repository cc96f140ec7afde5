//! Token ledger the exit game takes custody through.
//!
//! [`Ledger`] is the narrow contract the exit game needs: move funds,
//! grant a spending allowance, and spend one. [`InMemoryLedger`] keeps
//! per-address balances and per-(owner, spender) allowances. Every
//! mutation is all-or-nothing: a failed call leaves balances unchanged.

use std::collections::HashMap;

use exitgame_types::{Address, ExitGameError, Result};

/// Fungible-token ledger operations used by the exit game.
pub trait Ledger {
    /// Current balance of `who`.
    fn balance_of(&self, who: Address) -> u64;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: Address, spender: Address) -> u64;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Returns [`ExitGameError::InsufficientFunds`] if `from` holds less
    /// than `amount`.
    fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<()>;

    /// Set the allowance `spender` has over `owner`'s balance, replacing
    /// any previous value.
    fn approve(&mut self, owner: Address, spender: Address, amount: u64);

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// that much allowance.
    ///
    /// # Errors
    /// - `Unauthorized` if the allowance is below `amount`
    /// - `InsufficientFunds` if `from` holds less than `amount`
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<()>;
}

/// In-memory ledger with balances and allowances.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens for `to`. Funding hook for simulations.
    pub fn mint(&mut self, to: Address, amount: u64) {
        *self.balances.entry(to).or_default() += amount;
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> u64 {
        self.balances.values().sum()
    }

    fn debit_check(&self, from: Address, amount: u64) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(ExitGameError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn move_funds(&mut self, from: Address, to: Address, amount: u64) {
        if let Some(bal) = self.balances.get_mut(&from) {
            *bal -= amount;
        }
        *self.balances.entry(to).or_default() += amount;
    }
}

impl Ledger for InMemoryLedger {
    fn balance_of(&self, who: Address) -> u64 {
        self.balances.get(&who).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: Address, spender: Address) -> u64 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<()> {
        self.debit_check(from, amount)?;
        self.move_funds(from, to, amount);
        tracing::debug!(from = %from.short(), to = %to.short(), amount, "Ledger transfer");
        Ok(())
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(ExitGameError::Unauthorized {
                reason: format!(
                    "spender {spender} allowance {allowed} below {amount} over {from}"
                ),
            });
        }
        self.debit_check(from, amount)?;
        self.approve(from, spender, allowed - amount);
        self.move_funds(from, to, amount);
        tracing::debug!(
            spender = %spender.short(),
            from = %from.short(),
            to = %to.short(),
            amount,
            "Ledger transfer_from"
        );
        Ok(())
    }
}
