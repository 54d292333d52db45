use std::{
    borrow::Borrow,
    fmt, ptr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Length of the random part of a generated [`AccountId`].
const GENERATED_SUFFIX_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Holder initials followed by a random suffix, e.g. `AL-3f9c02ab`.
    ///
    /// Uniqueness is not guaranteed, the registry detects collisions.
    pub fn generate(holder_name: &str) -> Self {
        let initials: String = holder_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        let initials = if initials.is_empty() {
            "XX".to_string()
        } else {
            initials
        };
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{initials}-{}", &suffix[..GENERATED_SUFFIX_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
    TransferredOut { to: AccountId },
    TransferredIn { from: AccountId },
}

/// Balance change that was applied to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEvent {
    pub account: AccountId,
    pub amount: Decimal,
    pub kind: AccountEventKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account holder name cannot be empty")]
    InvalidName,
    #[error("Amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Insufficient balance. Available: {available}, requested: {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },
    #[error("Balance would exceed the representable range")]
    BalanceOverflow,
}

/// Point in time view of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub holder_name: String,
    pub balance: Decimal,
}

/// State guarded by the account lock.
///
/// `handle_*` only validate and build events, `apply` is the single place where
/// the balance changes. Once `handle_*` succeeded, `apply` cannot fail.
#[derive(Debug, Default)]
struct Balance {
    amount: Decimal,
}

impl Balance {
    fn handle_credit(
        &self,
        account: &AccountId,
        amount: Decimal,
        kind: AccountEventKind,
    ) -> Result<AccountEvent, AccountError> {
        if self.amount.checked_add(amount).is_none() {
            return Err(AccountError::BalanceOverflow);
        }
        Ok(AccountEvent {
            account: account.clone(),
            amount,
            kind,
        })
    }

    fn handle_debit(
        &self,
        account: &AccountId,
        amount: Decimal,
        kind: AccountEventKind,
    ) -> Result<AccountEvent, AccountError> {
        if self.amount < amount {
            return Err(AccountError::InsufficientBalance {
                available: self.amount,
                requested: amount,
            });
        }
        Ok(AccountEvent {
            account: account.clone(),
            amount,
            kind,
        })
    }

    fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited | AccountEventKind::TransferredIn { .. } => {
                self.amount += event.amount;
            }
            AccountEventKind::Withdrawn | AccountEventKind::TransferredOut { .. } => {
                self.amount -= event.amount;
            }
        }
    }
}

/// Balance holder that can be shared between threads.
///
/// Every account owns its own lock. Operations touching two accounts take both
/// locks in a global order, see [`Account::transfer`].
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    holder_name: String,
    balance: Mutex<Balance>,
}

impl Account {
    pub fn new(id: AccountId, holder_name: &str) -> Result<Self, AccountError> {
        let holder_name = holder_name.trim();
        if holder_name.is_empty() {
            return Err(AccountError::InvalidName);
        }
        Ok(Self {
            id,
            holder_name: holder_name.to_string(),
            balance: Mutex::default(),
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Decimal {
        self.lock().amount
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.clone(),
            holder_name: self.holder_name.clone(),
            balance: self.balance(),
        }
    }

    pub fn deposit(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        validate_amount(amount)?;
        let mut balance = self.lock();
        let event = balance
            .handle_credit(&self.id, amount, AccountEventKind::Deposited)
            .inspect_err(|err| self.log_rejected("deposit", err))?;
        balance.apply(&event);
        debug!(account = %self.id, %amount, balance = %balance.amount, "deposited");
        Ok(event)
    }

    pub fn withdraw(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        validate_amount(amount)?;
        let mut balance = self.lock();
        let event = balance
            .handle_debit(&self.id, amount, AccountEventKind::Withdrawn)
            .inspect_err(|err| self.log_rejected("withdraw", err))?;
        balance.apply(&event);
        debug!(account = %self.id, %amount, balance = %balance.amount, "withdrawn");
        Ok(event)
    }

    /// Moves `amount` to `destination`, returning the event applied to `self`.
    ///
    /// Both locks are held while the balance is checked and both sides are
    /// changed. Transferring to the same account only checks the balance.
    pub fn transfer(
        &self,
        destination: &Account,
        amount: Decimal,
    ) -> Result<AccountEvent, AccountError> {
        validate_amount(amount)?;
        let outgoing = AccountEventKind::TransferredOut {
            to: destination.id.clone(),
        };

        if ptr::eq(self, destination) {
            let balance = self.lock();
            let event = balance
                .handle_debit(&self.id, amount, outgoing)
                .inspect_err(|err| self.log_rejected("transfer", err))?;
            debug!(account = %self.id, %amount, "transfer to self, balance unchanged");
            return Ok(event);
        }

        let (mut source, mut target) = Self::lock_pair(self, destination);
        let debit = source
            .handle_debit(&self.id, amount, outgoing)
            .inspect_err(|err| self.log_rejected("transfer", err))?;
        let credit = target
            .handle_credit(
                &destination.id,
                amount,
                AccountEventKind::TransferredIn {
                    from: self.id.clone(),
                },
            )
            .inspect_err(|err| destination.log_rejected("transfer", err))?;
        source.apply(&debit);
        target.apply(&credit);
        debug!(
            from = %self.id,
            to = %destination.id,
            %amount,
            balance = %source.amount,
            "transferred"
        );
        Ok(debit)
    }

    /// Reads both balances while holding both locks.
    pub fn balances_of(a: &Account, b: &Account) -> (Decimal, Decimal) {
        if ptr::eq(a, b) {
            let amount = a.balance();
            return (amount, amount);
        }
        let (a, b) = Self::lock_pair(a, b);
        (a.amount, b.amount)
    }

    fn lock(&self) -> MutexGuard<'_, Balance> {
        // A panic while holding the lock cannot leave a half applied event.
        self.balance.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ordered by id, the address only breaks ties between distinct accounts
    /// sharing an id.
    fn lock_order_key(&self) -> (&AccountId, usize) {
        (&self.id, ptr::from_ref(self) as usize)
    }

    /// Locks two distinct accounts in global order, guards are returned in
    /// argument order.
    fn lock_pair<'a>(
        a: &'a Account,
        b: &'a Account,
    ) -> (MutexGuard<'a, Balance>, MutexGuard<'a, Balance>) {
        if a.lock_order_key() < b.lock_order_key() {
            let first = a.lock();
            let second = b.lock();
            (first, second)
        } else {
            let first = b.lock();
            let second = a.lock();
            (second, first)
        }
    }

    fn log_rejected(&self, operation: &'static str, err: &AccountError) {
        debug!(account = %self.id, operation, %err, "rejected");
    }
}

fn validate_amount(amount: Decimal) -> Result<(), AccountError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(AccountError::InvalidAmount { amount })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn account(id: &str) -> Account {
        Account::new(AccountId::from(id), "Ada Lovelace").unwrap()
    }

    fn funded(id: &str, amount: i64) -> Account {
        let acc = account(id);
        if amount > 0 {
            acc.deposit(Decimal::from(amount)).unwrap();
        }
        acc
    }

    #[test]
    fn new_account_validates_holder_name() {
        let acc = Account::new(AccountId::from("A1"), "  Ada Lovelace ").unwrap();
        assert_eq!(acc.holder_name(), "Ada Lovelace");
        assert_eq!(acc.balance(), Decimal::ZERO);

        let err = Account::new(AccountId::from("A2"), "   ").unwrap_err();
        assert_eq!(err, AccountError::InvalidName);
        assert_eq!(err.to_string(), "Account holder name cannot be empty");
    }

    #[test]
    fn deposit_then_withdraw() {
        let acc = account("A1");
        let evt = acc.deposit(Decimal::from(500)).unwrap();
        assert_eq!(evt.kind, AccountEventKind::Deposited);
        assert_eq!(acc.balance(), Decimal::from(500));

        let evt = acc.withdraw(Decimal::from(200)).unwrap();
        assert_eq!(evt.kind, AccountEventKind::Withdrawn);
        assert_eq!(evt.amount, Decimal::from(200));
        assert_eq!(acc.balance(), Decimal::from(300));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let acc = funded("A1", 100);
        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            assert!(matches!(
                acc.deposit(amount),
                Err(AccountError::InvalidAmount { .. })
            ));
            assert!(matches!(
                acc.withdraw(amount),
                Err(AccountError::InvalidAmount { .. })
            ));
        }
        let other = account("B1");
        assert!(matches!(
            acc.transfer(&other, Decimal::ZERO),
            Err(AccountError::InvalidAmount { .. })
        ));
        assert_eq!(acc.balance(), Decimal::from(100));
        assert_eq!(other.balance(), Decimal::ZERO);
    }

    #[test]
    fn withdraw_more_than_available() {
        let acc = funded("X", 100);
        let err = acc.withdraw(Decimal::from(150)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientBalance {
                available: Decimal::from(100),
                requested: Decimal::from(150),
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient balance. Available: 100, requested: 150"
        );
        assert_eq!(acc.balance(), Decimal::from(100));
    }

    #[test]
    fn transfer_moves_funds() {
        let a = funded("A", 1000);
        let b = account("B");
        let evt = a.transfer(&b, Decimal::from(300)).unwrap();
        assert_eq!(
            evt.kind,
            AccountEventKind::TransferredOut {
                to: AccountId::from("B")
            }
        );
        assert_eq!(a.balance(), Decimal::from(700));
        assert_eq!(b.balance(), Decimal::from(300));

        // in the opposite direction the lock order is the same
        b.transfer(&a, Decimal::from(100)).unwrap();
        assert_eq!(Account::balances_of(&a, &b), (Decimal::from(800), Decimal::from(200)));
    }

    #[test]
    fn failed_transfer_changes_nothing() {
        let a = funded("A", 50);
        let b = funded("B", 10);
        let err = a.transfer(&b, Decimal::from(51)).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientBalance { .. }));
        assert_eq!(Account::balances_of(&a, &b), (Decimal::from(50), Decimal::from(10)));
    }

    #[test]
    fn transfer_overflowing_destination_changes_nothing() {
        let a = funded("A", 10);
        let b = account("B");
        b.deposit(Decimal::MAX).unwrap();
        let err = a.transfer(&b, Decimal::from(1)).unwrap_err();
        assert_eq!(err, AccountError::BalanceOverflow);
        assert_eq!(a.balance(), Decimal::from(10));
        assert_eq!(b.balance(), Decimal::MAX);
    }

    #[test]
    fn transfer_to_self_is_a_checked_noop() {
        let a = funded("A", 100);
        a.transfer(&a, Decimal::from(40)).unwrap();
        assert_eq!(a.balance(), Decimal::from(100));

        let err = a.transfer(&a, Decimal::from(101)).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientBalance { .. }));
        assert_eq!(Account::balances_of(&a, &a), (Decimal::from(100), Decimal::from(100)));
    }

    #[test]
    fn accounts_sharing_an_id_still_transfer() {
        let a = funded("SAME", 20);
        let b = account("SAME");
        a.transfer(&b, Decimal::from(5)).unwrap();
        b.transfer(&a, Decimal::from(1)).unwrap();
        assert_eq!(Account::balances_of(&a, &b), (Decimal::from(16), Decimal::from(4)));
    }

    #[test]
    fn generated_ids_use_initials() {
        let id = AccountId::generate("ada  lovelace");
        assert!(id.as_str().starts_with("AL-"));
        assert_eq!(id.as_str().len(), "AL-".len() + GENERATED_SUFFIX_LEN);
        assert!(AccountId::generate("").as_str().starts_with("XX-"));
    }

    #[test]
    fn summary_reflects_balance() {
        let acc = funded("A", 42);
        assert_eq!(
            acc.summary(),
            AccountSummary {
                id: AccountId::from("A"),
                holder_name: "Ada Lovelace".to_string(),
                balance: Decimal::from(42),
            }
        );
    }

    proptest! {
        /// Random transfers between three accounts never create or destroy
        /// money and never leave a balance negative.
        #[test]
        fn transfers_conserve_money(
            ops in prop::collection::vec((0usize..3, 0usize..3, -10i64..200), 1..64)
        ) {
            let accounts = [funded("A", 300), funded("B", 200), funded("C", 0)];
            let total = Decimal::from(500);
            for (from, to, amount) in ops {
                let before = Account::balances_of(&accounts[from], &accounts[to]);
                let result = accounts[from].transfer(&accounts[to], Decimal::from(amount));
                let after = Account::balances_of(&accounts[from], &accounts[to]);
                if result.is_err() {
                    prop_assert_eq!(before, after);
                }
                prop_assert_eq!(before.0 + before.1, after.0 + after.1);
                let sum: Decimal = accounts.iter().map(Account::balance).sum();
                prop_assert_eq!(sum, total);
                prop_assert!(accounts.iter().all(|acc| acc.balance() >= Decimal::ZERO));
            }
        }
    }
}
