use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tracing::{info, warn};

use crate::account::{Account, AccountError, AccountId, AccountSummary};

/// How many fresh ids [`AccountRegistry::create_account`] tries before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Account not found: {id}")]
    AccountNotFound { id: AccountId },
    #[error("Account already exists: {id}")]
    DuplicateAccount { id: AccountId },
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Concurrent index of accounts by id.
///
/// Shares no lock with the accounts it holds, so lookups never wait on a
/// balance operation.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with a generated id and zero balance.
    pub fn create_account(&self, holder_name: &str) -> Result<Arc<Account>, RegistryError> {
        let mut attempt = 1;
        loop {
            let account = Account::new(AccountId::generate(holder_name), holder_name)?;
            match self.register(account) {
                Err(RegistryError::DuplicateAccount { id }) if attempt < MAX_ID_ATTEMPTS => {
                    warn!(account = %id, attempt, "generated account id already taken, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Inserts `account`, leaving an existing entry with the same id untouched.
    pub fn register(&self, account: Account) -> Result<Arc<Account>, RegistryError> {
        match self.accounts.entry(account.id().clone()) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateAccount {
                id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let account = Arc::new(account);
                entry.insert(Arc::clone(&account));
                info!(account = %account.id(), holder = account.holder_name(), "account registered");
                Ok(account)
            }
        }
    }

    pub fn find(&self, id: &str) -> Result<Arc<Account>, RegistryError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::AccountNotFound {
                id: AccountId::from(id),
            })
    }

    /// Accounts present at call time, ordered by id.
    ///
    /// Balances are not frozen, they may change while the iterator is consumed.
    pub fn list_all(&self) -> impl Iterator<Item = Arc<Account>> + use<> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        accounts.into_iter()
    }

    pub fn summaries(&self) -> impl Iterator<Item = AccountSummary> + use<> {
        self.list_all().map(|account| account.summary())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
