use thiserror::Error;

use crate::{
    account::{AccountError, AccountEvent, AccountId},
    command::{CommandError, LedgerCommand},
    registry::RegistryError,
};

pub mod registry_processor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error(transparent)]
    CommandErr(#[from] CommandError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
    #[error(transparent)]
    RegistryErr(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Opened(AccountId),
    Applied(AccountEvent),
}

/// Runs ledger commands. Implementations are shared between worker threads.
pub trait CommandProcessor: Sync {
    fn process(&self, command: LedgerCommand) -> Result<ProcessOutcome, ProcessError>;
}
