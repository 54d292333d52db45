use crate::{
    account::Account,
    command::LedgerCommand,
    registry::AccountRegistry,
};

use super::{CommandProcessor, ProcessError, ProcessOutcome};

/// Resolves command ids through an [`AccountRegistry`] and runs them on the
/// accounts directly.
#[derive(Debug, Default)]
pub struct RegistryProcessor {
    pub registry: AccountRegistry,
}

impl CommandProcessor for RegistryProcessor {
    fn process(&self, command: LedgerCommand) -> Result<ProcessOutcome, ProcessError> {
        match command {
            LedgerCommand::Open { id, holder_name } => {
                let account = match id {
                    Some(id) => self.registry.register(Account::new(id, &holder_name)?)?,
                    None => self.registry.create_account(&holder_name)?,
                };
                Ok(ProcessOutcome::Opened(account.id().clone()))
            }
            LedgerCommand::Deposit { account, amount } => {
                let evt = self.registry.find(account.as_str())?.deposit(amount)?;
                Ok(ProcessOutcome::Applied(evt))
            }
            LedgerCommand::Withdraw { account, amount } => {
                let evt = self.registry.find(account.as_str())?.withdraw(amount)?;
                Ok(ProcessOutcome::Applied(evt))
            }
            LedgerCommand::Transfer { from, to, amount } => {
                let source = self.registry.find(from.as_str())?;
                let destination = self.registry.find(to.as_str())?;
                let evt = source.transfer(&destination, amount)?;
                Ok(ProcessOutcome::Applied(evt))
            }
        }
    }
}
