use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::account::AccountId;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    /// Opens an account, `id` is generated when missing.
    Open {
        id: Option<AccountId>,
        holder_name: String,
    },
    Deposit {
        account: AccountId,
        amount: Decimal,
    },
    Withdraw {
        account: AccountId,
        amount: Decimal,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Account is required for {kind:?}")]
    AccountRequired { kind: OperationKind },
    #[error("Destination account is required for {kind:?}")]
    DestinationRequired { kind: OperationKind },
    #[error("Holder name is required for {kind:?}")]
    HolderRequired { kind: OperationKind },
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: OperationKind },
}

impl LedgerCommand {
    /// Checks that the fields needed by `kind` are present.
    ///
    /// Values themselves (amount sign, blank names) are validated by the
    /// account when the command runs.
    pub fn parse(
        kind: OperationKind,
        account: Option<String>,
        destination: Option<String>,
        holder_name: Option<String>,
        amount: Option<Decimal>,
    ) -> Result<Self, CommandError> {
        let account = account.filter(|id| !id.is_empty()).map(AccountId::new);
        match kind {
            OperationKind::Open => Ok(Self::Open {
                id: account,
                holder_name: holder_name.ok_or(CommandError::HolderRequired { kind })?,
            }),
            OperationKind::Deposit => Ok(Self::Deposit {
                account: account.ok_or(CommandError::AccountRequired { kind })?,
                amount: amount.ok_or(CommandError::AmountRequired { kind })?,
            }),
            OperationKind::Withdraw => Ok(Self::Withdraw {
                account: account.ok_or(CommandError::AccountRequired { kind })?,
                amount: amount.ok_or(CommandError::AmountRequired { kind })?,
            }),
            OperationKind::Transfer => Ok(Self::Transfer {
                from: account.ok_or(CommandError::AccountRequired { kind })?,
                to: destination
                    .filter(|id| !id.is_empty())
                    .map(AccountId::new)
                    .ok_or(CommandError::DestinationRequired { kind })?,
                amount: amount.ok_or(CommandError::AmountRequired { kind })?,
            }),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Open { .. } => OperationKind::Open,
            Self::Deposit { .. } => OperationKind::Deposit,
            Self::Withdraw { .. } => OperationKind::Withdraw,
            Self::Transfer { .. } => OperationKind::Transfer,
        }
    }
}
