use std::io::Write;

use anyhow::Context;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::AccountSummary;

#[derive(Debug, Serialize)]
struct AccountRow<'a> {
    account: &'a str,
    holder: &'a str,
    balance: Decimal,
}

impl<'a> From<&'a AccountSummary> for AccountRow<'a> {
    fn from(summary: &'a AccountSummary) -> Self {
        Self {
            account: summary.id.as_str(),
            holder: &summary.holder_name,
            balance: summary.balance,
        }
    }
}

/// Writes one `account,holder,balance` row per summary, in iteration order.
pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = AccountSummary>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for summary in accounts {
        writer
            .serialize(AccountRow::from(&summary))
            .with_context(|| format!("Failed to write account `{}` to CSV", summary.id))?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}
