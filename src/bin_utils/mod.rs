//! Non-interactive driver around the ledger core: reads operations from CSV,
//! runs them and prints the resulting accounts.

use std::{
    io::{Read, Write},
    mem,
    sync::{Mutex, PoisonError},
    thread,
};

use crate::{
    command::{LedgerCommand, OperationKind},
    processor::{CommandProcessor, ProcessError, registry_processor::RegistryProcessor},
};
use anyhow::{Context, Result};
use csv_parser::CsvOperationParser;
use csv_printer::print_accounts;
use tracing::debug;
pub mod csv_parser;
pub mod csv_printer;

pub type ErrorPrinter = Box<dyn Fn(u64, ProcessError) + Sync>;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    /// Threads used for the operations between two `open` rows.
    pub workers: usize,
    pub error_printer: ErrorPrinter,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    /// `open` rows act as barriers: everything before one has finished before
    /// the account is opened, so later rows can refer to it.
    pub fn run(self) -> Result<()> {
        let Self {
            input,
            output,
            workers,
            error_printer,
        } = self;
        let parser = CsvOperationParser::new(input);
        let processor = RegistryProcessor::default();
        let mut batch = Vec::new();

        for (line, row) in parser {
            let row = row.with_context(|| format!("Failed to parse operation at line {line}"))?;
            let command = match LedgerCommand::parse(
                row.kind,
                row.account,
                row.destination,
                row.holder,
                row.amount,
            ) {
                Ok(command) => command,
                Err(err) => {
                    error_printer(line, err.into());
                    continue;
                }
            };
            if command.kind() == OperationKind::Open {
                run_batch(&processor, mem::take(&mut batch), workers, &error_printer);
                if let Err(err) = processor.process(command) {
                    error_printer(line, err);
                }
            } else {
                batch.push((line, command));
            }
        }
        run_batch(&processor, batch, workers, &error_printer);

        print_accounts(output, processor.registry.summaries())
    }
}

fn run_batch<P>(
    processor: &P,
    batch: Vec<(u64, LedgerCommand)>,
    workers: usize,
    error_printer: &ErrorPrinter,
) where
    P: CommandProcessor,
{
    if batch.is_empty() {
        return;
    }
    debug!(operations = batch.len(), workers, "running batch");
    if workers <= 1 {
        for (line, command) in batch {
            if let Err(err) = processor.process(command) {
                error_printer(line, err);
            }
        }
        return;
    }

    let queue = Mutex::new(batch.into_iter());
    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| {
                loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some((line, command)) = next else {
                        break;
                    };
                    if let Err(err) = processor.process(command) {
                        error_printer(line, err);
                    }
                }
            });
        }
    });
}
