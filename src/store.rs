//! JSONL file store
//!
//! Reading and writing of the entity files shared by every generator. The
//! write mode is an explicit parameter: the baseline generators truncate
//! their output, the scenario generators append to the shared
//! controlled-trades file, and callers must say which they want.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::types::{Account, Trade};

/// Whether opening an output file discards or preserves existing content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// Buffered JSON-lines writer for any serializable record type
pub struct LedgerWriter {
    writer: BufWriter<File>,
}

impl LedgerWriter {
    /// Open an output file in the given mode, creating parent directories
    pub fn open(path: impl AsRef<Path>, mode: WriteMode) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let file = match mode {
            WriteMode::Truncate => File::create(path),
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path),
        }
        .with_context(|| format!("Failed to open output file {}", path.display()))?;

        Ok(LedgerWriter {
            writer: BufWriter::new(file),
        })
    }

    /// Write one record as a JSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to serialize record")?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_all<'a, T, I>(&mut self, records: I) -> Result<usize>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut count = 0;
        for record in records {
            self.write(record)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output file")?;
        Ok(())
    }
}

/// Load the account store. A missing file is a fatal precondition error:
/// every generator needs accounts to exist before it can run.
pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!(
            "Accounts file not found: {}. Run `market-synth accounts` first.",
            path.display()
        );
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut accounts = Vec::new();
    let mut skipped = 0;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Read error at line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Account>(&line) {
            Ok(account) => accounts.push(account),
            Err(err) => {
                warn!("Skipping malformed account at line {}: {}", line_no + 1, err);
                skipped += 1;
            }
        }
    }

    if accounts.is_empty() {
        anyhow::bail!("No usable accounts in {}", path.display());
    }

    info!(
        "Loaded {} accounts from {} ({} skipped)",
        accounts.len(),
        path.display(),
        skipped
    );
    Ok(accounts)
}

/// Streaming reader over a trade ledger.
///
/// Yields `(line_number, parse_result)` so the reconciler can log and skip
/// malformed lines without aborting. Never holds more than one line in
/// memory.
#[derive(Debug)]
pub struct LedgerReader {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl LedgerReader {
    /// Open a ledger. A missing file is a fatal precondition error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!(
                "Trades file not found: {}. Run `market-synth trades` first.",
                path.display()
            );
        }
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(LedgerReader {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for LedgerReader {
    type Item = (usize, Result<Trade>);

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_no += 1;
        let result = line
            .map_err(anyhow::Error::from)
            .and_then(|l| serde_json::from_str::<Trade>(&l).map_err(anyhow::Error::from));
        Some((self.line_no, result))
    }
}
