use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ladder_types::Standings;

use crate::error::{LogError, Result};
use crate::record::Transaction;
use crate::scan::{BackwardScan, ForwardScan, ReverseLines};

/// Flush/sync strategy for appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    #[default]
    EveryWrite,
    /// Flush to the OS and rely on page-cache writeback.
    OsDefault,
}

/// Configuration for the transaction log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub sync_mode: SyncMode,
}

/// Internal state for the append handle.
struct LogWriter {
    file: File,
    /// End of the last complete record.
    offset: u64,
}

/// Append-only, newline-delimited transaction log.
///
/// The log owns a single append handle; readers open their own handles, so
/// any number of scans can run while the owner holds no lock on the writer.
/// Callers coordinate writers (see `ladder-engine`'s `Ladder`), this type
/// only guarantees that a record is either fully present after `append`
/// returns or not present at all.
pub struct TransactionLog {
    path: PathBuf,
    writer: LogWriter,
    config: LogConfig,
}

impl TransactionLog {
    /// Open (or create) the log file at the given path.
    pub fn open(path: &Path, config: LogConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        debug!(path = %path.display(), offset, "transaction log opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: LogWriter { file, offset },
            config,
        })
    }

    /// Append one record. Returns the byte offset at which it starts.
    ///
    /// If the write fails part-way the file is cut back to its previous
    /// length, so a failed append leaves no trace.
    pub fn append(&mut self, transaction: &Transaction) -> Result<u64> {
        let sync_mode = self.config.sync_mode;
        self.append_with(transaction, |file, line| write_line(file, line, sync_mode))
    }

    fn append_with<F>(&mut self, transaction: &Transaction, write: F) -> Result<u64>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let line = transaction.to_line()?;
        let entry_offset = self.writer.offset;

        if let Err(e) = write(&mut self.writer.file, &line) {
            warn!(offset = entry_offset, error = %e, "append failed; rolling back");
            if let Err(rollback) = self.writer.file.set_len(entry_offset) {
                warn!(offset = entry_offset, error = %rollback, "rollback failed");
            }
            return Err(e.into());
        }

        self.writer.offset += line.len() as u64;
        debug!(
            offset = entry_offset,
            len = line.len(),
            id = %transaction.id,
            kind = %transaction.tx_type(),
            "log append"
        );
        Ok(entry_offset)
    }

    /// The most recent transaction, or `None` for an empty log.
    ///
    /// Unlike the scans, this does not skip a bad line: the tail decides the
    /// current ladder, so an unterminated or unparseable final record is
    /// reported as [`LogError::CorruptTail`].
    pub fn last(&self) -> Result<Option<Transaction>> {
        let Some(mut lines) = self.reverse_lines()? else {
            return Ok(None);
        };
        while let Some(line) = lines.next_line()? {
            if line.is_blank() {
                continue;
            }
            if !line.terminated {
                return Err(LogError::CorruptTail {
                    offset: line.offset,
                    reason: "record is missing its terminating newline".into(),
                });
            }
            return Transaction::from_line(&line.bytes)
                .map(Some)
                .map_err(|e| LogError::CorruptTail {
                    offset: line.offset,
                    reason: e.to_string(),
                });
        }
        Ok(None)
    }

    /// Standings embedded in the tail record; empty for an empty log.
    pub fn read_tail(&self) -> Result<Standings> {
        Ok(self
            .last()?
            .map(|tx| tx.standings)
            .unwrap_or_default())
    }

    /// Records newest-first. Each call starts a fresh scan from the end.
    pub fn scan_backward(&self) -> Result<BackwardScan> {
        Ok(BackwardScan::new(self.reverse_lines()?))
    }

    /// Records oldest-first.
    pub fn scan_forward(&self) -> Result<ForwardScan> {
        Ok(ForwardScan::new(self.open_reader()?))
    }

    /// Byte length of the complete records written so far.
    pub fn offset(&self) -> u64 {
        self.writer.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reverse_lines(&self) -> Result<Option<ReverseLines>> {
        match self.open_reader()? {
            Some(file) => Ok(Some(ReverseLines::new(file)?)),
            None => Ok(None),
        }
    }

    /// A fresh read handle. A log file removed from under us reads as empty.
    fn open_reader(&self) -> Result<Option<File>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_line(file: &mut File, line: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    file.write_all(line)?;
    file.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync_data()?;
    }
    Ok(())
}
