use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::error::Result;
use crate::record::Transaction;

/// Bytes read per step when walking the file backward.
const REVERSE_CHUNK: usize = 8 * 1024;

/// A parsed transaction and the byte offset of its line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub offset: u64,
    pub transaction: Transaction,
}

/// One raw line produced by [`ReverseLines`].
pub(crate) struct RawLine {
    pub offset: u64,
    pub bytes: Vec<u8>,
    /// `false` only for a final line missing its `\n` (a torn write).
    pub terminated: bool,
}

impl RawLine {
    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(u8::is_ascii_whitespace)
    }
}

/// Yields the lines of a file last-to-first, reading fixed-size chunks from
/// the end so only the part of the file actually visited is read.
pub(crate) struct ReverseLines {
    file: File,
    /// Bytes before `pos` have not been read yet.
    pos: u64,
    /// Unconsumed bytes covering `pos..pos + buf.len()`.
    buf: Vec<u8>,
}

impl ReverseLines {
    pub fn new(file: File) -> io::Result<Self> {
        let pos = file.metadata()?.len();
        Ok(Self {
            file,
            pos,
            buf: Vec::new(),
        })
    }

    fn read_chunk(&mut self) -> io::Result<()> {
        let take = (REVERSE_CHUNK as u64).min(self.pos);
        let start = self.pos - take;
        let mut chunk = vec![0u8; take as usize];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&self.buf);
        self.buf = chunk;
        self.pos = start;
        Ok(())
    }

    pub fn next_line(&mut self) -> io::Result<Option<RawLine>> {
        if self.buf.is_empty() {
            if self.pos == 0 {
                return Ok(None);
            }
            self.read_chunk()?;
        }

        // Only the very last line of the file can lack its terminator; every
        // later call starts right after the previous line's `\n`.
        let terminated = self.buf.last() == Some(&b'\n');
        let start = loop {
            let end = self.buf.len() - usize::from(terminated);
            if let Some(nl) = self.buf[..end].iter().rposition(|&b| b == b'\n') {
                break nl + 1;
            }
            if self.pos == 0 {
                break 0;
            }
            self.read_chunk()?;
        };

        let end = self.buf.len() - usize::from(terminated);
        let bytes = self.buf[start..end].to_vec();
        let offset = self.pos + start as u64;
        self.buf.truncate(start);

        Ok(Some(RawLine {
            offset,
            bytes,
            terminated,
        }))
    }
}

/// Newest-first iterator over the records of a log.
///
/// Lines that do not parse (and a torn final line) are skipped as holes;
/// their offsets are available from [`BackwardScan::holes`]. An I/O error
/// is yielded once and ends the scan.
pub struct BackwardScan {
    lines: Option<ReverseLines>,
    holes: Vec<u64>,
}

impl BackwardScan {
    pub(crate) fn new(lines: Option<ReverseLines>) -> Self {
        Self {
            lines,
            holes: Vec::new(),
        }
    }

    /// Offsets of the malformed lines skipped so far.
    pub fn holes(&self) -> &[u64] {
        &self.holes
    }
}

impl Iterator for BackwardScan {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.as_mut()?.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(holes = self.holes.len(), "backward scan complete");
                    self.lines = None;
                    return None;
                }
                Err(e) => {
                    self.lines = None;
                    return Some(Err(e.into()));
                }
            };
            if line.is_blank() {
                continue;
            }
            if !line.terminated {
                warn!(offset = line.offset, "unterminated record; skipping");
                self.holes.push(line.offset);
                continue;
            }
            match Transaction::from_line(&line.bytes) {
                Ok(transaction) => {
                    return Some(Ok(LogRecord {
                        offset: line.offset,
                        transaction,
                    }))
                }
                Err(e) => {
                    warn!(offset = line.offset, error = %e, "malformed record; skipping");
                    self.holes.push(line.offset);
                }
            }
        }
    }
}

/// Oldest-first iterator over the records of a log, with the same hole
/// handling as [`BackwardScan`].
pub struct ForwardScan {
    reader: Option<BufReader<File>>,
    offset: u64,
    holes: Vec<u64>,
}

impl ForwardScan {
    pub(crate) fn new(file: Option<File>) -> Self {
        Self {
            reader: file.map(BufReader::new),
            offset: 0,
            holes: Vec::new(),
        }
    }

    /// Offsets of the malformed lines skipped so far.
    pub fn holes(&self) -> &[u64] {
        &self.holes
    }
}

impl Iterator for ForwardScan {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = match self.reader.as_mut()?.read_until(b'\n', &mut line) {
                Ok(0) => {
                    debug!(holes = self.holes.len(), "forward scan complete");
                    self.reader = None;
                    return None;
                }
                Ok(n) => n,
                Err(e) => {
                    self.reader = None;
                    return Some(Err(e.into()));
                }
            };
            let offset = self.offset;
            self.offset += read as u64;

            let terminated = line.last() == Some(&b'\n');
            if terminated {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            if !terminated {
                warn!(offset, "unterminated record; skipping");
                self.holes.push(offset);
                continue;
            }
            match Transaction::from_line(&line) {
                Ok(transaction) => return Some(Ok(LogRecord { offset, transaction })),
                Err(e) => {
                    warn!(offset, error = %e, "malformed record; skipping");
                    self.holes.push(offset);
                }
            }
        }
    }
}
