// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL store-event write-ahead log with group commit support.
//!
//! Events are durably stored before acknowledgement, enabling crash
//! recovery via snapshot + replay. Group commit batches writes (~10ms) for
//! performance.
//!
//! Each entry is a single line of JSON: `{"seq":N,"event":{...}}\n`

use crate::event::StoreEvent;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// Flush interval for group commit (~10ms batches)
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum entries to buffer before forcing flush
const FLUSH_THRESHOLD: usize = 100;

/// Errors that can occur in Wal operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization helper for writing WAL entries without cloning the event.
#[derive(Serialize)]
struct WalRecordRef<'a> {
    seq: u64,
    event: &'a StoreEvent,
}

/// Deserialization helper for reading WAL entries.
#[derive(Deserialize)]
struct WalRecord {
    seq: u64,
    event: StoreEvent,
}

/// JSONL WAL for durable store events with group commit.
///
/// Events are buffered in memory and flushed to disk either when
/// `needs_flush()` reports the interval elapsed / buffer full, or explicitly
/// via `flush()`. Replay happens once, at `open`: the caller receives every
/// valid entry to re-apply over the last snapshot. A trailing corrupt
/// region (torn write on crash) is rotated to a `.bak` file and the valid
/// prefix preserved.
pub struct Wal {
    file: File,
    path: PathBuf,
    /// Next sequence number to assign
    write_seq: u64,
    /// Buffered JSON lines waiting to be flushed (without trailing newline)
    write_buffer: Vec<Vec<u8>>,
    /// Last flush timestamp for interval checking
    last_flush: Instant,
}

impl Wal {
    /// Open or create a WAL at the given path, returning the log handle and
    /// every valid event recorded in it (in write order) for replay.
    pub fn open(path: &Path) -> Result<(Self, Vec<StoreEvent>), WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (records, corrupt) = Self::read_records(&file)?;

        if corrupt {
            // Rotate the corrupt WAL to .bak and rewrite the valid prefix.
            drop(file);
            let bak_path = crate::snapshot::rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak_path.display(),
                valid_entries = records.len(),
                "Corrupt WAL detected, rotating to .bak and preserving valid entries",
            );
            std::fs::rename(path, &bak_path)?;

            {
                let mut new_file = File::create(path)?;
                for record in &records {
                    let line = serde_json::to_vec(&WalRecordRef {
                        seq: record.seq,
                        event: &record.event,
                    })?;
                    new_file.write_all(&line)?;
                    new_file.write_all(b"\n")?;
                }
                new_file.sync_all()?;
            }

            file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(path)?;
        }

        let write_seq = records.iter().map(|r| r.seq).max().unwrap_or(0);
        let events = records.into_iter().map(|r| r.event).collect();

        Ok((
            Self {
                file,
                path: path.to_owned(),
                write_seq,
                write_buffer: Vec::new(),
                last_flush: Instant::now(),
            },
            events,
        ))
    }

    /// Read all valid records, stopping at the first corrupt entry.
    ///
    /// Returns `(records, corrupt)` where `corrupt` is true if a parse error
    /// was encountered (not just EOF).
    fn read_records(file: &File) -> Result<(Vec<WalRecord>, bool), WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut records = Vec::new();
        let mut corrupt = false;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    corrupt = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        Ok((records, corrupt))
    }

    /// Append an event to the write buffer.
    ///
    /// Returns the assigned sequence number. The event is NOT durable until
    /// `flush()` is called.
    pub fn append(&mut self, event: &StoreEvent) -> Result<u64, WalError> {
        self.write_seq += 1;
        let seq = self.write_seq;
        let record = WalRecordRef { seq, event };
        let json_bytes = serde_json::to_vec(&record)?;
        self.write_buffer.push(json_bytes);
        Ok(seq)
    }

    /// Check if flush is needed (interval elapsed or buffer full).
    pub fn needs_flush(&self) -> bool {
        !self.write_buffer.is_empty()
            && (self.last_flush.elapsed() >= FLUSH_INTERVAL
                || self.write_buffer.len() >= FLUSH_THRESHOLD)
    }

    /// Flush all buffered entries to disk with a single fsync.
    ///
    /// This is the durability point: after flush returns successfully, all
    /// buffered events are guaranteed to be on disk.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        for mut json_bytes in self.write_buffer.drain(..) {
            json_bytes.push(b'\n');
            self.file.write_all(&json_bytes)?;
        }

        self.file.sync_all()?;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Truncate the log after a durable snapshot has captured its contents.
    ///
    /// The sequence counter keeps counting up so later entries never reuse
    /// a seq from before the truncation.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.flush()?;
        self.file.set_len(0)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
