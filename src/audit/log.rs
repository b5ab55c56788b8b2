//! Bounded, append-only audit trail

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

use super::{AuditEntry, AuditEvent, AuditKind};

/// Default number of entries retained in memory
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Selects entries for export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub to: Option<DateTime<Utc>>,
    /// Restrict to these kinds
    pub kinds: Option<Vec<AuditKind>>,
}

impl AuditFilter {
    /// Full history
    pub fn all() -> Self {
        Self::default()
    }

    /// Only halt transitions
    pub fn halts_only() -> Self {
        Self {
            kinds: Some(vec![AuditKind::HaltTriggered]),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = AuditKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if self.from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.timestamp > to) {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.contains(&entry.kind()),
            None => true,
        }
    }
}

/// Point-in-time export of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    /// Entries evicted from memory before this export
    pub dropped: u64,
    /// Matching entries in sequence order
    pub entries: Vec<AuditEntry>,
}

#[derive(Debug, Default)]
struct AuditBuffer {
    entries: VecDeque<AuditEntry>,
    /// Evicted halt entries, kept for the whole session
    pinned: Vec<AuditEntry>,
    next_seq: u64,
    dropped: u64,
    /// First eviction happened and has not been logged yet
    eviction_pending: bool,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Session-scoped audit trail
///
/// Appends never block on I/O and never fail. When the ring is full the oldest
/// entry is evicted and counted; halt entries survive eviction.
#[derive(Debug)]
pub struct AuditLog {
    capacity: usize,
    inner: Mutex<AuditBuffer>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    /// Create a log retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(AuditBuffer {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY)),
                ..Default::default()
            }),
        }
    }

    /// Append an event, returning its sequence number
    pub fn append(&self, event: AuditEvent) -> u64 {
        let mut buffer = self.inner.lock();

        let mut timestamp = Utc::now();
        if let Some(last) = buffer.last_timestamp {
            timestamp = timestamp.max(last);
        }
        let seq = buffer.next_seq;
        buffer.next_seq += 1;
        buffer.last_timestamp = Some(timestamp);

        if buffer.entries.len() >= self.capacity {
            if let Some(evicted) = buffer.entries.pop_front() {
                buffer.dropped += 1;
                if evicted.kind() == AuditKind::HaltTriggered {
                    buffer.pinned.push(evicted);
                }
                if buffer.dropped == 1 {
                    buffer.eviction_pending = true;
                }
            }
        }

        buffer.entries.push_back(AuditEntry {
            seq,
            timestamp,
            event,
        });
        seq
    }

    /// Log the first eviction, once per session
    ///
    /// `append` runs inside the ledger's critical section and never logs;
    /// callers invoke this after releasing their own locks.
    pub fn report_eviction(&self) {
        let pending = std::mem::take(&mut self.inner.lock().eviction_pending);
        if pending {
            tracing::warn!(
                capacity = self.capacity,
                "Audit log full, evicting oldest entries"
            );
        }
    }

    /// Entries currently held in the ring
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted so far
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }

    /// Export matching entries as of now
    pub fn export_report(&self, filter: &AuditFilter) -> AuditReport {
        let buffer = self.inner.lock();
        // Pinned entries predate everything still in the ring
        let entries = buffer
            .pinned
            .iter()
            .chain(buffer.entries.iter())
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        AuditReport {
            generated_at: Utc::now(),
            dropped: buffer.dropped,
            entries,
        }
    }
}

/// Write entries as JSON lines
pub fn write_jsonl<W: Write>(entries: &[AuditEntry], mut writer: W) -> std::io::Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Read entries written by [`write_jsonl`], skipping blank lines
pub fn read_jsonl<R: BufRead>(reader: R) -> std::io::Result<Vec<AuditEntry>> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}
