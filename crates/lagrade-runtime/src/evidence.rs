#![forbid(unsafe_code)]

//! Bounded FIFO ledger of structured trial log entries for one checking run.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{TrialLogEntry, TrialResult};

/// Bounded FIFO buffer recording trial log entries.
///
/// Capacity is enforced via `capacity.max(1)`. When full, the oldest entry
/// is evicted before a new one is appended, so a long passing run keeps only
/// its tail while a failing run always keeps the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialLedger {
    capacity: usize,
    entries: VecDeque<TrialLogEntry>,
    evicted: usize,
}

impl TrialLedger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            evicted: 0,
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn record(&mut self, entry: TrialLogEntry) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TrialLogEntry> {
        self.entries.back()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries dropped to honour the capacity.
    #[must_use]
    pub const fn evicted(&self) -> usize {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialLogEntry> {
        self.entries.iter()
    }

    /// Entries whose result is [`TrialResult::Fail`].
    pub fn failures(&self) -> impl Iterator<Item = &TrialLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.result == Some(TrialResult::Fail))
    }

    /// One JSON object per line, oldest first.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .map(TrialLogEntry::to_json_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
