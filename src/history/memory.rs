//! In-memory session history.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AddressSource, HistoryMode};

/// One history entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub address: String,
    pub payload: Option<Value>,
}

struct Entries {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

/// Session history kept in process.
///
/// Behaves like a browser tab: pushing drops any forward entries, and
/// `back`/`forward` move the cursor without changing the list.
pub struct MemoryHistory {
    inner: Mutex<Entries>,
}

impl MemoryHistory {
    /// Start with a single entry for `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Entries {
                entries: vec![HistoryEntry {
                    address: address.into(),
                    payload: None,
                }],
                cursor: 0,
            }),
        }
    }

    /// The current entry.
    pub fn entry(&self) -> HistoryEntry {
        let inner = self.inner.lock();
        inner.entries[inner.cursor].clone()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Never true; a history always holds its starting entry.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Move to the previous entry. Returns false at the start.
    pub fn back(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.cursor == 0 {
            return false;
        }
        inner.cursor -= 1;
        true
    }

    /// Move to the next entry. Returns false at the end.
    pub fn forward(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.cursor + 1 >= inner.entries.len() {
            return false;
        }
        inner.cursor += 1;
        true
    }
}

impl AddressSource for MemoryHistory {
    fn current(&self) -> String {
        let inner = self.inner.lock();
        inner.entries[inner.cursor].address.clone()
    }

    fn set(&self, address: &str, mode: HistoryMode, payload: Option<Value>) {
        let mut inner = self.inner.lock();
        let entry = HistoryEntry {
            address: address.to_string(),
            payload,
        };

        match mode {
            HistoryMode::Replace => {
                let cursor = inner.cursor;
                inner.entries[cursor] = entry;
            }
            HistoryMode::Push => {
                let keep = inner.cursor + 1;
                inner.entries.truncate(keep);
                inner.entries.push(entry);
                inner.cursor = keep;
            }
        }
    }
}
