//! [`RollingLog`] – capped, newest-first log.
//!
//! Entries are inserted at the head; once the log holds `cap` entries every
//! further insertion evicts from the tail.
//!
//! ```
//! use tablepulse_types::RollingLog;
//!
//! let mut log = RollingLog::new(2);
//! log.push("a");
//! log.push("b");
//! log.push("c");
//! assert_eq!(log.to_vec(), vec!["c", "b"]);
//! ```

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingLog<T> {
    cap: usize,
    entries: VecDeque<T>,
}

impl<T> RollingLog<T> {
    /// Create an empty log holding at most `cap` entries.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    /// Seed a log from `entries`, given newest first.  Anything beyond `cap`
    /// is dropped.
    pub fn from_newest_first(cap: usize, entries: impl IntoIterator<Item = T>) -> Self {
        let mut entries: VecDeque<T> = entries.into_iter().collect();
        entries.truncate(cap);
        Self { cap, entries }
    }

    /// Insert `entry` at the head, evicting the oldest entries past the cap.
    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn newest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.entries.retain(keep);
    }
}

impl<T: Clone> RollingLog<T> {
    /// Copy the entries out, newest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
