//! Bounded undo/redo over full document snapshots.
//!
//! The history is a list of snapshots plus a cursor. Pushing a snapshot
//! first truncates everything after the cursor (the stale redo branch),
//! then appends and advances. When the list grows past `max_size` the
//! oldest entry is evicted and the cursor shifts with it.
//!
//! Snapshots are whole `Document` + `CanvasSettings` clones plus the
//! branding rules. At tens of
//! blocks that is cheap; the public contract would not change if entries
//! became reversible diffs.

use df_core::{BrandingRules, CanvasSettings, Document};
use std::collections::VecDeque;

/// The document-affecting slice of editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    pub canvas: CanvasSettings,
    pub branding: BrandingRules,
    /// Revision of the editor when the snapshot was taken.
    pub revision: u64,
}

pub struct History {
    entries: VecDeque<Snapshot>,
    /// Cursor into `entries`; `None` only while the history is empty.
    index: Option<usize>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size.min(64)),
            index: None,
            max_size,
        }
    }

    /// Record a new state, discarding any redo branch.
    pub fn push(&mut self, snapshot: Snapshot) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// Drop everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.index = Some(0);
    }

    /// Step back one entry. No-op at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let i = self.index.filter(|&i| i > 0)? - 1;
        self.index = Some(i);
        self.entries.get(i)
    }

    /// Step forward one entry. No-op at the newest entry.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let i = self.index? + 1;
        if i >= self.entries.len() {
            return None;
        }
        self.index = Some(i);
        self.entries.get(i)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index?)
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.entries.len())
    }

    /// Cursor position; `None` when empty.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the bound, evicting the oldest entries if needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
            self.index = self.index.map(|i| i.saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(revision: u64) -> Snapshot {
        Snapshot {
            document: Document::new(),
            canvas: CanvasSettings::default(),
            branding: BrandingRules::default(),
            revision,
        }
    }

    fn revision(h: &History) -> Option<u64> {
        h.current().map(|s| s.revision)
    }

    #[test]
    fn undo_redo_walks_the_cursor() {
        let mut h = History::new(10);
        h.reset(snap(0));
        h.push(snap(1));
        h.push(snap(2));

        assert_eq!(h.undo().map(|s| s.revision), Some(1));
        assert_eq!(h.undo().map(|s| s.revision), Some(0));
        assert!(h.undo().is_none(), "oldest entry");
        assert_eq!(h.index(), Some(0));

        assert_eq!(h.redo().map(|s| s.revision), Some(1));
        assert_eq!(h.redo().map(|s| s.revision), Some(2));
        assert!(h.redo().is_none(), "newest entry");
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = History::new(10);
        h.reset(snap(0));
        h.push(snap(1));
        h.push(snap(2));
        h.undo();
        h.push(snap(3));

        assert!(!h.can_redo());
        assert_eq!(h.len(), 3);
        assert_eq!(h.undo().map(|s| s.revision), Some(1));
    }

    #[test]
    fn max_size_trims_oldest() {
        let mut h = History::new(3);
        h.reset(snap(0));
        for r in 1..=5 {
            h.push(snap(r));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), Some(2));
        assert_eq!(revision(&h), Some(5));

        let mut undo_count = 0;
        while h.undo().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 2);
        assert_eq!(revision(&h), Some(3));
    }

    #[test]
    fn empty_history_is_inert() {
        let mut h = History::new(0);
        assert_eq!(h.max_size(), 1);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert!(!h.can_undo());
        assert_eq!(h.index(), None);
    }

    #[test]
    fn shrinking_bound_keeps_cursor_in_range() {
        let mut h = History::new(10);
        h.reset(snap(0));
        for r in 1..=4 {
            h.push(snap(r));
        }
        h.set_max_size(2);
        assert_eq!(h.len(), 2);
        assert_eq!(h.index(), Some(1));
        assert_eq!(revision(&h), Some(4));
    }
}
