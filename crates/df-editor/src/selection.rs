//! Selection set and clipboard.

use df_core::model::Block;
use df_core::{BlockId, Document};
use smallvec::SmallVec;

/// Selected block ids in selection order. Most selections are a handful of
/// blocks, so they live inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: SmallVec<[BlockId; 8]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[BlockId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.ids.contains(&id)
    }

    /// The most recently selected block.
    pub fn primary(&self) -> Option<BlockId> {
        self.ids.last().copied()
    }

    /// Replace the selection with a single block.
    pub fn select(&mut self, id: BlockId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Add a block. Returns false if it was already selected.
    pub fn add(&mut self, id: BlockId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: BlockId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|b| *b != id);
        self.ids.len() != before
    }

    /// Add or remove `id`. Returns true if it is selected afterwards.
    pub fn toggle(&mut self, id: BlockId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Replace the selection, dropping duplicates.
    pub fn set(&mut self, ids: impl IntoIterator<Item = BlockId>) {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn clear(&mut self) -> bool {
        let had = !self.ids.is_empty();
        self.ids.clear();
        had
    }

    /// Drop ids that no longer exist in `doc`. Returns true if any were
    /// dropped.
    pub fn retain_existing(&mut self, doc: &Document) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| doc.contains(*id));
        self.ids.len() != before
    }
}

/// Copied block snapshots plus a paste counter, so repeated pastes of the
/// same copy step further away from the original.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    blocks: Vec<Block>,
    pastes: u32,
}

impl Clipboard {
    /// Replace the contents and reset the paste counter.
    pub fn store(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.pastes = 0;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Offset for the next paste: `step × n` for the n-th paste.
    pub fn next_offset(&mut self, step: f64) -> f64 {
        self.pastes += 1;
        step * self.pastes as f64
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.pastes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::model::*;
    use df_core::Rect;

    #[test]
    fn toggle_and_order() {
        let a = BlockId::intern("sel_a");
        let b = BlockId::intern("sel_b");
        let mut sel = Selection::new();
        sel.select(a);
        assert!(sel.toggle(b));
        assert_eq!(sel.ids(), &[a, b]);
        assert_eq!(sel.primary(), Some(b));
        assert!(!sel.toggle(a));
        assert_eq!(sel.ids(), &[b]);
        assert!(!sel.add(b));
    }

    #[test]
    fn retain_existing_prunes_removed_blocks() {
        let mut doc = Document::new();
        let kept = doc
            .add_block(Block::new(
                BlockId::intern("sel_kept"),
                BlockKind::Shape(ShapeBlock::default()),
                Rect::new(0.0, 0.0, 10.0, 10.0),
            ))
            .unwrap();
        let mut sel = Selection::new();
        sel.set([kept, BlockId::intern("sel_ghost"), kept]);
        assert_eq!(sel.len(), 2);
        assert!(sel.retain_existing(&doc));
        assert_eq!(sel.ids(), &[kept]);
    }

    #[test]
    fn paste_offsets_grow() {
        let mut clip = Clipboard::default();
        clip.store(Vec::new());
        assert_eq!(clip.next_offset(20.0), 20.0);
        assert_eq!(clip.next_offset(20.0), 40.0);
        clip.store(Vec::new());
        assert_eq!(clip.next_offset(20.0), 20.0);
    }
}
