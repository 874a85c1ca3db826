//! The block & layer store.
//!
//! `Document` owns every block and the ordered layer list, and is the only
//! place that touches both at once. Every public mutation leaves the store
//! referentially consistent:
//!
//! - each block id is stored once and referenced by exactly one layer, once;
//! - at least one layer exists;
//! - `Block::layer` / `Block::z_index` match the layer reference lists.

use crate::error::{DocError, DocResult};
use crate::id::{BlockId, LayerId};
use crate::model::*;
use std::collections::{HashMap, HashSet};

/// Canonical document state: blocks, layers and the active layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Blocks in insertion order. Paint order comes from the layers.
    blocks: Vec<Block>,

    /// Index from `BlockId` → position in `blocks`.
    id_index: HashMap<BlockId, usize>,

    /// Layers, bottom first.
    layers: Vec<Layer>,

    /// Layer that receives newly created blocks.
    active_layer: LayerId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a single layer.
    #[must_use]
    pub fn new() -> Self {
        let layer = Layer::new(LayerId::with_prefix("layer"), "Layer 1");
        let active_layer = layer.id;
        Self {
            blocks: Vec::new(),
            id_index: HashMap::new(),
            layers: vec![layer],
            active_layer,
        }
    }

    /// Build a document from stored blocks and layers, rejecting anything
    /// that breaks the ownership invariants. The topmost layer becomes active.
    pub fn from_parts(blocks: Vec<Block>, layers: Vec<Layer>) -> DocResult<Self> {
        let Some(top) = layers.last() else {
            return Err(DocError::Inconsistent("document has no layers".into()));
        };
        let active_layer = top.id;

        let mut doc = Self {
            blocks: Vec::with_capacity(blocks.len()),
            id_index: HashMap::with_capacity(blocks.len()),
            layers,
            active_layer,
        };
        for mut block in blocks {
            if doc.id_index.contains_key(&block.id) {
                return Err(DocError::DuplicateBlock(block.id));
            }
            if let BlockKind::Table(table) = &block.kind {
                table.validate(block.id)?;
            }
            block.normalize();
            doc.id_index.insert(block.id, doc.blocks.len());
            doc.blocks.push(block);
        }

        let mut seen_layers = HashSet::new();
        for layer in &doc.layers {
            if !seen_layers.insert(layer.id) {
                return Err(DocError::DuplicateLayer(layer.id));
            }
        }

        doc.check_invariants()?;
        doc.renumber();
        Ok(doc)
    }

    /// Decompose into `(blocks, layers)` for persistence.
    pub fn into_parts(self) -> (Vec<Block>, Vec<Layer>) {
        (self.blocks, self.layers)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.id_index.get(&id).map(|&i| &self.blocks[i])
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    /// The layer that references `block`.
    pub fn layer_of(&self, block: BlockId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.block_ids.contains(&block))
    }

    /// Blocks bottom-to-top: layer by layer, then each layer's own order.
    pub fn paint_order(&self) -> impl Iterator<Item = (&Layer, &Block)> {
        self.layers.iter().flat_map(move |layer| {
            layer
                .block_ids
                .iter()
                .filter_map(move |id| self.block(*id).map(|b| (layer, b)))
        })
    }

    /// A fresh block id with the given prefix that is not stored yet.
    ///
    /// Generated ids can collide with ids that came from a loaded template,
    /// so keep drawing until one is free.
    pub fn fresh_block_id(&self, prefix: &str) -> BlockId {
        loop {
            let id = BlockId::with_prefix(prefix);
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// A fresh layer id that is not in use.
    pub fn fresh_layer_id(&self) -> LayerId {
        loop {
            let id = LayerId::with_prefix("layer");
            if self.layer(id).is_none() {
                return id;
            }
        }
    }

    // ─── Blocks ──────────────────────────────────────────────────────────

    /// Store `block` and append it on top of the active layer.
    pub fn add_block(&mut self, block: Block) -> DocResult<BlockId> {
        let layer = self.active_layer;
        self.add_block_to_layer(block, layer)
    }

    /// Store `block` and append it on top of `layer`.
    pub fn add_block_to_layer(&mut self, mut block: Block, layer: LayerId) -> DocResult<BlockId> {
        if self.contains(block.id) {
            return Err(DocError::DuplicateBlock(block.id));
        }
        if let BlockKind::Table(table) = &block.kind {
            table.validate(block.id)?;
        }
        let Some(layer_idx) = self.layer_index(layer) else {
            return Err(DocError::Inconsistent(format!("no layer {layer}")));
        };

        block.normalize();
        let id = block.id;
        self.id_index.insert(id, self.blocks.len());
        self.blocks.push(block);
        self.layers[layer_idx].block_ids.push(id);
        self.renumber();
        log::trace!("block {id} added to layer {layer}");
        Ok(id)
    }

    /// Merge a partial update into a block. Returns `Ok(false)` when the
    /// block no longer exists.
    pub fn update_block(&mut self, id: BlockId, patch: &BlockPatch) -> DocResult<bool> {
        let Some(&i) = self.id_index.get(&id) else {
            return Ok(false);
        };
        self.blocks[i].apply_patch(patch)?;
        Ok(true)
    }

    /// Mutable access for edits that have no patch form (table structure).
    /// Returns `None` when the block no longer exists.
    pub fn with_block_mut<R>(&mut self, id: BlockId, f: impl FnOnce(&mut Block) -> R) -> Option<R> {
        let i = *self.id_index.get(&id)?;
        let block = &mut self.blocks[i];
        let out = f(block);
        // Identity and bookkeeping are owned by the document.
        block.id = id;
        block.normalize();
        block.metadata.updated_at = now_millis();
        self.renumber();
        Some(out)
    }

    /// Remove a block and strip it from its layer.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let i = self.id_index.remove(&id)?;
        let block = self.blocks.remove(i);
        for layer in &mut self.layers {
            layer.block_ids.retain(|b| *b != id);
        }
        self.rebuild_index();
        self.renumber();
        Some(block)
    }

    /// Clone a block under a fresh id, shifted by `(dx, dy)`, directly above
    /// the original in the same layer.
    pub fn duplicate_block(&mut self, id: BlockId, dx: f64, dy: f64) -> Option<BlockId> {
        let original = self.block(id)?.clone();
        let layer_idx = self.layers.iter().position(|l| l.block_ids.contains(&id))?;

        let mut copy = original;
        copy.id = self.fresh_block_id(copy.block_type().as_str());
        copy.x += dx;
        copy.y += dy;
        copy.metadata = BlockMetadata::default();
        let new_id = copy.id;

        self.id_index.insert(new_id, self.blocks.len());
        self.blocks.push(copy);
        let ids = &mut self.layers[layer_idx].block_ids;
        let pos = ids.iter().position(|b| *b == id).map_or(ids.len(), |p| p + 1);
        ids.insert(pos, new_id);
        self.renumber();
        Some(new_id)
    }

    /// Move a block to the top of another layer.
    pub fn move_block_to_layer(&mut self, id: BlockId, layer: LayerId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let Some(target) = self.layer_index(layer) else {
            return false;
        };
        if self.layers[target].block_ids.contains(&id) {
            return false;
        }
        for l in &mut self.layers {
            l.block_ids.retain(|b| *b != id);
        }
        self.layers[target].block_ids.push(id);
        self.renumber();
        true
    }

    // ─── Z-order inside a layer ──────────────────────────────────────────

    /// Move a block one step toward the top. Returns true if the order changed.
    pub fn bring_forward(&mut self, id: BlockId) -> bool {
        self.restack(id, |pos, len| (pos + 1 < len).then_some(pos + 1))
    }

    /// Move a block one step toward the bottom.
    pub fn send_backward(&mut self, id: BlockId) -> bool {
        self.restack(id, |pos, _| pos.checked_sub(1))
    }

    /// Move a block to the top of its layer.
    pub fn bring_to_front(&mut self, id: BlockId) -> bool {
        self.restack(id, |pos, len| (pos + 1 < len).then_some(len - 1))
    }

    /// Move a block to the bottom of its layer.
    pub fn send_to_back(&mut self, id: BlockId) -> bool {
        self.restack(id, |pos, _| (pos > 0).then_some(0))
    }

    /// Move `id` inside its layer to the position chosen by `target`, which
    /// receives `(current_position, layer_len)`.
    fn restack(&mut self, id: BlockId, target: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.block_ids.contains(&id)) else {
            return false;
        };
        let ids = &mut layer.block_ids;
        let Some(pos) = ids.iter().position(|b| *b == id) else {
            return false;
        };
        let Some(to) = target(pos, ids.len()) else {
            return false;
        };
        let moved = ids.remove(pos);
        ids.insert(to, moved);
        self.renumber();
        true
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    /// Append a new, empty layer on top.
    pub fn add_layer(&mut self, layer: Layer) -> DocResult<LayerId> {
        if self.layer(layer.id).is_some() {
            return Err(DocError::DuplicateLayer(layer.id));
        }
        if !layer.block_ids.is_empty() {
            return Err(DocError::LayerNotEmpty(layer.id));
        }
        let id = layer.id;
        self.layers.push(layer);
        Ok(id)
    }

    /// Update a layer's display properties. Returns false if it is gone.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => {
                patch.apply(layer);
                true
            }
            None => false,
        }
    }

    /// Remove a layer together with the blocks it references.
    ///
    /// The last remaining layer is never removed. If the active layer goes,
    /// the layer below it (or the new bottom layer) becomes active.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        if self.layers.len() <= 1 {
            log::debug!("refusing to remove the last layer {id}");
            return None;
        }
        let idx = self.layer_index(id)?;
        let layer = self.layers.remove(idx);

        let doomed: HashSet<BlockId> = layer.block_ids.iter().copied().collect();
        self.blocks.retain(|b| !doomed.contains(&b.id));
        self.rebuild_index();

        if self.active_layer == id {
            self.active_layer = self.layers[idx.saturating_sub(1)].id;
        }
        self.renumber();
        Some(layer)
    }

    /// Make `id` the layer that receives new blocks.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.layer(id).is_none() {
            return false;
        }
        self.active_layer = id;
        true
    }

    /// Move the layer at `from` to position `to`. Out-of-range indices and
    /// `from == to` are no-ops.
    pub fn reorder_layers(&mut self, from: usize, to: usize) -> bool {
        let len = self.layers.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.renumber();
        true
    }

    // ─── Invariants ──────────────────────────────────────────────────────

    /// Report the first broken ownership invariant, if any.
    pub fn check_invariants(&self) -> DocResult<()> {
        if self.layers.is_empty() {
            return Err(DocError::Inconsistent("document has no layers".into()));
        }
        if self.layer(self.active_layer).is_none() {
            return Err(DocError::Inconsistent(format!(
                "active layer {} does not exist",
                self.active_layer
            )));
        }

        let mut owners: HashMap<BlockId, LayerId> = HashMap::with_capacity(self.blocks.len());
        for layer in &self.layers {
            for id in &layer.block_ids {
                if !self.contains(*id) {
                    return Err(DocError::Inconsistent(format!(
                        "layer {} references missing block {id}",
                        layer.id
                    )));
                }
                if let Some(prev) = owners.insert(*id, layer.id) {
                    return Err(DocError::Inconsistent(format!(
                        "block {id} referenced by both {prev} and {}",
                        layer.id
                    )));
                }
            }
        }
        if let Some(orphan) = self.blocks.iter().find(|b| !owners.contains_key(&b.id)) {
            return Err(DocError::Inconsistent(format!(
                "block {} belongs to no layer",
                orphan.id
            )));
        }
        Ok(())
    }

    /// Rebuild the `id_index` after positional removals.
    fn rebuild_index(&mut self) {
        self.id_index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
    }

    /// Recompute each block's owning-layer index and z-index from the layers.
    fn renumber(&mut self) {
        for (layer_idx, layer) in self.layers.iter().enumerate() {
            for (z, id) in layer.block_ids.iter().enumerate() {
                if let Some(&i) = self.id_index.get(id) {
                    self.blocks[i].layer = layer_idx;
                    self.blocks[i].z_index = z;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn shape(id: &str) -> Block {
        Block::new(
            BlockId::intern(id),
            BlockKind::Shape(ShapeBlock::default()),
            Rect::new(0.0, 0.0, 50.0, 50.0),
        )
    }

    fn ids(layer: &Layer) -> Vec<&str> {
        layer.block_ids.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn add_block_goes_to_active_layer() {
        let mut doc = Document::new();
        let id = doc.add_block(shape("doc_a")).unwrap();
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.layer_of(id).unwrap().id, doc.active_layer());
        doc.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut doc = Document::new();
        doc.add_block(shape("doc_dup")).unwrap();
        assert!(matches!(
            doc.add_block(shape("doc_dup")),
            Err(DocError::DuplicateBlock(_))
        ));
        assert_eq!(doc.block_count(), 1);
    }

    #[test]
    fn remove_block_strips_layer_reference() {
        let mut doc = Document::new();
        let a = doc.add_block(shape("doc_rm_a")).unwrap();
        let b = doc.add_block(shape("doc_rm_b")).unwrap();
        assert!(doc.remove_block(a).is_some());
        assert!(doc.remove_block(a).is_none(), "second removal is a no-op");
        assert_eq!(ids(&doc.layers()[0]), vec![b.as_str()]);
        assert_eq!(doc.block(b).unwrap().z_index, 0);
        doc.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_lands_above_original_with_offset() {
        let mut doc = Document::new();
        let a = doc.add_block(shape("doc_dupl_a")).unwrap();
        let top = doc.add_block(shape("doc_dupl_top")).unwrap();
        let copy = doc.duplicate_block(a, 20.0, 20.0).unwrap();

        assert_ne!(copy, a);
        assert_eq!(doc.block(copy).unwrap().origin(), kurbo::Point::new(20.0, 20.0));
        assert_eq!(
            ids(&doc.layers()[0]),
            vec![a.as_str(), copy.as_str(), top.as_str()]
        );
        doc.check_invariants().unwrap();
    }

    #[test]
    fn last_layer_cannot_be_removed() {
        let mut doc = Document::new();
        let only = doc.active_layer();
        assert!(doc.remove_layer(only).is_none());
        assert_eq!(doc.layers().len(), 1);
    }

    #[test]
    fn removing_layer_drops_its_blocks_and_moves_active() {
        let mut doc = Document::new();
        let bottom = doc.active_layer();
        let keep = doc.add_block(shape("doc_keep")).unwrap();

        let top = doc.add_layer(Layer::new(doc.fresh_layer_id(), "Top")).unwrap();
        assert!(doc.set_active_layer(top));
        let gone = doc.add_block(shape("doc_gone")).unwrap();

        let removed = doc.remove_layer(top).unwrap();
        assert_eq!(removed.block_ids, vec![gone]);
        assert!(!doc.contains(gone));
        assert!(doc.contains(keep));
        assert_eq!(doc.active_layer(), bottom);
        doc.check_invariants().unwrap();
    }

    #[test]
    fn add_layer_rejects_prefilled_reference_list() {
        let mut doc = Document::new();
        let mut layer = Layer::new(doc.fresh_layer_id(), "Sneaky");
        layer.block_ids.push(BlockId::intern("doc_ghost"));
        assert!(matches!(doc.add_layer(layer), Err(DocError::LayerNotEmpty(_))));
    }

    #[test]
    fn reorder_layers_updates_owner_indices() {
        let mut doc = Document::new();
        let a = doc.add_block(shape("doc_reorder")).unwrap();
        doc.add_layer(Layer::new(doc.fresh_layer_id(), "Second")).unwrap();
        assert_eq!(doc.block(a).unwrap().layer, 0);

        assert!(doc.reorder_layers(0, 1));
        assert_eq!(doc.block(a).unwrap().layer, 1);
        assert!(!doc.reorder_layers(0, 5));
        assert!(!doc.reorder_layers(1, 1));
    }

    #[test]
    fn z_order_moves() {
        let mut doc = Document::new();
        let a = doc.add_block(shape("doc_z_a")).unwrap();
        let b = doc.add_block(shape("doc_z_b")).unwrap();
        let c = doc.add_block(shape("doc_z_c")).unwrap();

        assert!(doc.bring_to_front(a));
        assert_eq!(ids(&doc.layers()[0]), vec![b.as_str(), c.as_str(), a.as_str()]);
        assert!(!doc.bring_forward(a), "already on top");
        assert!(doc.send_backward(a));
        assert_eq!(doc.block(a).unwrap().z_index, 1);
        assert!(doc.send_to_back(a));
        assert!(!doc.send_to_back(a));
        assert_eq!(ids(&doc.layers()[0]), vec![a.as_str(), b.as_str(), c.as_str()]);
    }

    #[test]
    fn move_block_between_layers() {
        let mut doc = Document::new();
        let a = doc.add_block(shape("doc_mv")).unwrap();
        let other = doc.add_layer(Layer::new(doc.fresh_layer_id(), "Other")).unwrap();
        assert!(doc.move_block_to_layer(a, other));
        assert!(!doc.move_block_to_layer(a, other));
        assert_eq!(doc.layer_of(a).unwrap().id, other);
        assert!(doc.layers()[0].block_ids.is_empty());
        doc.check_invariants().unwrap();
    }

    #[test]
    fn from_parts_rejects_orphans() {
        let block = shape("doc_orphan");
        let layer = Layer::new(LayerId::intern("doc_empty_layer"), "Empty");
        let err = Document::from_parts(vec![block], vec![layer]).unwrap_err();
        assert!(matches!(err, DocError::Inconsistent(_)));
    }
}
