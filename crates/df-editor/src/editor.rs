//! The editor command surface.
//!
//! `Editor` is the only way to change a document. Every mutating command
//! runs the same pipeline:
//!
//! 1. validate (missing or locked targets make the command a no-op);
//! 2. apply to the `Document` / canvas settings;
//! 3. bump the revision, which drives the dirty flag;
//! 4. push a history snapshot, unless a snapshot is being restored;
//! 5. notify subscribers.
//!
//! Selection and viewport changes skip steps 3–4. Subscribers receive a
//! shared reference, so they can read the editor but never re-enter it.

use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::history::{History, Snapshot};
use crate::placement::{self, PlacementIntent};
use crate::selection::{Clipboard, Selection};
use crate::shortcuts::Restack;
use df_core::model::*;
use df_core::variables;
use df_core::{
    BlockId, BrandingRules, CanvasSettings, Document, GridSettings, Guide, GuideAxis, LayerId,
    Margins, Point, Rect, Size, Template, Vec2, Viewport,
};
use df_render::{hit_test, hit_test_rect};
use std::collections::HashMap;
use std::time::Duration;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A command changed blocks, layers or canvas settings.
    Document,
    /// Undo or redo restored a snapshot.
    History,
    /// A template replaced the whole document.
    Loaded,
    Selection,
    Viewport,
    /// The document was marked as saved.
    Saved,
}

pub type SubscriberId = u64;

type Subscriber = Box<dyn FnMut(ChangeKind, &Editor)>;

/// What the export collaborator receives: visible blocks in paint order
/// plus the page setup and branding.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    pub page_size: Size,
    pub margins: Margins,
    pub branding: BrandingRules,
    pub blocks: Vec<Block>,
}

impl ExportSnapshot {
    /// Substitute `{{ name }}` placeholders in text blocks and table cells.
    /// Placeholders without a value are left as written.
    pub fn resolve_variables(&mut self, values: &HashMap<String, String>) {
        for block in &mut self.blocks {
            match &mut block.kind {
                BlockKind::Text(text) => {
                    text.content = variables::render(&text.content, |name| {
                        values.get(name).map(String::as_str)
                    });
                }
                BlockKind::Table(table) => {
                    for cell in table.cells.iter_mut().flatten() {
                        cell.content = variables::render(&cell.content, |name| {
                            values.get(name).map(String::as_str)
                        });
                    }
                }
                BlockKind::Image(_) | BlockKind::Shape(_) => {}
            }
        }
    }
}

pub struct Editor {
    config: EditorConfig,
    /// Page setup, variables, branding. Blocks and layers live in `doc`.
    template: Template,
    doc: Document,
    canvas: CanvasSettings,
    viewport: Viewport,
    /// Size of the on-screen canvas, once the host reports it.
    screen_size: Option<Size>,
    selection: Selection,
    clipboard: Clipboard,
    history: History,
    revision: u64,
    saved_revision: u64,
    /// Internal-update guard: set while a snapshot is being restored.
    applying_history: bool,
    /// Named text fields from document analysis.
    extracted: HashMap<String, String>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: SubscriberId,
}

impl Editor {
    /// An editor with an empty, single-layer document.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;

        let mut template = Template::new("untitled", "Untitled");
        template.page_size = config.page_size;
        let canvas = CanvasSettings {
            grid: config.grid.sanitized(),
            ..CanvasSettings::default()
        };
        let doc = Document::new();
        let mut history = History::new(config.max_history);
        history.reset(Snapshot {
            document: doc.clone(),
            canvas: canvas.clone(),
            branding: template.branding_rules.clone(),
            revision: 0,
        });

        Ok(Self {
            viewport: config.viewport(),
            config,
            template,
            doc,
            canvas,
            screen_size: None,
            selection: Selection::new(),
            clipboard: Clipboard::default(),
            history,
            revision: 0,
            saved_revision: 0,
            applying_history: false,
            extracted: HashMap::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        })
    }

    // ─── Read-only state ─────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Template settings. Its `blocks`/`layers` are empty; use
    /// `save_template` for the full shape.
    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Logical canvas size in points.
    pub fn page_size(&self) -> Size {
        self.template.logical_size()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.config.undo_enabled && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.config.undo_enabled && self.history.can_redo()
    }

    /// True when the current state differs from the last saved one.
    pub fn is_dirty(&self) -> bool {
        self.history
            .current()
            .is_some_and(|s| s.revision != self.saved_revision)
    }

    /// Whether an autosave should run after `elapsed` since the last one.
    pub fn autosave_due(&self, elapsed: Duration) -> bool {
        self.config
            .autosave_interval()
            .is_some_and(|interval| self.is_dirty() && elapsed >= interval)
    }

    // ─── Pipeline ────────────────────────────────────────────────────────

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.doc.clone(),
            canvas: self.canvas.clone(),
            branding: self.template.branding_rules.clone(),
            revision: self.revision,
        }
    }

    /// Steps 3–5 for a mutation that has already been applied.
    fn commit(&mut self, label: &str) {
        self.selection.retain_existing(&self.doc);
        if self.applying_history {
            log::warn!("{label}: not recorded while restoring history");
        } else {
            self.revision += 1;
            let snapshot = self.snapshot();
            if self.config.undo_enabled {
                self.history.push(snapshot);
            } else {
                self.history.reset(snapshot);
            }
        }
        log::debug!("{label} (revision {})", self.revision);
        self.notify(ChangeKind::Document);
    }

    fn restore(&mut self, snapshot: Snapshot, label: &str) {
        self.applying_history = true;
        self.doc = snapshot.document;
        self.canvas = snapshot.canvas;
        self.template.branding_rules = snapshot.branding;
        self.selection.retain_existing(&self.doc);
        self.applying_history = false;
        log::debug!("{label} → revision {}", snapshot.revision);
        self.notify(ChangeKind::History);
    }

    fn notify(&mut self, kind: ChangeKind) {
        if self.subscribers.is_empty() {
            return;
        }
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for (_, subscriber) in subscribers.iter_mut() {
            subscriber(kind, self);
        }
        self.subscribers = subscribers;
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Register an observer called after every change.
    pub fn subscribe(&mut self, f: impl FnMut(ChangeKind, &Editor) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        if !self.config.undo_enabled {
            return false;
        }
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.config.undo_enabled {
            return false;
        }
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot, "redo");
        true
    }

    /// Record the current state as saved.
    pub fn mark_saved(&mut self) {
        if let Some(current) = self.history.current() {
            self.saved_revision = current.revision;
        }
        self.notify(ChangeKind::Saved);
    }

    // ─── Templates ───────────────────────────────────────────────────────

    /// Replace the document with a template. Nothing changes unless the
    /// whole template loads; history restarts from the loaded state.
    pub fn load_template(&mut self, mut template: Template) -> EditorResult<()> {
        let doc = template.to_document()?;
        template.blocks.clear();
        template.layers = None;

        self.applying_history = true;
        self.doc = doc;
        self.template = template;
        self.selection.clear();
        self.revision += 1;
        let snapshot = self.snapshot();
        self.history.reset(snapshot);
        self.saved_revision = self.revision;
        self.applying_history = false;

        log::debug!(
            "loaded template {:?} ({} blocks)",
            self.template.id,
            self.doc.block_count()
        );
        self.notify(ChangeKind::Loaded);
        Ok(())
    }

    pub fn load_template_json(&mut self, json: &str) -> EditorResult<()> {
        let template = Template::from_json(json)?;
        self.load_template(template)
    }

    /// The template shape with the current blocks and layers.
    pub fn save_template(&self) -> Template {
        let mut template = self.template.clone();
        template.capture(&self.doc);
        template
    }

    pub fn save_template_json(&self) -> EditorResult<String> {
        Ok(self.save_template().to_json()?)
    }

    /// Replace the branding rules. Returns `false` if they are unchanged.
    pub fn set_branding_rules(&mut self, rules: BrandingRules) -> bool {
        if self.template.branding_rules == rules {
            return false;
        }
        self.template.branding_rules = rules;
        self.commit("set branding");
        true
    }

    // ─── Extracted content & variables ───────────────────────────────────

    /// Replace the named text fields supplied by document analysis.
    pub fn set_extracted_content(&mut self, fields: HashMap<String, String>) {
        log::debug!("received {} extracted fields", fields.len());
        self.extracted = fields;
    }

    pub fn extracted_content(&self) -> &HashMap<String, String> {
        &self.extracted
    }

    /// Text for a content key: the extracted field, else the default of a
    /// variable with that name or source.
    pub fn content_for(&self, key: &str) -> Option<String> {
        if let Some(value) = self.extracted.get(key) {
            return Some(value.clone());
        }
        self.template
            .variables
            .iter()
            .find(|v| v.name == key || v.source.as_deref() == Some(key))
            .map(|v| v.default_value.clone())
    }

    /// Current value of every template variable: the extracted field named
    /// by its `source` if present, else its default.
    pub fn variable_values(&self) -> HashMap<String, String> {
        self.template
            .variables
            .iter()
            .map(|v| {
                let value = v
                    .source
                    .as_deref()
                    .and_then(|s| self.extracted.get(s))
                    .unwrap_or(&v.default_value);
                (v.name.clone(), value.clone())
            })
            .collect()
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Visible blocks in paint order with placeholders kept verbatim.
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            page_size: self.page_size(),
            margins: self.template.margins,
            branding: self.template.branding_rules.clone(),
            blocks: self
                .doc
                .paint_order()
                .filter(|(layer, block)| layer.visible && block.visible)
                .map(|(_, block)| block.clone())
                .collect(),
        }
    }

    /// `export_snapshot` with variable values substituted.
    pub fn export_resolved(&self) -> ExportSnapshot {
        let mut snapshot = self.export_snapshot();
        snapshot.resolve_variables(&self.variable_values());
        snapshot
    }

    // ─── Blocks ──────────────────────────────────────────────────────────

    /// False for missing blocks and for blocks that are locked or sit in a
    /// locked layer.
    fn editable(&self, id: BlockId) -> bool {
        match (self.doc.block(id), self.doc.layer_of(id)) {
            (Some(block), Some(layer)) => !block.locked && !layer.locked,
            _ => false,
        }
    }

    fn insert(&mut self, block: Block, label: &str) -> EditorResult<BlockId> {
        let id = self.doc.add_block(block)?;
        self.selection.select(id);
        self.commit(label);
        Ok(id)
    }

    /// Create a block with the configured defaults, top-left at document
    /// point `at`, and select it.
    pub fn create_block(
        &mut self,
        block_type: BlockType,
        at: Point,
        content: Option<String>,
    ) -> EditorResult<BlockId> {
        let id = self.doc.fresh_block_id(block_type.as_str());
        let origin = self.canvas.grid.snap_point(at);
        let block = placement::build_block(
            id,
            block_type,
            origin,
            &self.config.defaults,
            content,
            self.page_size(),
        );
        self.insert(block, "create block")
    }

    /// Add a block with an explicit payload and bounds. The editor assigns
    /// the id and clamps the bounds into the page.
    pub fn add_block(&mut self, kind: BlockKind, bounds: Rect) -> EditorResult<BlockId> {
        let id = self.doc.fresh_block_id(kind.block_type().as_str());
        let mut block = Block::new(id, kind, bounds);
        block.clamp_to_page(self.page_size());
        self.insert(block, "add block")
    }

    /// Place a block from a palette drop.
    pub fn drop_block(&mut self, intent: &PlacementIntent) -> EditorResult<BlockId> {
        let block_type = intent.parsed_type().inspect_err(|e| {
            log::warn!("rejected drop: {e}");
        })?;
        let content = match block_type {
            BlockType::Text => intent.content_key.as_deref().and_then(|k| self.content_for(k)),
            _ => None,
        };
        let origin = placement::drop_origin(intent.screen_point(), &self.viewport, &self.canvas.grid);
        let id = self.doc.fresh_block_id(block_type.as_str());
        let block = placement::build_block(
            id,
            block_type,
            origin,
            &self.config.defaults,
            content,
            self.page_size(),
        );
        self.insert(block, "drop block")
    }

    /// Merge a partial update. Geometry changes are clamped into the page.
    ///
    /// Locked blocks only accept `locked` / `visible` toggles. Returns
    /// `Ok(false)` for no-ops; a patch for another block kind is an error and
    /// leaves the block unchanged.
    pub fn update_block(&mut self, id: BlockId, patch: &BlockPatch) -> EditorResult<bool> {
        if !self.doc.contains(id) {
            return Ok(false);
        }
        let toggles_only = BlockPatch {
            locked: None,
            visible: None,
            ..patch.clone()
        } == BlockPatch::default();
        if !toggles_only && !self.editable(id) {
            log::debug!("update of locked block {id} ignored");
            return Ok(false);
        }
        let before = self.doc.block(id).cloned();
        if !self.doc.update_block(id, patch)? {
            return Ok(false);
        }
        if patch.touches_geometry() {
            let page = self.page_size();
            self.doc.with_block_mut(id, |b| b.clamp_to_page(page));
        }
        if self.doc.block(id) == before.as_ref() {
            return Ok(false);
        }
        self.commit("update block");
        Ok(true)
    }

    /// Move the selected, editable blocks by `delta` document points.
    pub fn move_selection(&mut self, delta: Vec2) -> bool {
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }
        let page = self.page_size();
        let ids: Vec<BlockId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.editable(*id))
            .collect();

        let mut moved = false;
        for id in ids {
            moved |= self
                .doc
                .with_block_mut(id, |b| {
                    let before = b.origin();
                    b.x += delta.x;
                    b.y += delta.y;
                    b.clamp_to_page(page);
                    b.origin() != before
                })
                .unwrap_or(false);
        }
        if moved {
            self.commit("move selection");
        }
        moved
    }

    /// Move the selection by a pointer drag measured in screen pixels.
    pub fn drag_selection(&mut self, screen_delta: Vec2) -> bool {
        let delta = self.viewport.delta_to_logical(screen_delta);
        self.move_selection(delta)
    }

    pub fn remove_block(&mut self, id: BlockId) -> bool {
        if !self.editable(id) || self.doc.remove_block(id).is_none() {
            return false;
        }
        self.selection.remove(id);
        self.commit("remove block");
        true
    }

    /// Remove every selected, editable block. Returns how many went.
    pub fn remove_selected(&mut self) -> usize {
        let removed = self.remove_many(&self.selection.ids().to_vec());
        if removed > 0 {
            self.commit("remove selection");
        }
        removed
    }

    fn remove_many(&mut self, ids: &[BlockId]) -> usize {
        let mut removed = 0;
        for &id in ids {
            if self.editable(id) && self.doc.remove_block(id).is_some() {
                self.selection.remove(id);
                removed += 1;
            }
        }
        removed
    }

    /// Clone a block next to the original and select the copy.
    pub fn duplicate_block(&mut self, id: BlockId) -> Option<BlockId> {
        let copy = self.duplicate_one(id)?;
        self.selection.select(copy);
        self.commit("duplicate block");
        Some(copy)
    }

    /// Duplicate every selected block; the copies become the selection.
    pub fn duplicate_selection(&mut self) -> Vec<BlockId> {
        let ids = self.in_paint_order(self.selection.ids());
        let copies: Vec<BlockId> = ids.into_iter().filter_map(|id| self.duplicate_one(id)).collect();
        if !copies.is_empty() {
            self.selection.set(copies.iter().copied());
            self.commit("duplicate selection");
        }
        copies
    }

    fn duplicate_one(&mut self, id: BlockId) -> Option<BlockId> {
        let offset = self.config.paste_offset;
        let page = self.page_size();
        let copy = self.doc.duplicate_block(id, offset, offset)?;
        self.doc.with_block_mut(copy, |b| {
            b.locked = false;
            b.clamp_to_page(page);
        });
        Some(copy)
    }

    /// `ids` sorted bottom-to-top.
    fn in_paint_order(&self, ids: &[BlockId]) -> Vec<BlockId> {
        let mut ordered: Vec<(usize, usize, BlockId)> = ids
            .iter()
            .filter_map(|id| self.doc.block(*id).map(|b| (b.layer, b.z_index, b.id)))
            .collect();
        ordered.sort_by_key(|&(layer, z, _)| (layer, z));
        ordered.into_iter().map(|(_, _, id)| id).collect()
    }

    // ─── Tables ──────────────────────────────────────────────────────────

    fn edit_table(&mut self, id: BlockId, label: &str, f: impl FnOnce(&mut TableBlock) -> bool) -> bool {
        if !self.editable(id) {
            return false;
        }
        let changed = self
            .doc
            .with_block_mut(id, |b| match &mut b.kind {
                BlockKind::Table(table) => f(table),
                _ => false,
            })
            .unwrap_or(false);
        if changed {
            self.commit(label);
        }
        changed
    }

    pub fn set_table_cell(&mut self, id: BlockId, row: usize, col: usize, content: &str) -> bool {
        self.edit_table(id, "edit cell", |t| t.set_cell(row, col, content))
    }

    pub fn insert_table_row(&mut self, id: BlockId, at: usize) -> bool {
        self.edit_table(id, "insert row", |t| {
            t.insert_row(at);
            true
        })
    }

    pub fn remove_table_row(&mut self, id: BlockId, at: usize) -> bool {
        self.edit_table(id, "remove row", |t| t.remove_row(at))
    }

    pub fn insert_table_column(&mut self, id: BlockId, at: usize) -> bool {
        self.edit_table(id, "insert column", |t| {
            t.insert_column(at);
            true
        })
    }

    pub fn remove_table_column(&mut self, id: BlockId, at: usize) -> bool {
        self.edit_table(id, "remove column", |t| t.remove_column(at))
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    fn restack_one(&mut self, id: BlockId, how: Restack) -> bool {
        if !self.editable(id) {
            return false;
        }
        match how {
            Restack::Forward => self.doc.bring_forward(id),
            Restack::Backward => self.doc.send_backward(id),
            Restack::ToFront => self.doc.bring_to_front(id),
            Restack::ToBack => self.doc.send_to_back(id),
        }
    }

    pub fn restack(&mut self, id: BlockId, how: Restack) -> bool {
        let changed = self.restack_one(id, how);
        if changed {
            self.commit("restack");
        }
        changed
    }

    /// Restack every selected block, keeping their relative order.
    pub fn restack_selection(&mut self, how: Restack) -> bool {
        let mut ids = self.in_paint_order(self.selection.ids());
        // Single steps start nearest the destination, jumps to either end
        // start farthest from it. Either way the group keeps its order.
        if matches!(how, Restack::Forward | Restack::ToBack) {
            ids.reverse();
        }
        let before: Vec<Vec<BlockId>> = self.doc.layers().iter().map(|l| l.block_ids.clone()).collect();
        for id in ids {
            self.restack_one(id, how);
        }
        let changed = self.doc.layers().iter().map(|l| &l.block_ids).ne(before.iter());
        if changed {
            self.commit("restack selection");
        }
        changed
    }

    pub fn move_block_to_layer(&mut self, id: BlockId, layer: LayerId) -> bool {
        let target_locked = self.doc.layer(layer).is_none_or(|l| l.locked);
        if target_locked || !self.editable(id) || !self.doc.move_block_to_layer(id, layer) {
            return false;
        }
        self.commit("move to layer");
        true
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    /// Add an empty layer on top and make it active.
    pub fn add_layer(&mut self, name: Option<&str>) -> EditorResult<LayerId> {
        let n = self.doc.layers().len();
        let name = name.map_or_else(|| format!("Layer {}", n + 1), str::to_string);
        let layer = Layer::new(self.doc.fresh_layer_id(), name)
            .with_color(LAYER_COLORS[n % LAYER_COLORS.len()]);
        let id = self.doc.add_layer(layer)?;
        self.doc.set_active_layer(id);
        self.commit("add layer");
        Ok(id)
    }

    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        if !self.doc.update_layer(id, patch) {
            return false;
        }
        self.commit("update layer");
        true
    }

    /// Remove a layer and its blocks. The last layer stays.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.doc.remove_layer(id).is_none() {
            return false;
        }
        self.commit("remove layer");
        true
    }

    /// Choose the layer that receives new blocks. Not recorded in history.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.doc.active_layer() == id || !self.doc.set_active_layer(id) {
            return false;
        }
        self.notify(ChangeKind::Document);
        true
    }

    pub fn reorder_layers(&mut self, from: usize, to: usize) -> bool {
        if !self.doc.reorder_layers(from, to) {
            return false;
        }
        self.commit("reorder layers");
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn selection_changed(&mut self) {
        log::trace!("selection: {:?}", self.selection.ids());
        self.notify(ChangeKind::Selection);
    }

    pub fn select(&mut self, id: BlockId) -> bool {
        if !self.doc.contains(id) || self.selection.ids() == [id] {
            return false;
        }
        self.selection.select(id);
        self.selection_changed();
        true
    }

    /// Add or remove one block. Returns true if it is selected afterwards.
    pub fn toggle_selection(&mut self, id: BlockId) -> bool {
        if !self.doc.contains(id) {
            return false;
        }
        let selected = self.selection.toggle(id);
        self.selection_changed();
        selected
    }

    /// Replace the selection; unknown ids are dropped.
    pub fn select_many(&mut self, ids: &[BlockId]) -> usize {
        let existing: Vec<BlockId> = ids.iter().copied().filter(|id| self.doc.contains(*id)).collect();
        self.selection.set(existing);
        self.selection_changed();
        self.selection.len()
    }

    /// Select every visible block in a visible, unlocked layer.
    pub fn select_all(&mut self) -> bool {
        let ids: Vec<BlockId> = self
            .doc
            .paint_order()
            .filter(|(layer, block)| layer.visible && !layer.locked && block.visible)
            .map(|(_, block)| block.id)
            .collect();
        if ids.as_slice() == self.selection.ids() {
            return false;
        }
        self.selection.set(ids);
        self.selection_changed();
        true
    }

    pub fn deselect(&mut self) -> bool {
        if !self.selection.clear() {
            return false;
        }
        self.selection_changed();
        true
    }

    /// Pointer selection at a screen point. With `additive` the hit block
    /// is toggled; otherwise it replaces the selection, and a miss clears it.
    pub fn select_at(&mut self, screen: Point, additive: bool) -> Option<BlockId> {
        let hit = hit_test(&self.doc, self.viewport.screen_to_logical(screen));
        match (hit, additive) {
            (Some(id), true) => {
                self.selection.toggle(id);
            }
            (Some(id), false) => self.selection.select(id),
            (None, true) => return None,
            (None, false) => {
                if !self.selection.clear() {
                    return None;
                }
            }
        }
        self.selection_changed();
        hit
    }

    /// Marquee selection over a screen rectangle. Returns the selection size.
    pub fn select_in_rect(&mut self, screen_rect: Rect, additive: bool) -> usize {
        let area = self.viewport.rect_to_logical(screen_rect.abs());
        let hits = hit_test_rect(&self.doc, area);
        if additive {
            for id in hits {
                self.selection.add(id);
            }
        } else {
            self.selection.set(hits);
        }
        self.selection_changed();
        self.selection.len()
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Snapshot the selected blocks. Returns how many were copied.
    pub fn copy(&mut self) -> usize {
        let blocks: Vec<Block> = self
            .in_paint_order(self.selection.ids())
            .into_iter()
            .filter_map(|id| self.doc.block(id).cloned())
            .collect();
        if blocks.is_empty() {
            return 0;
        }
        let n = blocks.len();
        self.clipboard.store(blocks);
        log::debug!("copied {n} blocks");
        n
    }

    /// Copy, then remove the selected editable blocks.
    pub fn cut(&mut self) -> usize {
        let copied = self.copy();
        if copied > 0 && self.remove_many(&self.selection.ids().to_vec()) > 0 {
            self.commit("cut");
        }
        copied
    }

    /// Add the clipboard blocks to the active layer under fresh ids, each
    /// paste offset further from the original. The copies become the
    /// selection.
    pub fn paste(&mut self) -> Vec<BlockId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let offset = self.clipboard.next_offset(self.config.paste_offset);
        let page = self.page_size();
        let snapshots = self.clipboard.blocks().to_vec();

        let mut pasted = Vec::with_capacity(snapshots.len());
        for mut block in snapshots {
            block.id = self.doc.fresh_block_id(block.block_type().as_str());
            block.x += offset;
            block.y += offset;
            block.locked = false;
            block.metadata = BlockMetadata::default();
            block.clamp_to_page(page);
            match self.doc.add_block(block) {
                Ok(id) => pasted.push(id),
                Err(e) => log::warn!("paste skipped a block: {e}"),
            }
        }
        if !pasted.is_empty() {
            self.selection.set(pasted.iter().copied());
            self.commit("paste");
        }
        pasted
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    fn viewport_changed(&mut self, changed: bool) -> bool {
        if changed {
            log::trace!(
                "viewport: zoom {} pan {:?}",
                self.viewport.zoom(),
                self.viewport.pan_offset()
            );
            self.notify(ChangeKind::Viewport);
        }
        changed
    }

    /// Report the on-screen canvas size, used by fit and center.
    pub fn set_screen_size(&mut self, size: Size) {
        self.screen_size = Some(size);
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let changed = self.viewport.set_zoom(zoom);
        self.viewport_changed(changed)
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        self.viewport_changed(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        self.viewport_changed(changed)
    }

    /// Zoom keeping the document point under `screen` in place.
    pub fn zoom_to_point(&mut self, screen: Point, zoom: f64) -> bool {
        let changed = self.viewport.zoom_to_point(screen, zoom);
        self.viewport_changed(changed)
    }

    /// Fit the page into the screen. Needs `set_screen_size` first.
    pub fn zoom_to_fit(&mut self) -> bool {
        let Some(screen) = self.screen_size else {
            return false;
        };
        let page = self.page_size();
        let changed = self.viewport.zoom_to_fit(screen, page, self.config.fit_padding);
        self.viewport_changed(changed)
    }

    pub fn center_canvas(&mut self) -> bool {
        let Some(screen) = self.screen_size else {
            return false;
        };
        let page = self.page_size();
        let changed = self.viewport.center_canvas(screen, page);
        self.viewport_changed(changed)
    }

    pub fn pan(&mut self, delta: Vec2) -> bool {
        let changed = self.viewport.pan(delta);
        self.viewport_changed(changed)
    }

    pub fn reset_view(&mut self) -> bool {
        let before = self.viewport;
        self.viewport.reset();
        let changed = self.viewport != before;
        self.viewport_changed(changed)
    }

    // ─── Grid & guides ───────────────────────────────────────────────────

    pub fn set_grid(&mut self, grid: GridSettings) -> bool {
        let grid = grid.sanitized();
        if grid == self.canvas.grid {
            return false;
        }
        self.canvas.grid = grid;
        self.commit("grid settings");
        true
    }

    pub fn toggle_grid(&mut self) -> bool {
        let grid = GridSettings {
            enabled: !self.canvas.grid.enabled,
            ..self.canvas.grid
        };
        self.set_grid(grid)
    }

    pub fn toggle_snap(&mut self) -> bool {
        let grid = GridSettings {
            snap: !self.canvas.grid.snap,
            ..self.canvas.grid
        };
        self.set_grid(grid)
    }

    pub fn add_guide(&mut self, axis: GuideAxis, position: f64) -> bool {
        if !position.is_finite() {
            return false;
        }
        self.canvas.guides.guides.push(Guide { axis, position });
        self.commit("add guide");
        true
    }

    pub fn remove_guide(&mut self, index: usize) -> bool {
        if index >= self.canvas.guides.guides.len() {
            return false;
        }
        self.canvas.guides.guides.remove(index);
        self.commit("remove guide");
        true
    }

    pub fn set_guides_visible(&mut self, visible: bool) -> bool {
        if self.canvas.guides.visible == visible {
            return false;
        }
        self.canvas.guides.visible = visible;
        self.commit("guide visibility");
        true
    }
}
