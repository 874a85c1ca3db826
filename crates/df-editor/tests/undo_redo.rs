//! Integration tests: editor commands → history → undo/redo (df-editor).
//!
//! Every structural command must be undoable as one step, restoring the
//! exact previous document, and history restores must never record
//! themselves.

use df_core::*;
use df_editor::{Editor, EditorConfig};
use pretty_assertions::assert_eq;

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(EditorConfig::default()).unwrap()
}

fn text_at(ed: &mut Editor, x: f64, y: f64) -> BlockId {
    ed.create_block(BlockType::Text, Point::new(x, y), None).unwrap()
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn two_adds_undo_once_redo_once() {
    let mut ed = editor();
    text_at(&mut ed, 10.0, 10.0);
    text_at(&mut ed, 50.0, 50.0);
    assert_eq!(ed.document().block_count(), 2);

    assert!(ed.undo());
    assert_eq!(ed.document().block_count(), 1);

    assert!(ed.redo());
    assert_eq!(ed.document().block_count(), 2);
}

#[test]
fn undo_restores_exact_previous_document() {
    let mut ed = editor();
    let id = text_at(&mut ed, 10.0, 10.0);
    let before = ed.document().clone();

    ed.update_block(id, &BlockPatch::position(300.0, 400.0)).unwrap();
    ed.update_block(id, &BlockPatch::text("Revised")).unwrap();
    assert_ne!(ed.document(), &before);

    ed.undo();
    ed.undo();
    assert_eq!(ed.document(), &before);
}

#[test]
fn undo_at_oldest_entry_is_a_no_op() {
    let mut ed = editor();
    assert!(!ed.can_undo());
    assert!(!ed.undo());
    assert!(!ed.redo());
    assert_eq!(ed.document().block_count(), 0);
}

#[test]
fn new_command_after_undo_discards_redo_branch() {
    let mut ed = editor();
    text_at(&mut ed, 0.0, 0.0);
    text_at(&mut ed, 0.0, 0.0);
    ed.undo();
    assert!(ed.can_redo());

    ed.create_block(BlockType::Shape, Point::new(100.0, 100.0), None)
        .unwrap();
    assert!(!ed.can_redo());
    assert!(!ed.redo());
    let types: Vec<BlockType> = ed.document().blocks().iter().map(Block::block_type).collect();
    assert_eq!(types, vec![BlockType::Text, BlockType::Shape]);
}

#[test]
fn restoring_history_does_not_record_itself() {
    let mut ed = editor();
    text_at(&mut ed, 0.0, 0.0);
    text_at(&mut ed, 0.0, 0.0);
    let len = ed.history().len();

    ed.undo();
    ed.redo();
    ed.undo();
    assert_eq!(ed.history().len(), len);
    assert_eq!(ed.history().index(), Some(1));
}

// ─── Bounds ─────────────────────────────────────────────────────────────

#[test]
fn history_is_bounded_by_config() {
    let json = include_str!("fixtures/editor_config.json");
    let mut ed = Editor::new(EditorConfig::from_json(json).unwrap()).unwrap();
    for i in 0..8 {
        text_at(&mut ed, i as f64 * 10.0, 0.0);
    }
    assert_eq!(ed.history().len(), 5);

    let mut undos = 0;
    while ed.undo() {
        undos += 1;
    }
    assert_eq!(undos, 4);
    assert_eq!(ed.document().block_count(), 4);
}

// ─── Layers ─────────────────────────────────────────────────────────────

#[test]
fn last_layer_cannot_be_removed() {
    let mut ed = editor();
    let only = ed.document().layers()[0].id;
    assert!(!ed.remove_layer(only));
    assert_eq!(ed.document().layers().len(), 1);
    assert!(!ed.can_undo(), "refused command leaves no history");
}

#[test]
fn removing_a_layer_takes_its_blocks_and_undo_brings_them_back() {
    let mut ed = editor();
    let base = ed.document().active_layer();
    text_at(&mut ed, 0.0, 0.0);
    let top = ed.add_layer(Some("Overlay")).unwrap();
    assert_eq!(ed.document().active_layer(), top);
    let on_top = text_at(&mut ed, 20.0, 20.0);
    assert_eq!(ed.document().layer_of(on_top).map(|l| l.id), Some(top));

    assert!(ed.remove_layer(top));
    assert!(!ed.document().contains(on_top));
    assert_eq!(ed.document().active_layer(), base);
    assert!(ed.selection().is_empty());

    ed.undo();
    assert!(ed.document().contains(on_top));
    assert_eq!(ed.document().layers().len(), 2);
}

#[test]
fn invariants_hold_across_a_mixed_session() {
    let mut ed = editor();
    let a = text_at(&mut ed, 0.0, 0.0);
    let b = ed
        .create_block(BlockType::Table, Point::new(50.0, 300.0), None)
        .unwrap();
    let layer = ed.add_layer(None).unwrap();
    assert!(ed.move_block_to_layer(a, layer));
    ed.select(b);
    ed.copy();
    ed.paste();
    ed.duplicate_block(a);
    ed.reorder_layers(1, 0);
    ed.remove_block(b);

    ed.document().check_invariants().unwrap();
    while ed.undo() {
        ed.document().check_invariants().unwrap();
    }
    while ed.redo() {
        ed.document().check_invariants().unwrap();
    }
}

#[test]
fn selection_and_viewport_changes_stay_out_of_history() {
    let mut ed = editor();
    let id = text_at(&mut ed, 0.0, 0.0);
    let len = ed.history().len();

    ed.deselect();
    ed.select(id);
    ed.zoom_in();
    ed.pan(Vec2::new(30.0, 30.0));
    assert_eq!(ed.history().len(), len);
}

#[test]
fn patch_that_changes_nothing_is_not_recorded() {
    let mut ed = editor();
    let id = text_at(&mut ed, 20.0, 20.0);
    ed.mark_saved();
    let len = ed.history().len();

    assert!(!ed.update_block(id, &BlockPatch::default()).unwrap());
    let same_flags = BlockPatch {
        locked: Some(false),
        visible: Some(true),
        ..BlockPatch::default()
    };
    assert!(!ed.update_block(id, &same_flags).unwrap());
    assert!(!ed.update_block(id, &BlockPatch::position(20.0, 20.0)).unwrap());

    assert_eq!(ed.history().len(), len);
    assert!(!ed.is_dirty());
}

#[test]
fn branding_change_is_dirty_and_undoable() {
    let mut ed = editor();
    ed.mark_saved();
    let rules = BrandingRules {
        primary_color: Color::from_hex("#0F766E"),
        heading_font: Some("Inter".into()),
        ..BrandingRules::default()
    };

    assert!(ed.set_branding_rules(rules.clone()));
    assert!(ed.is_dirty());
    assert!(!ed.set_branding_rules(rules.clone()));
    assert_eq!(ed.save_template().branding_rules, rules);

    assert!(ed.undo());
    assert_eq!(ed.template().branding_rules, BrandingRules::default());
    assert!(!ed.is_dirty());
    assert!(ed.redo());
    assert_eq!(ed.export_snapshot().branding, rules);
}
