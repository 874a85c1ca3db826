//! Integration tests: template load → edit → save → reload, and the
//! export snapshot handed to the PDF collaborator.

use df_core::*;
use df_editor::{Editor, EditorConfig};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

const ANNUAL_REPORT: &str = include_str!("fixtures/annual_report.json");

fn loaded() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ed = Editor::new(EditorConfig::default()).unwrap();
    ed.load_template_json(ANNUAL_REPORT).unwrap();
    ed
}

fn ids(blocks: &[Block]) -> Vec<&'static str> {
    blocks.iter().map(|b| b.id.as_str()).collect()
}

fn text_of(block: &Block) -> &str {
    match &block.kind {
        BlockKind::Text(t) => &t.content,
        other => panic!("expected text, got {other:?}"),
    }
}

// ─── Loading ────────────────────────────────────────────────────────────

#[test]
fn load_starts_clean_with_fresh_history() {
    let ed = loaded();
    assert_eq!(ed.document().block_count(), 5);
    assert_eq!(ed.document().layers().len(), 2);
    assert_eq!(ed.document().active_layer(), LayerId::intern("content"));
    assert!(!ed.is_dirty());
    assert!(!ed.can_undo());
    assert_eq!(ed.template().name, "Annual Report Cover");
}

#[test]
fn failed_load_keeps_current_document() {
    let mut ed = loaded();
    let before = ed.document().clone();
    let broken = ANNUAL_REPORT.replace(r#""id": "summary""#, r#""id": "heading""#);

    assert!(ed.load_template_json(&broken).is_err());
    assert!(ed.load_template_json("{ not json").is_err());
    assert_eq!(ed.document(), &before);
    assert_eq!(ed.template().id, "tpl_annual_report");
}

#[test]
fn locked_layer_blocks_are_not_editable_or_selectable() {
    let mut ed = loaded();
    let band = BlockId::intern("band");
    assert!(!ed.update_block(band, &BlockPatch::position(10.0, 10.0)).unwrap());
    assert!(!ed.remove_block(band));

    assert!(ed.select_all());
    let selected: Vec<&str> = ed.selection().ids().iter().map(|id| id.as_str()).collect();
    assert_eq!(selected, vec!["heading", "summary", "kpis"]);
}

// ─── Save / reload ──────────────────────────────────────────────────────

#[test]
fn save_and_reload_preserves_edits() {
    let mut ed = loaded();
    let heading = BlockId::intern("heading");
    ed.update_block(heading, &BlockPatch::position(36.0, 120.0)).unwrap();
    let kpis = BlockId::intern("kpis");
    assert!(ed.insert_table_column(kpis, 3));
    assert!(ed.set_table_cell(kpis, 0, 3, "Headcount"));
    assert!(ed.is_dirty());

    let json = ed.save_template_json().unwrap();
    ed.mark_saved();
    assert!(!ed.is_dirty());

    let mut reopened = Editor::new(EditorConfig::default()).unwrap();
    reopened.load_template_json(&json).unwrap();
    assert_eq!(reopened.document(), ed.document());
    assert_eq!(reopened.template().variables, ed.template().variables);
}

#[test]
fn saved_template_lists_blocks_in_paint_order() {
    let ed = loaded();
    let template = ed.save_template();
    assert_eq!(
        ids(&template.blocks),
        vec!["band", "heading", "summary", "kpis", "draft_note"]
    );
    let layers = template.layers.expect("layers are always written");
    assert_eq!(layers[0].name, "Backdrop");
    assert!(layers[0].locked);
}

// ─── Export ─────────────────────────────────────────────────────────────

#[test]
fn export_snapshot_skips_hidden_blocks_and_keeps_placeholders() {
    let ed = loaded();
    let snapshot = ed.export_snapshot();
    assert_eq!(snapshot.page_size, Size::new(595.0, 842.0));
    assert_eq!(ids(&snapshot.blocks), vec!["band", "heading", "summary", "kpis"]);
    assert_eq!(text_of(&snapshot.blocks[1]), "{{ company }} annual report {{ year }}");
    assert_eq!(snapshot.branding.heading_font.as_deref(), Some("Inter"));
}

#[test]
fn export_resolved_fills_variables_from_extracted_content() {
    let mut ed = loaded();
    ed.set_extracted_content(HashMap::from([(
        "company_name".to_string(),
        "Globex".to_string(),
    )]));

    let snapshot = ed.export_resolved();
    assert_eq!(text_of(&snapshot.blocks[1]), "Globex annual report 2025");
    // no variable named `audience`: left as written
    assert_eq!(text_of(&snapshot.blocks[2]), "Prepared for {{ audience }}");
    match &snapshot.blocks[3].kind {
        BlockKind::Table(t) => assert_eq!(t.cell(1, 0).unwrap().content, "2025"),
        other => panic!("expected table, got {other:?}"),
    }
    // the document itself is untouched
    let heading = ed.document().block(BlockId::intern("heading")).unwrap();
    assert_eq!(text_of(heading), "{{ company }} annual report {{ year }}");
}
