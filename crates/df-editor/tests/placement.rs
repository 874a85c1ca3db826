//! Integration tests: palette drops and pointer selection through the
//! viewport (screen pixels → document points).

use df_core::*;
use df_editor::{ChangeKind, Editor, EditorConfig, PlacementIntent};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

fn editor() -> Editor {
    Editor::new(EditorConfig::default()).unwrap()
}

// ─── Drops ──────────────────────────────────────────────────────────────

#[test]
fn drop_far_outside_is_clamped_inside_page() {
    let mut ed = editor();
    let id = ed
        .drop_block(&PlacementIntent::new("text", Point::new(1000.0, 1000.0)))
        .unwrap();
    let block = ed.document().block(id).unwrap();
    assert_eq!(block.origin(), Point::new(395.0, 742.0));
    assert_eq!(block.size(), Size::new(200.0, 100.0));
    assert_eq!(ed.selection().ids(), &[id]);
}

#[test]
fn drop_maps_through_zoom_and_pan() {
    let mut ed = editor();
    ed.set_zoom(2.0);
    ed.pan(Vec2::new(50.0, 20.0));

    let id = ed
        .drop_block(&PlacementIntent::new("shape", Point::new(250.0, 220.0)))
        .unwrap();
    assert_eq!(
        ed.document().block(id).unwrap().origin(),
        Point::new(100.0, 100.0)
    );
}

#[test]
fn drop_snaps_to_grid_when_enabled() {
    let json = include_str!("fixtures/editor_config.json");
    let mut ed = Editor::new(EditorConfig::from_json(json).unwrap()).unwrap();
    let id = ed
        .drop_block(&PlacementIntent::new("image", Point::new(31.0, 43.0)))
        .unwrap();
    assert_eq!(
        ed.document().block(id).unwrap().origin(),
        Point::new(36.0, 48.0)
    );
}

#[test]
fn unknown_type_is_rejected_without_side_effects() {
    let mut ed = editor();
    let notified = Rc::new(Cell::new(0));
    let n = Rc::clone(&notified);
    ed.subscribe(move |_, _| n.set(n.get() + 1));

    assert!(
        ed.drop_block(&PlacementIntent::new("chart", Point::new(10.0, 10.0)))
            .is_err()
    );
    assert_eq!(ed.document().block_count(), 0);
    assert!(!ed.can_undo());
    assert!(!ed.is_dirty());
    assert_eq!(notified.get(), 0);
}

#[test]
fn text_drop_uses_extracted_content() {
    let mut ed = editor();
    ed.set_extracted_content(HashMap::from([(
        "headline".to_string(),
        "Record growth in 2025".to_string(),
    )]));

    let filled = ed
        .drop_block(&PlacementIntent::new("text", Point::ORIGIN).with_content_key("headline"))
        .unwrap();
    let fallback = ed
        .drop_block(&PlacementIntent::new("text", Point::ORIGIN).with_content_key("missing"))
        .unwrap();

    let content = |id: BlockId| match &ed.document().block(id).unwrap().kind {
        BlockKind::Text(t) => t.content.clone(),
        other => panic!("expected text, got {other:?}"),
    };
    assert_eq!(content(filled), "Record growth in 2025");
    assert_eq!(content(fallback), ed.config().defaults.text.content);
}

#[test]
fn intent_deserializes_from_palette_payload() {
    let intent: PlacementIntent = serde_json::from_str(
        r#"{ "blockType": "Table", "screenX": 12.5, "screenY": 40, "contentKey": "kpis" }"#,
    )
    .unwrap();
    assert_eq!(intent.screen_point(), Point::new(12.5, 40.0));
    assert_eq!(intent.parsed_type().unwrap(), BlockType::Table);
    assert_eq!(intent.content_key.as_deref(), Some("kpis"));
}

// ─── Viewport & pointer selection ───────────────────────────────────────

#[test]
fn zoom_to_point_keeps_anchor_fixed() {
    let mut ed = editor();
    ed.pan(Vec2::new(40.0, 25.0));
    let anchor = Point::new(300.0, 200.0);
    let before = ed.viewport().screen_to_logical(anchor);

    assert!(ed.zoom_to_point(anchor, 2.5));
    let after = ed.viewport().screen_to_logical(anchor);
    assert!((before - after).hypot() < 1e-9);
    assert_eq!(ed.viewport().zoom(), 2.5);
}

#[test]
fn zoom_is_clamped_to_configured_bounds() {
    let mut ed = editor();
    ed.set_zoom(50.0);
    assert_eq!(ed.viewport().zoom(), 5.0);
    ed.set_zoom(0.0);
    assert_eq!(ed.viewport().zoom(), 0.1);
}

#[test]
fn fit_needs_a_screen_size_and_then_centers_the_page() {
    let mut ed = editor();
    let seen = Rc::new(Cell::new(None));
    let s = Rc::clone(&seen);
    ed.subscribe(move |kind, _| s.set(Some(kind)));

    assert!(!ed.zoom_to_fit());
    ed.set_screen_size(Size::new(1190.0, 842.0));
    assert!(ed.zoom_to_fit());
    assert_eq!(seen.get(), Some(ChangeKind::Viewport));

    let page = ed.viewport().rect_to_screen(Rect::new(0.0, 0.0, 595.0, 842.0));
    assert!((page.center().x - 595.0).abs() < 1e-6);
    assert!((page.center().y - 421.0).abs() < 1e-6);
    assert!((page.height() - 842.0 * 0.9).abs() < 1e-6);
}

#[test]
fn click_selects_topmost_block_under_pointer() {
    let mut ed = editor();
    let below = ed
        .create_block(BlockType::Shape, Point::new(100.0, 100.0), None)
        .unwrap();
    let above = ed
        .create_block(BlockType::Shape, Point::new(150.0, 150.0), None)
        .unwrap();
    ed.deselect();
    ed.set_zoom(2.0);

    // document (160, 160) is inside both blocks
    assert_eq!(ed.select_at(Point::new(320.0, 320.0), false), Some(above));
    // document (110, 110) only hits the lower one; shift-click adds it
    assert_eq!(ed.select_at(Point::new(220.0, 220.0), true), Some(below));
    assert_eq!(ed.selection().ids(), &[above, below]);

    assert_eq!(ed.select_at(Point::new(1100.0, 1600.0), false), None);
    assert!(ed.selection().is_empty());
}

#[test]
fn marquee_selects_intersecting_blocks() {
    let mut ed = editor();
    let a = ed
        .create_block(BlockType::Shape, Point::new(0.0, 0.0), None)
        .unwrap();
    let b = ed
        .create_block(BlockType::Shape, Point::new(300.0, 0.0), None)
        .unwrap();
    let _far = ed
        .create_block(BlockType::Shape, Point::new(0.0, 600.0), None)
        .unwrap();

    // dragged right-to-left, bottom-to-top
    let n = ed.select_in_rect(Rect::new(350.0, 50.0, 50.0, 10.0), false);
    assert_eq!(n, 2);
    assert_eq!(ed.selection().ids(), &[a, b]);
}

#[test]
fn drag_converts_screen_delta_to_document_points() {
    let mut ed = editor();
    let id = ed
        .create_block(BlockType::Shape, Point::new(100.0, 100.0), None)
        .unwrap();
    ed.set_zoom(2.0);

    assert!(ed.drag_selection(Vec2::new(40.0, -20.0)));
    assert_eq!(
        ed.document().block(id).unwrap().origin(),
        Point::new(120.0, 90.0)
    );
}
