//! Hit testing: document point → block lookup.
//!
//! Walks the paint order in reverse (last painted = topmost). Hidden
//! blocks, hidden layers and locked layers are never hit. Rotated blocks are
//! tested in their own unrotated frame.

use df_core::model::Block;
use df_core::{BlockId, Document, Layer};
use kurbo::{Affine, Point, Rect};

fn pickable(layer: &Layer, block: &Block) -> bool {
    layer.visible && !layer.locked && block.visible
}

fn contains(block: &Block, p: Point) -> bool {
    let bounds = block.bounds();
    if block.rotation == 0.0 {
        return bounds.contains(p);
    }
    let unrotate = Affine::rotate_about(-block.rotation.to_radians(), bounds.center());
    bounds.contains(unrotate * p)
}

/// Axis-aligned box around the block after rotation.
fn rotated_bounds(block: &Block) -> Rect {
    let bounds = block.bounds();
    if block.rotation == 0.0 {
        return bounds;
    }
    Affine::rotate_about(block.rotation.to_radians(), bounds.center()).transform_rect_bbox(bounds)
}

/// Find the topmost block at document point `p`.
/// Returns `None` if only the page background is hit.
pub fn hit_test(doc: &Document, p: Point) -> Option<BlockId> {
    doc.layers()
        .iter()
        .rev()
        .filter(|layer| layer.visible && !layer.locked)
        .flat_map(|layer| {
            layer
                .block_ids
                .iter()
                .rev()
                .filter_map(move |id| doc.block(*id).map(|b| (layer, b)))
        })
        .find(|(layer, block)| pickable(layer, block) && contains(block, p))
        .map(|(_, block)| block.id)
}

/// All pickable blocks whose (rotated) bounds intersect `rect`, in paint
/// order. Used for marquee selection.
pub fn hit_test_rect(doc: &Document, rect: Rect) -> Vec<BlockId> {
    let rect = rect.abs();
    doc.paint_order()
        .filter(|(layer, block)| pickable(layer, block))
        .filter(|(_, block)| overlaps(rect, rotated_bounds(block)))
        .map(|(_, block)| block.id)
        .collect()
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::model::*;
    use df_core::LayerPatch;

    fn shape(doc: &mut Document, id: &str, bounds: Rect) -> BlockId {
        doc.add_block(Block::new(
            BlockId::intern(id),
            BlockKind::Shape(ShapeBlock::default()),
            bounds,
        ))
        .unwrap()
    }

    #[test]
    fn hit_test_basic() {
        let mut doc = Document::new();
        let a = shape(&mut doc, "hit_a", Rect::new(10.0, 10.0, 110.0, 110.0));
        let b = shape(&mut doc, "hit_b", Rect::new(200.0, 200.0, 250.0, 250.0));

        assert_eq!(hit_test(&doc, Point::new(50.0, 50.0)), Some(a));
        assert_eq!(hit_test(&doc, Point::new(220.0, 220.0)), Some(b));
        assert_eq!(hit_test(&doc, Point::new(150.0, 150.0)), None);
    }

    #[test]
    fn topmost_block_wins() {
        let mut doc = Document::new();
        shape(&mut doc, "hit_under", Rect::new(0.0, 0.0, 100.0, 100.0));
        let over = shape(&mut doc, "hit_over", Rect::new(50.0, 50.0, 150.0, 150.0));
        assert_eq!(hit_test(&doc, Point::new(75.0, 75.0)), Some(over));
    }

    #[test]
    fn locked_layer_is_not_pickable() {
        let mut doc = Document::new();
        shape(&mut doc, "hit_locked", Rect::new(0.0, 0.0, 100.0, 100.0));
        doc.update_layer(
            doc.active_layer(),
            &LayerPatch {
                locked: Some(true),
                ..LayerPatch::default()
            },
        );
        assert_eq!(hit_test(&doc, Point::new(50.0, 50.0)), None);
        assert!(hit_test_rect(&doc, Rect::new(0.0, 0.0, 500.0, 500.0)).is_empty());
    }

    #[test]
    fn rotated_block_uses_its_own_frame() {
        let mut doc = Document::new();
        let bar = shape(&mut doc, "hit_bar", Rect::new(0.0, 45.0, 100.0, 55.0));
        doc.update_block(bar, &BlockPatch::rotation(90.0)).unwrap();

        // After a quarter turn the bar is vertical around (50, 50).
        assert_eq!(hit_test(&doc, Point::new(50.0, 10.0)), Some(bar));
        assert_eq!(hit_test(&doc, Point::new(10.0, 50.0)), None);
    }

    #[test]
    fn marquee_collects_intersecting_in_paint_order() {
        let mut doc = Document::new();
        let a = shape(&mut doc, "hit_rect_a", Rect::new(10.0, 10.0, 60.0, 60.0));
        let b = shape(&mut doc, "hit_rect_b", Rect::new(50.0, 50.0, 100.0, 100.0));
        shape(&mut doc, "hit_rect_far", Rect::new(300.0, 300.0, 350.0, 350.0));

        // Dragged bottom-right to top-left.
        let hits = hit_test_rect(&doc, Rect::new(80.0, 80.0, 0.0, 0.0));
        assert_eq!(hits, vec![a, b]);
    }
}
