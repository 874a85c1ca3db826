//! Document → screen-space draw instructions.
//!
//! Walks the document in paint order (layers bottom-to-top, then each
//! layer's own order) and emits one `DrawInstruction` per visible block,
//! already mapped through the viewport transform. The external surface only
//! has to paint what it receives.

use df_core::model::*;
use df_core::{BlockId, CanvasSettings, Document, GridSettings, LayerId, Viewport};
use kurbo::{Affine, Line, Point, Rect, Size};
use peniko::{Color, Mix};

/// Everything a surface needs to paint one block.
#[derive(Debug, Clone)]
pub struct DrawInstruction {
    pub id: BlockId,
    pub layer: LayerId,
    /// Unrotated bounds in screen pixels.
    pub bounds: Rect,
    /// Document → screen transform including the block's rotation about its
    /// center. Apply to the block's document-space geometry.
    pub transform: Affine,
    /// Clockwise degrees.
    pub rotation: f64,
    /// Block opacity multiplied by layer opacity.
    pub opacity: f32,
    pub blend: Mix,
    pub content: DrawContent,
}

#[derive(Debug, Clone)]
pub enum DrawContent {
    Text {
        content: String,
        font_family: String,
        /// Font size in screen pixels.
        font_size: f64,
        font_weight: u16,
        italic: bool,
        color: Color,
        align: TextAlign,
        line_height: f64,
        rtl: bool,
    },
    Image {
        src: String,
        fit: ImageFit,
        filters: ImageFilters,
        crop: Option<CropRect>,
    },
    Table {
        rows: u32,
        cols: u32,
        cells: Vec<Vec<String>>,
        header_background: Option<Color>,
        alternate_background: Option<Color>,
        border_color: Color,
        /// Border width in screen pixels; zero when the border is off.
        border_width: f64,
    },
    Shape {
        shape: ShapeKind,
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
        corner_radius: f64,
    },
}

/// Build the draw list for the current document and viewport. Hidden
/// layers and hidden blocks are skipped.
pub fn build_draw_list(doc: &Document, viewport: &Viewport) -> Vec<DrawInstruction> {
    let zoom = viewport.zoom();
    doc.paint_order()
        .filter(|(layer, block)| layer.visible && block.visible)
        .map(|(layer, block)| {
            let bounds = block.bounds();
            let rotate = Affine::rotate_about(block.rotation.to_radians(), bounds.center());
            DrawInstruction {
                id: block.id,
                layer: layer.id,
                bounds: viewport.rect_to_screen(bounds),
                transform: viewport.transform() * rotate,
                rotation: block.rotation,
                opacity: (block.opacity * layer.opacity).clamp(0.0, 1.0) as f32,
                blend: blend_mix(layer.blend_mode),
                content: draw_content(&block.kind, zoom),
            }
        })
        .collect()
}

fn draw_content(kind: &BlockKind, zoom: f64) -> DrawContent {
    match kind {
        BlockKind::Text(t) => DrawContent::Text {
            content: t.content.clone(),
            font_family: t.font_family.clone(),
            font_size: t.font_size * zoom,
            font_weight: t.font_weight,
            italic: t.font_style == FontStyle::Italic,
            color: to_peniko(t.color),
            align: t.align,
            line_height: t.line_height,
            rtl: t.direction == TextDirection::Rtl,
        },
        BlockKind::Image(i) => DrawContent::Image {
            src: i.src.clone(),
            fit: i.fit,
            filters: i.filters,
            crop: i.crop,
        },
        BlockKind::Table(t) => DrawContent::Table {
            rows: t.rows,
            cols: t.cols,
            cells: t
                .cells
                .iter()
                .map(|row| row.iter().map(|c| c.content.clone()).collect())
                .collect(),
            header_background: t.header_style.background.map(to_peniko),
            alternate_background: t
                .alternate_rows
                .then_some(t.alternate_color)
                .flatten()
                .map(to_peniko),
            border_color: to_peniko(t.border.color),
            border_width: match t.border.line {
                BorderLine::None => 0.0,
                _ => t.border.width * zoom,
            },
        },
        BlockKind::Shape(s) => DrawContent::Shape {
            shape: s.shape,
            fill: s.fill.map(to_peniko),
            stroke: s.stroke.map(to_peniko),
            stroke_width: s.stroke_width * zoom,
            corner_radius: s.corner_radius * zoom,
        },
    }
}

/// Screen-space grid lines covering `page`, or nothing when the grid is off.
pub fn grid_lines(canvas: &CanvasSettings, page: Size, viewport: &Viewport) -> Vec<Line> {
    let grid: &GridSettings = &canvas.grid;
    if !grid.enabled || grid.size <= 0.0 {
        return Vec::new();
    }
    let t = viewport.transform();
    let mut lines = Vec::new();

    let mut x = 0.0;
    while x <= page.width {
        lines.push(t * Line::new(Point::new(x, 0.0), Point::new(x, page.height)));
        x += grid.size;
    }
    let mut y = 0.0;
    while y <= page.height {
        lines.push(t * Line::new(Point::new(0.0, y), Point::new(page.width, y)));
        y += grid.size;
    }
    lines
}

/// The grid color with its opacity folded into alpha.
pub fn grid_color(grid: &GridSettings) -> Color {
    let [r, g, b, a] = grid.color.to_rgba8();
    Color::from_rgba8(r, g, b, (a as f64 * grid.opacity).round() as u8)
}

// ─── Helpers ─────────────────────────────────────────────────────────────

pub fn to_peniko(c: df_core::Color) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}

pub fn blend_mix(mode: BlendMode) -> Mix {
    match mode {
        BlendMode::Normal => Mix::Normal,
        BlendMode::Multiply => Mix::Multiply,
        BlendMode::Screen => Mix::Screen,
        BlendMode::Overlay => Mix::Overlay,
        BlendMode::Darken => Mix::Darken,
        BlendMode::Lighten => Mix::Lighten,
        BlendMode::ColorDodge => Mix::ColorDodge,
        BlendMode::ColorBurn => Mix::ColorBurn,
        BlendMode::HardLight => Mix::HardLight,
        BlendMode::SoftLight => Mix::SoftLight,
        BlendMode::Difference => Mix::Difference,
        BlendMode::Exclusion => Mix::Exclusion,
    }
}
