//! Drag-and-drop placement: "put a block of type T here" → a new block.
//!
//! The drop point arrives in screen pixels. It is mapped to document
//! points through the viewport, snapped to the grid when snapping is on,
//! and becomes the block's top-left corner. The block gets its final,
//! type-specific size before it is clamped into the page, so the clamp
//! always uses the size that is stored.

use crate::config::BlockDefaults;
use df_core::model::{Block, BlockType};
use df_core::{BlockId, DocResult, GridSettings, Point, Rect, Size, Viewport};
use serde::{Deserialize, Serialize};

/// A request from the block palette, delivered with the drop position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementIntent {
    /// Block type tag, e.g. `"text"`. Unknown tags are rejected.
    pub block_type: String,
    /// Drop position in screen pixels.
    pub screen_x: f64,
    pub screen_y: f64,
    /// Name of an extracted content field to seed a text block with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_key: Option<String>,
}

impl PlacementIntent {
    pub fn new(block_type: impl Into<String>, screen: Point) -> Self {
        Self {
            block_type: block_type.into(),
            screen_x: screen.x,
            screen_y: screen.y,
            content_key: None,
        }
    }

    pub fn with_content_key(mut self, key: impl Into<String>) -> Self {
        self.content_key = Some(key.into());
        self
    }

    pub fn screen_point(&self) -> Point {
        Point::new(self.screen_x, self.screen_y)
    }

    /// Parse the type tag.
    pub fn parsed_type(&self) -> DocResult<BlockType> {
        self.block_type.parse()
    }
}

/// Where a block placed at `screen` lands, in document points, before
/// clamping.
pub fn drop_origin(screen: Point, viewport: &Viewport, grid: &GridSettings) -> Point {
    grid.snap_point(viewport.screen_to_logical(screen))
}

/// Build a new block of `block_type` at document point `origin` with the
/// configured defaults, clamped into `page`.
pub fn build_block(
    id: BlockId,
    block_type: BlockType,
    origin: Point,
    defaults: &BlockDefaults,
    content: Option<String>,
    page: Size,
) -> Block {
    let size = defaults.size(block_type);
    let kind = defaults.kind(block_type, content);
    let mut block = Block::new(id, kind, Rect::from_origin_size(origin, size));
    block.clamp_to_page(page);
    block
}
