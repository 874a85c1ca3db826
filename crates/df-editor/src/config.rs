//! Editor configuration: page size, zoom bounds, history, autosave and the
//! defaults used for newly created blocks.
//!
//! Every field has a default, so a host can pass partial JSON:
//!
//! ```json
//! { "pageSize": { "width": 612, "height": 792 }, "maxHistory": 100 }
//! ```

use crate::error::ConfigError;
use df_core::model::*;
use df_core::{GridSettings, PageSize, Size, Viewport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest default font size accepted for new text blocks.
pub const MIN_LEGIBLE_FONT_SIZE: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Logical canvas size in points.
    pub page_size: PageSize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier for zoom in / zoom out.
    pub zoom_step: f64,
    /// Fraction of the viewport a fitted page occupies.
    pub fit_padding: f64,
    pub undo_enabled: bool,
    pub max_history: usize,
    /// Autosave interval; `None` disables the hint.
    pub autosave_interval_ms: Option<u64>,
    /// Offset applied to each paste / duplicate, in points.
    pub paste_offset: f64,
    pub grid: GridSettings,
    pub defaults: BlockDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: 1.2,
            fit_padding: 0.9,
            undo_enabled: true,
            max_history: 50,
            autosave_interval_ms: None,
            paste_offset: 20.0,
            grid: GridSettings::default(),
            defaults: BlockDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Parse partial JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let PageSize { width, height } = self.page_size;
        if !positive(width) || !positive(height) {
            return Err(ConfigError::PageSize { width, height });
        }
        if !positive(self.min_zoom) || !positive(self.max_zoom) || self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomBounds {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::ZoomStep(self.zoom_step));
        }
        if self.max_history == 0 {
            return Err(ConfigError::HistoryDepth);
        }
        if !(self.defaults.text.font_size >= MIN_LEGIBLE_FONT_SIZE) {
            return Err(ConfigError::FontSize(self.defaults.text.font_size));
        }
        for block_type in BlockType::ALL {
            let size = self.defaults.size(block_type);
            if !positive(size.width) || !positive(size.height) {
                return Err(ConfigError::BlockSize {
                    block: block_type.as_str(),
                    width: size.width,
                    height: size.height,
                });
            }
        }
        Ok(())
    }

    /// A fresh viewport honoring the zoom settings.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.min_zoom, self.max_zoom).with_step(self.zoom_step)
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        self.autosave_interval_ms.map(Duration::from_millis)
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

// ─── Block defaults ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextDefaults {
    pub width: f64,
    pub height: f64,
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub color: Color,
}

impl Default for TextDefaults {
    fn default() -> Self {
        let base = TextBlock::default();
        Self {
            width: 200.0,
            height: 100.0,
            content: "Double-click to edit".into(),
            font_family: base.font_family,
            font_size: base.font_size,
            font_weight: base.font_weight,
            color: base.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageDefaults {
    pub width: f64,
    pub height: f64,
    /// Placeholder source shown until the user picks an image.
    pub src: String,
    pub fit: ImageFit,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            src: String::new(),
            fit: ImageFit::Contain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableDefaults {
    pub width: f64,
    pub height: f64,
    pub rows: u32,
    pub cols: u32,
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 120.0,
            rows: 3,
            cols: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeDefaults {
    pub width: f64,
    pub height: f64,
    pub shape: ShapeKind,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        let base = ShapeBlock::default();
        Self {
            width: 120.0,
            height: 120.0,
            shape: base.shape,
            fill: base.fill,
            stroke: base.stroke,
            stroke_width: base.stroke_width,
        }
    }
}

/// Defaults for each block type created through the editor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDefaults {
    pub text: TextDefaults,
    pub image: ImageDefaults,
    pub table: TableDefaults,
    pub shape: ShapeDefaults,
}

impl BlockDefaults {
    /// Default size for a new block of `block_type`.
    pub fn size(&self, block_type: BlockType) -> Size {
        match block_type {
            BlockType::Text => Size::new(self.text.width, self.text.height),
            BlockType::Image => Size::new(self.image.width, self.image.height),
            BlockType::Table => Size::new(self.table.width, self.table.height),
            BlockType::Shape => Size::new(self.shape.width, self.shape.height),
        }
    }

    /// Type-specific payload for a new block. `content` overrides the
    /// default text of a text block and is ignored for other types.
    pub fn kind(&self, block_type: BlockType, content: Option<String>) -> BlockKind {
        match block_type {
            BlockType::Text => BlockKind::Text(TextBlock {
                content: content.unwrap_or_else(|| self.text.content.clone()),
                font_family: self.text.font_family.clone(),
                font_size: self.text.font_size.max(MIN_LEGIBLE_FONT_SIZE),
                font_weight: self.text.font_weight.clamp(100, 900),
                color: self.text.color,
                ..TextBlock::default()
            }),
            BlockType::Image => BlockKind::Image(ImageBlock {
                src: self.image.src.clone(),
                fit: self.image.fit,
                ..ImageBlock::default()
            }),
            BlockType::Table => BlockKind::Table(TableBlock::new(self.table.rows, self.table.cols)),
            BlockType::Shape => BlockKind::Shape(ShapeBlock {
                shape: self.shape.shape,
                fill: self.shape.fill,
                stroke: self.shape.stroke,
                stroke_width: self.shape.stroke_width.max(0.0),
                ..ShapeBlock::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EditorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.defaults.size(BlockType::Text), Size::new(200.0, 100.0));
        assert_eq!(config.viewport().zoom_bounds(), (0.1, 5.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EditorConfig::from_json(
            r#"{ "pageSize": { "width": 612, "height": 792 }, "maxHistory": 10,
                 "defaults": { "text": { "fontSize": 12 } } }"#,
        )
        .unwrap();
        assert_eq!(config.page_size, PageSize::LETTER);
        assert_eq!(config.max_history, 10);
        assert_eq!(config.defaults.text.font_size, 12.0);
        assert_eq!(config.defaults.text.width, 200.0);
        assert!(config.undo_enabled);
    }

    #[test]
    fn illegible_font_is_rejected() {
        let err = EditorConfig::from_json(r#"{ "defaults": { "text": { "fontSize": 0 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::FontSize(_)));
    }

    #[test]
    fn inverted_zoom_bounds_are_rejected() {
        let config = EditorConfig {
            min_zoom: 4.0,
            max_zoom: 2.0,
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZoomBounds { .. })));

        let config = EditorConfig {
            max_history: 0,
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::HistoryDepth)));
    }

    #[test]
    fn text_kind_uses_override_content() {
        let defaults = BlockDefaults::default();
        let BlockKind::Text(text) = defaults.kind(BlockType::Text, Some("Intro".into())) else {
            panic!("expected text");
        };
        assert_eq!(text.content, "Intro");
        assert!(text.font_size >= MIN_LEGIBLE_FONT_SIZE);
    }
}
