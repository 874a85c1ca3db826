//! The template persistence shape and its conversion to/from a `Document`.
//!
//! A template is what gets saved and loaded: page setup, the block list,
//! template variables and branding rules. Layer structure is stored too when
//! available; older templates without a `layers` list get their layers
//! rebuilt from each block's `layer` / `zIndex` fields.

use crate::document::Document;
use crate::error::{DocError, DocResult};
use crate::id::LayerId;
use crate::model::*;
use crate::variables;
use kurbo::{Insets, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ─── Page setup ──────────────────────────────────────────────────────────

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn to_size(self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 36.0,
            right: 36.0,
            bottom: 36.0,
            left: 36.0,
        }
    }
}

// ─── Variables & branding ────────────────────────────────────────────────

/// A named value that text content can reference as `{{ name }}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub default_value: String,
    /// Extracted field that supplies the value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingRules {
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub accent_color: Option<Color>,
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
    /// Logo image source.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateMetadata {
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for TemplateMetadata {
    fn default() -> Self {
        let now = now_millis();
        Self {
            created_at: now,
            updated_at: now,
            version: SCHEMA_VERSION,
            author: None,
        }
    }
}

// ─── Template ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Layer structure, bottom first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub branding_rules: BrandingRules,
    #[serde(default)]
    pub metadata: TemplateMetadata,
}

impl Template {
    /// An empty A4 portrait template.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            tags: Vec::new(),
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            blocks: Vec::new(),
            layers: None,
            variables: Vec::new(),
            branding_rules: BrandingRules::default(),
            metadata: TemplateMetadata::default(),
        }
    }

    pub fn from_json(json: &str) -> DocResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> DocResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Logical canvas size. Landscape puts the long side horizontal.
    pub fn logical_size(&self) -> Size {
        let PageSize { width, height } = self.page_size;
        match self.orientation {
            Orientation::Landscape if height > width => Size::new(height, width),
            _ => Size::new(width, height),
        }
    }

    /// The page area inside the margins.
    pub fn content_area(&self) -> Rect {
        let m = self.margins;
        Rect::from_origin_size(kurbo::Point::ORIGIN, self.logical_size())
            - Insets::new(m.left, m.top, m.right, m.bottom)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Placeholder names used in text content that no variable defines,
    /// in first-use order.
    pub fn undefined_variables(&self) -> Vec<String> {
        let defined: HashSet<&str> = self.variables.iter().map(|v| v.name.as_str()).collect();
        let mut missing: Vec<String> = Vec::new();
        for block in &self.blocks {
            for text in text_fields(block) {
                for name in variables::placeholders(text) {
                    if !defined.contains(name) && !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                }
            }
        }
        missing
    }

    /// Check the page setup and schema version.
    pub fn validate(&self) -> DocResult<()> {
        if self.metadata.version > SCHEMA_VERSION {
            return Err(DocError::UnsupportedSchema {
                found: self.metadata.version,
                supported: SCHEMA_VERSION,
            });
        }
        let PageSize { width, height } = self.page_size;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(DocError::InvalidTemplate(format!(
                "page size must be positive, got {width}×{height}"
            )));
        }
        let mut names = HashSet::new();
        for var in &self.variables {
            if var.name.trim().is_empty() {
                return Err(DocError::InvalidTemplate("variable with empty name".into()));
            }
            if !names.insert(var.name.as_str()) {
                return Err(DocError::InvalidTemplate(format!(
                    "variable {:?} defined twice",
                    var.name
                )));
            }
        }
        Ok(())
    }

    /// Build the document model. Nothing is produced unless the whole
    /// template is valid.
    pub fn to_document(&self) -> DocResult<Document> {
        self.validate()?;

        let layers = match &self.layers {
            Some(layers) => layers.clone(),
            None => rebuild_layers(&self.blocks)?,
        };
        let doc = Document::from_parts(self.blocks.clone(), layers)?;

        for name in self.undefined_variables() {
            log::warn!("template {:?} references undefined variable {name:?}", self.id);
        }
        log::debug!(
            "loaded template {:?}: {} blocks, {} layers",
            self.id,
            doc.block_count(),
            doc.layers().len()
        );
        Ok(doc)
    }

    /// Write the document's blocks (in paint order) and layers back into
    /// the template and bump `updatedAt`.
    pub fn capture(&mut self, doc: &Document) {
        self.blocks = doc.paint_order().map(|(_, b)| b.clone()).collect();
        self.layers = Some(doc.layers().to_vec());
        self.metadata.updated_at = now_millis();
        self.metadata.version = SCHEMA_VERSION;
    }
}

/// Text carried by a block that may contain placeholders.
pub(crate) fn text_fields(block: &Block) -> Vec<&str> {
    match &block.kind {
        BlockKind::Text(t) => vec![t.content.as_str()],
        BlockKind::Table(t) => t
            .cells
            .iter()
            .flatten()
            .map(|c| c.content.as_str())
            .collect(),
        BlockKind::Image(_) | BlockKind::Shape(_) => Vec::new(),
    }
}

/// Recreate layers from each block's stored `layer` and `z_index`.
/// A layer index can never exceed the block count.
fn rebuild_layers(blocks: &[Block]) -> DocResult<Vec<Layer>> {
    if let Some(block) = blocks.iter().find(|b| b.layer >= blocks.len()) {
        return Err(DocError::InvalidTemplate(format!(
            "block {} has layer index {} but the template has {} blocks",
            block.id,
            block.layer,
            blocks.len()
        )));
    }
    let count = blocks.iter().map(|b| b.layer + 1).max().unwrap_or(1);
    let mut layers: Vec<Layer> = (0..count)
        .map(|i| {
            Layer::new(LayerId::intern(&format!("layer_{}", i + 1)), format!("Layer {}", i + 1))
                .with_color(LAYER_COLORS[i % LAYER_COLORS.len()])
        })
        .collect();

    let mut order: Vec<(usize, usize, usize)> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.layer, b.z_index, i))
        .collect();
    order.sort_unstable();
    for (layer, _, i) in order {
        layers[layer].block_ids.push(blocks[i].id);
    }
    Ok(layers)
}
