//! Block and layer data model for branded documents.
//!
//! A document is a flat store of `Block`s plus an ordered list of `Layer`s.
//! Layers *reference* blocks by id; the order of a layer's `block_ids` is the
//! paint order inside that layer, and layers paint bottom (index 0) to top.
//! Each block kind carries only its own fields, so every consumer has to
//! match exhaustively on `BlockKind`.

use crate::error::{DocError, DocResult};
use crate::id::{BlockId, LayerId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Schema version written into block and template metadata.
pub const SCHEMA_VERSION: u32 = 1;

/// Smallest width/height a block may shrink to, in points.
pub const MIN_BLOCK_SIZE: f64 = 1.0;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], serialized as `#RRGGBB[AA]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb8(0, 0, 0);
    pub const WHITE: Color = Color::rgb8(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let digits = hex
            .bytes()
            .map(hex_val)
            .collect::<Option<Vec<u8>>>()?;

        let channels: Vec<u8> = match digits.len() {
            3 | 4 => digits.iter().map(|d| d * 17).collect(),
            6 | 8 => digits.chunks(2).map(|p| p[0] << 4 | p[1]).collect(),
            _ => return None,
        };
        let alpha = channels.get(3).copied().unwrap_or(255);
        Some(Self::rgba(
            channels[0] as f32 / 255.0,
            channels[1] as f32 / 255.0,
            channels[2] as f32 / 255.0,
            alpha as f32 / 255.0,
        ))
    }

    /// 8-bit channels, rounded.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Shortest lossless hex form: `#RRGGBB` when opaque, else `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextBlock {
    pub content: String,
    pub font_family: String,
    /// Point size.
    pub font_size: f64,
    /// CSS-style weight, 100..=900.
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub color: Color,
    pub align: TextAlign,
    /// Multiple of the font size.
    pub line_height: f64,
    pub letter_spacing: f64,
    pub direction: TextDirection,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Inter".into(),
            font_size: 16.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            color: Color::rgb8(0x1F, 0x29, 0x37),
            align: TextAlign::Left,
            line_height: 1.4,
            letter_spacing: 0.0,
            direction: TextDirection::Ltr,
        }
    }
}

// ─── Image ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    Cover,
    #[default]
    Contain,
    Fill,
    ScaleDown,
}

/// CSS-filter style adjustments, in percent except `blur` (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageFilters {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub blur: f64,
    pub sepia: f64,
    pub grayscale: f64,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            sepia: 0.0,
            grayscale: 0.0,
        }
    }
}

impl ImageFilters {
    /// Clamp every parameter into its usable range.
    pub fn clamped(self) -> Self {
        Self {
            brightness: finite_or(self.brightness, 100.0).clamp(0.0, 200.0),
            contrast: finite_or(self.contrast, 100.0).clamp(0.0, 200.0),
            saturation: finite_or(self.saturation, 100.0).clamp(0.0, 200.0),
            blur: finite_or(self.blur, 0.0).clamp(0.0, 100.0),
            sepia: finite_or(self.sepia, 0.0).clamp(0.0, 100.0),
            grayscale: finite_or(self.grayscale, 0.0).clamp(0.0, 100.0),
        }
    }
}

/// Source-image crop, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageBlock {
    /// URL, data URI or asset key; resolved by the renderer.
    pub src: String,
    pub fit: ImageFit,
    pub filters: ImageFilters,
    pub crop: Option<CropRect>,
}

// ─── Table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Text,
    Number,
    Header,
}

/// Per-cell style; `None` fields fall back to the table's row style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellStyle {
    pub background: Option<Color>,
    pub color: Option<Color>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u16>,
    pub align: Option<TextAlign>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableCell {
    pub content: String,
    pub cell_type: CellType,
    pub style: Option<CellStyle>,
    pub row_span: u32,
    pub col_span: u32,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            content: String::new(),
            cell_type: CellType::Text,
            style: None,
            row_span: 1,
            col_span: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderLine {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BorderStyle {
    pub width: f64,
    pub color: Color,
    pub line: BorderLine,
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::rgb8(0xD1, 0xD5, 0xDB),
            line: BorderLine::Solid,
        }
    }
}

/// A row-major table. `cells.len() == rows` and every row has `cols` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableBlock {
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<Vec<TableCell>>,
    pub header_style: CellStyle,
    pub cell_style: CellStyle,
    pub border: BorderStyle,
    pub alternate_rows: bool,
    pub alternate_color: Option<Color>,
}

impl Default for TableBlock {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

impl TableBlock {
    /// An empty `rows × cols` table whose first row is a header row.
    pub fn new(rows: u32, cols: u32) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let cells = (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|_| TableCell {
                        cell_type: if r == 0 { CellType::Header } else { CellType::Text },
                        ..TableCell::default()
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            cols,
            cells,
            header_style: CellStyle {
                background: Some(Color::rgb8(0xF3, 0xF4, 0xF6)),
                font_weight: Some(600),
                ..CellStyle::default()
            },
            cell_style: CellStyle::default(),
            border: BorderStyle::default(),
            alternate_rows: false,
            alternate_color: None,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Replace a cell's content. Returns false if out of range.
    pub fn set_cell(&mut self, row: usize, col: usize, content: impl Into<String>) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                cell.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Insert an empty row before `at` (clamped to the end).
    pub fn insert_row(&mut self, at: usize) {
        let at = at.min(self.cells.len());
        let row = (0..self.cols).map(|_| TableCell::default()).collect();
        self.cells.insert(at, row);
        self.rows += 1;
        self.clamp_spans();
    }

    /// Remove row `at`. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, at: usize) -> bool {
        if self.rows <= 1 || at >= self.cells.len() {
            return false;
        }
        self.cells.remove(at);
        self.rows -= 1;
        self.clamp_spans();
        true
    }

    /// Insert an empty column before `at` (clamped to the end).
    pub fn insert_column(&mut self, at: usize) {
        let at = at.min(self.cols as usize);
        for row in &mut self.cells {
            row.insert(at, TableCell::default());
        }
        self.cols += 1;
        self.clamp_spans();
    }

    /// Remove column `at`. The last remaining column cannot be removed.
    pub fn remove_column(&mut self, at: usize) -> bool {
        if self.cols <= 1 || at >= self.cols as usize {
            return false;
        }
        for row in &mut self.cells {
            row.remove(at);
        }
        self.cols -= 1;
        self.clamp_spans();
        true
    }

    /// Keep every span inside the table edge and at least 1.
    fn clamp_spans(&mut self) {
        let rows = self.rows;
        let cols = self.cols;
        for (r, row) in self.cells.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                cell.row_span = cell.row_span.clamp(1, rows - r as u32);
                cell.col_span = cell.col_span.clamp(1, cols - c as u32);
            }
        }
    }

    /// Check the matrix against the declared dimensions.
    pub fn validate(&self, id: BlockId) -> DocResult<()> {
        let malformed = |reason: String| DocError::MalformedTable { id, reason };
        if self.rows == 0 || self.cols == 0 {
            return Err(malformed("table needs at least one row and column".into()));
        }
        if self.cells.len() != self.rows as usize {
            return Err(malformed(format!(
                "{} rows declared, {} present",
                self.rows,
                self.cells.len()
            )));
        }
        if let Some((r, row)) = self
            .cells
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.cols as usize)
        {
            return Err(malformed(format!(
                "row {r} has {} cells, expected {}",
                row.len(),
                self.cols
            )));
        }
        Ok(())
    }
}

// ─── Shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Line,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeBlock {
    pub shape: ShapeKind,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub corner_radius: f64,
}

impl Default for ShapeBlock {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            fill: Some(Color::rgb8(0xE5, 0xE7, 0xEB)),
            stroke: None,
            stroke_width: 1.0,
            corner_radius: 0.0,
        }
    }
}

// ─── Blocks ──────────────────────────────────────────────────────────────

/// The type tag of a block, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Image,
    Table,
    Shape,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Text,
        BlockType::Image,
        BlockType::Table,
        BlockType::Shape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Table => "table",
            BlockType::Shape => "shape",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| DocError::UnsupportedBlockType(s.to_string()))
    }
}

/// Kind-specific payload. Serialized inline with a `"type"` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Text(TextBlock),
    Image(ImageBlock),
    Table(TableBlock),
    Shape(ShapeBlock),
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Text(_) => BlockType::Text,
            BlockKind::Image(_) => BlockType::Image,
            BlockKind::Table(_) => BlockType::Table,
            BlockKind::Shape(_) => BlockType::Shape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockMetadata {
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u32,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        let now = now_millis();
        Self {
            created_at: now,
            updated_at: now,
            version: SCHEMA_VERSION,
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// A single positioned visual element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// Top-left corner in document points.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise degrees in `[0, 360)`.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Index of the owning layer. Maintained by `Document`.
    #[serde(default)]
    pub layer: usize,
    /// Stacking position inside the owning layer. Maintained by `Document`.
    #[serde(default)]
    pub z_index: usize,
    #[serde(default)]
    pub metadata: BlockMetadata,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind, bounds: Rect) -> Self {
        let mut block = Self {
            id,
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            visible: true,
            layer: 0,
            z_index: 0,
            metadata: BlockMetadata::default(),
            kind,
        };
        block.normalize();
        block
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Unrotated bounding box in document points.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size())
    }

    /// Clamp numeric fields into range: finite position, minimum size,
    /// opacity in `[0, 1]`, rotation in `[0, 360)`.
    pub fn normalize(&mut self) {
        self.x = finite_or(self.x, 0.0);
        self.y = finite_or(self.y, 0.0);
        self.width = finite_or(self.width, MIN_BLOCK_SIZE).max(MIN_BLOCK_SIZE);
        self.height = finite_or(self.height, MIN_BLOCK_SIZE).max(MIN_BLOCK_SIZE);
        self.opacity = finite_or(self.opacity, 1.0).clamp(0.0, 1.0);
        self.rotation = finite_or(self.rotation, 0.0).rem_euclid(360.0);
        if let BlockKind::Image(img) = &mut self.kind {
            img.filters = img.filters.clamped();
        }
    }

    /// Shrink and shift the block so its bounding box lies inside a page of
    /// size `page`, anchored at the origin.
    pub fn clamp_to_page(&mut self, page: Size) {
        self.normalize();
        self.width = self.width.min(page.width.max(MIN_BLOCK_SIZE));
        self.height = self.height.min(page.height.max(MIN_BLOCK_SIZE));
        self.x = self.x.clamp(0.0, (page.width - self.width).max(0.0));
        self.y = self.y.clamp(0.0, (page.height - self.height).max(0.0));
    }

    /// Merge a partial update. The type tag never changes: a patch for a
    /// different kind is rejected and the block is left untouched.
    pub fn apply_patch(&mut self, patch: &BlockPatch) -> DocResult<()> {
        if let Some(kind_patch) = &patch.kind {
            let patch_type = kind_patch.block_type();
            if patch_type != self.block_type() {
                return Err(DocError::KindMismatch {
                    id: self.id,
                    block: self.block_type(),
                    patch: patch_type,
                });
            }
        }

        merge(&mut self.x, &patch.x);
        merge(&mut self.y, &patch.y);
        merge(&mut self.width, &patch.width);
        merge(&mut self.height, &patch.height);
        merge(&mut self.rotation, &patch.rotation);
        merge(&mut self.opacity, &patch.opacity);
        merge(&mut self.locked, &patch.locked);
        merge(&mut self.visible, &patch.visible);

        match (&mut self.kind, &patch.kind) {
            (BlockKind::Text(t), Some(KindPatch::Text(p))) => p.apply(t),
            (BlockKind::Image(i), Some(KindPatch::Image(p))) => p.apply(i),
            (BlockKind::Table(t), Some(KindPatch::Table(p))) => p.apply(t),
            (BlockKind::Shape(s), Some(KindPatch::Shape(p))) => p.apply(s),
            _ => {}
        }

        self.normalize();
        self.metadata.updated_at = now_millis();
        Ok(())
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// Overwrite `dst` only when the patch field is `Some`.
fn merge<T: Clone>(dst: &mut T, src: &Option<T>) {
    if let Some(v) = src {
        *dst = v.clone();
    }
}

/// A partial update to a block. `None` fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub locked: Option<bool>,
    pub visible: Option<bool>,
    pub kind: Option<KindPatch>,
}

impl BlockPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: Some(KindPatch::Text(TextPatch {
                content: Some(content.into()),
                ..TextPatch::default()
            })),
            ..Self::default()
        }
    }

    /// True when the patch touches position or size.
    pub fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KindPatch {
    Text(TextPatch),
    Image(ImagePatch),
    Table(TablePatch),
    Shape(ShapePatch),
}

impl KindPatch {
    pub fn block_type(&self) -> BlockType {
        match self {
            KindPatch::Text(_) => BlockType::Text,
            KindPatch::Image(_) => BlockType::Image,
            KindPatch::Table(_) => BlockType::Table,
            KindPatch::Shape(_) => BlockType::Shape,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub color: Option<Color>,
    pub align: Option<TextAlign>,
    pub line_height: Option<f64>,
    pub letter_spacing: Option<f64>,
    pub direction: Option<TextDirection>,
}

impl TextPatch {
    fn apply(&self, t: &mut TextBlock) {
        merge(&mut t.content, &self.content);
        merge(&mut t.font_family, &self.font_family);
        merge(&mut t.font_size, &self.font_size);
        merge(&mut t.font_weight, &self.font_weight);
        merge(&mut t.font_style, &self.font_style);
        merge(&mut t.color, &self.color);
        merge(&mut t.align, &self.align);
        merge(&mut t.line_height, &self.line_height);
        merge(&mut t.letter_spacing, &self.letter_spacing);
        merge(&mut t.direction, &self.direction);
        t.font_size = finite_or(t.font_size, 1.0).max(1.0);
        t.font_weight = t.font_weight.clamp(100, 900);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePatch {
    pub src: Option<String>,
    pub fit: Option<ImageFit>,
    pub filters: Option<ImageFilters>,
    /// `Some(None)` clears the crop.
    pub crop: Option<Option<CropRect>>,
}

impl ImagePatch {
    fn apply(&self, i: &mut ImageBlock) {
        merge(&mut i.src, &self.src);
        merge(&mut i.fit, &self.fit);
        merge(&mut i.filters, &self.filters);
        merge(&mut i.crop, &self.crop);
    }
}

/// Style-level table update. Structural edits (rows, columns, cells) go
/// through the dedicated table operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TablePatch {
    pub header_style: Option<CellStyle>,
    pub cell_style: Option<CellStyle>,
    pub border: Option<BorderStyle>,
    pub alternate_rows: Option<bool>,
    pub alternate_color: Option<Option<Color>>,
}

impl TablePatch {
    fn apply(&self, t: &mut TableBlock) {
        merge(&mut t.header_style, &self.header_style);
        merge(&mut t.cell_style, &self.cell_style);
        merge(&mut t.border, &self.border);
        merge(&mut t.alternate_rows, &self.alternate_rows);
        merge(&mut t.alternate_color, &self.alternate_color);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapePatch {
    pub shape: Option<ShapeKind>,
    pub fill: Option<Option<Color>>,
    pub stroke: Option<Option<Color>>,
    pub stroke_width: Option<f64>,
    pub corner_radius: Option<f64>,
}

impl ShapePatch {
    fn apply(&self, s: &mut ShapeBlock) {
        merge(&mut s.shape, &self.shape);
        merge(&mut s.fill, &self.fill);
        merge(&mut s.stroke, &self.stroke);
        merge(&mut s.stroke_width, &self.stroke_width);
        merge(&mut s.corner_radius, &self.corner_radius);
        s.stroke_width = finite_or(s.stroke_width, 0.0).max(0.0);
        s.corner_radius = finite_or(s.corner_radius, 0.0).max(0.0);
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

/// Tag colors cycled through for new layers in the layer panel.
pub const LAYER_COLORS: [Color; 6] = [
    Color::rgb8(0x3B, 0x82, 0xF6),
    Color::rgb8(0x10, 0xB9, 0x81),
    Color::rgb8(0xF5, 0x9E, 0x0B),
    Color::rgb8(0xEF, 0x44, 0x44),
    Color::rgb8(0x8B, 0x5C, 0xF6),
    Color::rgb8(0xEC, 0x48, 0x99),
];

/// An ordered, independently visible/lockable grouping of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Paint order inside the layer, bottom first.
    #[serde(default)]
    pub block_ids: Vec<BlockId>,
    #[serde(default = "default_layer_color")]
    pub color: Color,
}

fn default_layer_color() -> Color {
    LAYER_COLORS[0]
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            block_ids: Vec::new(),
            color: default_layer_color(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// A partial update to a layer's display properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub blend_mode: Option<BlendMode>,
    pub color: Option<Color>,
}

impl LayerPatch {
    pub fn apply(&self, layer: &mut Layer) {
        merge(&mut layer.name, &self.name);
        merge(&mut layer.visible, &self.visible);
        merge(&mut layer.locked, &self.locked);
        merge(&mut layer.opacity, &self.opacity);
        merge(&mut layer.blend_mode, &self.blend_mode);
        merge(&mut layer.color, &self.color);
        layer.opacity = finite_or(layer.opacity, 1.0).clamp(0.0, 1.0);
    }
}
