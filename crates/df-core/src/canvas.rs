//! Canvas display settings that travel with the document: grid and guides.

use crate::model::Color;
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridSettings {
    pub enabled: bool,
    /// Cell size in document points.
    pub size: f64,
    pub color: Color,
    pub opacity: f64,
    /// Snap newly placed blocks to grid intersections.
    pub snap: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 10.0,
            color: Color::rgb8(0xCB, 0xD5, 0xE1),
            opacity: 0.5,
            snap: false,
        }
    }
}

impl GridSettings {
    /// Clamp size and opacity into range.
    pub fn sanitized(mut self) -> Self {
        if !self.size.is_finite() || self.size < 1.0 {
            self.size = 1.0;
        }
        self.opacity = if self.opacity.is_finite() { self.opacity.clamp(0.0, 1.0) } else { 0.5 };
        self
    }

    /// Round a document point to the nearest grid intersection when snapping
    /// is on; otherwise return it unchanged.
    pub fn snap_point(&self, p: Point) -> Point {
        if !self.snap || self.size <= 0.0 {
            return p;
        }
        Point::new(
            (p.x / self.size).round() * self.size,
            (p.y / self.size).round() * self.size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    Horizontal,
    Vertical,
}

/// A ruler guide at a fixed document coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: GuideAxis,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuideSettings {
    pub visible: bool,
    pub color: Color,
    pub guides: Vec<Guide>,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            visible: true,
            color: Color::rgb8(0x06, 0xB6, 0xD4),
            guides: Vec::new(),
        }
    }
}

/// The document-affecting canvas configuration captured in history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasSettings {
    pub grid: GridSettings,
    pub guides: GuideSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest_cell() {
        let grid = GridSettings {
            snap: true,
            size: 10.0,
            ..GridSettings::default()
        };
        assert_eq!(grid.snap_point(Point::new(14.0, 26.0)), Point::new(10.0, 30.0));

        let off = GridSettings::default();
        assert_eq!(off.snap_point(Point::new(14.0, 26.0)), Point::new(14.0, 26.0));
    }

    #[test]
    fn sanitize_clamps() {
        let grid = GridSettings {
            size: 0.0,
            opacity: 4.0,
            ..GridSettings::default()
        }
        .sanitized();
        assert_eq!(grid.size, 1.0);
        assert_eq!(grid.opacity, 1.0);
    }
}
