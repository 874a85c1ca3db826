//! Diffing bridge between the document and a drawing backend.
//!
//! The backend (`RenderSurface`) may come up asynchronously, or not at all.
//! Until it is attached the renderer is `Loading` and every sync is
//! deferred; if it fails the renderer is `Unavailable` and the host shows a
//! static preview. The document never depends on either state.
//!
//! A sync compares the ids drawn last time (and the grid as drawn) with the
//! current draw list. Only when those differ is the surface cleared and
//! rebuilt; otherwise each item is updated in place. Grid lines are in
//! screen space, so with the grid on a zoom or pan also forces a rebuild.

use crate::draw::{DrawInstruction, build_draw_list, grid_color, grid_lines};
use df_core::{BlockId, CanvasSettings, Document, GridSettings, Viewport};
use kurbo::{Affine, Line, Size};
use peniko::Color;
use thiserror::Error;

/// A drawing backend.
pub trait RenderSurface {
    /// Drop every drawn object.
    fn clear(&mut self);

    /// Paint a grid behind the blocks.
    fn draw_grid(&mut self, lines: &[Line], color: Color);

    /// Add a new object for `item` on top of everything drawn so far.
    fn draw(&mut self, item: &DrawInstruction);

    /// Refresh the existing object for `item.id` in place.
    fn update(&mut self, item: &DrawInstruction);

    /// Flush the frame.
    fn present(&mut self) {}
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("rendering unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    /// Waiting for the backend to initialize.
    Loading,
    Ready,
    /// The backend failed; only a static preview is possible.
    Unavailable(String),
}

/// What a `sync` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No surface yet; nothing drawn.
    Deferred,
    /// The surface was cleared and every item drawn again.
    Rebuilt,
    /// Same items as before; each was updated in place.
    Updated,
}

pub struct Renderer<S: RenderSurface> {
    surface: Option<S>,
    state: RenderState,
    drawn: Vec<BlockId>,
    /// Inputs of the grid currently on the surface, if any.
    grid_drawn: Option<GridKey>,
    stale: bool,
    rebuilds: u64,
}

impl<S: RenderSurface> Default for Renderer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RenderSurface> Renderer<S> {
    pub fn new() -> Self {
        Self {
            surface: None,
            state: RenderState::Loading,
            drawn: Vec::new(),
            grid_drawn: None,
            stale: true,
            rebuilds: 0,
        }
    }

    /// The backend finished loading.
    pub fn attach(&mut self, surface: S) {
        log::debug!("render surface attached");
        self.surface = Some(surface);
        self.state = RenderState::Ready;
        self.stale = true;
    }

    /// The backend failed to initialize or was lost.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("rendering unavailable: {reason}");
        self.surface = None;
        self.drawn.clear();
        self.grid_drawn = None;
        self.state = RenderState::Unavailable(reason);
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == RenderState::Ready
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Number of full clear-and-redraw passes so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Force the next sync to rebuild (e.g. after a surface resize).
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Bring the surface in line with the document.
    pub fn sync(
        &mut self,
        doc: &Document,
        viewport: &Viewport,
        canvas: &CanvasSettings,
        page: Size,
    ) -> Result<SyncOutcome, RenderError> {
        if let RenderState::Unavailable(reason) = &self.state {
            return Err(RenderError::Unavailable(reason.clone()));
        }
        let Some(surface) = self.surface.as_mut() else {
            log::trace!("sync deferred: surface still loading");
            return Ok(SyncOutcome::Deferred);
        };

        let items = build_draw_list(doc, viewport);
        let grid = canvas.grid.enabled.then(|| GridKey {
            grid: canvas.grid,
            transform: viewport.transform(),
            page,
        });
        let same_ids = items.len() == self.drawn.len()
            && items.iter().zip(&self.drawn).all(|(item, id)| item.id == *id);

        let outcome = if self.stale || !same_ids || grid != self.grid_drawn {
            surface.clear();
            if grid.is_some() {
                surface.draw_grid(&grid_lines(canvas, page, viewport), grid_color(&canvas.grid));
            }
            for item in &items {
                surface.draw(item);
            }
            self.drawn = items.iter().map(|i| i.id).collect();
            self.grid_drawn = grid;
            self.stale = false;
            self.rebuilds += 1;
            SyncOutcome::Rebuilt
        } else {
            for item in &items {
                surface.update(item);
            }
            SyncOutcome::Updated
        };
        surface.present();
        log::trace!("render sync: {outcome:?}, {} items", items.len());
        Ok(outcome)
    }
}

/// Everything the grid lines depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridKey {
    grid: GridSettings,
    transform: Affine,
    page: Size,
}

// ─── Headless surface ────────────────────────────────────────────────────

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Grid(usize),
    Draw(BlockId),
    Update(BlockId),
    Present,
}

/// A surface that records calls instead of painting. Used for server-side
/// previews and tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub ops: Vec<SurfaceOp>,
}

impl HeadlessSurface {
    /// Ids currently on the surface, bottom first.
    pub fn drawn_ids(&self) -> Vec<BlockId> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Draw(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for HeadlessSurface {
    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_grid(&mut self, lines: &[Line], _color: Color) {
        self.ops.push(SurfaceOp::Grid(lines.len()));
    }

    fn draw(&mut self, item: &DrawInstruction) {
        self.ops.push(SurfaceOp::Draw(item.id));
    }

    fn update(&mut self, item: &DrawInstruction) {
        self.ops.push(SurfaceOp::Update(item.id));
    }

    fn present(&mut self) {
        self.ops.push(SurfaceOp::Present);
    }
}
